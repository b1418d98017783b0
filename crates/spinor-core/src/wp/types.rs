//! Write-protect data model: the kind-based `WpRange` table the catalog
//! declares per part, and the register-access descriptor used to read and
//! write the bits that select one.

use bitflags::bitflags;

/// Maximum number of Block-Protect bits a part's status register exposes.
pub const MAX_BP_BITS: usize = 4;

/// Hardware write-protection mode, derived from the SRP/SRL bit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum WpMode {
    /// Status register can be freely modified.
    #[default]
    Disabled,
    /// The WP# pin must be inactive to modify the status register.
    Hardware,
    /// The status register cannot be modified until a power cycle.
    PowerCycle,
    /// The status register is permanently locked (OTP).
    Permanent,
}

impl WpMode {
    /// Derive the mode from the `(srl, srp)` bit pair.
    pub const fn from_bits(srl: bool, srp: bool) -> Self {
        match (srl, srp) {
            (false, false) => Self::Disabled,
            (false, true) => Self::Hardware,
            (true, false) => Self::PowerCycle,
            (true, true) => Self::Permanent,
        }
    }
}

impl core::fmt::Display for WpMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::Disabled => "disabled",
            Self::Hardware => "hardware",
            Self::PowerCycle => "power-cycle",
            Self::Permanent => "permanent",
        };
        f.write_str(s)
    }
}

/// The kind of protected extent a `WpRange` entry describes (§3/§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum WpRangeKind {
    /// Nothing protected.
    None,
    /// The entire die protected.
    All,
    /// Lower `64 KiB << shift` bytes protected, block-count style.
    BpLower,
    /// Upper `64 KiB << shift` bytes protected, block-count style.
    BpUpper,
    /// Complement of `BpLower`.
    BpCmpLower,
    /// Complement of `BpUpper`.
    BpCmpUpper,
    /// Lower `4 KiB << shift` bytes protected, small-sector style.
    SpLower,
    /// Upper `4 KiB << shift` bytes protected, small-sector style.
    SpUpper,
    /// Lower `size >> shift` bytes protected, ratio style.
    RpLower,
    /// Upper `size >> shift` bytes protected, ratio style.
    RpUpper,
    /// Full die minus the `SpLower` chunk.
    SpCmpLower,
    /// Full die minus the `SpUpper` chunk.
    SpCmpUpper,
    /// Full die minus a chunk sized like `SpLower` but measured from the
    /// opposite end.
    SpCmpfLower,
    /// Full die minus a chunk sized like `SpUpper` but measured from the
    /// opposite end.
    SpCmpfUpper,
    /// Complement of `RpLower`.
    RpCmpLower,
    /// Complement of `RpUpper`.
    RpCmpUpper,
}

/// One row of a part's write-protect lookup table: the register bit
/// pattern that selects this range, and the `kind`/`shift` needed to turn
/// it into a `(start, len)` extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WpRange {
    /// Which extent shape this row describes.
    pub kind: WpRangeKind,
    /// Shift applied to the kind's base unit (see `decode` in `ranges.rs`).
    pub shift: u8,
    /// The bit pattern in the register access's data bytes that selects
    /// this row. Matched via `mask_value == (regval & WpInfo.bp_mask)`.
    pub mask_value: u32,
}

impl WpRange {
    /// Construct a table row.
    pub const fn new(kind: WpRangeKind, shift: u8, mask_value: u32) -> Self {
        Self { kind, shift, mask_value }
    }
}

/// Which shape of register access a part's write-protect bits use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterAccessKind {
    /// A single status/config register read with `opcode_read`, written
    /// with `opcode_write`, no address phase.
    Normal,
    /// An addressed register access (e.g. a security register requiring an
    /// address phase even though it behaves like a status register).
    Addressed,
    /// Several register reads concatenated into one logical value (e.g.
    /// SR1|SR2 as a 16-bit word), `data_bytes` wide.
    Multi,
}

bitflags! {
    /// Semantic flags on a `RegisterAccess` beyond its raw opcode shape.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RegisterAccessFlags: u8 {
        /// The address phase (if any) must track 4-byte-addressing mode.
        const ADDRESS_4B_AWARE = 1 << 0;
        /// Writes to this register are volatile only (no persistence across
        /// power cycle); use the EWSR(50h) unlock instead of WREN.
        const VOLATILE_WRITE_ONLY = 1 << 1;
    }
}

/// Describes how to read and write the register(s) that hold a part's
/// write-protect selector bits (§3 `RegisterAccess`).
#[derive(Clone, Copy)]
pub struct RegisterAccess {
    /// Shape of this access.
    pub kind: RegisterAccessKind,
    /// Opcode used to read the register(s).
    pub opcode_read: u8,
    /// Opcode used to write the register(s).
    pub opcode_write: u8,
    /// Number of address bytes, 0 if this is a `Normal` access.
    pub addr_bytes: u8,
    /// Dummy bytes inserted before the read data phase.
    pub dummy_bytes_read: u8,
    /// Number of data bytes read/written (1 for `Normal`, >1 for `Multi`).
    pub data_bytes: u8,
    /// Address value for `Addressed` accesses.
    pub address: u32,
    /// Semantic flags.
    pub flags: RegisterAccessFlags,
    /// Mask, within the concatenated data bytes, of the bits that select a
    /// `WpRange` row (the Block-Protect bits plus TB/SEC/CMP where present).
    pub bp_mask: u32,
    /// Bit position of the Status Register Protect 0 bit, if present.
    pub srp_bit: Option<(u8, u8)>,
    /// Bit position of the Status Register Lock (SRP1/SRL) bit, if present.
    pub srl_bit: Option<(u8, u8)>,
}

impl core::fmt::Debug for RegisterAccess {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisterAccess")
            .field("kind", &self.kind)
            .field("opcode_read", &self.opcode_read)
            .field("opcode_write", &self.opcode_write)
            .field("bp_mask", &self.bp_mask)
            .finish()
    }
}

impl RegisterAccess {
    /// The common Winbond/GigaDevice-style layout: SR1 holds SRP0 (bit 7),
    /// SEC (bit 6), TB (bit 5), BP2-0 (bits 4-2); SR2 holds SRL (bit 0).
    /// Represented here as a 16-bit concatenated `Multi` access (SR1 in the
    /// low byte, SR2 in the high byte) so `bp_mask` can cover both in one
    /// register value.
    pub const fn winbond_standard(opcode_read: u8, opcode_write: u8) -> Self {
        Self {
            kind: RegisterAccessKind::Multi,
            opcode_read,
            opcode_write,
            addr_bytes: 0,
            dummy_bytes_read: 0,
            data_bytes: 2,
            address: 0,
            flags: RegisterAccessFlags::empty(),
            bp_mask: 0b0111_1100,
            srp_bit: Some((0, 7)),
            srl_bit: Some((1, 0)),
        }
    }
}

/// An ordered list of `WpRange` entries plus the register-access descriptor
/// to read/write them (§3 `WpInfo`).
#[derive(Clone, Copy)]
pub struct WpInfo {
    /// Lookup table, checked in order; the first row whose `mask_value`
    /// matches wins.
    pub ranges: &'static [WpRange],
    /// How to read/write the selector bits.
    pub access: RegisterAccess,
}

impl core::fmt::Debug for WpInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WpInfo").field("ranges_len", &self.ranges.len()).field("access", &self.access).finish()
    }
}

impl WpInfo {
    /// Find the table row matching `regval` under `access.bp_mask`. Lookup
    /// is total: a miss (no row found) maps to the implicit `None` range
    /// rather than an error (§3 invariant).
    pub fn lookup(&self, regval: u32) -> WpRange {
        let masked = regval & self.access.bp_mask;
        self.ranges
            .iter()
            .find(|r| r.mask_value == masked)
            .copied()
            .unwrap_or(WpRange::new(WpRangeKind::None, 0, 0))
    }
}
