//! `ResolvedFlash` - the live runtime descriptor produced by probing and
//! negotiating with an attached part (§3).

use crate::part::{EraseRegion, EraseSector, OtpLayout, Part, MAX_ERASE_SECTORS};
use crate::sfdp::SfdpInfo;
use crate::spi::{IoMode, IoOpcode};
use crate::wp::WpInfo;

/// Identity of the probed part.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Display vendor name (may come from an alias).
    pub vendor_name: &'static str,
    /// Model name.
    pub model_name: &'static str,
    /// Raw bytes read back from RDID at probe time.
    pub id_bytes: heapless::Vec<u8, 8>,
}

/// Geometry of the attached die(s).
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    /// Total size in bytes.
    pub size: u64,
    /// Number of stacked dies.
    pub ndies: u32,
    /// Page-program granularity in bytes.
    pub page_size: u32,
    /// Address bytes currently in effect on the bus (3 or 4).
    pub naddr_current: u8,
    /// Address bytes the part natively prefers (3 unless always-4B).
    pub naddr_native: u8,
}

/// Negotiated and live clock speeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Speeds {
    /// Lowest-common-denominator speed used during probing.
    pub min_low_hz: u32,
    /// Fastest speed the negotiated I/O mode supports.
    pub max_high_hz: u32,
    /// Currently configured high speed.
    pub curr_high_hz: u32,
    /// Currently configured low (probe-safe) speed.
    pub curr_low_hz: u32,
    /// The part's own speed ceiling for the selected bus width.
    pub part_max_hz: u32,
}

/// Negotiated I/O opcode selections and live bus-width state (§3 `io`).
#[derive(Debug, Clone, Copy)]
pub struct IoState {
    /// Selected read opcode.
    pub read_opcode: u8,
    /// Selected read `IoOpcode`/`IoMode` pairing.
    pub read_io_info: IoOpcode,
    /// Read mode, used to compute bus widths for dummy-cycle byte math.
    pub read_mode: IoMode,
    /// Dummy bytes inserted before the read data phase
    /// (`(ndummy_cycles + nmode_cycles) * addr_bw / 8`).
    pub read_ndummy_bytes: u8,
    /// Selected page-program opcode.
    pub pp_opcode: u8,
    /// Selected page-program `IoOpcode`/`IoMode` pairing.
    pub pp_io_info: IoOpcode,
    /// Page-program mode.
    pub pp_mode: IoMode,
    /// Steady-state command bus width once negotiation settles (1, 2 or 4).
    pub cmd_buswidth_steady_state: u8,
    /// Command bus width currently in effect (may differ transiently
    /// during a QPI/DPI enter/exit transition).
    pub cmd_buswidth_current: u8,
    /// Last value written to the extended-address/bank register.
    pub curr_high_addr_byte: u8,
    /// True if 4-byte addressing mode is the active sticky mode.
    pub a4b_mode_active: bool,
    /// True iff the Quad-Enable bit has been written and read back as set
    /// since the last soft-reset.
    pub qe_set: bool,
}

/// Erase capability actually bound for the current address width.
#[derive(Debug, Clone)]
pub struct EraseState {
    /// Ordered regions summing to the die size.
    #[cfg(feature = "alloc")]
    pub regions: alloc::vec::Vec<EraseRegion>,
    /// Ordered regions (no_std without `alloc`).
    #[cfg(not(feature = "alloc"))]
    pub regions: &'static [EraseRegion],
    /// Sector-type table referenced by the regions' masks.
    pub sector_info: [EraseSector; MAX_ERASE_SECTORS],
}

/// Volatile engine-internal state not part of the part's static
/// description (§3 `state`).
#[derive(Debug, Clone, Copy, Default)]
pub struct VolatileState {
    /// True once a global-unlock (98h) has been issued this session.
    pub global_unlock_requested: bool,
    /// Per-die read-granularity cap in bytes, 0 if the part is single-die.
    pub die_read_granularity: u32,
    /// Currently selected die index (for `select_die`).
    pub current_die: u32,
}

/// The live runtime descriptor produced by `probe_init`/`part_init`.
///
/// Exclusively owns its `sfdp` bytes and, when not pointing at the
/// embedded uniform-region slot, its erase-region array; both are freed
/// when the handle is destroyed.
#[derive(Debug, Clone)]
pub struct ResolvedFlash {
    /// Catalog entry this descriptor was resolved from.
    pub part: &'static Part,
    /// Identity fields.
    pub identity: Identity,
    /// Geometry fields.
    pub geometry: Geometry,
    /// Speed fields.
    pub speeds: Speeds,
    /// I/O negotiation state.
    pub io: IoState,
    /// Erase capability for the current address width.
    pub erase: EraseState,
    /// OTP layout, if this part has one.
    pub otp: Option<OtpLayout>,
    /// Write-protect table, if this part has one.
    pub wp: Option<WpInfo>,
    /// Parsed SFDP data, if SFDP was present and sane.
    pub sfdp: Option<SfdpInfo>,
    /// Volatile engine state.
    pub state: VolatileState,
}

impl ResolvedFlash {
    /// True if 4-byte addressing is needed for any address in this die
    /// (§3 invariant: parts over 16 MiB must leave 4B mode in a known
    /// state before negotiation).
    pub fn requires_4b_addressing(&self) -> bool {
        self.geometry.size > 16 * 1024 * 1024
    }

    /// Validate the invariant that every chosen bus width in `io` is
    /// present in `allowed_caps`, returning `false` if the negotiated
    /// state has since drifted out of the caller's allowed set.
    pub fn io_within_allowed(&self, allowed: crate::spi::IoCaps) -> bool {
        allowed.contains(crate::spi::IoCaps::of(self.io.read_mode))
            && allowed.contains(crate::spi::IoCaps::of(self.io.pp_mode))
    }
}
