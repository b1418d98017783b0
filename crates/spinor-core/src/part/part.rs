//! `Part` - one catalog entry.

use crate::spi::{IoCaps, IoOpcode};
use crate::wp::WpInfo;

use super::erase::EraseInfo;
use super::fixups::FixupHooks;
use super::id::PartId;
use super::ops_override::OpsOverride;
use super::otp::OtpLayout;
use super::strategies::{A4bDisType, A4bEnType, A4bFlags, PartFlags, QeType, QpiDisType, QpiEnType, SoftResetFlags};

/// An alternate `(vendor, model)` pair that resolves to the same `Part`.
/// The display vendor shown to the user is the alias's vendor when
/// present, else the part's primary vendor (§4.2).
#[derive(Debug, Clone, Copy)]
pub struct Alias {
    /// Alternate vendor name, if this alias renames the vendor too.
    pub vendor: Option<&'static str>,
    /// Alternate model name under which this part is also sold.
    pub model: &'static str,
}

/// Per-IoMode opcode table, used for `read_opcodes_{3b,4b}` /
/// `pp_opcodes_{3b,4b}`. Fixed-size and indexed by `IoCaps` bit position so
/// it stays `'static const`-constructible for the built-in catalog.
#[derive(Debug, Clone, Copy)]
pub struct IoOpcodeTable {
    entries: [Option<IoOpcode>; 10],
}

impl IoOpcodeTable {
    /// An empty table (no opcodes declared for this address width).
    pub const EMPTY: Self = Self { entries: [None; 10] };

    /// Build a table from `(IoMode, IoOpcode)` pairs.
    pub fn build(pairs: &[(crate::spi::IoMode, IoOpcode)]) -> Self {
        let mut entries = [None; 10];
        for (mode, op) in pairs {
            entries[io_mode_slot(*mode)] = Some(*op);
        }
        Self { entries }
    }

    /// Look up the opcode bound to one `IoMode`, if any.
    pub fn get(&self, mode: crate::spi::IoMode) -> Option<IoOpcode> {
        self.entries[io_mode_slot(mode)]
    }
}

fn io_mode_slot(mode: crate::spi::IoMode) -> usize {
    use crate::spi::IoMode::*;
    match mode {
        Single => 0,
        DualOutput => 1,
        DualIo => 2,
        DualAll => 3,
        QuadOutput => 4,
        QuadIo => 5,
        QuadAll => 6,
        OctalOutput => 7,
        OctalIo => 8,
        OctalAll => 9,
    }
}

/// Optional register-layout metadata kept purely for diagnostic dumps
/// (`spi-nor-info`-style tooling); never consulted by the engine itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterLayoutInfo {
    /// Human-readable name of the status/config register set this part uses.
    pub description: &'static str,
}

/// A reference to a vendor shown in catalog listings, either the part's
/// primary vendor or an alias's renamed vendor.
#[derive(Debug, Clone, Copy)]
pub struct VendorRef {
    /// Vendor display name.
    pub name: &'static str,
    /// JEDEC manufacturer ID byte.
    pub mfr_id: u8,
}

/// A catalog entry describing one SPI-NOR part family (§3 `Part`).
#[derive(Debug, Clone, Copy)]
pub struct Part {
    /// Model name, e.g. `"W25Q128JV"`.
    pub model: &'static str,
    /// Vendor shown to the user when no alias applies.
    pub display_vendor: Option<VendorRef>,
    /// JEDEC ID and mask this part matches.
    pub id: PartId,
    /// Total die size in bytes; always a power of two.
    pub size: u64,
    /// Number of dies (stacked parts use `SELECT_DIE`); default 1.
    pub ndies: u32,
    /// Page-program granularity in bytes; default 256.
    pub page_size: u32,
    /// Capability/behavior flags.
    pub flags: PartFlags,
    /// Vendor-private bitset; bit names are vendor-specific.
    pub vendor_flags: u32,
    /// Quad-Enable procedure.
    pub qe_type: QeType,
    /// QPI-enter procedure.
    pub qpi_en_type: QpiEnType,
    /// QPI-exit procedure.
    pub qpi_dis_type: QpiDisType,
    /// 4-byte-addressing enter procedure.
    pub a4b_en_type: A4bEnType,
    /// 4-byte-addressing exit procedure.
    pub a4b_dis_type: A4bDisType,
    /// Which 4-byte-addressing strategies this part advertises.
    pub a4b_flags: A4bFlags,
    /// Which soft-reset sequences this part advertises.
    pub soft_reset_flags: SoftResetFlags,
    /// Maximum SPI (1-1-1) clock in MHz.
    pub max_speed_spi_mhz: u32,
    /// Maximum dual-I/O clock in MHz.
    pub max_speed_dual_mhz: u32,
    /// Maximum quad-I/O clock in MHz.
    pub max_speed_quad_mhz: u32,
    /// Worst-case page-program time in microseconds.
    pub max_pp_time_us: u32,
    /// `IoMode`s this part supports for reads.
    pub read_io_caps: IoCaps,
    /// `IoMode`s this part supports for page program.
    pub pp_io_caps: IoCaps,
    /// Erase layout when addressed with 3 bytes.
    pub erase_info_3b: Option<EraseInfo>,
    /// Erase layout when addressed with 4 bytes; falls back to
    /// `erase_info_3b`, then the built-in default, when absent (§9).
    pub erase_info_4b: Option<EraseInfo>,
    /// Read opcode table, 3-byte addressing.
    pub read_opcodes_3b: IoOpcodeTable,
    /// Read opcode table, 4-byte addressing.
    pub read_opcodes_4b: IoOpcodeTable,
    /// Page-program opcode table, 3-byte addressing.
    pub pp_opcodes_3b: IoOpcodeTable,
    /// Page-program opcode table, 4-byte addressing.
    pub pp_opcodes_4b: IoOpcodeTable,
    /// OTP region layout, if this part has one.
    pub otp: Option<OtpLayout>,
    /// Write-protect range table, if this part has one.
    pub wp_ranges: Option<WpInfo>,
    /// Diagnostic-only register layout description.
    pub regs: Option<RegisterLayoutInfo>,
    /// Alternate `(vendor, model)` names this entry also matches under.
    pub alias: &'static [Alias],
    /// Part-specific resolver/engine hooks.
    pub fixups: Option<FixupHooks>,
    /// Per-operation overrides for vendor-specific procedures.
    pub ops: Option<OpsOverride>,
}

/// Builder for dense `const`-friendly `Part` declarations; mirrors the
/// catalog's need to express a hundred near-identical parts tersely.
pub struct PartBuilder {
    part: Part,
}

impl PartBuilder {
    /// Start building a part with the given model name, id and size; every
    /// other field defaults to its "not present" value.
    pub const fn new(model: &'static str, id: PartId, size: u64) -> Self {
        Self {
            part: Part {
                model,
                display_vendor: None,
                id,
                size,
                ndies: 1,
                page_size: 256,
                flags: PartFlags::empty(),
                vendor_flags: 0,
                qe_type: QeType::DontCare,
                qpi_en_type: QpiEnType::None,
                qpi_dis_type: QpiDisType::None,
                a4b_en_type: A4bEnType::None,
                a4b_dis_type: A4bDisType::None,
                a4b_flags: A4bFlags::empty(),
                soft_reset_flags: SoftResetFlags::empty(),
                max_speed_spi_mhz: 0,
                max_speed_dual_mhz: 0,
                max_speed_quad_mhz: 0,
                max_pp_time_us: 0,
                read_io_caps: IoCaps::empty(),
                pp_io_caps: IoCaps::empty(),
                erase_info_3b: None,
                erase_info_4b: None,
                read_opcodes_3b: IoOpcodeTable::EMPTY,
                read_opcodes_4b: IoOpcodeTable::EMPTY,
                pp_opcodes_3b: IoOpcodeTable::EMPTY,
                pp_opcodes_4b: IoOpcodeTable::EMPTY,
                otp: None,
                wp_ranges: None,
                regs: None,
                alias: &[],
                fixups: None,
                ops: None,
            },
        }
    }

    /// Set the display vendor.
    pub const fn vendor(mut self, name: &'static str, mfr_id: u8) -> Self {
        self.part.display_vendor = Some(VendorRef { name, mfr_id });
        self
    }

    /// Set capability/behavior flags.
    pub const fn flags(mut self, flags: PartFlags) -> Self {
        self.part.flags = flags;
        self
    }

    /// Set the Quad-Enable procedure.
    pub const fn qe_type(mut self, qe_type: QeType) -> Self {
        self.part.qe_type = qe_type;
        self
    }

    /// Set the QPI enter/exit procedures.
    pub const fn qpi(mut self, en: QpiEnType, dis: QpiDisType) -> Self {
        self.part.qpi_en_type = en;
        self.part.qpi_dis_type = dis;
        self
    }

    /// Set the 4-byte-addressing enter/exit procedures and capability bits.
    pub const fn a4b(mut self, en: A4bEnType, dis: A4bDisType, flags: A4bFlags) -> Self {
        self.part.a4b_en_type = en;
        self.part.a4b_dis_type = dis;
        self.part.a4b_flags = flags;
        self
    }

    /// Set soft-reset capability bits.
    pub const fn soft_reset(mut self, flags: SoftResetFlags) -> Self {
        self.part.soft_reset_flags = flags;
        self
    }

    /// Set maximum clock speeds in MHz.
    pub const fn speeds(mut self, spi_mhz: u32, dual_mhz: u32, quad_mhz: u32) -> Self {
        self.part.max_speed_spi_mhz = spi_mhz;
        self.part.max_speed_dual_mhz = dual_mhz;
        self.part.max_speed_quad_mhz = quad_mhz;
        self
    }

    /// Set worst-case page-program time in microseconds.
    pub const fn max_pp_time_us(mut self, us: u32) -> Self {
        self.part.max_pp_time_us = us;
        self
    }

    /// Set page-program granularity in bytes.
    pub const fn page_size(mut self, bytes: u32) -> Self {
        self.part.page_size = bytes;
        self
    }

    /// Set the number of stacked dies.
    pub const fn ndies(mut self, n: u32) -> Self {
        self.part.ndies = n;
        self
    }

    /// Set the read/program `IoMode` capability bitsets.
    pub const fn io_caps(mut self, read: IoCaps, pp: IoCaps) -> Self {
        self.part.read_io_caps = read;
        self.part.pp_io_caps = pp;
        self
    }

    /// Set the 3-byte-addressing read opcode table.
    pub fn read_opcodes_3b(mut self, table: IoOpcodeTable) -> Self {
        self.part.read_opcodes_3b = table;
        self
    }

    /// Set the 4-byte-addressing read opcode table.
    pub fn read_opcodes_4b(mut self, table: IoOpcodeTable) -> Self {
        self.part.read_opcodes_4b = table;
        self
    }

    /// Set the 3-byte-addressing page-program opcode table.
    pub fn pp_opcodes_3b(mut self, table: IoOpcodeTable) -> Self {
        self.part.pp_opcodes_3b = table;
        self
    }

    /// Set the 4-byte-addressing page-program opcode table.
    pub fn pp_opcodes_4b(mut self, table: IoOpcodeTable) -> Self {
        self.part.pp_opcodes_4b = table;
        self
    }

    /// Set the 3-byte and (optionally) 4-byte erase layouts.
    pub fn erase_info(mut self, three_byte: EraseInfo, four_byte: Option<EraseInfo>) -> Self {
        self.part.erase_info_3b = Some(three_byte);
        self.part.erase_info_4b = four_byte;
        self
    }

    /// Set the OTP region layout.
    pub const fn otp(mut self, otp: OtpLayout) -> Self {
        self.part.otp = Some(otp);
        self
    }

    /// Set the write-protect range table.
    pub const fn wp_ranges(mut self, wp: WpInfo) -> Self {
        self.part.wp_ranges = Some(wp);
        self
    }

    /// Set alternate `(vendor, model)` names.
    pub const fn alias(mut self, alias: &'static [Alias]) -> Self {
        self.part.alias = alias;
        self
    }

    /// Set resolver/engine fixup hooks.
    pub const fn fixups(mut self, fixups: FixupHooks) -> Self {
        self.part.fixups = Some(fixups);
        self
    }

    /// Set per-operation overrides.
    pub const fn ops(mut self, ops: OpsOverride) -> Self {
        self.part.ops = Some(ops);
        self
    }

    /// Finish building.
    pub const fn build(self) -> Part {
        self.part
    }
}

/// Effective erase layout for the requested address width, applying the
/// §9 fallback order: the part's own entry for that width, else its 3-byte
/// entry, else `None` (the caller falls back further to
/// `EraseInfo::default_3byte`).
pub fn erase_info_for<'a>(part: &'a Part, four_byte: bool) -> Option<&'a EraseInfo> {
    if four_byte {
        part.erase_info_4b.as_ref().or(part.erase_info_3b.as_ref())
    } else {
        part.erase_info_3b.as_ref()
    }
}
