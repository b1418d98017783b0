//! Enumerated strategies the negotiator picks between: quad-enable
//! procedure, QPI/DPI enter/exit pairs, 4-byte addressing mode switch, and
//! soft-reset precedence.

use bitflags::bitflags;

/// How a part's Quad-Enable bit is set. All strategies read back and
/// verify after writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum QeType {
    /// Part never needs an explicit QE write (quad mode always available).
    #[default]
    DontCare,
    /// Set Status Register 1 bit 6 via WRSR.
    Sr1Bit6,
    /// Set Status Register 2 bit 1 via WRSR, preserving SR1.
    Sr2Bit1,
    /// Set Status Register 2 bit 1 via a combined 2-byte WRSR (SR1|SR2).
    Sr2Bit1WrSr1,
    /// Set Status Register 2 bit 7.
    Sr2Bit7,
    /// Set Non-Volatile Configuration Register bit 4 via the extended
    /// volatile configuration register.
    NvcrBit4,
    /// Known to need a QE write, but the exact procedure is vendor-specific
    /// and bound through `ops.quad_enable` instead.
    Unknown,
}

/// How a part enters QPI (4-4-4) mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum QpiEnType {
    /// Part has no QPI mode.
    #[default]
    None,
    /// Enter via the standard Quad-Enable-Request sequence at opcode 38h.
    Qer38h,
    /// Enter via bare opcode 38h with no preceding QE write.
    Opcode38h,
    /// Enter via opcode 35h.
    Opcode35h,
    /// Enter by writing bit 1 of the volatile enhanced configuration
    /// register at address `0x800003`.
    Addr800003h,
    /// Enter by clearing bit 7 of the volatile enhanced configuration
    /// register.
    VecrBit7Clr,
    /// Vendor-specific sequence bound through `ops.qpi_enable`.
    Vendor,
}

/// How a part exits QPI mode back to 1-1-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum QpiDisType {
    /// Part has no QPI mode.
    #[default]
    None,
    /// Exit via opcode FFh.
    OpcodeFfh,
    /// Exit via opcode F5h.
    OpcodeF5h,
    /// Exit by restoring the volatile enhanced configuration register at
    /// `0x800003`.
    Addr800003h,
    /// Exit via the RSTEN(66h)/RST(99h) pair.
    Reset6699h,
    /// Vendor-specific sequence bound through `ops.qpi_disable`.
    Vendor,
}

/// How a part enters 4-byte addressing mode when it has no dedicated 4B
/// opcodes (§4.5 addressing-mode strategy, step 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum A4bEnType {
    /// Part is always 4B-addressed, or always uses dedicated opcodes; no
    /// explicit enter step.
    #[default]
    None,
    /// Bare opcode B7h.
    Opcode_B7h,
    /// WREN then opcode B7h.
    WrenThenB7h,
    /// Write the bank/extended-address register.
    Bank,
    /// Write the non-volatile configuration register.
    Nvcr,
}

/// How a part exits 4-byte addressing mode back to 3B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum A4bDisType {
    /// No explicit exit step.
    #[default]
    None,
    /// Bare opcode E9h.
    Opcode_E9h,
    /// WREN then opcode E9h.
    WrenThenE9h,
    /// Clear the bank/extended-address register.
    Bank,
    /// Clear the non-volatile configuration register.
    Nvcr,
}

bitflags! {
    /// Per-part capability/behavior flags (§3 `Part.flags`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PartFlags: u32 {
        /// A catalog placeholder that must redirect via `fixups.pre_param_setup`
        /// rather than being used directly.
        const META = 1 << 0;
        /// Part has no SFDP table; resolver relies on ID match alone.
        const NO_SFDP = 1 << 1;
        /// Part supports 4 KiB sector erase.
        const SECT_4K = 1 << 2;
        /// Part supports 32 KiB block erase.
        const SECT_32K = 1 << 3;
        /// Part supports 64 KiB block erase.
        const SECT_64K = 1 << 4;
        /// Part supports 256 KiB block erase.
        const SECT_256K = 1 << 5;
        /// Status register writes are volatile (cleared on power cycle).
        const SR_VOLATILE = 1 << 6;
        /// Status register writes are non-volatile (persist across power cycle).
        const SR_NONVOLATILE = 1 << 7;
        /// Volatile status register writes use the legacy 50h (EWSR) unlock.
        const SR_VOLATILE_WREN_50H = 1 << 8;
        /// Part supports a factory-programmed unique ID.
        const UNIQUE_ID = 1 << 9;
        /// Part has a complete set of DPI opcodes for both read and program.
        const FULL_DPI_OPCODES = 1 << 10;
        /// Part has a complete set of QPI opcodes for both read and program.
        const FULL_QPI_OPCODES = 1 << 11;
        /// SFDP reports 4-byte addressing mode directly.
        const SFDP_4B_MODE = 1 << 12;
        /// Part supports a single global block-unlock opcode (98h).
        const GLOBAL_BLOCK_UNLOCK = 1 << 13;
        /// Part uses the legacy AAI word-program state machine instead of
        /// page program.
        const AAI_WORD_PROGRAM = 1 << 14;
        /// Part accepts writes/erases without a preceding WREN.
        const NO_WREN = 1 << 15;
        /// Catalog entry exists only to be rejected (used for known-bad IDs).
        const NO_OP = 1 << 16;
        /// Program opcode drives data on 2 lines, address on 1 (1-1-2 program).
        const PP_DUAL_INPUT = 1 << 17;
    }
}

bitflags! {
    /// Bitset describing which 4-byte-addressing strategies a part
    /// advertises as usable (a part may support more than one; the
    /// negotiator walks them in the §4.5 priority order).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct A4bFlags: u16 {
        /// Part is always addressed with 4 bytes, no mode switch exists.
        const ALWAYS_4B = 1 << 0;
        /// Part has dedicated opcodes for 4-byte addressing.
        const DEDICATED_4B_OPCODES = 1 << 1;
        /// Part supports the B7h/E9h enter/exit pair.
        const B7H_E9H = 1 << 2;
        /// Part requires WREN before B7h/E9h.
        const WREN_REQUIRED = 1 << 3;
        /// Part uses a bank/extended-address register instead of a sticky mode.
        const BANK_REGISTER = 1 << 4;
        /// Part uses a non-volatile configuration register bit.
        const NVCR_BIT = 1 << 5;
    }
}

bitflags! {
    /// Bitset of soft-reset sequences a part supports. Precedence when more
    /// than one bit is set: `RSTEN_RST` > `F0H` > `DRIVE_4IO_FH`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SoftResetFlags: u8 {
        /// RSTEN(66h) then RST(99h).
        const RSTEN_RST = 1 << 0;
        /// Legacy single-opcode reset, F0h.
        const F0H = 1 << 1;
        /// Drive all I/O lines high for N clocks with CS deasserted.
        const DRIVE_4IO_FH = 1 << 2;
    }
}

/// Number of clocks to drive high for `DRIVE_4IO_FH`, chosen per the
/// part's current addressing mode (4B-aware parts need the longer count).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drive4ioClocks {
    /// 8 clocks (3B-addressing parts).
    Eight,
    /// 8 or 10 clocks depending on current 4B-mode state.
    EightOrTen,
    /// 16 clocks (some quad-capable parts).
    Sixteen,
}

impl Drive4ioClocks {
    /// Clock count to drive, given whether 4-byte addressing mode is
    /// currently active.
    pub const fn clocks(self, a4b_mode_active: bool) -> u32 {
        match self {
            Self::Eight => 8,
            Self::EightOrTen => {
                if a4b_mode_active {
                    10
                } else {
                    8
                }
            }
            Self::Sixteen => 16,
        }
    }
}
