//! `IoMode` — the closed set of command/address/data bus-width shapes a
//! transfer can take, plus the per-mode opcode/timing descriptor it resolves
//! to on a given part.

use bitflags::bitflags;

/// One complete SPI transfer shape: how many lines the command, address and
/// data phases each use.
///
/// `negotiate` iterates the set a part advertises widest-first when picking
/// a read/program opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum IoMode {
    /// 1-1-1: standard single-line SPI.
    Single,
    /// 1-1-2: command on 1 line, address on 1 line, data on 2 lines.
    DualOutput,
    /// 1-2-2: command on 1 line, address and data on 2 lines.
    DualIo,
    /// 2-2-2: command, address and data all on 2 lines.
    DualAll,
    /// 1-1-4: command and address on 1 line, data on 4 lines.
    QuadOutput,
    /// 1-4-4: command on 1 line, address and data on 4 lines.
    QuadIo,
    /// 4-4-4: command, address and data all on 4 lines (QPI mode).
    QuadAll,
    /// 1-1-8: command and address on 1 line, data on 8 lines.
    OctalOutput,
    /// 1-8-8: command on 1 line, address and data on 8 lines.
    OctalIo,
    /// 8-8-8: command, address and data all on 8 lines (OPI mode).
    OctalAll,
}

impl IoMode {
    /// Number of lines used for the command phase.
    pub const fn cmd_bw(self) -> u8 {
        match self {
            Self::Single | Self::DualOutput | Self::DualIo => 1,
            Self::DualAll => 2,
            Self::QuadOutput | Self::QuadIo => 1,
            Self::QuadAll => 4,
            Self::OctalOutput | Self::OctalIo => 1,
            Self::OctalAll => 8,
        }
    }

    /// Number of lines used for the address phase.
    pub const fn addr_bw(self) -> u8 {
        match self {
            Self::Single | Self::DualOutput => 1,
            Self::DualIo | Self::DualAll => 2,
            Self::QuadOutput => 1,
            Self::QuadIo | Self::QuadAll => 4,
            Self::OctalOutput => 1,
            Self::OctalIo | Self::OctalAll => 8,
        }
    }

    /// Number of lines used for the data phase.
    pub const fn data_bw(self) -> u8 {
        match self {
            Self::Single => 1,
            Self::DualOutput | Self::DualIo | Self::DualAll => 2,
            Self::QuadOutput | Self::QuadIo | Self::QuadAll => 4,
            Self::OctalOutput | Self::OctalIo | Self::OctalAll => 8,
        }
    }

    /// True if this mode drives the address on more than one line.
    pub const fn is_multi_io(self) -> bool {
        self.addr_bw() > 1
    }

    /// True if every phase uses the same bus width (the part is in a
    /// sticky QPI/DPI/OPI mode rather than a per-command multi-IO shape).
    pub const fn is_uniform(self) -> bool {
        self.cmd_bw() == self.addr_bw() && self.addr_bw() == self.data_bw()
    }
}

bitflags! {
    /// Bitset of `IoMode`s a part (or negotiated session) supports, used for
    /// `read_io_caps`/`pp_io_caps` and intersected with the caller's
    /// `set_allowed_io_caps` mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IoCaps: u16 {
        const SINGLE       = 1 << 0;
        const DUAL_OUTPUT  = 1 << 1;
        const DUAL_IO      = 1 << 2;
        const DUAL_ALL     = 1 << 3;
        const QUAD_OUTPUT  = 1 << 4;
        const QUAD_IO      = 1 << 5;
        const QUAD_ALL     = 1 << 6;
        const OCTAL_OUTPUT = 1 << 7;
        const OCTAL_IO     = 1 << 8;
        const OCTAL_ALL    = 1 << 9;
    }
}

impl IoCaps {
    /// The single bit corresponding to one `IoMode`.
    pub const fn of(mode: IoMode) -> Self {
        match mode {
            IoMode::Single => Self::SINGLE,
            IoMode::DualOutput => Self::DUAL_OUTPUT,
            IoMode::DualIo => Self::DUAL_IO,
            IoMode::DualAll => Self::DUAL_ALL,
            IoMode::QuadOutput => Self::QUAD_OUTPUT,
            IoMode::QuadIo => Self::QUAD_IO,
            IoMode::QuadAll => Self::QUAD_ALL,
            IoMode::OctalOutput => Self::OCTAL_OUTPUT,
            IoMode::OctalIo => Self::OCTAL_IO,
            IoMode::OctalAll => Self::OCTAL_ALL,
        }
    }

    /// All modes set in this bitset, ordered widest-to-narrowest.
    pub fn widest_first(self) -> impl Iterator<Item = IoMode> {
        const ORDER: [IoMode; 10] = [
            IoMode::OctalAll,
            IoMode::OctalIo,
            IoMode::OctalOutput,
            IoMode::QuadAll,
            IoMode::QuadIo,
            IoMode::QuadOutput,
            IoMode::DualAll,
            IoMode::DualIo,
            IoMode::DualOutput,
            IoMode::Single,
        ];
        ORDER.into_iter().filter(move |m| self.contains(Self::of(*m)))
    }
}

/// Opcode and timing parameters for one `IoMode` on a given part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoOpcode {
    /// The command byte issued for this mode.
    pub opcode: u8,
    /// Dummy cycles inserted between address and data phases.
    pub dummy_cycles: u8,
    /// Mode-bit cycles (continuous-read mode byte), if the opcode uses one.
    pub mode_cycles: u8,
}

impl IoOpcode {
    /// Construct with zero dummy/mode cycles (standard `READ`-style opcode).
    pub const fn simple(opcode: u8) -> Self {
        Self { opcode, dummy_cycles: 0, mode_cycles: 0 }
    }

    /// Construct with a fixed dummy-cycle count and no mode cycles.
    pub const fn with_dummy(opcode: u8, dummy_cycles: u8) -> Self {
        Self { opcode, dummy_cycles, mode_cycles: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_widths_match_mode_name() {
        assert_eq!((IoMode::QuadIo.cmd_bw(), IoMode::QuadIo.addr_bw(), IoMode::QuadIo.data_bw()), (1, 4, 4));
        assert_eq!((IoMode::DualOutput.cmd_bw(), IoMode::DualOutput.addr_bw(), IoMode::DualOutput.data_bw()), (1, 1, 2));
        assert_eq!((IoMode::QuadAll.cmd_bw(), IoMode::QuadAll.addr_bw(), IoMode::QuadAll.data_bw()), (4, 4, 4));
    }

    #[test]
    fn widest_first_respects_caps_mask() {
        let caps = IoCaps::SINGLE | IoCaps::QUAD_IO;
        let order: heapless::Vec<IoMode, 10> = caps.widest_first().collect();
        assert_eq!(order.as_slice(), &[IoMode::QuadIo, IoMode::Single]);
    }
}
