//! SPI-level vocabulary: address widths, I/O modes, the wire-level `Op`
//! transaction shape, and standard JEDEC opcode constants.

mod address;
mod io_mode;
mod op;
pub mod opcodes;

pub use address::AddressWidth;
pub use io_mode::{IoCaps, IoMode, IoOpcode};
pub use op::{AddrPhase, CmdPhase, DataBuf, DataDir, DataPhase, DummyPhase, Op, PhaseWidth};
pub use opcodes::*;
