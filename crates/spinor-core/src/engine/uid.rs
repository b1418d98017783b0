//! Unique-ID read (§4.6): `RDUID` (4Bh) with a dummy phase, gated on
//! `PartFlags::UNIQUE_ID`.
//!
//! The SFDP-offset and SCUR-window UID families named alongside RDUID are
//! not modelled separately - no catalog part needs them and `OpsOverride`
//! has no uid hook yet, so a part that only exposes one of those reads
//! `Error::Unsupported` here until a concrete vendor needs it.

use crate::error::{Error, Result};
use crate::part::PartFlags;
use crate::resolved::ResolvedFlash;
use crate::spi::{opcodes, AddrPhase, CmdPhase, DataPhase, DummyPhase, Op, PhaseWidth};
use crate::transport::Transport;

/// Read the part's unique ID into `buf` (8 or 16 bytes, caller-sized).
#[maybe_async::maybe_async]
pub async fn read_unique_id(transport: &mut dyn Transport, resolved: &ResolvedFlash, buf: &mut [u8]) -> Result<()> {
    if !resolved.part.flags.contains(PartFlags::UNIQUE_ID) {
        return Err(Error::Unsupported);
    }
    let width = PhaseWidth::sdr(resolved.io.cmd_buswidth_current.max(1));
    let dummy_bytes = if resolved.io.a4b_mode_active { 5 } else { 4 };
    let mut op = Op {
        cmd: CmdPhase { len: 1, width, opcode: opcodes::RDUID },
        addr: AddrPhase::NONE,
        dummy: DummyPhase { len: dummy_bytes, width },
        data: DataPhase::read(buf, width),
    };
    transport.exec_op(&mut op).await.into_result()
}
