//! Bulk read (§4.6): issue the negotiated read opcode, looping over
//! `Transport::adjust_op_size` chunk boundaries until the whole request is
//! satisfied.

use crate::error::{Error, Result};
use crate::resolved::ResolvedFlash;
use crate::spi::{AddrPhase, AddressWidth, CmdPhase, DataPhase, DummyPhase, Op, PhaseWidth};
use crate::transport::Transport;

/// Read `buf.len()` bytes starting at `addr` using the negotiated read
/// opcode and bus width, chunked to whatever size `adjust_op_size` allows.
#[maybe_async::maybe_async]
pub async fn read(transport: &mut dyn Transport, resolved: &ResolvedFlash, addr: u64, mut buf: &mut [u8]) -> Result<()> {
    if addr + buf.len() as u64 > resolved.geometry.size {
        return Err(Error::FlashAddressOutOfRange);
    }
    let io = &resolved.io;
    let addr_width = if resolved.geometry.naddr_current == 4 { AddressWidth::FourByte } else { AddressWidth::ThreeByte };
    let cmd_width = PhaseWidth::sdr(io.read_mode.cmd_bw());
    let addr_bus_width = PhaseWidth::sdr(io.read_mode.addr_bw());
    let data_width = PhaseWidth::sdr(io.read_mode.data_bw());

    let mut cursor = addr as u32;
    while !buf.is_empty() {
        let mut op = Op {
            cmd: CmdPhase { len: 1, width: cmd_width, opcode: io.read_opcode },
            addr: AddrPhase { len: addr_width.bytes(), width: addr_bus_width, val: cursor },
            dummy: DummyPhase { len: io.read_ndummy_bytes, width: addr_bus_width },
            data: DataPhase::read(&mut *buf, data_width),
        };
        transport.adjust_op_size(&mut op);
        let sent = op.data.len.min(buf.len());
        transport.exec_op(&mut op).await.into_result()?;

        cursor += sent as u32;
        buf = &mut buf[sent..];
    }
    Ok(())
}
