//! Page program (§4.6): the default page-program loop chunked to the
//! part's page size, plus the legacy AAI word-program state machine for
//! parts flagged `PartFlags::AAI_WORD_PROGRAM`.

use crate::error::{Error, Result};
use crate::part::PartFlags;
use crate::resolved::ResolvedFlash;
use crate::spi::{opcodes, AddrPhase, AddressWidth, CmdPhase, DataPhase, DummyPhase, Op, PhaseWidth};
use crate::transport::Transport;

use super::wait::wait_ready;

#[maybe_async::maybe_async]
async fn write_enable(transport: &mut dyn Transport) -> Result<()> {
    let mut op = Op::simple(opcodes::WREN);
    transport.exec_op(&mut op).await.into_result()
}

/// Program `data` starting at `addr`, dispatching to the AAI word-program
/// state machine for parts that need it.
#[maybe_async::maybe_async]
pub async fn write(transport: &mut dyn Transport, resolved: &ResolvedFlash, addr: u64, data: &[u8]) -> Result<()> {
    if addr + data.len() as u64 > resolved.geometry.size {
        return Err(Error::FlashAddressOutOfRange);
    }
    if resolved.part.flags.contains(PartFlags::AAI_WORD_PROGRAM) {
        write_aai(transport, resolved, addr, data).await
    } else {
        write_pages(transport, resolved, addr, data).await
    }
}

/// Program at most one page's worth of `data`, starting at `addr`, honoring
/// the page-boundary cap the same way `write` does for a single call
/// (`write_page` in the public surface).
#[maybe_async::maybe_async]
pub async fn write_page(transport: &mut dyn Transport, resolved: &ResolvedFlash, addr: u64, data: &[u8]) -> Result<usize> {
    let page_size = resolved.geometry.page_size.max(1);
    let page_remaining = page_size - (addr as u32 % page_size);
    let chunk_len = (data.len() as u32).min(page_remaining) as usize;
    program_one_chunk(transport, resolved, addr, &data[..chunk_len]).await?;
    Ok(chunk_len)
}

#[maybe_async::maybe_async]
async fn program_one_chunk(transport: &mut dyn Transport, resolved: &ResolvedFlash, addr: u64, chunk: &[u8]) -> Result<usize> {
    let io = &resolved.io;
    let addr_width = if resolved.geometry.naddr_current == 4 { AddressWidth::FourByte } else { AddressWidth::ThreeByte };
    let cmd_width = PhaseWidth::sdr(io.pp_mode.cmd_bw());
    let addr_bus_width = PhaseWidth::sdr(io.pp_mode.addr_bw());
    let data_width = PhaseWidth::sdr(io.pp_mode.data_bw());

    write_enable(transport).await?;
    let mut op = Op {
        cmd: CmdPhase { len: 1, width: cmd_width, opcode: io.pp_opcode },
        addr: AddrPhase { len: addr_width.bytes(), width: addr_bus_width, val: addr as u32 },
        dummy: DummyPhase::default(),
        data: DataPhase::write(chunk, data_width),
    };
    transport.adjust_op_size(&mut op);
    let sent = op.data.len.min(chunk.len());
    transport.exec_op(&mut op).await.into_result()?;
    wait_ready(transport, resolved.part.max_pp_time_us / 1000 + 1).await?;
    Ok(sent)
}

#[maybe_async::maybe_async]
async fn write_pages(transport: &mut dyn Transport, resolved: &ResolvedFlash, addr: u64, data: &[u8]) -> Result<()> {
    let page_size = resolved.geometry.page_size.max(1);
    let mut remaining = data;
    let mut cursor = addr;
    while !remaining.is_empty() {
        let page_offset = cursor as u32 % page_size;
        let want = (remaining.len() as u32).min(page_size - page_offset) as usize;
        let sent = program_one_chunk(transport, resolved, cursor, &remaining[..want]).await?;
        cursor += sent as u64;
        remaining = &remaining[sent..];
    }
    Ok(())
}

/// AAI (Auto Address Increment) word-program state machine, for legacy SST
/// parts whose page-program opcode only ever writes two bytes at a time and
/// auto-increments the address internally between writes (§4.6).
#[maybe_async::maybe_async]
async fn write_aai(transport: &mut dyn Transport, resolved: &ResolvedFlash, addr: u64, data: &[u8]) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    let max_wait_ms = resolved.part.max_pp_time_us / 1000 + 1;
    let w = PhaseWidth::SDR_1;
    let addr_width = AddressWidth::ThreeByte;
    let mut cursor = addr;
    let mut remaining = data;

    if cursor % 2 != 0 {
        write_enable(transport).await?;
        let mut op = Op {
            cmd: CmdPhase { len: 1, width: w, opcode: opcodes::PP },
            addr: AddrPhase { len: addr_width.bytes(), width: w, val: cursor as u32 },
            dummy: DummyPhase::default(),
            data: DataPhase::write(&remaining[..1], w),
        };
        transport.exec_op(&mut op).await.into_result()?;
        wait_ready(transport, max_wait_ms).await?;
        cursor += 1;
        remaining = &remaining[1..];
    }

    if remaining.len() >= 2 {
        write_enable(transport).await?;
        let mut first = true;
        while remaining.len() >= 2 {
            let mut op = if first {
                Op {
                    cmd: CmdPhase { len: 1, width: w, opcode: opcodes::AAI_WP },
                    addr: AddrPhase { len: addr_width.bytes(), width: w, val: cursor as u32 },
                    dummy: DummyPhase::default(),
                    data: DataPhase::write(&remaining[..2], w),
                }
            } else {
                Op {
                    cmd: CmdPhase { len: 1, width: w, opcode: opcodes::AAI_WP },
                    addr: AddrPhase::NONE,
                    dummy: DummyPhase::default(),
                    data: DataPhase::write(&remaining[..2], w),
                }
            };
            transport.exec_op(&mut op).await.into_result()?;
            wait_ready(transport, max_wait_ms).await?;
            cursor += 2;
            remaining = &remaining[2..];
            first = false;
        }
        let mut wrdi = Op::simple(opcodes::WRDI);
        transport.exec_op(&mut wrdi).await.into_result()?;
        wait_ready(transport, max_wait_ms).await?;
    }

    if remaining.len() == 1 {
        write_enable(transport).await?;
        let mut op = Op {
            cmd: CmdPhase { len: 1, width: w, opcode: opcodes::PP },
            addr: AddrPhase { len: addr_width.bytes(), width: w, val: cursor as u32 },
            dummy: DummyPhase::default(),
            data: DataPhase::write(remaining, w),
        };
        transport.exec_op(&mut op).await.into_result()?;
        wait_ready(transport, max_wait_ms).await?;
    }

    Ok(())
}
