//! OTP (one-time-programmable) region access (§4.6), dispatched across the
//! families an `OtpLayout` may declare. Every entry point validates `index`
//! against the layout before issuing a single Transport call.

use crate::error::{Error, Result};
use crate::part::{OtpFamily, OtpLayout};
use crate::resolved::ResolvedFlash;
use crate::spi::{opcodes, AddrPhase, CmdPhase, DataPhase, DummyPhase, Op, PhaseWidth};
use crate::transport::Transport;

use super::wait::wait_ready;

#[maybe_async::maybe_async]
async fn write_enable(transport: &mut dyn Transport) -> Result<()> {
    let mut op = Op::simple(opcodes::WREN);
    transport.exec_op(&mut op).await.into_result()
}

#[maybe_async::maybe_async]
async fn enso(transport: &mut dyn Transport) -> Result<()> {
    let mut op = Op::simple(opcodes::ENSO);
    transport.exec_op(&mut op).await.into_result()
}

#[maybe_async::maybe_async]
async fn exso(transport: &mut dyn Transport) -> Result<()> {
    let mut op = Op::simple(opcodes::EXSO);
    transport.exec_op(&mut op).await.into_result()
}

fn layout_of(resolved: &ResolvedFlash) -> Result<&OtpLayout> {
    resolved.otp.as_ref().ok_or(Error::Unsupported)
}

/// Address for one OTP access, honoring the part's `ops.otp_addr` override
/// (high-bank-latch parts that additionally write an extended-address
/// register above 16 MiB) before falling back to each family's default
/// mapping.
fn region_address(resolved: &ResolvedFlash, layout: &OtpLayout, index: u32, addr: u32) -> u32 {
    if let Some(hook) = resolved.part.ops.and_then(|o| o.otp_addr) {
        return hook(resolved, index, addr);
    }
    match layout.family {
        OtpFamily::Secr | OtpFamily::Eon1 | OtpFamily::Eon2 | OtpFamily::Eon3 | OtpFamily::Eon4 => layout.secr_address(index, addr),
        OtpFamily::Paged => (index - layout.start_index) * layout.size + addr,
        OtpFamily::Scur | OtpFamily::AtmelRaw => addr,
    }
}

#[maybe_async::maybe_async]
async fn read_linear(transport: &mut dyn Transport, opcode: u8, addr: u32, dummy_bytes: u8, buf: &mut [u8]) -> Result<()> {
    let w = PhaseWidth::SDR_1;
    let mut op = Op {
        cmd: CmdPhase { len: 1, width: w, opcode },
        addr: AddrPhase { len: 3, width: w, val: addr },
        dummy: DummyPhase { len: dummy_bytes, width: w },
        data: DataPhase::read(buf, w),
    };
    transport.exec_op(&mut op).await.into_result()
}

#[maybe_async::maybe_async]
async fn write_linear(transport: &mut dyn Transport, opcode: u8, addr: u32, data: &[u8]) -> Result<()> {
    let w = PhaseWidth::SDR_1;
    let mut op = Op {
        cmd: CmdPhase { len: 1, width: w, opcode },
        addr: AddrPhase { len: 3, width: w, val: addr },
        dummy: DummyPhase::default(),
        data: DataPhase::write(data, w),
    };
    transport.exec_op(&mut op).await.into_result()
}

fn validate(layout: &OtpLayout, index: u32, addr: u32, len: usize) -> Result<()> {
    if !layout.contains_index(index) {
        return Err(Error::InvalidParameter);
    }
    if addr as u64 + len as u64 > layout.size as u64 {
        return Err(Error::InvalidParameter);
    }
    Ok(())
}

/// Read `buf.len()` bytes from OTP region `index` at offset `addr`.
#[maybe_async::maybe_async]
pub async fn read_otp(transport: &mut dyn Transport, resolved: &ResolvedFlash, index: u32, addr: u32, buf: &mut [u8]) -> Result<()> {
    let layout = layout_of(resolved)?;
    validate(layout, index, addr, buf.len())?;

    match layout.family {
        OtpFamily::Scur => {
            enso(transport).await?;
            let result = read_linear(transport, opcodes::READ_OTP, addr, 1, buf).await;
            exso(transport).await?;
            result
        }
        // 77h wants a 2-dummy-byte gap between the 3-byte address and the
        // data phase, unlike the 1-byte gap every other OTP family uses.
        OtpFamily::AtmelRaw => read_linear(transport, opcodes::ATMEL_READ_OTP, addr, 2, buf).await,
        _ => {
            let a = region_address(resolved, layout, index, addr);
            read_linear(transport, opcodes::READ_OTP, a, 1, buf).await
        }
    }
}

/// Program `data` into OTP region `index` at offset `addr`. Paged layouts
/// split the write on 256-byte page boundaries regardless of region size.
#[maybe_async::maybe_async]
pub async fn program_otp(transport: &mut dyn Transport, resolved: &ResolvedFlash, index: u32, addr: u32, data: &[u8]) -> Result<()> {
    let layout = layout_of(resolved)?;
    validate(layout, index, addr, data.len())?;

    match layout.family {
        OtpFamily::Scur => {
            enso(transport).await?;
            write_enable(transport).await?;
            let result = write_linear(transport, opcodes::PROGRAM_OTP, addr, data).await;
            let _ = wait_ready(transport, 100).await;
            exso(transport).await?;
            result
        }
        OtpFamily::AtmelRaw => {
            write_enable(transport).await?;
            write_linear(transport, opcodes::ATMEL_PROGRAM_OTP, addr, data).await?;
            wait_ready(transport, 100).await
        }
        OtpFamily::Paged => {
            const PAGE: u32 = 256;
            let mut offset = 0usize;
            while offset < data.len() {
                let within = addr + offset as u32;
                let page_off = within % PAGE;
                let chunk = ((PAGE - page_off) as usize).min(data.len() - offset);
                let a = region_address(resolved, layout, index, within);
                write_enable(transport).await?;
                write_linear(transport, opcodes::PROGRAM_OTP, a, &data[offset..offset + chunk]).await?;
                wait_ready(transport, 100).await?;
                offset += chunk;
            }
            Ok(())
        }
        _ => {
            let a = region_address(resolved, layout, index, addr);
            write_enable(transport).await?;
            write_linear(transport, opcodes::PROGRAM_OTP, a, data).await?;
            wait_ready(transport, 100).await
        }
    }
}

/// Erase OTP region `index` (SECR/EON-style parts only; `Scur`, `Paged` and
/// `AtmelRaw` layouts have no generic erase step and reject the call).
#[maybe_async::maybe_async]
pub async fn erase_otp(transport: &mut dyn Transport, resolved: &ResolvedFlash, index: u32) -> Result<()> {
    let layout = layout_of(resolved)?;
    if !layout.contains_index(index) {
        return Err(Error::InvalidParameter);
    }
    match layout.family {
        OtpFamily::Secr | OtpFamily::Eon1 | OtpFamily::Eon2 | OtpFamily::Eon3 | OtpFamily::Eon4 => {
            let a = region_address(resolved, layout, index, 0);
            write_enable(transport).await?;
            let w = PhaseWidth::SDR_1;
            let mut op = Op {
                cmd: CmdPhase { len: 1, width: w, opcode: opcodes::ERASE_OTP },
                addr: AddrPhase { len: 3, width: w, val: a },
                dummy: DummyPhase::default(),
                data: DataPhase::none(),
            };
            transport.exec_op(&mut op).await.into_result()?;
            wait_ready(transport, 3_000).await
        }
        _ => Err(Error::Unsupported),
    }
}

/// Lock-bit `(byte offset, bit index)` for OTP region `index`, via
/// `ops.otp_lock_bit` if the part declares a vendor override, else
/// `(0, index - start_index)` for the common case of one lock bit per
/// region packed into a single register byte.
pub fn lock_bit_position(resolved: &ResolvedFlash, layout: &OtpLayout, index: u32) -> (u8, u8) {
    if let Some(hook) = resolved.part.ops.and_then(|o| o.otp_lock_bit) {
        return hook(index);
    }
    (0, (index - layout.start_index) as u8)
}

/// Read back whether OTP region `index` is locked, via the SECR-family
/// `RDSCUR` register and the region's lock-bit position.
#[maybe_async::maybe_async]
pub async fn otp_locked(transport: &mut dyn Transport, resolved: &ResolvedFlash, index: u32) -> Result<bool> {
    let layout = layout_of(resolved)?;
    if !layout.contains_index(index) {
        return Err(Error::InvalidParameter);
    }
    let (_, bit) = lock_bit_position(resolved, layout, index);
    let mut buf = [0u8; 1];
    let mut op = Op::read_reg(opcodes::RDSCUR, &mut buf);
    transport.exec_op(&mut op).await.into_result()?;
    Ok(buf[0] & (1 << bit) != 0)
}

/// Permanently lock OTP region `index` by setting its lock bit in `RDSCUR`/
/// `WRSCUR` (SECR-style parts; other families have no generic lock register
/// and reject the call).
#[maybe_async::maybe_async]
pub async fn lock_otp(transport: &mut dyn Transport, resolved: &ResolvedFlash, index: u32) -> Result<()> {
    let layout = layout_of(resolved)?;
    if !layout.contains_index(index) {
        return Err(Error::InvalidParameter);
    }
    match layout.family {
        OtpFamily::Secr | OtpFamily::Eon1 | OtpFamily::Eon2 | OtpFamily::Eon3 | OtpFamily::Eon4 => {
            let (_, bit) = lock_bit_position(resolved, layout, index);
            let mut buf = [0u8; 1];
            let mut read = Op::read_reg(opcodes::RDSCUR, &mut buf);
            transport.exec_op(&mut read).await.into_result()?;
            write_enable(transport).await?;
            let value = buf[0] | (1 << bit);
            let mut write = Op::write_reg(opcodes::WRSCUR, &[value]);
            transport.exec_op(&mut write).await.into_result()?;
            wait_ready(transport, 100).await
        }
        _ => Err(Error::Unsupported),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::{PartBuilder, PartId};
    use crate::resolved::{EraseState, Geometry, Identity, IoState, ResolvedFlash, Speeds, VolatileState};
    use crate::spi::IoMode;

    const PART: crate::part::Part = PartBuilder::new("TEST25Q", PartId::exact(&[0xEF, 0x40, 0x18]), 16 * 1024 * 1024).build();

    fn resolved_with(otp: Option<OtpLayout>) -> ResolvedFlash {
        ResolvedFlash {
            part: &PART,
            identity: Identity { vendor_name: "Test", model_name: "TEST25Q", id_bytes: heapless::Vec::new() },
            geometry: Geometry { size: 16 * 1024 * 1024, ndies: 1, page_size: 256, naddr_current: 3, naddr_native: 3 },
            speeds: Speeds::default(),
            io: IoState {
                read_opcode: 0x03,
                read_io_info: crate::spi::IoOpcode::simple(0x03),
                read_mode: IoMode::Single,
                read_ndummy_bytes: 0,
                pp_opcode: 0x02,
                pp_io_info: crate::spi::IoOpcode::simple(0x02),
                pp_mode: IoMode::Single,
                cmd_buswidth_steady_state: 1,
                cmd_buswidth_current: 1,
                curr_high_addr_byte: 0,
                a4b_mode_active: false,
                qe_set: false,
            },
            erase: EraseState { regions: alloc::vec![], sector_info: [crate::part::EraseSector::new(0, 0, 0); crate::part::MAX_ERASE_SECTORS] },
            otp,
            wp: None,
            sfdp: None,
            state: VolatileState::default(),
        }
    }

    #[test]
    fn layout_of_rejects_parts_with_no_otp() {
        let resolved = resolved_with(None);
        assert_eq!(layout_of(&resolved).unwrap_err(), Error::Unsupported);
    }

    #[test]
    fn validate_rejects_index_outside_layout() {
        let layout = OtpLayout::new(1, 3, 256, OtpFamily::Secr);
        assert!(validate(&layout, 0, 0, 1).is_err());
        assert!(validate(&layout, 4, 0, 1).is_err());
        assert!(validate(&layout, 2, 0, 1).is_ok());
    }

    #[test]
    fn validate_rejects_access_past_region_size() {
        let layout = OtpLayout::new(0, 1, 128, OtpFamily::Secr);
        assert!(validate(&layout, 0, 120, 16).is_err());
        assert!(validate(&layout, 0, 120, 8).is_ok());
    }

    #[test]
    fn region_address_secr_packs_index_into_high_bits() {
        let resolved = resolved_with(None);
        let layout = OtpLayout::new(0, 4, 256, OtpFamily::Secr);
        assert_eq!(region_address(&resolved, &layout, 2, 0x10), (2 << 12) | 0x10);
    }

    #[test]
    fn region_address_paged_is_flat_offset_from_start_index() {
        let resolved = resolved_with(None);
        let layout = OtpLayout::new(5, 4, 256, OtpFamily::Paged);
        assert_eq!(region_address(&resolved, &layout, 6, 10), 256 + 10);
    }

    #[test]
    fn region_address_scur_and_atmel_are_flat_addresses() {
        let resolved = resolved_with(None);
        let scur = OtpLayout::new(0, 1, 256, OtpFamily::Scur);
        assert_eq!(region_address(&resolved, &scur, 0, 42), 42);
        let atmel = OtpLayout::new(0, 1, 128, OtpFamily::AtmelRaw);
        assert_eq!(region_address(&resolved, &atmel, 0, 7), 7);
    }

    #[test]
    fn lock_bit_position_defaults_to_index_minus_start() {
        let resolved = resolved_with(None);
        let layout = OtpLayout::new(3, 4, 256, OtpFamily::Secr);
        assert_eq!(lock_bit_position(&resolved, &layout, 5), (0, 2));
    }
}
