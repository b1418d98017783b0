//! Erase (§4.6): `erase_at` erases the single largest sector that fits at
//! one address within its region; `erase` rounds a caller's `(addr, len)`
//! to region boundaries and iterates `erase_at` to cover it.

use crate::error::{Error, Result};
use crate::part::{EraseRegion, EraseSector};
use crate::resolved::ResolvedFlash;
use crate::spi::{opcodes, AddrPhase, AddressWidth, CmdPhase, DataPhase, DummyPhase, Op, PhaseWidth};
use crate::transport::Transport;

use super::wait::wait_ready;

#[maybe_async::maybe_async]
async fn write_enable(transport: &mut dyn Transport) -> Result<()> {
    let mut op = Op::simple(opcodes::WREN);
    transport.exec_op(&mut op).await.into_result()
}

/// Locate the region containing `addr` and its base offset within the die.
fn region_at(resolved: &ResolvedFlash, addr: u64) -> Option<(u64, &EraseRegion)> {
    let mut base = 0u64;
    for region in resolved.erase.regions.iter() {
        if addr >= base && addr < base + region.size_bytes {
            return Some((base, region));
        }
        base += region.size_bytes;
    }
    None
}

/// Largest enabled sector in `region` whose size divides `offset_in_region`
/// and fits within `remaining` bytes (§4.6 step 3).
fn largest_fitting_sector(resolved: &ResolvedFlash, region: &EraseRegion, offset_in_region: u64, remaining: u64) -> Option<EraseSector> {
    (0..crate::part::MAX_ERASE_SECTORS)
        .filter(|&i| region.allows_sector(i))
        .map(|i| resolved.erase.sector_info[i])
        .filter(|s| s.size_bytes > 0 && (s.size_bytes as u64) <= remaining && offset_in_region % s.size_bytes as u64 == 0)
        .max_by_key(|s| s.size_bytes)
}

/// Erase the single largest sector that both starts at `addr` (aligned down
/// to the region's smallest granularity) and fits within `maxlen`,
/// returning the number of bytes actually erased (§4.6 "Erase at").
#[maybe_async::maybe_async]
pub async fn erase_at(transport: &mut dyn Transport, resolved: &ResolvedFlash, addr: u64, maxlen: u64) -> Result<u64> {
    if addr >= resolved.geometry.size {
        return Err(Error::FlashAddressOutOfRange);
    }
    let (region_base, region) = region_at(resolved, addr).ok_or(Error::Unsupported)?;
    let region_end = region_base + region.size_bytes;

    let erase_start = addr - (addr % region.min_erasesize as u64);
    let requested_end = (addr + maxlen) - ((addr + maxlen) % region.min_erasesize as u64);
    let erase_end = requested_end.min(region_end);
    if erase_end <= erase_start {
        return Ok(0);
    }

    let offset_in_region = erase_start - region_base;
    let remaining = erase_end - erase_start;
    let sector = largest_fitting_sector(resolved, region, offset_in_region, remaining).ok_or(Error::Unsupported)?;

    let four_byte = resolved.geometry.naddr_current == 4;
    let addr_width = if four_byte { AddressWidth::FourByte } else { AddressWidth::ThreeByte };
    let w = PhaseWidth::sdr(resolved.io.cmd_buswidth_current.max(1));

    write_enable(transport).await?;
    let mut op = Op {
        cmd: CmdPhase { len: 1, width: w, opcode: sector.opcode },
        addr: AddrPhase { len: addr_width.bytes(), width: w, val: erase_start as u32 },
        dummy: DummyPhase::default(),
        data: DataPhase::none(),
    };
    transport.exec_op(&mut op).await.into_result()?;
    wait_ready(transport, sector.max_time_ms).await?;

    Ok((sector.size_bytes as u64).min(remaining))
}

/// Erase the full `[addr, addr+len)` span, rounding to the containing
/// region's granularity and iterating `erase_at` (§4.6 "Erase (range)").
/// The start and end of the range can fall in different regions with
/// different `min_erasesize`s (e.g. a 4 KiB parameter region followed by a
/// 64 KiB bulk region), so each bound is rounded against the region it
/// actually falls in rather than both against the start region's.
/// Fails if any step erases zero bytes, which would otherwise loop forever.
#[maybe_async::maybe_async]
pub async fn erase(transport: &mut dyn Transport, resolved: &ResolvedFlash, addr: u64, len: u64) -> Result<()> {
    if len == 0 {
        return Ok(());
    }

    let (_, start_region) = region_at(resolved, addr).ok_or(Error::Unsupported)?;
    let mut cursor = addr - (addr % start_region.min_erasesize as u64);

    let raw_end = addr + len;
    let (_, end_region) = region_at(resolved, raw_end - 1).ok_or(Error::Unsupported)?;
    let end = {
        let rounded = raw_end - (raw_end % end_region.min_erasesize as u64);
        if rounded < raw_end { rounded + end_region.min_erasesize as u64 } else { rounded }
    };

    while cursor < end {
        let erased = erase_at(transport, resolved, cursor, end - cursor).await?;
        if erased == 0 {
            return Err(Error::Fail);
        }
        cursor += erased;
    }
    Ok(())
}

/// Erase the whole die with a single chip-erase opcode.
#[maybe_async::maybe_async]
pub async fn chip_erase(transport: &mut dyn Transport, resolved: &ResolvedFlash) -> Result<()> {
    let w = PhaseWidth::sdr(resolved.io.cmd_buswidth_current.max(1));
    write_enable(transport).await?;
    let mut op = Op { cmd: CmdPhase { len: 1, width: w, opcode: opcodes::CE_60 }, addr: AddrPhase::NONE, dummy: DummyPhase::default(), data: DataPhase::none() };
    transport.exec_op(&mut op).await.into_result()?;
    // No part-level "max chip erase time" field exists in the catalog;
    // chip erase can take minutes, so poll against a generous fixed bound
    // rather than the per-sector `max_time_ms` values.
    wait_ready(transport, 400_000).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::{EraseSector, PartBuilder, PartId};
    use crate::resolved::{EraseState, Geometry, Identity, IoState, ResolvedFlash, Speeds, VolatileState};
    use crate::spi::IoMode;

    const SECT_4K: EraseSector = EraseSector::new(0x20, 4 * 1024, 400);
    const SECT_32K: EraseSector = EraseSector::new(0x52, 32 * 1024, 1600);
    const SECT_64K: EraseSector = EraseSector::new(0xD8, 64 * 1024, 2000);

    const PART: crate::part::Part = PartBuilder::new("TEST25Q", PartId::exact(&[0xEF, 0x40, 0x18]), 16 * 1024 * 1024).build();

    // Two regions: a 4 KiB-only "parameter" region at the bottom, then a
    // uniform 4K/32K/64K region for the rest of the die - mirrors parts that
    // restrict small sectors to the first block.
    fn two_region_resolved() -> ResolvedFlash {
        let mut sector_info = [EraseSector::new(0, 0, 0); crate::part::MAX_ERASE_SECTORS];
        sector_info[0] = SECT_4K;
        sector_info[1] = SECT_32K;
        sector_info[2] = SECT_64K;
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
            erase: EraseState {
                regions: alloc::vec![
                    crate::part::EraseRegion::new(64 * 1024, 0b001, 4 * 1024, 4 * 1024),
                    crate::part::EraseRegion::new(16 * 1024 * 1024 - 64 * 1024, 0b111, 4 * 1024, 64 * 1024),
                ],
                sector_info,
            },
            otp: None,
            wp: None,
            sfdp: None,
            state: VolatileState::default(),
        }
    }

    #[test]
    fn region_at_finds_containing_region_and_base() {
        let resolved = two_region_resolved();
        let (base, region) = region_at(&resolved, 0).unwrap();
        assert_eq!(base, 0);
        assert_eq!(region.erasesizes_mask, 0b001);

        let (base, region) = region_at(&resolved, 64 * 1024 + 10).unwrap();
        assert_eq!(base, 64 * 1024);
        assert_eq!(region.erasesizes_mask, 0b111);
    }

    #[test]
    fn region_at_returns_none_past_the_die() {
        let resolved = two_region_resolved();
        assert!(region_at(&resolved, 16 * 1024 * 1024).is_none());
    }

    #[test]
    fn largest_fitting_sector_respects_region_mask() {
        let resolved = two_region_resolved();
        let (_, param_region) = region_at(&resolved, 0).unwrap();
        // Only the 4K sector is enabled in the parameter region, even though
        // 64 KiB would otherwise fit and divide the offset.
        let sector = largest_fitting_sector(&resolved, param_region, 0, 64 * 1024).unwrap();
        assert_eq!(sector.size_bytes, 4 * 1024);
    }

    #[test]
    fn largest_fitting_sector_picks_64k_when_aligned_and_enabled() {
        let resolved = two_region_resolved();
        let (_, bulk_region) = region_at(&resolved, 64 * 1024).unwrap();
        let sector = largest_fitting_sector(&resolved, bulk_region, 0, 64 * 1024).unwrap();
        assert_eq!(sector.size_bytes, 64 * 1024);
    }

    #[test]
    fn largest_fitting_sector_falls_back_when_misaligned() {
        let resolved = two_region_resolved();
        let (_, bulk_region) = region_at(&resolved, 64 * 1024).unwrap();
        // Offset of 32 KiB into the region divides 32K and 4K sectors but not 64K.
        let sector = largest_fitting_sector(&resolved, bulk_region, 32 * 1024, 64 * 1024).unwrap();
        assert_eq!(sector.size_bytes, 32 * 1024);
    }

    #[test]
    fn largest_fitting_sector_none_when_remaining_too_small() {
        let resolved = two_region_resolved();
        let (_, bulk_region) = region_at(&resolved, 64 * 1024).unwrap();
        assert!(largest_fitting_sector(&resolved, bulk_region, 0, 1024).is_none());
    }
}
