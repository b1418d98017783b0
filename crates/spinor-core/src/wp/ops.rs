//! Write-protect register read/write/verify cycle: read the selector bits
//! through a part's `RegisterAccess`, look up the matching `WpRange`,
//! decode it to a protected extent, and (for writes) find a row whose
//! extent matches the caller's request and commit its bits with
//! read-back verification.

use crate::error::Error;
use crate::spi::opcodes;
use crate::spi::Op;
use crate::transport::Transport;

use super::ranges::{decode, ProtectedExtent};
use super::types::{RegisterAccess, RegisterAccessFlags, RegisterAccessKind, WpInfo, WpMode};

/// Errors specific to write-protect operations, distinct from the crate's
/// bit-stable `Error` taxonomy so callers can tell "no WP support on this
/// part" apart from "the write went through but didn't stick".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WpError {
    /// The part has no `WpInfo` declared.
    ChipUnsupported,
    /// Reading the selector register(s) failed.
    ReadFailed,
    /// Writing the selector register(s) failed.
    WriteFailed,
    /// The register read back did not match what was written.
    VerifyFailed,
    /// No table row decodes to the requested extent.
    RangeUnsupported,
    /// The requested `WpMode` cannot be set programmatically
    /// (`PowerCycle`/`Permanent` require a power cycle or are OTP).
    ModeUnsupported,
    /// Underlying transport/bus error.
    SpiError(Error),
}

impl From<Error> for WpError {
    fn from(e: Error) -> Self {
        WpError::SpiError(e)
    }
}

impl core::fmt::Display for WpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s: &dyn core::fmt::Display = match self {
            WpError::ChipUnsupported => &"chip does not support write protection",
            WpError::ReadFailed => &"failed to read status registers",
            WpError::WriteFailed => &"failed to write status registers",
            WpError::VerifyFailed => &"verify failed: written value did not match",
            WpError::RangeUnsupported => &"requested range is not supported by this part",
            WpError::ModeUnsupported => &"requested mode is not supported",
            WpError::SpiError(e) => return write!(f, "SPI error: {}", e),
        };
        core::fmt::Display::fmt(s, f)
    }
}

/// Result type for write-protect operations.
pub type WpResult<T> = core::result::Result<T, WpError>;

/// Read the concatenated register value (1 or 2 bytes per `access.kind`)
/// that carries the write-protect selector bits.
#[maybe_async::maybe_async]
pub async fn read_register(transport: &mut dyn Transport, access: &RegisterAccess) -> WpResult<u32> {
    let mut buf = [0u8; 2];
    let n = access.data_bytes as usize;
    let mut op = match access.kind {
        RegisterAccessKind::Normal | RegisterAccessKind::Multi => Op::read_reg(access.opcode_read, &mut buf[..n]),
        RegisterAccessKind::Addressed => {
            let mut op = Op::read_reg(access.opcode_read, &mut buf[..n]);
            op.addr = crate::spi::AddrPhase::new(crate::spi::AddressWidth::ThreeByte, access.address);
            op
        }
    };
    let status = transport.exec_op(&mut op).await;
    status.into_result().map_err(|_| WpError::ReadFailed)?;
    let value = buf[..n].iter().rev().fold(0u32, |acc, b| (acc << 8) | *b as u32);
    Ok(value)
}

/// Write the concatenated register value, preceded by WREN unless the
/// access is flagged volatile-write-only (which uses EWSR(50h) instead).
#[maybe_async::maybe_async]
pub async fn write_register(transport: &mut dyn Transport, access: &RegisterAccess, value: u32) -> WpResult<()> {
    let unlock_opcode = if access.flags.contains(RegisterAccessFlags::VOLATILE_WRITE_ONLY) {
        opcodes::EWSR
    } else {
        opcodes::WREN
    };
    let mut unlock = Op::simple(unlock_opcode);
    transport.exec_op(&mut unlock).await.into_result()?;

    let n = access.data_bytes as usize;
    let mut buf = [0u8; 2];
    for (i, b) in buf[..n].iter_mut().enumerate() {
        *b = (value >> (8 * i)) as u8;
    }
    let mut op = Op::write_reg(access.opcode_write, &buf[..n]);
    let status = transport.exec_op(&mut op).await;
    status.into_result().map_err(|_| WpError::WriteFailed)?;

    let readback = read_register(transport, access).await?;
    if readback & access.bp_mask != value & access.bp_mask {
        return Err(WpError::VerifyFailed);
    }
    Ok(())
}

/// Current hardware `WpMode`, derived from the SRP/SRL bit pair.
#[maybe_async::maybe_async]
pub async fn read_wp_mode(transport: &mut dyn Transport, access: &RegisterAccess) -> WpResult<WpMode> {
    let value = read_register(transport, access).await?;
    let srp = access.srp_bit.is_some_and(|(byte, bit)| bit_set(value, byte, bit));
    let srl = access.srl_bit.is_some_and(|(byte, bit)| bit_set(value, byte, bit));
    Ok(WpMode::from_bits(srl, srp))
}

fn bit_set(value: u32, byte: u8, bit: u8) -> bool {
    (value >> (8 * byte + bit)) & 1 != 0
}

/// Currently protected extent, found by reading the selector bits and
/// looking them up in `wp.ranges`.
#[maybe_async::maybe_async]
pub async fn read_protected_extent(
    transport: &mut dyn Transport,
    wp: &WpInfo,
    die_size: u64,
) -> WpResult<ProtectedExtent> {
    let value = read_register(transport, &wp.access).await?;
    let range = wp.lookup(value);
    Ok(decode(range, die_size))
}

/// Find the first table row that decodes to exactly `target` and commit
/// its bits, preserving every bit outside `access.bp_mask`.
#[maybe_async::maybe_async]
pub async fn set_protected_extent(
    transport: &mut dyn Transport,
    wp: &WpInfo,
    die_size: u64,
    target: ProtectedExtent,
) -> WpResult<()> {
    let row = wp
        .ranges
        .iter()
        .find(|r| decode(**r, die_size) == target)
        .ok_or(WpError::RangeUnsupported)?;

    let current = read_register(transport, &wp.access).await?;
    let merged = (current & !wp.access.bp_mask) | (row.mask_value & wp.access.bp_mask);
    write_register(transport, &wp.access, merged).await
}

/// Set the hardware lock mode. Only `Disabled` and `Hardware` are settable
/// without a power cycle or OTP fuse.
#[maybe_async::maybe_async]
pub async fn set_wp_mode(transport: &mut dyn Transport, access: &RegisterAccess, mode: WpMode) -> WpResult<()> {
    if matches!(mode, WpMode::PowerCycle | WpMode::Permanent) {
        return Err(WpError::ModeUnsupported);
    }
    let current = read_register(transport, access).await?;
    let mut value = current;
    if let Some((byte, bit)) = access.srp_bit {
        value = set_bit(value, byte, bit, matches!(mode, WpMode::Hardware));
    }
    if let Some((byte, bit)) = access.srl_bit {
        value = set_bit(value, byte, bit, false);
    }
    write_register(transport, access, value).await
}

fn set_bit(value: u32, byte: u8, bit: u8, set: bool) -> u32 {
    let mask = 1u32 << (8 * byte + bit);
    if set {
        value | mask
    } else {
        value & !mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wp::types::{WpRange, WpRangeKind};

    #[test]
    fn wp_mode_from_bits_truth_table() {
        assert_eq!(WpMode::from_bits(false, false), WpMode::Disabled);
        assert_eq!(WpMode::from_bits(false, true), WpMode::Hardware);
        assert_eq!(WpMode::from_bits(true, false), WpMode::PowerCycle);
        assert_eq!(WpMode::from_bits(true, true), WpMode::Permanent);
    }

    #[test]
    fn lookup_falls_back_to_none_on_miss() {
        let ranges: &[WpRange] = &[WpRange::new(WpRangeKind::BpUpper, 0, 0b0000_0100)];
        let wp = WpInfo { ranges, access: RegisterAccess::winbond_standard(opcodes::RDSR, opcodes::WRSR) };
        let row = wp.lookup(0b0111_1100);
        assert!(matches!(row.kind, WpRangeKind::None));
    }

    #[test]
    fn lookup_matches_declared_row() {
        let ranges: &[WpRange] = &[WpRange::new(WpRangeKind::BpUpper, 0, 0b0000_0100)];
        let wp = WpInfo { ranges, access: RegisterAccess::winbond_standard(opcodes::RDSR, opcodes::WRSR) };
        let row = wp.lookup(0b0000_0100);
        assert!(matches!(row.kind, WpRangeKind::BpUpper));
    }
}
