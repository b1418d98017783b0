//! The public [`Flash`] handle (§6): the single entry point callers attach
//! a [`Transport`] to, identify and negotiate against a catalog part, and
//! drive through read/program/erase/OTP/write-protect/unique-ID/reset
//! operations.
//!
//! Every public entry point here acquires the Transport's bus lock before
//! its first call and releases it on every exit path (§4.6, §5), mirroring
//! the teacher's own `SpiMaster: &mut M` single-owner borrow discipline -
//! `Flash` owns the transport outright rather than sharing it, so the lock
//! exists for the Transport's own reentrancy bookkeeping, not for
//! cross-thread exclusion.

use crate::catalog;
use crate::engine::{erase, otp, program, read, reset, uid};
use crate::error::{Error, Result};
use crate::negotiate;
use crate::part::{erase_info_for, Part};
use crate::resolved::{EraseState, Geometry, Identity, IoState, ResolvedFlash, Speeds, VolatileState};
use crate::resolver;
use crate::sfdp::SfdpInfo;
use crate::spi::{opcodes, IoCaps, Op};
use crate::transport::Transport;
use crate::wp::{self, ProtectedExtent, WpMode};

/// Summary view of an initialized part (§6 `info(f) -> FlashInfo`).
#[derive(Debug, Clone)]
pub struct FlashInfo {
    /// Vendor display name.
    pub vendor: &'static str,
    /// Model name.
    pub model: &'static str,
    /// Total die size in bytes.
    pub size: u64,
    /// Page-program granularity in bytes.
    pub page_size: u32,
    /// Number of stacked dies.
    pub ndies: u32,
    /// True if this part has an OTP region.
    pub has_otp: bool,
    /// True if this part has a write-protect range table.
    pub has_wp: bool,
    /// True if SFDP was present and parsed cleanly.
    pub has_sfdp: bool,
}

/// Build a fresh, negotiated-but-unfilled `ResolvedFlash` for a known part,
/// the same shape `resolver::blank_resolved` uses internally, generalized
/// to accept the caller's probe results directly (§3 lifecycle:
/// `probe_init`/`part_init` are the only constructors).
fn build_resolved(part: &'static Part, identity: Identity, sfdp: Option<SfdpInfo>) -> ResolvedFlash {
    let four_byte_native = part.size > 16 * 1024 * 1024;
    let erase = erase_info_for(part, four_byte_native);
    let erase_state = match erase {
        Some(info) => EraseState { regions: info.regions.clone(), sector_info: info.sector_info },
        None => EraseState { regions: alloc::vec::Vec::new(), sector_info: [crate::part::EraseSector::new(0, 0, 0); crate::part::MAX_ERASE_SECTORS] },
    };

    ResolvedFlash {
        part,
        identity,
        geometry: Geometry {
            size: part.size,
            ndies: part.ndies,
            page_size: part.page_size,
            naddr_current: if four_byte_native { 4 } else { 3 },
            naddr_native: if four_byte_native { 4 } else { 3 },
        },
        speeds: Speeds::default(),
        io: IoState {
            read_opcode: opcodes::READ,
            read_io_info: crate::spi::IoOpcode::simple(opcodes::READ),
            read_mode: crate::spi::IoMode::Single,
            read_ndummy_bytes: 0,
            pp_opcode: opcodes::PP,
            pp_io_info: crate::spi::IoOpcode::simple(opcodes::PP),
            pp_mode: crate::spi::IoMode::Single,
            cmd_buswidth_steady_state: 1,
            cmd_buswidth_current: 1,
            curr_high_addr_byte: 0,
            a4b_mode_active: four_byte_native && part.a4b_flags.contains(crate::part::A4bFlags::ALWAYS_4B),
            qe_set: false,
        },
        erase: erase_state,
        otp: part.otp,
        wp: part.wp_ranges,
        sfdp,
        state: VolatileState::default(),
    }
}

/// Push the part's speed ceiling for the negotiated read mode to the
/// Transport, capped by any caller-set `speed_limit_hz` (§4.6 step 2,
/// "set high speed").
#[maybe_async::maybe_async]
async fn apply_negotiated_speed(transport: &mut dyn Transport, resolved: &mut ResolvedFlash, speed_limit_hz: Option<u32>) {
    let mhz = if resolved.io.read_mode.data_bw() >= 4 {
        resolved.part.max_speed_quad_mhz
    } else if resolved.io.read_mode.data_bw() == 2 {
        resolved.part.max_speed_dual_mhz
    } else {
        resolved.part.max_speed_spi_mhz
    };
    let mut hz = mhz.saturating_mul(1_000_000);
    if hz == 0 {
        hz = 1_000_000;
    }
    if let Some(limit) = speed_limit_hz {
        hz = hz.min(limit);
    }
    if matches!(transport.set_speed(hz).await, crate::transport::Status::Ok) {
        resolved.speeds.part_max_hz = mhz.saturating_mul(1_000_000);
        resolved.speeds.max_high_hz = hz;
        resolved.speeds.curr_high_hz = hz;
    }
}

/// A probed-and-negotiated flash handle (§6). Owns the attached
/// [`Transport`]; `None` until [`Flash::attach`] and not yet initialized
/// until [`Flash::probe_init`] or [`Flash::part_init`] succeeds.
pub struct Flash<T: Transport> {
    transport: Option<T>,
    resolved: Option<ResolvedFlash>,
    allowed_io_caps: IoCaps,
    speed_limit_hz: Option<u32>,
}

impl<T: Transport> Default for Flash<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Flash<T> {
    /// Create an unattached handle (§6 `create`).
    pub fn new() -> Self {
        Self { transport: None, resolved: None, allowed_io_caps: IoCaps::all(), speed_limit_hz: None }
    }

    /// Attach a transport, returning whatever was previously attached (§6
    /// `attach`). Detaching invalidates any negotiated state.
    pub fn attach(&mut self, transport: T) -> Option<T> {
        self.resolved = None;
        self.transport.replace(transport)
    }

    /// Detach and return the transport, if any (§6 `detach`).
    pub fn detach(&mut self) -> Option<T> {
        self.resolved = None;
        self.transport.take()
    }

    /// True once a transport is attached.
    pub fn is_attached(&self) -> bool {
        self.transport.is_some()
    }

    /// True once `probe_init`/`part_init` has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.resolved.is_some()
    }

    /// Cap negotiation to a subset of the part's declared I/O capability
    /// (§6 `set_allowed_io_caps`). Takes effect on the next init call.
    pub fn set_allowed_io_caps(&mut self, mask: IoCaps) {
        self.allowed_io_caps = mask;
    }

    /// Cap the speed pushed to the Transport after negotiation (§6
    /// `set_speed_limit`). Takes effect on the next init call.
    pub fn set_speed_limit(&mut self, hz: u32) {
        self.speed_limit_hz = Some(hz);
    }

    /// Identify the attached part without negotiating I/O (§6 `probe`).
    #[maybe_async::maybe_async]
    pub async fn probe(&mut self) -> Result<Identity> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let outcome = resolver::resolve(transport).await?;
        Ok(outcome.identity)
    }

    /// Identify and fully initialize the attached part: probe, then
    /// negotiate I/O and push the negotiated speed (§6 `probe_init`).
    #[maybe_async::maybe_async]
    pub async fn probe_init(&mut self) -> Result<()> {
        let allowed = self.allowed_io_caps;
        let limit = self.speed_limit_hz;
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;

        let outcome = resolver::resolve(transport).await?;
        let mut resolved = build_resolved(outcome.part, outcome.identity, outcome.sfdp);
        negotiate::negotiate(transport, allowed, &mut resolved).await?;
        apply_negotiated_speed(transport, &mut resolved, limit).await;
        self.resolved = Some(resolved);
        Ok(())
    }

    /// Initialize against a named catalog part directly (§6 `part_init`).
    /// When `forced` is false, the JEDEC-ID probe still runs and a mismatch
    /// against the named part returns `FlashPartMismatch`; when `forced` is
    /// true, the probe ladder is skipped entirely and the named part is
    /// trusted without hardware verification.
    #[maybe_async::maybe_async]
    pub async fn part_init(&mut self, model: &str, forced: bool) -> Result<()> {
        let part = catalog::find_by_name(model).ok_or(Error::FlashPartNotSpecified)?;
        let allowed = self.allowed_io_caps;
        let limit = self.speed_limit_hz;
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;

        let (identity, sfdp) = if forced {
            let vendor_name = part.display_vendor.map(|v| v.name).unwrap_or("Unknown");
            (Identity { vendor_name, model_name: part.model, id_bytes: heapless::Vec::new() }, None)
        } else {
            let outcome = resolver::resolve(transport).await?;
            if !core::ptr::eq(outcome.part, part) {
                return Err(Error::FlashPartMismatch);
            }
            (outcome.identity, outcome.sfdp)
        };

        let mut resolved = build_resolved(part, identity, sfdp);
        negotiate::negotiate(transport, allowed, &mut resolved).await?;
        apply_negotiated_speed(transport, &mut resolved, limit).await;
        self.resolved = Some(resolved);
        Ok(())
    }

    /// Summary info about the initialized part (§6 `info`).
    pub fn info(&self) -> Result<FlashInfo> {
        let r = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        Ok(FlashInfo {
            vendor: r.identity.vendor_name,
            model: r.identity.model_name,
            size: r.geometry.size,
            page_size: r.geometry.page_size,
            ndies: r.geometry.ndies,
            has_otp: r.otp.is_some(),
            has_wp: r.wp.is_some(),
            has_sfdp: r.sfdp.is_some(),
        })
    }

    /// Borrow the full negotiated descriptor, for callers that need more
    /// than the [`FlashInfo`] summary (erase regions, SFDP table, ...).
    pub fn resolved(&self) -> Result<&ResolvedFlash> {
        self.resolved.as_ref().ok_or(Error::FlashNotProbed)
    }

    /// Read `buf.len()` bytes starting at `addr` (§6 `read`).
    #[maybe_async::maybe_async]
    pub async fn read(&mut self, addr: u64, buf: &mut [u8]) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        read::read(transport, resolved, addr, buf).await
    }

    /// Program `data` starting at `addr`, looping over page boundaries (and
    /// the AAI state machine where the part needs it) internally (§6
    /// `write`).
    #[maybe_async::maybe_async]
    pub async fn write(&mut self, addr: u64, data: &[u8]) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        program::write(transport, resolved, addr, data).await
    }

    /// Program at most one page's worth of `data`, returning the number of
    /// bytes actually sent (§6 `write_page`).
    #[maybe_async::maybe_async]
    pub async fn write_page(&mut self, addr: u64, data: &[u8]) -> Result<usize> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        program::write_page(transport, resolved, addr, data).await
    }

    /// Erase `[addr, addr+len)`, rounding to the containing region's
    /// granularity (§6 `erase`).
    #[maybe_async::maybe_async]
    pub async fn erase(&mut self, addr: u64, len: u64) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        erase::erase(transport, resolved, addr, len).await
    }

    /// Erase the single largest sector fitting at `addr` within `maxlen`,
    /// returning bytes actually erased (§6 `erase_at`).
    #[maybe_async::maybe_async]
    pub async fn erase_at(&mut self, addr: u64, maxlen: u64) -> Result<u64> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        erase::erase_at(transport, resolved, addr, maxlen).await
    }

    /// Erase the whole die in a single chip-erase command.
    #[maybe_async::maybe_async]
    pub async fn chip_erase(&mut self) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        erase::chip_erase(transport, resolved).await
    }

    /// Read `buf.len()` bytes from OTP region `index` at offset `addr`
    /// (§6 `otp_read`).
    #[maybe_async::maybe_async]
    pub async fn otp_read(&mut self, index: u32, addr: u32, buf: &mut [u8]) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        otp::read_otp(transport, resolved, index, addr, buf).await
    }

    /// Program `data` into OTP region `index` at offset `addr` (§6
    /// `otp_write`).
    #[maybe_async::maybe_async]
    pub async fn otp_write(&mut self, index: u32, addr: u32, data: &[u8]) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        otp::program_otp(transport, resolved, index, addr, data).await
    }

    /// Erase OTP region `index` (§6 `otp_erase`).
    #[maybe_async::maybe_async]
    pub async fn otp_erase(&mut self, index: u32) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        otp::erase_otp(transport, resolved, index).await
    }

    /// Permanently lock OTP region `index` (§6 `otp_lock`).
    #[maybe_async::maybe_async]
    pub async fn otp_lock(&mut self, index: u32) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        otp::lock_otp(transport, resolved, index).await
    }

    /// True if OTP region `index` is locked (§6 `otp_locked`).
    #[maybe_async::maybe_async]
    pub async fn otp_locked(&mut self, index: u32) -> Result<bool> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        otp::otp_locked(transport, resolved, index).await
    }

    /// Read the part's unique ID into `buf` (§6 `read_uid`).
    #[maybe_async::maybe_async]
    pub async fn read_uid(&mut self, buf: &mut [u8]) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        uid::read_unique_id(transport, resolved, buf).await
    }

    /// Select which stacked die subsequent ops target (§6 `select_die`,
    /// §4.6 "Select die").
    #[maybe_async::maybe_async]
    pub async fn select_die(&mut self, index: u32) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_mut().ok_or(Error::FlashNotProbed)?;
        if index >= resolved.geometry.ndies {
            return Err(Error::InvalidParameter);
        }
        let w = crate::spi::PhaseWidth::sdr(resolved.io.cmd_buswidth_current.max(1));
        let mut op = Op {
            cmd: crate::spi::CmdPhase { len: 1, width: w, opcode: opcodes::SELECT_DIE },
            addr: crate::spi::AddrPhase::NONE,
            dummy: crate::spi::DummyPhase::default(),
            data: crate::spi::DataPhase::write(core::slice::from_ref(&(index as u8)), w),
        };
        transport.exec_op(&mut op).await.into_result()?;
        resolved.state.current_die = index;
        Ok(())
    }

    /// Switch the steady-state command bus width to `bw` lines, 1/2/4
    /// (§6 `set_bus_width`, §4.6 "Bus-width switch").
    #[maybe_async::maybe_async]
    pub async fn set_bus_width(&mut self, bw: u8) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_mut().ok_or(Error::FlashNotProbed)?;
        let part = resolved.part;
        negotiate::set_bus_width(transport, part, resolved, bw).await
    }

    /// Run the part's bound soft-reset sequence and reset sticky negotiated
    /// state (§6 soft reset recovery, §4.6 "Soft reset recovery").
    #[maybe_async::maybe_async]
    pub async fn soft_reset(&mut self) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_mut().ok_or(Error::FlashNotProbed)?;
        reset::soft_reset(transport, resolved).await
    }

    /// Read the current write-protect mode (§4.7).
    #[maybe_async::maybe_async]
    pub async fn wp_mode(&mut self) -> Result<WpMode> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        let info = resolved.wp.as_ref().ok_or(Error::Unsupported)?;
        wp::read_wp_mode(transport, &info.access).await.map_err(Error::from)
    }

    /// Set the write-protect mode (§4.7).
    #[maybe_async::maybe_async]
    pub async fn set_wp_mode(&mut self, mode: WpMode) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        let info = resolved.wp.as_ref().ok_or(Error::Unsupported)?;
        wp::set_wp_mode(transport, &info.access, mode).await.map_err(Error::from)
    }

    /// Read which `(start, len)` extent is currently write-protected (§4.7).
    #[maybe_async::maybe_async]
    pub async fn protected_extent(&mut self) -> Result<ProtectedExtent> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        let info = resolved.wp.as_ref().ok_or(Error::Unsupported)?;
        wp::read_protected_extent(transport, info, resolved.geometry.size).await.map_err(Error::from)
    }

    /// Set the write-protected extent to exactly `[start, start+len)` (§4.7).
    /// The target must match a row the part's range table can select; rows
    /// that cannot express the requested extent fail with `InvalidParameter`
    /// (via `WpError::RangeUnsupported`).
    #[maybe_async::maybe_async]
    pub async fn set_protected_extent(&mut self, start: u64, len: u64) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::DeviceNotFound)?;
        let resolved = self.resolved.as_ref().ok_or(Error::FlashNotProbed)?;
        let info = resolved.wp.as_ref().ok_or(Error::Unsupported)?;
        let target = ProtectedExtent { start, len };
        wp::set_protected_extent(transport, info, resolved.geometry.size, target).await.map_err(Error::from)
    }
}
