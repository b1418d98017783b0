//! Part identification (§4.4): the JEDEC-ID retry ladder, SFDP walk, and
//! bounded fixup re-probe loop that turn an attached, otherwise-unknown
//! Transport into a concrete catalog [`Part`].
//!
//! Everything here runs before I/O negotiation - the bus is still 1-1-1 (or
//! whatever multi-I/O mode the ladder had to try to get an ID reply at all)
//! and nothing about page size, erase layout or quad-enable has been
//! decided yet. That's [`crate::negotiate`]'s job, working from the
//! [`Part`] this module hands back.

use heapless::Vec as HVec;

use crate::catalog;
use crate::error::{Error, Result};
use crate::part::{Part, MAX_REPROBE_DEPTH};
use crate::resolved::{EraseState, Geometry, Identity, IoState, ResolvedFlash, Speeds, VolatileState};
use crate::sfdp::{probe_sfdp, SfdpInfo};
use crate::spi::{opcodes, AddrPhase, CmdPhase, DataPhase, DummyPhase, IoMode, IoOpcode, Op, PhaseWidth};
use crate::transport::{SpiMode, Status, Transport};

/// Clock rate used while the part's real speed ceiling is still unknown.
const PROBE_SPEED_HZ: u32 = 1_000_000;

/// One JEDEC-ID read attempt in the retry ladder (§4.4 step 2), tried in
/// order until one both succeeds on the bus and matches a catalog part.
struct ProbeStep {
    opcode: u8,
    cmd_bw: u8,
    dummy_cycles: u8,
}

const PROBE_LADDER: [ProbeStep; 6] = [
    ProbeStep { opcode: opcodes::RDID, cmd_bw: 1, dummy_cycles: 0 },
    ProbeStep { opcode: opcodes::RDID_MULTI, cmd_bw: 4, dummy_cycles: 1 },
    ProbeStep { opcode: opcodes::RDID_MULTI, cmd_bw: 4, dummy_cycles: 0 },
    ProbeStep { opcode: opcodes::RDID, cmd_bw: 4, dummy_cycles: 0 },
    ProbeStep { opcode: opcodes::RDID_MULTI, cmd_bw: 2, dummy_cycles: 0 },
    ProbeStep { opcode: opcodes::RDID, cmd_bw: 2, dummy_cycles: 0 },
];

/// A catalog hit from the retry ladder: which part matched, the ID bytes
/// read back (up to 8, whatever length the Transport actually returned),
/// and which bus width produced the match.
struct LadderMatch {
    part: &'static Part,
    id_bytes: HVec<u8, 8>,
    cmd_bw: u8,
}

/// Result of [`resolve`]: the matched catalog part, its identity, the bus
/// width the probe ended up settling on, and any SFDP table found - the
/// inputs [`crate::negotiate`] needs to pick opcodes and strategies.
pub struct ProbeOutcome {
    /// The matched catalog entry.
    pub part: &'static Part,
    /// Display identity derived from the match (vendor/model names, raw ID
    /// bytes as read back from the device).
    pub identity: Identity,
    /// Command bus width (1, 2 or 4) the probe believes the bus is
    /// currently in.
    pub probe_cmd_bw: u8,
    /// Parsed SFDP table, if the part has one and it decoded cleanly.
    pub sfdp: Option<SfdpInfo>,
}

#[maybe_async::maybe_async]
async fn read_id(transport: &mut dyn Transport, step: &ProbeStep, buf: &mut [u8]) -> bool {
    let width = PhaseWidth::sdr(step.cmd_bw);
    let mut op = Op {
        cmd: CmdPhase { len: 1, width, opcode: step.opcode },
        addr: AddrPhase::NONE,
        dummy: DummyPhase { len: step.dummy_cycles, width },
        data: DataPhase::read(buf, width),
    };
    if !transport.supports_op(&op) {
        return false;
    }
    transport.adjust_op_size(&mut op);
    matches!(transport.exec_op(&mut op).await, Status::Ok)
}

#[maybe_async::maybe_async]
async fn exec_bare(transport: &mut dyn Transport, opcode: u8, cmd_bw: u8) {
    let width = PhaseWidth::sdr(cmd_bw);
    let mut op = Op { cmd: CmdPhase { len: 1, width, opcode }, addr: AddrPhase::NONE, dummy: DummyPhase::default(), data: DataPhase::none() };
    if transport.supports_op(&op) {
        let _ = transport.exec_op(&mut op).await;
    }
}

/// All-`0x00`/all-`0xFF` reads mean "nothing answered" on most controllers;
/// never let those match a catalog entry even if some part's mask is loose
/// enough to accept them.
fn looks_like_no_reply(id: &[u8]) -> bool {
    id.iter().all(|b| *b == 0x00) || id.iter().all(|b| *b == 0xFF)
}

#[maybe_async::maybe_async]
async fn walk_ladder(transport: &mut dyn Transport) -> Option<LadderMatch> {
    for step in PROBE_LADDER.iter() {
        let mut short = [0u8; 3];
        if !read_id(transport, step, &mut short).await || looks_like_no_reply(&short) {
            continue;
        }
        let Some(part) = catalog::find_by_id(&short) else {
            continue;
        };
        let mut long = [0u8; 8];
        let id_bytes = if read_id(transport, step, &mut long).await && !looks_like_no_reply(&long) {
            HVec::from_slice(&long).unwrap_or_default()
        } else {
            HVec::from_slice(&short).unwrap_or_default()
        };
        return Some(LadderMatch { part, id_bytes, cmd_bw: step.cmd_bw });
    }
    None
}

/// Walk every SFDP entry bus width worth trying, starting with the one the
/// ID ladder already settled on (§4.4 step 4).
#[maybe_async::maybe_async]
async fn sfdp_probe_with_fallback(transport: &mut dyn Transport, known_bw: u8) -> Option<SfdpInfo> {
    if known_bw == 1 {
        return probe_sfdp(transport, 1).await;
    }
    for bw in [1u8, 4, 2] {
        if let Some(info) = probe_sfdp(transport, bw).await {
            return Some(info);
        }
    }
    None
}

/// A placeholder `ResolvedFlash` built purely so a `pre_param_setup` hook
/// has something to inspect and redirect before real negotiation has run;
/// every field past `part`/`identity` holds a conservative, unnegotiated
/// default (§9: "before SFDP-derived parameters are merged into the blank
/// `ResolvedFlash`").
fn blank_resolved(part: &'static Part, identity: Identity) -> ResolvedFlash {
    let four_byte_native = part.size > 16 * 1024 * 1024;
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
        speeds: Speeds { min_low_hz: PROBE_SPEED_HZ, curr_low_hz: PROBE_SPEED_HZ, ..Speeds::default() },
        io: IoState {
            read_opcode: opcodes::READ,
            read_io_info: IoOpcode::simple(opcodes::READ),
            read_mode: IoMode::Single,
            read_ndummy_bytes: 0,
            pp_opcode: opcodes::PP,
            pp_io_info: IoOpcode::simple(opcodes::PP),
            pp_mode: IoMode::Single,
            cmd_buswidth_steady_state: 1,
            cmd_buswidth_current: 1,
            curr_high_addr_byte: 0,
            a4b_mode_active: false,
            qe_set: false,
        },
        // This module only ever compiles under `std`, which always implies
        // `alloc`, so `EraseState::regions` is the owned-`Vec` variant.
        erase: EraseState { regions: alloc::vec::Vec::new(), sector_info: [crate::part::EraseSector::new(0, 0, 0); crate::part::MAX_ERASE_SECTORS] },
        otp: part.otp,
        wp: part.wp_ranges,
        sfdp: None,
        state: VolatileState::default(),
    }
}

/// Bounded fixup re-probe loop (§4.4 step 5, §9): repeatedly call the
/// current part's `pre_param_setup` hook, following a redirect to another
/// model name up to [`MAX_REPROBE_DEPTH`] times before giving up.
fn run_reprobe_chain(transport: &mut dyn Transport, mut part: &'static Part, identity: Identity) -> Result<(&'static Part, Identity)> {
    let mut depth = 0u8;
    loop {
        let hook = part.fixups.and_then(|f| f.pre_param_setup);
        let Some(hook) = hook else {
            return Ok((part, identity));
        };
        let mut placeholder = blank_resolved(part, identity.clone());
        let redirect = hook(transport, &mut placeholder)?;
        match redirect {
            None => return Ok((part, identity)),
            Some(model_name) => {
                depth += 1;
                if depth > MAX_REPROBE_DEPTH {
                    return Err(Error::FlashPartNotRecognised);
                }
                part = catalog::find_by_name(model_name).ok_or(Error::FlashPartNotRecognised)?;
            }
        }
    }
}

/// Identify the part attached to `transport`: reset to a known bus state,
/// walk the JEDEC-ID retry ladder, canonicalize back onto SPI-mode reads if
/// the match only came back over QPI/DPI, probe SFDP, and run the bounded
/// fixup re-probe chain (§4.4 steps 1-6).
#[maybe_async::maybe_async]
pub async fn resolve(transport: &mut dyn Transport) -> Result<ProbeOutcome> {
    transport.bus_lock();
    let outcome = resolve_inner(transport).await;
    transport.bus_unlock();
    outcome
}

#[maybe_async::maybe_async]
async fn resolve_inner(transport: &mut dyn Transport) -> Result<ProbeOutcome> {
    let _ = transport.set_speed(PROBE_SPEED_HZ).await;
    let _ = transport.set_mode(SpiMode::Mode0).await;

    let mut found = walk_ladder(transport).await.ok_or(Error::FlashPartNotRecognised)?;

    // Step 3: a match over QPI/DPI only tells us a part is attached, not
    // that it will stay usable once negotiation drops into 1-1-1 for the
    // bulk of its work - fall back to SPI-mode reads if exiting succeeds.
    if found.cmd_bw != 1 {
        exec_bare(transport, opcodes::RSTQIO_FFH, found.cmd_bw).await;
        if let Some(retry) = walk_ladder(transport).await {
            found = retry;
        }
    }

    let vendor_name = found.part.display_vendor.map(|v| v.name).unwrap_or("Unknown");
    let identity = Identity { vendor_name, model_name: found.part.model, id_bytes: found.id_bytes };
    let probe_cmd_bw = found.cmd_bw;
    let part = found.part;

    let (part, identity) = run_reprobe_chain(transport, part, identity)?;

    let sfdp = sfdp_probe_with_fallback(transport, probe_cmd_bw).await;

    Ok(ProbeOutcome { part, identity, probe_cmd_bw, sfdp })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Only the plain sync logic is unit-tested here, matching the rest of
    // the crate: no `pollster`/async-test-executor dependency exists in the
    // workspace, so the bus-walking `async fn`s above are exercised
    // end-to-end instead, through a real (async) Transport impl.

    #[test]
    fn all_zero_or_all_ff_reply_is_rejected() {
        assert!(looks_like_no_reply(&[0x00, 0x00, 0x00]));
        assert!(looks_like_no_reply(&[0xFF, 0xFF, 0xFF, 0xFF]));
        assert!(!looks_like_no_reply(&[0xEF, 0x40, 0x18]));
    }

    #[test]
    fn probe_ladder_tries_single_line_spi_first_and_widens_after() {
        assert_eq!(PROBE_LADDER[0].cmd_bw, 1);
        assert!(PROBE_LADDER.iter().skip(1).all(|step| step.cmd_bw == 2 || step.cmd_bw == 4));
    }

    #[test]
    fn blank_resolved_defaults_to_four_byte_addressing_over_16mib() {
        let part = crate::catalog::find_by_name("W25Q256JV").expect("catalog lookup");
        let identity = Identity { vendor_name: "Winbond", model_name: part.model, id_bytes: HVec::new() };
        let resolved = blank_resolved(part, identity);
        assert_eq!(resolved.geometry.naddr_current, 4);
        assert_eq!(resolved.geometry.naddr_native, 4);
    }

    #[test]
    fn blank_resolved_defaults_to_three_byte_addressing_under_16mib() {
        let part = crate::catalog::find_by_name("W25Q128JV").expect("catalog lookup");
        let identity = Identity { vendor_name: "Winbond", model_name: part.model, id_bytes: HVec::new() };
        let resolved = blank_resolved(part, identity);
        assert_eq!(resolved.geometry.naddr_current, 3);
        assert_eq!(resolved.geometry.naddr_native, 3);
    }

    #[test]
    fn reprobe_chain_is_identity_when_part_declares_no_fixups() {
        let part = crate::catalog::find_by_name("W25Q128JV").expect("catalog lookup");
        let identity = Identity { vendor_name: "Winbond", model_name: part.model, id_bytes: HVec::new() };
        // `MockTransport` is only built under `#[cfg(test)]`; an unused
        // placeholder pointer stands in since no fixups means the hook is
        // never actually invoked.
        struct NullTransport;
        #[maybe_async::maybe_async]
        impl Transport for NullTransport {
            fn if_caps(&self) -> crate::transport::IfCaps {
                crate::transport::IfCaps::empty()
            }
            fn supports_op(&self, _op: &Op<'_>) -> bool {
                true
            }
            fn adjust_op_size(&self, _op: &mut Op<'_>) {}
            async fn exec_op(&mut self, _op: &mut Op<'_>) -> Status {
                Status::Ok
            }
            async fn set_speed(&mut self, _hz: u32) -> Status {
                Status::Ok
            }
            fn get_speed(&self) -> u32 {
                0
            }
            async fn set_mode(&mut self, _mode: SpiMode) -> Status {
                Status::Ok
            }
            async fn set_cs_pol(&mut self, _positive: bool) -> Status {
                Status::Ok
            }
            fn bus_lock(&mut self) {}
            fn bus_unlock(&mut self) {}
        }
        let mut transport = NullTransport;
        let (resolved_part, resolved_identity) = run_reprobe_chain(&mut transport, part, identity).expect("no fixups, no redirect");
        assert_eq!(resolved_part.model, "W25Q128JV");
        assert_eq!(resolved_identity.model_name, "W25Q128JV");
    }
}
