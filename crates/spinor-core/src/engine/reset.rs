//! Soft-reset recovery (§4.6): run the part's bound soft-reset sequence,
//! then reset the sticky negotiated state that a reset invalidates -
//! `qe_set` goes back to false and the bus returns to single-line 1-1-1.

use crate::error::Result;
use crate::negotiate::{apply_soft_reset, choose_soft_reset};
use crate::part::A4bFlags;
use crate::resolved::ResolvedFlash;
use crate::transport::Transport;

/// Delay observed after issuing a soft reset before the part is guaranteed
/// to accept new commands again.
pub const RESET_SETTLE_MS: u32 = 1;

#[maybe_async::maybe_async]
pub async fn soft_reset(transport: &mut dyn Transport, resolved: &mut ResolvedFlash) -> Result<()> {
    if let Some(strategy) = choose_soft_reset(resolved.part.soft_reset_flags) {
        apply_soft_reset(transport, strategy, resolved.io.a4b_mode_active, resolved.io.cmd_buswidth_current).await?;
    }

    resolved.io.qe_set = false;
    resolved.io.cmd_buswidth_current = 1;
    resolved.io.a4b_mode_active = resolved.part.a4b_flags.contains(A4bFlags::ALWAYS_4B);
    resolved.geometry.naddr_current = if resolved.io.a4b_mode_active { 4 } else { 3 };
    resolved.state.global_unlock_requested = false;
    Ok(())
}
