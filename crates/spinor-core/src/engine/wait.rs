//! Wait-busy polling (§4.6, §5): spin on `RDSR`'s `WIP` bit after any
//! program/erase/register-write op, bounded by the part's declared
//! worst-case completion time rather than a wall-clock deadline - no
//! no_std-compatible monotonic clock is threaded through this crate, so the
//! bound is expressed as a poll count instead of elapsed milliseconds.

use crate::error::{Error, Result};
use crate::spi::{opcodes, Op};
use crate::transport::Transport;

/// Poll attempts per millisecond of the caller's declared budget. Tuned so
/// a part's worst-case completion time maps to a retry count generous
/// enough that a real SPI transfer's latency, not this constant, is what
/// actually bounds wall-clock time.
const POLLS_PER_MS: u32 = 4;

/// Poll `RDSR` until the `WIP` bit clears or `max_time_ms` worth of polls
/// have elapsed, returning `Error::Timeout` in the latter case.
#[maybe_async::maybe_async]
pub async fn wait_ready(transport: &mut dyn Transport, max_time_ms: u32) -> Result<()> {
    let max_polls = (max_time_ms.max(1) * POLLS_PER_MS).max(1);
    let mut buf = [0u8; 1];
    for _ in 0..max_polls {
        let mut op = Op::read_reg(opcodes::RDSR, &mut buf);
        transport.exec_op(&mut op).await.into_result()?;
        if buf[0] & opcodes::SR1_WIP == 0 {
            return Ok(());
        }
    }
    Err(Error::Timeout)
}
