//! Per-part overrides for operations whose default implementation doesn't
//! fit a particular vendor (§4.8's `ops` field).

use crate::error::Result;
use crate::resolved::ResolvedFlash;
use crate::transport::Transport;

/// Function-pointer overrides for operations the default engine
/// implementation gets wrong for a specific part. Each field replaces one
/// step of the negotiator or engine; unset fields fall back to the
/// default procedure named in §4.5/§4.6.
#[derive(Clone, Copy, Default)]
pub struct OpsOverride {
    /// Replaces the default Quad-Enable write/verify procedure.
    pub quad_enable: Option<fn(&mut dyn Transport, &mut ResolvedFlash) -> Result<()>>,
    /// Replaces the default QPI-enter sequence.
    pub qpi_enable: Option<fn(&mut dyn Transport, &mut ResolvedFlash) -> Result<()>>,
    /// Replaces the default QPI-exit sequence.
    pub qpi_disable: Option<fn(&mut dyn Transport, &mut ResolvedFlash) -> Result<()>>,
    /// Replaces the default OTP address computation for SECR-style parts
    /// (e.g. high-bank-latch parts that additionally write EAR above
    /// 16 MiB).
    pub otp_addr: Option<fn(&ResolvedFlash, index: u32, addr: u32) -> u32>,
    /// Replaces the default OTP-region lock-bit computation.
    pub otp_lock_bit: Option<fn(index: u32) -> (u8, u8)>,
}

impl core::fmt::Debug for OpsOverride {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OpsOverride")
            .field("quad_enable", &self.quad_enable.is_some())
            .field("qpi_enable", &self.qpi_enable.is_some())
            .field("qpi_disable", &self.qpi_disable.is_some())
            .field("otp_addr", &self.otp_addr.is_some())
            .field("otp_lock_bit", &self.otp_lock_bit.is_some())
            .finish()
    }
}
