//! Fixup hooks: part-specific code invoked at fixed points in the resolver
//! and operation engine, grounded on the teacher's per-chip quirk-callback
//! pattern but retargeted at the new `Part`/`ResolvedFlash` model.

use crate::error::Result;
use crate::resolved::ResolvedFlash;
use crate::transport::Transport;

/// Bounded recursion depth for `pre_param_setup` → `reprobe_part` chains
/// (§9 Open Question, resolved: treat exceeding this as a configuration
/// error, never UB).
pub const MAX_REPROBE_DEPTH: u8 = 4;

/// Per-part quirk hooks. Every hook is optional; a `None` hook is simply
/// skipped by the caller. Hooks are plain function pointers so built-in
/// catalog entries stay `'static const`.
#[derive(Clone, Copy, Default)]
pub struct FixupHooks {
    /// Runs before SFDP-derived parameters are merged into the blank
    /// `ResolvedFlash`. May call `reprobe_part` to redirect a `meta` entry
    /// (or a revision-specific alias) to a different concrete `Part`.
    pub pre_param_setup: Option<fn(&mut dyn Transport, &mut ResolvedFlash) -> Result<Option<&'static str>>>,
    /// Runs after SFDP merge and opcode negotiation, before the resolved
    /// descriptor is handed back to the caller. Used for one-off register
    /// pokes (e.g. SST's unconditional `max_pp_time_ms` override, §9).
    pub post_param_setup: Option<fn(&mut dyn Transport, &mut ResolvedFlash) -> Result<()>>,
}

impl core::fmt::Debug for FixupHooks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FixupHooks")
            .field("pre_param_setup", &self.pre_param_setup.is_some())
            .field("post_param_setup", &self.post_param_setup.is_some())
            .finish()
    }
}
