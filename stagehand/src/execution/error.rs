//! Errors crossing the stage execution boundary.
//!
//! Only [`RejectError`] ever reaches the caller of a stage; every other
//! problem a hook causes is confined to the outcome log.

use crate::plan::HookId;
use crate::stage::Stage;

/// Error text recorded for a hook that outlived its group deadline.
pub const TIMEOUT_ERROR: &str = "Hook execution timeout";

/// A hook's request to terminate the auction.
///
/// Propagated out of the stage; the caller must stop processing the
/// auction and respond with the carried no-bid code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectError {
    /// OpenRTB no-bid reason code to respond with.
    pub nbr_code: i32,

    /// The hook that rejected.
    pub hook_id: HookId,

    /// The stage it rejected at.
    pub stage: Stage,
}

impl std::fmt::Display for RejectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Module {} (hook: {}) rejected request with code {} at {} stage",
            self.hook_id.module_code, self.hook_id.hook_impl_code, self.nbr_code, self.stage
        )
    }
}

impl std::error::Error for RejectError {}
