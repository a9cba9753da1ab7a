//! Recovery Escape Hatch
//!
//! For externally detected stuck states only. Normal operations never need
//! this; their guards release on completion.

use tracing::warn;

use crate::coordinator::LoadingCoordinator;

impl LoadingCoordinator {
    /// Clear every outstanding token and hide the indicator
    ///
    /// Operations still in flight keep running; their later releases find
    /// nothing to remove and do not re-open the indicator. Returns how many
    /// tokens were cleared.
    pub fn force_hide(&self) -> usize {
        let mut state = self.lock();
        let state = &mut *state;
        let cleared = state.ledger.clear(&mut state.visibility);
        warn!(cleared, "Forced loading indicator hide");
        cleared
    }
}
