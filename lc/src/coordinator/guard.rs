//! RAII release of an operation token

use tracing::debug;
use uuid::Uuid;

use super::core::LoadingCoordinator;

/// Holds one ledger token; releases it exactly once when dropped
///
/// Dropping the future that owns a guard still releases the token, so an
/// abandoned operation can't leave the indicator stuck.
#[must_use = "dropping the guard releases the operation immediately"]
#[derive(Debug)]
pub struct OperationGuard {
    coordinator: LoadingCoordinator,
    token_id: Uuid,
    released: bool,
}

impl OperationGuard {
    pub(crate) fn new(coordinator: LoadingCoordinator, token_id: Uuid) -> Self {
        Self {
            coordinator,
            token_id,
            released: false,
        }
    }

    pub fn token_id(&self) -> Uuid {
        self.token_id
    }

    /// Release now instead of at drop
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        debug!(token_id = %self.token_id, "OperationGuard: releasing");
        self.coordinator.release(self.token_id);
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        self.release_once();
    }
}
