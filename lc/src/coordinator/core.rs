//! LoadingCoordinator - shared handle over the ledger and visibility store

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use super::config::CoordinatorConfig;
use super::guard::OperationGuard;
use crate::enforcer::{SessionConfig, hold_for_at_least, settle};
use crate::ledger::{LedgerStats, OperationLedger, OperationToken};
use crate::visibility::{VisibilityEvent, VisibilitySession, VisibilityStore};

/// Ledger and store, always mutated together under one lock
pub(crate) struct CoordinatorState {
    pub(crate) ledger: OperationLedger,
    pub(crate) visibility: VisibilityStore,
}

struct Inner {
    state: Mutex<CoordinatorState>,
    default_message: String,
}

/// Handle to the application's loading coordinator
///
/// Clones share state. All bookkeeping is synchronous and never fails; the
/// lock is only held for the duration of a single transition, never across
/// an await point.
#[derive(Clone)]
pub struct LoadingCoordinator {
    inner: Arc<Inner>,
}

impl LoadingCoordinator {
    pub fn new(config: &CoordinatorConfig) -> Self {
        debug!(?config, "LoadingCoordinator::new: called");
        let state = CoordinatorState {
            ledger: OperationLedger::new(),
            visibility: VisibilityStore::new(config.default_message.clone(), config.event_capacity),
        };
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                default_message: config.default_message.clone(),
            }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        // A panic while holding the lock can't leave the ledger half-updated
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Message used when a caller has nothing more specific
    pub fn default_message(&self) -> &str {
        &self.inner.default_message
    }

    /// Show the indicator directly, bypassing the ledger
    pub fn show(&self, message: &str) {
        debug!(%message, "LoadingCoordinator::show: called");
        self.lock().visibility.show(message);
    }

    /// Hide the indicator directly, bypassing the ledger
    ///
    /// Outstanding tokens are left in place; use
    /// [`force_hide`](LoadingCoordinator::force_hide) to clear them as well.
    pub fn hide(&self) {
        debug!("LoadingCoordinator::hide: called");
        self.lock().visibility.hide();
    }

    /// Register an operation and return the guard that releases it
    pub fn acquire(&self, message: impl Into<String>) -> OperationGuard {
        let token = OperationToken::new(message);
        let token_id = token.id();
        debug!(%token_id, "LoadingCoordinator::acquire: called");
        {
            let mut state = self.lock();
            let CoordinatorState { ledger, visibility } = &mut *state;
            ledger.acquire(token, visibility);
        }
        OperationGuard::new(self.clone(), token_id)
    }

    pub(crate) fn release(&self, token_id: Uuid) -> bool {
        debug!(%token_id, "LoadingCoordinator::release: called");
        let mut state = self.lock();
        let CoordinatorState { ledger, visibility } = &mut *state;
        ledger.release(token_id, visibility)
    }

    /// Run `work` under a loading session
    ///
    /// Opens one ledger entry, awaits the work, holds until
    /// `config.min_duration` has passed, then releases. On failure the
    /// session's handler (if any) is called after the release and its
    /// result is returned; otherwise the failure is returned as is.
    pub async fn run_with_loading<T, E, F>(&self, work: F, config: SessionConfig<T, E>) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        debug!(?config, "LoadingCoordinator::run_with_loading: called");
        let guard = self.acquire(config.message.clone());
        let outcome = hold_for_at_least(config.min_duration, work).await;
        guard.release();

        if outcome.is_err() {
            debug!(handled = config.has_failure_handler(), "run_with_loading: work failed");
        }
        settle(outcome, config.into_handler())
    }

    /// Whether any operation currently holds a token
    pub fn is_active(&self) -> bool {
        !self.lock().ledger.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.lock().ledger.len()
    }

    /// Current visibility state
    pub fn snapshot(&self) -> VisibilitySession {
        self.lock().visibility.session().clone()
    }

    /// Subscribe to visibility changes made after this call
    pub fn subscribe(&self) -> broadcast::Receiver<VisibilityEvent> {
        self.lock().visibility.subscribe()
    }

    pub fn stats(&self) -> LedgerStats {
        self.lock().ledger.stats()
    }

    /// Messages of the active operations, oldest first
    pub fn active_messages(&self) -> Vec<String> {
        self.lock().ledger.tokens().map(|t| t.message().to_string()).collect()
    }
}

impl Default for LoadingCoordinator {
    fn default() -> Self {
        Self::new(&CoordinatorConfig::default())
    }
}

impl fmt::Debug for LoadingCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("LoadingCoordinator")
            .field("active", &state.ledger.len())
            .field("session", state.visibility.session())
            .finish()
    }
}
