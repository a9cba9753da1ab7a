//! Operation Ledger - reference-counted registry of in-flight operations
//!
//! Every running unit of work holds one [`OperationToken`] in the ledger. The
//! ledger drives the [`VisibilityStore`]: the first token in shows the
//! indicator, the last token out hides it. Releasing a token that isn't
//! present (already released, or cleared by a forced recovery) is a no-op.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::visibility::VisibilityStore;

/// Handle for one in-flight unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationToken {
    id: Uuid,
    created_at: DateTime<Utc>,
    message: String,
}

impl OperationToken {
    /// Create a token with a fresh time-ordered id
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_id(Uuid::now_v7(), message)
    }

    pub(crate) fn with_id(id: Uuid, message: impl Into<String>) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            message: message.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Message the operation asked to display
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Counters describing ledger activity since creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    /// Tokens admitted
    pub acquired: u64,
    /// Tokens removed by a normal release
    pub released: u64,
    /// Releases that found no matching token
    pub ignored_releases: u64,
    /// Acquires refused because the id was already active
    pub rejected_acquires: u64,
    /// Number of forced recoveries
    pub forced_recoveries: u64,
    /// Tokens dropped by forced recoveries
    pub forced_tokens: u64,
    /// Highest number of simultaneously active tokens
    pub peak_active: usize,
}

/// Active set of operation tokens
#[derive(Debug, Default)]
pub struct OperationLedger {
    // v7 ids sort by creation time, so iteration follows admission order
    active: BTreeMap<Uuid, OperationToken>,
    session_started: Option<DateTime<Utc>>,
    stats: LedgerStats,
}

impl OperationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit `token`, showing the indicator if it's the first active one
    ///
    /// Returns false (and changes nothing) if a token with the same id is
    /// already active.
    pub fn acquire(&mut self, token: OperationToken, store: &mut VisibilityStore) -> bool {
        debug!(
            token_id = %token.id,
            message = %token.message,
            active = self.active.len(),
            "OperationLedger::acquire: called"
        );
        if self.active.contains_key(&token.id) {
            warn!(token_id = %token.id, "OperationLedger::acquire: token already active, ignoring");
            self.stats.rejected_acquires += 1;
            return false;
        }

        let first = self.active.is_empty();
        if first {
            store.show(&token.message);
            self.session_started = Some(token.created_at);
        }
        self.active.insert(token.id, token);
        self.stats.acquired += 1;
        self.stats.peak_active = self.stats.peak_active.max(self.active.len());

        if first {
            info!("Loading session opened");
        }
        true
    }

    /// Remove the token with `id`, hiding the indicator if none remain
    ///
    /// Unknown ids are ignored. Returns true if a token was removed.
    pub fn release(&mut self, id: Uuid, store: &mut VisibilityStore) -> bool {
        debug!(token_id = %id, active = self.active.len(), "OperationLedger::release: called");
        if self.active.remove(&id).is_none() {
            debug!(token_id = %id, "OperationLedger::release: unknown token, ignoring");
            self.stats.ignored_releases += 1;
            return false;
        }
        self.stats.released += 1;

        if self.active.is_empty() {
            store.hide();
            let visible_ms = self
                .session_started
                .take()
                .map(|started| (Utc::now() - started).num_milliseconds())
                .unwrap_or_default();
            info!(visible_ms, "Loading session closed");
        }
        true
    }

    /// Drop every active token and hide the indicator
    ///
    /// Returns the number of tokens that were cleared.
    pub fn clear(&mut self, store: &mut VisibilityStore) -> usize {
        let cleared = self.active.len();
        debug!(cleared, "OperationLedger::clear: called");
        self.active.clear();
        self.session_started = None;
        self.stats.forced_recoveries += 1;
        self.stats.forced_tokens += cleared as u64;
        store.hide();
        cleared
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.active.contains_key(&id)
    }

    /// Active tokens in admission order
    pub fn tokens(&self) -> impl Iterator<Item = &OperationToken> {
        self.active.values()
    }

    pub fn stats(&self) -> LedgerStats {
        self.stats
    }
}
