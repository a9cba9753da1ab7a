//! Sequential Session Composer
//!
//! Runs an ordered list of work units under a single loading session: one
//! ledger token, one floor hold for the whole batch, results in input order.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::coordinator::LoadingCoordinator;
use crate::enforcer::SessionConfig;

impl LoadingCoordinator {
    /// Run `units` one after another under one loading session
    ///
    /// Unit *i + 1* starts only after unit *i* has finished. The first
    /// failure stops the sequence; later units are never started and the
    /// failure is returned once the floor hold completes. An empty input
    /// returns immediately without opening a session.
    pub async fn run_sequence_with_loading<T, E, I, F, Fut>(
        &self,
        units: I,
        message: impl Into<String>,
        min_duration: Duration,
    ) -> Result<Vec<T>, E>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let units: Vec<F> = units.into_iter().collect();
        let total = units.len();
        debug!(total, min_duration_ms = min_duration.as_millis() as u64, "run_sequence_with_loading: called");
        if units.is_empty() {
            return Ok(Vec::new());
        }

        let steps = async move {
            let mut results = Vec::with_capacity(total);
            for (index, unit) in units.into_iter().enumerate() {
                debug!(step = index + 1, total, "run_sequence_with_loading: starting step");
                match unit().await {
                    Ok(value) => results.push(value),
                    Err(e) => {
                        debug!(step = index + 1, total, "run_sequence_with_loading: step failed, aborting");
                        return Err(e);
                    }
                }
            }
            Ok(results)
        };

        self.run_with_loading(steps, SessionConfig::new(message, min_duration)).await
    }
}
