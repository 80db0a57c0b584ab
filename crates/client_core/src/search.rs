//! Debounced location search feeding the stop builder.

use std::{sync::Arc, time::Duration};

use shared::domain::LocationCandidate;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::api::TripApi;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(400);
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSnapshot {
    pub query: String,
    pub candidates: Vec<LocationCandidate>,
    in_flight: usize,
    finished: u64,
    /// Bumped by every keystroke and selection; a response is applied only
    /// while it still matches the generation it was scheduled under.
    generation: u64,
}

impl SearchSnapshot {
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Number of requests that have come back, successfully or not.
    pub fn finished_requests(&self) -> u64 {
        self.finished
    }
}

/// Search box state. At most one request is waiting on its quiet period at a
/// time; a keystroke replaces it. Requests that already fired run to
/// completion, but their results are dropped once newer input has arrived.
pub struct LocationSearch {
    api: Arc<dyn TripApi>,
    quiet_period: Duration,
    limit: u32,
    state: Arc<watch::Sender<SearchSnapshot>>,
    pending: Option<JoinHandle<()>>,
}

impl LocationSearch {
    pub fn new(api: Arc<dyn TripApi>) -> Self {
        Self::with_options(api, DEFAULT_QUIET_PERIOD, DEFAULT_SEARCH_LIMIT)
    }

    pub fn with_options(api: Arc<dyn TripApi>, quiet_period: Duration, limit: u32) -> Self {
        let (state, _) = watch::channel(SearchSnapshot::default());
        Self {
            api,
            quiet_period,
            limit,
            state: Arc::new(state),
            pending: None,
        }
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.state.subscribe()
    }

    /// Handles one keystroke's worth of input. Must be called inside a tokio
    /// runtime.
    pub fn input(&mut self, text: &str) {
        self.cancel_pending();
        let query = text.trim().to_string();
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            generation = state.generation;
            state.query = text.to_string();
            if query.is_empty() {
                state.candidates.clear();
            }
        });
        if query.is_empty() {
            return;
        }

        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        let quiet_period = self.quiet_period;
        let limit = self.limit;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            // Detached so that a later keystroke cannot abort a fired request.
            tokio::spawn(run_search(api, state, query, limit, generation));
        }));
    }

    /// Picks the candidate at `index`, clears the box and hands the candidate
    /// to `on_select`. Returns false when no such candidate is listed.
    pub fn select(&mut self, index: usize, on_select: impl FnOnce(LocationCandidate)) -> bool {
        let Some(candidate) = self.state.borrow().candidates.get(index).cloned() else {
            return false;
        };
        self.cancel_pending();
        self.state.send_modify(|state| {
            state.generation += 1;
            state.query.clear();
            state.candidates.clear();
        });
        debug!(slug = %candidate.slug, "search: candidate selected");
        on_select(candidate);
        true
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl Drop for LocationSearch {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

async fn run_search(
    api: Arc<dyn TripApi>,
    state: Arc<watch::Sender<SearchSnapshot>>,
    query: String,
    limit: u32,
    generation: u64,
) {
    state.send_modify(|state| state.in_flight += 1);
    match api.search_locations(&query, limit).await {
        Ok(candidates) => {
            let results = candidates.len();
            let mut applied = false;
            state.send_modify(|state| {
                if state.generation == generation {
                    state.candidates = candidates;
                    applied = true;
                }
            });
            if applied {
                info!(%query, results, "search: candidates updated");
            } else {
                debug!(%query, results, "search: dropping response for superseded input");
            }
        }
        Err(err) => warn!(%query, "search: request failed: {err}"),
    }
    state.send_modify(|state| {
        state.in_flight -= 1;
        state.finished += 1;
    });
}

#[cfg(test)]
#[path = "tests/search_tests.rs"]
mod tests;
