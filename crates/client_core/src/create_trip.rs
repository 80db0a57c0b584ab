//! Trip creation form: the location search wired into a [`TripDraft`].

use std::sync::Arc;

use shared::domain::TripId;

use crate::{
    api::TripApi,
    config::ClientSettings,
    error::SubmitError,
    search::LocationSearch,
    trip_draft::{TempStopId, TripDraft},
};

pub struct CreateTripSession {
    api: Arc<dyn TripApi>,
    pub search: LocationSearch,
    pub draft: TripDraft,
    error: Option<String>,
}

impl CreateTripSession {
    pub fn new(api: Arc<dyn TripApi>, settings: &ClientSettings) -> Self {
        let search = LocationSearch::with_options(
            Arc::clone(&api),
            settings.search_quiet_period(),
            settings.search_limit,
        );
        Self {
            api,
            search,
            draft: TripDraft::new(),
            error: None,
        }
    }

    /// Adds the listed candidate at `index` as the next stop.
    pub fn select_candidate(&mut self, index: usize) -> Option<TempStopId> {
        let draft = &mut self.draft;
        let mut added = None;
        self.search
            .select(index, |candidate| added = Some(draft.add(candidate)));
        added
    }

    /// Inline form error from the last submission attempt.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Submits the draft and returns the id of the trip to show next.
    pub async fn submit(&mut self) -> Result<TripId, SubmitError> {
        self.error = None;
        match self.draft.submit(self.api.as_ref()).await {
            Ok(created) => Ok(created.id),
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/create_trip_tests.rs"]
mod tests;
