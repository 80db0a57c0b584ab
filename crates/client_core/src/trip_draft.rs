//! Unsaved trip being assembled stop by stop.

use chrono::{Local, NaiveDate};
use shared::{
    domain::LocationCandidate,
    protocol::{TripCreate, TripDetails, TripLocationCreate},
};
use tracing::{error, info};

use crate::{
    api::TripApi,
    error::{SubmitError, ValidationError},
};

/// Session-local stop identifier. Never sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TempStopId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopDraft {
    pub temporary_id: TempStopId,
    pub location_name: String,
    pub location_slug: String,
    pub arrival_date: NaiveDate,
    pub duration_days: u32,
    order: u32,
}

impl StopDraft {
    /// 1-based position in the draft.
    pub fn order(&self) -> u32 {
        self.order
    }

    fn to_payload(&self) -> TripLocationCreate {
        TripLocationCreate {
            location_area_name: self.location_name.clone(),
            location_area_slug: self.location_slug.clone(),
            arrival_date: self.arrival_date,
            duration_days: self.duration_days,
            order: self.order,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopPatch {
    pub arrival_date: Option<NaiveDate>,
    pub duration_days: Option<u32>,
}

#[derive(Debug, Default)]
pub struct TripDraft {
    pub name: String,
    pub description: String,
    stops: Vec<StopDraft>,
    next_temp_id: u64,
}

impl TripDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stops(&self) -> &[StopDraft] {
        &self.stops
    }

    /// Appends a stop arriving today (local date) for one day.
    pub fn add(&mut self, candidate: LocationCandidate) -> TempStopId {
        self.add_arriving(candidate, Local::now().date_naive())
    }

    pub fn add_arriving(
        &mut self,
        candidate: LocationCandidate,
        arrival_date: NaiveDate,
    ) -> TempStopId {
        self.next_temp_id += 1;
        let temporary_id = TempStopId(self.next_temp_id);
        let order = self.stops.len() as u32 + 1;
        self.stops.push(StopDraft {
            temporary_id,
            location_name: candidate.name,
            location_slug: candidate.slug,
            arrival_date,
            duration_days: 1,
            order,
        });
        temporary_id
    }

    /// Applies `patch` to the matching stop. Durations are clamped to at
    /// least one day.
    pub fn update(&mut self, temporary_id: TempStopId, patch: StopPatch) -> bool {
        let Some(stop) = self
            .stops
            .iter_mut()
            .find(|stop| stop.temporary_id == temporary_id)
        else {
            return false;
        };
        if let Some(arrival_date) = patch.arrival_date {
            stop.arrival_date = arrival_date;
        }
        if let Some(duration_days) = patch.duration_days {
            stop.duration_days = duration_days.max(1);
        }
        true
    }

    /// Removes the matching stop; the remaining stops are renumbered so that
    /// `order` stays `1..=len`.
    pub fn remove(&mut self, temporary_id: TempStopId) -> bool {
        let before = self.stops.len();
        self.stops.retain(|stop| stop.temporary_id != temporary_id);
        if self.stops.len() == before {
            return false;
        }
        for (index, stop) in self.stops.iter_mut().enumerate() {
            stop.order = index as u32 + 1;
        }
        true
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::NameRequired);
        }
        if self.stops.is_empty() {
            return Err(ValidationError::NoStops);
        }
        Ok(())
    }

    pub fn to_payload(&self) -> Result<TripCreate, ValidationError> {
        self.validate()?;
        let description = self.description.trim();
        Ok(TripCreate {
            name: self.name.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            stops: self.stops.iter().map(StopDraft::to_payload).collect(),
        })
    }

    /// Sends the draft to the trip service. On success the draft is reset and
    /// the created trip returned; on failure the draft is left untouched.
    pub async fn submit(&mut self, api: &dyn TripApi) -> Result<TripDetails, SubmitError> {
        let payload = self.to_payload()?;
        match api.create_trip(&payload).await {
            Ok(created) => {
                info!(
                    trip_id = created.id.0,
                    stops = payload.stops.len(),
                    "trip: created"
                );
                *self = Self {
                    next_temp_id: self.next_temp_id,
                    ..Self::default()
                };
                Ok(created)
            }
            Err(err) => {
                error!(stops = payload.stops.len(), "trip: creation failed: {err}");
                Err(SubmitError::Creation(err))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/trip_draft_tests.rs"]
mod tests;
