//! Scripted in-memory trip service shared by component tests.

use std::{collections::HashMap, sync::Mutex, time::Duration};

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{
    domain::{LocationCandidate, StopId, TripId},
    protocol::{EncounterRow, ExtraLocation, TripCreate, TripDetails, TripStop, TripSummary},
};
use tokio::time::Instant;

use crate::{api::TripApi, error::CollaboratorError};

#[derive(Clone)]
pub(crate) struct Scripted<T> {
    pub delay: Duration,
    pub value: Option<T>,
}

impl<T> Scripted<T> {
    pub fn ok(value: T) -> Self {
        Self {
            delay: Duration::ZERO,
            value: Some(value),
        }
    }

    pub fn failing() -> Self {
        Self {
            delay: Duration::ZERO,
            value: None,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
pub(crate) struct FakeTripApi {
    pub trips: Option<Scripted<Vec<TripSummary>>>,
    pub trip: HashMap<TripId, Scripted<TripDetails>>,
    pub encounters: HashMap<TripId, Scripted<Vec<EncounterRow>>>,
    pub search: Option<Scripted<Vec<LocationCandidate>>>,
    pub extra: HashMap<String, Scripted<Vec<ExtraLocation>>>,
    pub create: Option<Scripted<TripDetails>>,
    pub calls: Mutex<Vec<String>>,
    pub search_calls: Mutex<Vec<(Instant, String, u32)>>,
    pub create_calls: Mutex<Vec<TripCreate>>,
}

impl FakeTripApi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls").push(call);
    }
}

async fn respond<T: Clone>(
    operation: &'static str,
    scripted: Option<&Scripted<T>>,
) -> Result<T, CollaboratorError> {
    let Some(scripted) = scripted else {
        return Err(CollaboratorError::Unavailable { operation });
    };
    if !scripted.delay.is_zero() {
        tokio::time::sleep(scripted.delay).await;
    }
    scripted
        .value
        .clone()
        .ok_or_else(|| CollaboratorError::Status {
            operation,
            status: 500,
            message: "Internal Server Error".into(),
        })
}

#[async_trait]
impl TripApi for FakeTripApi {
    async fn list_trips(&self) -> Result<Vec<TripSummary>, CollaboratorError> {
        self.record("list_trips".into());
        respond("list_trips", self.trips.as_ref()).await
    }

    async fn create_trip(&self, payload: &TripCreate) -> Result<TripDetails, CollaboratorError> {
        self.record("create_trip".into());
        self.create_calls
            .lock()
            .expect("create calls")
            .push(payload.clone());
        respond("create_trip", self.create.as_ref()).await
    }

    async fn get_trip(&self, trip_id: TripId) -> Result<TripDetails, CollaboratorError> {
        self.record(format!("get_trip {trip_id}"));
        respond("get_trip", self.trip.get(&trip_id)).await
    }

    async fn trip_encounters(
        &self,
        trip_id: TripId,
    ) -> Result<Vec<EncounterRow>, CollaboratorError> {
        self.record(format!("trip_encounters {trip_id}"));
        respond("trip_encounters", self.encounters.get(&trip_id)).await
    }

    async fn search_locations(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<LocationCandidate>, CollaboratorError> {
        self.search_calls
            .lock()
            .expect("search calls")
            .push((Instant::now(), query.to_string(), limit));
        respond("search_locations", self.search.as_ref()).await
    }

    async fn extra_locations(
        &self,
        creature: &str,
        trip_id: TripId,
    ) -> Result<Vec<ExtraLocation>, CollaboratorError> {
        self.record(format!("extra_locations {creature} {trip_id}"));
        respond("extra_locations", self.extra.get(creature)).await
    }
}

pub(crate) fn date(raw: &str) -> NaiveDate {
    raw.parse().expect("date")
}

pub(crate) fn candidate(name: &str, slug: &str) -> LocationCandidate {
    LocationCandidate {
        name: name.into(),
        slug: slug.into(),
        url: format!("https://pokeapi.co/api/v2/location-area/{slug}/"),
    }
}

pub(crate) fn trip_details(id: i64, stops: &[(&str, u32)]) -> TripDetails {
    TripDetails {
        id: TripId(id),
        name: format!("Trip {id}"),
        description: Some("Gym tour".into()),
        start_date: date("2024-05-01"),
        end_date: date("2024-05-03"),
        stops: stops
            .iter()
            .enumerate()
            .map(|(index, (name, order))| TripStop {
                id: StopId(index as i64 + 1),
                location_area_name: name.to_string(),
                location_area_slug: name.to_ascii_lowercase().replace(' ', "-"),
                arrival_date: date("2024-05-01"),
                duration_days: 1,
                order: *order,
            })
            .collect(),
    }
}

pub(crate) fn encounter(name: &str, max_chance: f64) -> EncounterRow {
    EncounterRow {
        name: name.into(),
        max_chance,
        locations_in_trip: Vec::new(),
        encounter_methods: Vec::new(),
        encounter_conditions: Vec::new(),
    }
}

pub(crate) fn extra_location(name: &str) -> ExtraLocation {
    ExtraLocation {
        location_area_name: name.into(),
        location_area_url: format!("https://pokeapi.co/api/v2/location-area/{name}/"),
    }
}
