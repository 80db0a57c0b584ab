use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{StopId, TripId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub id: TripId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripStop {
    pub id: StopId,
    pub location_area_name: String,
    pub location_area_slug: String,
    pub arrival_date: NaiveDate,
    pub duration_days: u32,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripDetails {
    pub id: TripId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub stops: Vec<TripStop>,
}

impl TripDetails {
    /// Stops ordered by their persisted `order`. The server's numbering is
    /// kept as-is.
    pub fn stops_in_order(&self) -> Vec<&TripStop> {
        let mut stops: Vec<&TripStop> = self.stops.iter().collect();
        stops.sort_by_key(|stop| stop.order);
        stops
    }

    /// Inclusive number of calendar days between start and end.
    pub fn span_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripLocationCreate {
    pub location_area_name: String,
    pub location_area_slug: String,
    pub arrival_date: NaiveDate,
    pub duration_days: u32,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripCreate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub stops: Vec<TripLocationCreate>,
}

/// Aggregated encounter data for one creature across the stops of a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterRow {
    pub name: String,
    pub max_chance: f64,
    #[serde(default)]
    pub locations_in_trip: Vec<String>,
    #[serde(default)]
    pub encounter_methods: Vec<String>,
    #[serde(default)]
    pub encounter_conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraLocation {
    pub location_area_name: String,
    pub location_area_url: String,
}
