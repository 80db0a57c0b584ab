use std::fmt;

use shared::protocol::TripSummary;
use tracing::{error, info};

use crate::{
    api::TripApi,
    format::{format_date_range, format_days},
    trip_detail::LoadState,
};

pub const TRIPS_LOAD_FAILED: &str = "Failed to load trips";

/// The saved-trips listing.
#[derive(Debug, Clone, PartialEq)]
pub struct TripDirectory {
    pub trips: LoadState<Vec<TripSummary>>,
}

impl TripDirectory {
    pub async fn load(api: &dyn TripApi) -> Self {
        let trips = match api.list_trips().await {
            Ok(trips) => {
                info!(count = trips.len(), "trips: loaded");
                LoadState::Loaded(trips)
            }
            Err(err) => {
                error!("trips: load failed: {err}");
                LoadState::Failed(TRIPS_LOAD_FAILED.to_string())
            }
        };
        Self { trips }
    }
}

impl fmt::Display for TripDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trips = match &self.trips {
            LoadState::Loading => return writeln!(f, "Loading trips..."),
            LoadState::Failed(message) => return writeln!(f, "{message}"),
            LoadState::Loaded(trips) => trips,
        };
        writeln!(f, "My Trips")?;
        if trips.is_empty() {
            return writeln!(f, "No trips yet. Try creating one!");
        }
        for trip in trips {
            writeln!(f)?;
            writeln!(f, "[{}] {}", trip.id, trip.name)?;
            if let Some(description) = trip.description.as_deref().filter(|d| !d.is_empty()) {
                writeln!(f, "{description}")?;
            }
            writeln!(
                f,
                "{} ({})",
                format_date_range(trip.start_date, trip.end_date),
                format_days(i64::from(trip.duration_days))
            )?;
        }
        Ok(())
    }
}
