//! Trip detail page: trip metadata, aggregated encounters and the
//! per-creature "other locations" overlay, each loaded independently.

use std::{fmt, sync::Arc};

use shared::{
    domain::TripId,
    protocol::{EncounterRow, ExtraLocation, TripDetails},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    api::TripApi,
    format::{format_date, format_date_range, format_days},
    table::{EncounterTable, SortColumn, SortState},
};

pub const TRIP_LOAD_FAILED: &str = "Failed to load trip";

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraLocations {
    Loading,
    /// Failed lookups are shown as an empty list.
    Loaded(Vec<ExtraLocation>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalState {
    pub creature: String,
    pub locations: ExtraLocations,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripDetailEvent {
    TripLoaded(TripId),
    TripFailed(TripId),
    EncountersLoaded { trip_id: TripId, count: usize },
    EncountersFailed(TripId),
    ExtraLocationsLoaded { creature: String },
    StaleResponseDiscarded { creature: String },
}

struct DetailState {
    trip_id: Option<TripId>,
    navigation_epoch: u64,
    trip: LoadState<TripDetails>,
    encounters: LoadState<Vec<EncounterRow>>,
    sort: SortState,
    modal: Option<ModalState>,
    selection_epoch: u64,
}

/// Identifies one issued request; a response is applied only while the
/// ticket still matches the current state.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    trip_id: TripId,
    epoch: u64,
}

pub struct TripDetailView {
    api: Arc<dyn TripApi>,
    inner: Mutex<DetailState>,
    events: broadcast::Sender<TripDetailEvent>,
}

impl TripDetailView {
    pub fn new(api: Arc<dyn TripApi>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            api,
            inner: Mutex::new(DetailState {
                trip_id: None,
                navigation_epoch: 0,
                trip: LoadState::Loading,
                encounters: LoadState::Loading,
                sort: SortState::default(),
                modal: None,
                selection_epoch: 0,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TripDetailEvent> {
        self.events.subscribe()
    }

    /// Shows `trip_id`, discarding whatever the view held before, and starts
    /// the trip and encounter loads.
    pub async fn navigate(self: &Arc<Self>, trip_id: TripId) {
        let ticket = {
            let mut guard = self.inner.lock().await;
            guard.navigation_epoch += 1;
            guard.selection_epoch += 1;
            guard.trip_id = Some(trip_id);
            guard.trip = LoadState::Loading;
            guard.encounters = LoadState::Loading;
            guard.sort = SortState::default();
            guard.modal = None;
            Ticket {
                trip_id,
                epoch: guard.navigation_epoch,
            }
        };
        info!(trip_id = trip_id.0, "trip: loading detail view");
        self.spawn_trip_load(ticket);
        self.spawn_encounter_load(ticket);
    }

    fn spawn_trip_load(self: &Arc<Self>, ticket: Ticket) {
        let view = Arc::clone(self);
        tokio::spawn(async move {
            let result = view.api.get_trip(ticket.trip_id).await;
            let event = {
                let mut guard = view.inner.lock().await;
                if guard.navigation_epoch != ticket.epoch {
                    debug!(
                        trip_id = ticket.trip_id.0,
                        "trip: dropping response for previous trip"
                    );
                    return;
                }
                match result {
                    Ok(trip) => {
                        info!(trip_id = trip.id.0, stops = trip.stops.len(), "trip: loaded");
                        guard.trip = LoadState::Loaded(trip);
                        TripDetailEvent::TripLoaded(ticket.trip_id)
                    }
                    Err(err) => {
                        error!(trip_id = ticket.trip_id.0, "trip: load failed: {err}");
                        guard.trip = LoadState::Failed(TRIP_LOAD_FAILED.to_string());
                        TripDetailEvent::TripFailed(ticket.trip_id)
                    }
                }
            };
            let _ = view.events.send(event);
        });
    }

    fn spawn_encounter_load(self: &Arc<Self>, ticket: Ticket) {
        let view = Arc::clone(self);
        tokio::spawn(async move {
            let result = view.api.trip_encounters(ticket.trip_id).await;
            let event = {
                let mut guard = view.inner.lock().await;
                if guard.navigation_epoch != ticket.epoch {
                    debug!(
                        trip_id = ticket.trip_id.0,
                        "encounters: dropping response for previous trip"
                    );
                    return;
                }
                match result {
                    Ok(rows) => {
                        let count = rows.len();
                        info!(trip_id = ticket.trip_id.0, count, "encounters: loaded");
                        guard.encounters = LoadState::Loaded(rows);
                        TripDetailEvent::EncountersLoaded {
                            trip_id: ticket.trip_id,
                            count,
                        }
                    }
                    Err(err) => {
                        warn!(trip_id = ticket.trip_id.0, "encounters: load failed: {err}");
                        guard.encounters = LoadState::Failed(err.to_string());
                        TripDetailEvent::EncountersFailed(ticket.trip_id)
                    }
                }
            };
            let _ = view.events.send(event);
        });
    }

    /// Row click. Opens the overlay for `creature` and fetches its locations
    /// outside the trip. Ignored until the trip itself has loaded.
    pub async fn select_creature(self: &Arc<Self>, creature: &str) -> bool {
        let ticket = {
            let mut guard = self.inner.lock().await;
            let LoadState::Loaded(trip) = &guard.trip else {
                return false;
            };
            let trip_id = trip.id;
            guard.selection_epoch += 1;
            guard.modal = Some(ModalState {
                creature: creature.to_string(),
                locations: ExtraLocations::Loading,
            });
            Ticket {
                trip_id,
                epoch: guard.selection_epoch,
            }
        };

        let view = Arc::clone(self);
        let creature = creature.to_string();
        tokio::spawn(async move {
            let result = view.api.extra_locations(&creature, ticket.trip_id).await;
            let event = {
                let mut guard = view.inner.lock().await;
                let still_selected = guard.selection_epoch == ticket.epoch
                    && guard
                        .modal
                        .as_ref()
                        .is_some_and(|modal| modal.creature == creature);
                if !still_selected {
                    info!(%creature, "modal: discarding stale extra locations");
                    TripDetailEvent::StaleResponseDiscarded { creature }
                } else {
                    let locations = match result {
                        Ok(locations) => locations,
                        Err(err) => {
                            warn!(
                                %creature,
                                trip_id = ticket.trip_id.0,
                                "modal: extra locations failed: {err}"
                            );
                            Vec::new()
                        }
                    };
                    guard.modal = Some(ModalState {
                        creature: creature.clone(),
                        locations: ExtraLocations::Loaded(locations),
                    });
                    TripDetailEvent::ExtraLocationsLoaded { creature }
                }
            };
            let _ = view.events.send(event);
        });
        true
    }

    pub async fn close_modal(&self) {
        let mut guard = self.inner.lock().await;
        guard.selection_epoch += 1;
        guard.modal = None;
    }

    pub async fn click_header(&self, column: SortColumn) {
        self.inner.lock().await.sort.click(column);
    }

    /// True once nothing the page shows is still loading.
    pub async fn is_settled(&self) -> bool {
        let guard = self.inner.lock().await;
        match &guard.trip {
            LoadState::Loading => false,
            LoadState::Failed(_) => true,
            LoadState::Loaded(_) => {
                !guard.encounters.is_loading()
                    && !matches!(
                        guard.modal,
                        Some(ModalState {
                            locations: ExtraLocations::Loading,
                            ..
                        })
                    )
            }
        }
    }

    pub async fn page(&self) -> TripPage {
        let guard = self.inner.lock().await;
        match &guard.trip {
            LoadState::Loading => TripPage::Loading,
            LoadState::Failed(message) => TripPage::Failed {
                message: message.clone(),
            },
            LoadState::Loaded(trip) => {
                let encounters = match &guard.encounters {
                    LoadState::Loading => EncounterSection::Loading,
                    LoadState::Loaded(rows) => EncounterSection::Table(guard.sort.render(rows)),
                    LoadState::Failed(_) => EncounterSection::Table(guard.sort.render(&[])),
                };
                TripPage::Ready(TripOverview {
                    trip: trip.clone(),
                    encounters,
                    modal: guard.modal.clone(),
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TripPage {
    Loading,
    Failed { message: String },
    Ready(TripOverview),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripOverview {
    pub trip: TripDetails,
    pub encounters: EncounterSection,
    pub modal: Option<ModalState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncounterSection {
    Loading,
    Table(EncounterTable),
}

impl fmt::Display for TripPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => writeln!(f, "Loading trip..."),
            Self::Failed { message } => writeln!(f, "{message}"),
            Self::Ready(overview) => write!(f, "{overview}"),
        }
    }
}

impl fmt::Display for TripOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trip = &self.trip;
        writeln!(f, "{}", trip.name)?;
        if let Some(description) = trip.description.as_deref().filter(|d| !d.is_empty()) {
            writeln!(f, "{description}")?;
        }
        let span = if trip.stops.is_empty() {
            "No stops".to_string()
        } else {
            format_days(trip.span_days())
        };
        writeln!(
            f,
            "{} ({span})",
            format_date_range(trip.start_date, trip.end_date)
        )?;

        writeln!(f)?;
        writeln!(f, "Stops")?;
        if trip.stops.is_empty() {
            writeln!(f, "No stops yet.")?;
        }
        for stop in trip.stops_in_order() {
            writeln!(
                f,
                "#{} – {} ({}, {})",
                stop.order,
                stop.location_area_name,
                format_date(stop.arrival_date),
                format_days(i64::from(stop.duration_days))
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Pokémon encounters")?;
        match &self.encounters {
            EncounterSection::Loading => writeln!(f, "Loading Pokémon data…")?,
            EncounterSection::Table(table) => write!(f, "{table}")?,
        }

        if let Some(modal) = &self.modal {
            writeln!(f)?;
            write!(f, "{modal}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ModalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Other locations for {}", self.creature)?;
        match &self.locations {
            ExtraLocations::Loading => writeln!(f, "Loading…"),
            ExtraLocations::Loaded(locations) if locations.is_empty() => {
                writeln!(f, "No other locations found outside this trip.")
            }
            ExtraLocations::Loaded(locations) => {
                for location in locations {
                    writeln!(f, "- {}", location.location_area_name)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/trip_detail_tests.rs"]
mod tests;
