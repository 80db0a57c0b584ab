//! Client-side state for building trips and browsing their encounters
//! against the trip service's HTTP API.

pub mod api;
pub mod config;
pub mod create_trip;
pub mod error;
pub mod format;
pub mod search;
pub mod table;
pub mod trip_detail;
pub mod trip_draft;
pub mod trips;

pub use api::{HttpTripApi, TripApi};
pub use config::{load_settings, ClientSettings};
pub use create_trip::CreateTripSession;
pub use error::{CollaboratorError, SubmitError, ValidationError};
pub use search::{LocationSearch, SearchSnapshot};
pub use table::{EncounterTable, SortColumn, SortDirection, SortState};
pub use trip_detail::{TripDetailEvent, TripDetailView, TripPage};
pub use trip_draft::{StopDraft, StopPatch, TempStopId, TripDraft};
pub use trips::TripDirectory;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
