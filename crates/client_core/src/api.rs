use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{LocationCandidate, TripId},
    error::ErrorDetail,
    protocol::{EncounterRow, ExtraLocation, TripCreate, TripDetails, TripSummary},
};
use tracing::debug;
use url::Url;

use crate::error::CollaboratorError;

/// HTTP contract of the trip service.
#[async_trait]
pub trait TripApi: Send + Sync {
    async fn list_trips(&self) -> Result<Vec<TripSummary>, CollaboratorError>;
    async fn create_trip(&self, payload: &TripCreate) -> Result<TripDetails, CollaboratorError>;
    async fn get_trip(&self, trip_id: TripId) -> Result<TripDetails, CollaboratorError>;
    async fn trip_encounters(&self, trip_id: TripId)
        -> Result<Vec<EncounterRow>, CollaboratorError>;
    async fn search_locations(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<LocationCandidate>, CollaboratorError>;
    async fn extra_locations(
        &self,
        creature: &str,
        trip_id: TripId,
    ) -> Result<Vec<ExtraLocation>, CollaboratorError>;
}

pub struct HttpTripApi {
    http: Client,
    base_url: Url,
}

impl HttpTripApi {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, http)
    }

    fn with_client(base_url: &str, http: Client) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            anyhow::bail!("api base url must be an http:// or https:// url: {base_url}");
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

async fn decode<T: DeserializeOwned>(
    operation: &'static str,
    sent: Result<Response, reqwest::Error>,
) -> Result<T, CollaboratorError> {
    let response = sent.map_err(|source| CollaboratorError::Transport { operation, source })?;
    let status = response.status();
    if !status.is_success() {
        let fallback = status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
        let message = match response.json::<ErrorDetail>().await {
            Ok(body) => body.message(),
            Err(_) => fallback,
        };
        return Err(CollaboratorError::Status {
            operation,
            status: status.as_u16(),
            message,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|source| CollaboratorError::Decode { operation, source })
}

#[async_trait]
impl TripApi for HttpTripApi {
    async fn list_trips(&self) -> Result<Vec<TripSummary>, CollaboratorError> {
        let url = self.endpoint(&["trips"]);
        debug!(%url, "api: list trips");
        decode("list_trips", self.http.get(url).send().await).await
    }

    async fn create_trip(&self, payload: &TripCreate) -> Result<TripDetails, CollaboratorError> {
        let url = self.endpoint(&["trips"]);
        debug!(%url, stops = payload.stops.len(), "api: create trip");
        decode("create_trip", self.http.post(url).json(payload).send().await).await
    }

    async fn get_trip(&self, trip_id: TripId) -> Result<TripDetails, CollaboratorError> {
        let id = trip_id.to_string();
        let url = self.endpoint(&["trips", &id]);
        debug!(%url, "api: get trip");
        decode("get_trip", self.http.get(url).send().await).await
    }

    async fn trip_encounters(
        &self,
        trip_id: TripId,
    ) -> Result<Vec<EncounterRow>, CollaboratorError> {
        let id = trip_id.to_string();
        let url = self.endpoint(&["trips", &id, "pokemon"]);
        debug!(%url, "api: trip encounters");
        decode("trip_encounters", self.http.get(url).send().await).await
    }

    async fn search_locations(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<LocationCandidate>, CollaboratorError> {
        let url = self.endpoint(&["locations", "search"]);
        debug!(%url, query, limit, "api: search locations");
        let sent = self
            .http
            .get(url)
            .query(&[("q", query.to_string()), ("limit", limit.to_string())])
            .send()
            .await;
        decode("search_locations", sent).await
    }

    async fn extra_locations(
        &self,
        creature: &str,
        trip_id: TripId,
    ) -> Result<Vec<ExtraLocation>, CollaboratorError> {
        let url = self.endpoint(&["pokemon", creature, "extra-locations"]);
        debug!(%url, trip_id = trip_id.0, "api: extra locations");
        let sent = self
            .http
            .get(url)
            .query(&[("trip_id", trip_id.0)])
            .send()
            .await;
        decode("extra_locations", sent).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
