use std::{collections::HashMap, sync::Arc};

use super::*;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use shared::protocol::TripLocationCreate;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    seen: Arc<Mutex<Vec<String>>>,
    created: Arc<Mutex<Vec<TripCreate>>>,
}

fn sample_trip(id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": "Kanto loop",
        "description": null,
        "start_date": "2024-05-01",
        "end_date": "2024-05-02",
        "stops": [{
            "id": 1,
            "location_area_name": "Viridian Forest",
            "location_area_slug": "viridian-forest-area",
            "arrival_date": "2024-05-01",
            "duration_days": 2,
            "order": 1
        }]
    })
}

async fn handle_list_trips(State(state): State<ServerState>) -> Json<serde_json::Value> {
    state.seen.lock().await.push("GET /trips".into());
    Json(serde_json::json!([{
        "id": 3,
        "name": "Kanto loop",
        "description": "first run",
        "start_date": "2024-05-01",
        "end_date": "2024-05-03",
        "duration_days": 3
    }]))
}

async fn handle_create_trip(
    State(state): State<ServerState>,
    Json(payload): Json<TripCreate>,
) -> Json<serde_json::Value> {
    state.created.lock().await.push(payload);
    Json(sample_trip(42))
}

async fn handle_get_trip(Path(id): Path<i64>) -> Result<Json<serde_json::Value>, StatusCode> {
    if id == 5 {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(sample_trip(id)))
}

async fn handle_encounters(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Json<serde_json::Value> {
    state.seen.lock().await.push(format!("GET /trips/{id}/pokemon"));
    Json(serde_json::json!([{
        "name": "pidgey",
        "max_chance": 40,
        "locations_in_trip": ["route-1-area"],
        "encounter_methods": ["walk"],
        "encounter_conditions": []
    }]))
}

async fn handle_search(
    State(state): State<ServerState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let q = params.get("q").cloned().unwrap_or_default();
    let limit = params.get("limit").cloned().unwrap_or_default();
    state.seen.lock().await.push(format!("search q={q} limit={limit}"));
    Json(serde_json::json!([{
        "name": "Route 1",
        "slug": "kanto-route-1-area",
        "url": "https://pokeapi.co/api/v2/location-area/295/"
    }]))
}

async fn handle_extra_locations(
    State(state): State<ServerState>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let trip_id = params.get("trip_id").cloned().unwrap_or_default();
    state
        .seen
        .lock()
        .await
        .push(format!("extra name={name} trip_id={trip_id}"));
    if name == "missingno" {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"detail": "Pokemon not found"})),
        );
    }
    (
        StatusCode::OK,
        Json(serde_json::json!([{
            "location_area_name": "Safari Zone",
            "location_area_url": "https://pokeapi.co/api/v2/location-area/100/"
        }])),
    )
}

async fn spawn_trip_server() -> (String, ServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = ServerState::default();
    let app = Router::new()
        .route("/trips", get(handle_list_trips).post(handle_create_trip))
        .route("/trips/:id", get(handle_get_trip))
        .route("/trips/:id/pokemon", get(handle_encounters))
        .route("/locations/search", get(handle_search))
        .route("/pokemon/:name/extra-locations", get(handle_extra_locations))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

#[test]
fn rejects_non_http_base_url() {
    assert!(HttpTripApi::new("ftp://example.com").is_err());
    assert!(HttpTripApi::new("not a url").is_err());
}

#[tokio::test]
async fn lists_trips() {
    let (server_url, state) = spawn_trip_server().await;
    let api = HttpTripApi::new(&server_url).expect("api");

    let trips = api.list_trips().await.expect("list");

    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].id, TripId(3));
    assert_eq!(trips[0].duration_days, 3);
    assert_eq!(state.seen.lock().await.as_slice(), ["GET /trips"]);
}

#[tokio::test]
async fn create_trip_posts_payload() {
    let (server_url, state) = spawn_trip_server().await;
    let api = HttpTripApi::new(&format!("{server_url}/")).expect("api");
    let payload = TripCreate {
        name: "Kanto loop".into(),
        description: None,
        stops: vec![TripLocationCreate {
            location_area_name: "Viridian Forest".into(),
            location_area_slug: "viridian-forest-area".into(),
            arrival_date: "2024-05-01".parse().expect("date"),
            duration_days: 2,
            order: 1,
        }],
    };

    let created = api.create_trip(&payload).await.expect("create");

    assert_eq!(created.id, TripId(42));
    assert_eq!(state.created.lock().await.as_slice(), [payload]);
}

#[tokio::test]
async fn get_trip_maps_server_error_to_status() {
    let (server_url, _state) = spawn_trip_server().await;
    let api = HttpTripApi::new(&server_url).expect("api");

    let trip = api.get_trip(TripId(7)).await.expect("trip");
    assert_eq!(trip.stops.len(), 1);

    let err = api.get_trip(TripId(5)).await.expect_err("must fail");
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.operation(), "get_trip");
}

#[tokio::test]
async fn trip_encounters_uses_pokemon_path() {
    let (server_url, state) = spawn_trip_server().await;
    let api = HttpTripApi::new(&server_url).expect("api");

    let rows = api.trip_encounters(TripId(9)).await.expect("rows");

    assert_eq!(rows[0].name, "pidgey");
    assert_eq!(rows[0].max_chance, 40.0);
    assert_eq!(state.seen.lock().await.as_slice(), ["GET /trips/9/pokemon"]);
}

#[tokio::test]
async fn search_sends_query_and_limit() {
    let (server_url, state) = spawn_trip_server().await;
    let api = HttpTripApi::new(&server_url).expect("api");

    let candidates = api.search_locations("route 1", 10).await.expect("search");

    assert_eq!(candidates[0].slug, "kanto-route-1-area");
    assert_eq!(
        state.seen.lock().await.as_slice(),
        ["search q=route 1 limit=10"]
    );
}

#[tokio::test]
async fn extra_locations_scopes_to_trip_and_surfaces_detail() {
    let (server_url, state) = spawn_trip_server().await;
    let api = HttpTripApi::new(&server_url).expect("api");

    let locations = api
        .extra_locations("pikachu", TripId(4))
        .await
        .expect("extra");
    assert_eq!(locations[0].location_area_name, "Safari Zone");

    let err = api
        .extra_locations("missingno", TripId(4))
        .await
        .expect_err("must fail");
    match err {
        CollaboratorError::Status {
            status, message, ..
        } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Pokemon not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(
        state.seen.lock().await.as_slice(),
        [
            "extra name=pikachu trip_id=4",
            "extra name=missingno trip_id=4"
        ]
    );
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let api = HttpTripApi::new(&format!("http://{addr}")).expect("api");

    let err = api.list_trips().await.expect_err("must fail");
    assert!(matches!(err, CollaboratorError::Transport { .. }));
}
