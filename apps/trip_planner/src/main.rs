use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use client_core::{
    format::{format_date, format_days},
    load_settings, trip_draft::StopPatch, ClientSettings, CreateTripSession, HttpTripApi,
    SearchSnapshot, SortColumn, TripApi, TripDetailView, TripDirectory,
};
use shared::domain::TripId;
use tokio::sync::{broadcast::error::RecvError, watch};
use tracing::{info, warn};

/// Upper bound on waiting for a search to settle after typing.
const SEARCH_SETTLE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Parser, Debug)]
#[command(about = "Plan trips and see which Pokémon you can meet along the way")]
struct Args {
    /// Overrides the configured trip service URL.
    #[arg(long)]
    api_base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List saved trips.
    Trips,
    /// Show a trip with its stops and encounter table.
    Show {
        id: i64,
        /// Header click; repeat to click several times.
        #[arg(long = "sort")]
        sort: Vec<SortColumn>,
        /// Open the "other locations" overlay for this Pokémon.
        #[arg(long)]
        pokemon: Option<String>,
    },
    /// Search location areas.
    Search { query: String },
    /// Create a trip from searched stops, then show it.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// QUERY[@YYYY-MM-DD][+DAYS]
        #[arg(long = "stop", required = true)]
        stops: Vec<StopArg>,
    },
}

#[derive(Debug, Clone)]
struct StopArg {
    query: String,
    arrival_date: Option<NaiveDate>,
    duration_days: Option<u32>,
}

impl std::str::FromStr for StopArg {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (rest, duration_days) = match raw.rsplit_once('+') {
            Some((rest, days)) => {
                let days = days
                    .trim()
                    .parse::<u32>()
                    .map_err(|err| format!("invalid duration '{days}': {err}"))?;
                (rest, Some(days))
            }
            None => (raw, None),
        };
        let (query, arrival_date) = match rest.rsplit_once('@') {
            Some((query, date)) => {
                let date = date
                    .trim()
                    .parse::<NaiveDate>()
                    .map_err(|err| format!("invalid arrival date '{date}': {err}"))?;
                (query, Some(date))
            }
            None => (rest, None),
        };
        let query = query.trim();
        if query.is_empty() {
            return Err("stop query must not be empty".to_string());
        }
        Ok(Self {
            query: query.to_string(),
            arrival_date,
            duration_days,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(url) = args.api_base_url {
        settings.api_base_url = client_core::config::normalize_base_url(&url);
    }
    let api: Arc<dyn TripApi> = Arc::new(build_api(&settings)?);
    info!(api_base_url = %settings.api_base_url, "trip planner starting");

    match args.command {
        Command::Trips => {
            print!("{}", TripDirectory::load(api.as_ref()).await);
        }
        Command::Show { id, sort, pokemon } => {
            show_trip(api, TripId(id), &sort, pokemon.as_deref()).await?;
        }
        Command::Search { query } => {
            let mut session = CreateTripSession::new(api, &settings);
            let snapshot = type_and_wait(&mut session, &query).await?;
            if snapshot.candidates.is_empty() {
                println!("No matching location areas.");
            }
            for (index, candidate) in snapshot.candidates.iter().enumerate() {
                println!("{index}: {} ({})", candidate.name, candidate.slug);
            }
        }
        Command::Create {
            name,
            description,
            stops,
        } => {
            let trip_id = create_trip(Arc::clone(&api), &settings, name, description, stops).await?;
            show_trip(api, trip_id, &[], None).await?;
        }
    }

    Ok(())
}

fn build_api(settings: &ClientSettings) -> Result<HttpTripApi> {
    let api = match settings.request_timeout() {
        Some(timeout) => HttpTripApi::with_timeout(&settings.api_base_url, timeout),
        None => HttpTripApi::new(&settings.api_base_url),
    };
    api.with_context(|| format!("invalid api base url '{}'", settings.api_base_url))
}

/// Types `query` into the search box and waits for the debounced request to
/// come back.
async fn type_and_wait(session: &mut CreateTripSession, query: &str) -> Result<SearchSnapshot> {
    let mut updates: watch::Receiver<SearchSnapshot> = session.search.subscribe();
    let finished_before = updates.borrow().finished_requests();
    session.search.input(query);
    if query.trim().is_empty() {
        return Ok(session.search.snapshot());
    }
    let settled = tokio::time::timeout(
        SEARCH_SETTLE_TIMEOUT,
        updates.wait_for(|snapshot| {
            snapshot.finished_requests() > finished_before && !snapshot.loading()
        }),
    )
    .await
    .map_err(|_| anyhow!("location search for '{query}' did not finish in time"))?
    .context("location search stopped unexpectedly")?;
    Ok(settled.clone())
}

async fn create_trip(
    api: Arc<dyn TripApi>,
    settings: &ClientSettings,
    name: String,
    description: Option<String>,
    stops: Vec<StopArg>,
) -> Result<TripId> {
    let mut session = CreateTripSession::new(api, settings);
    session.draft.name = name;
    session.draft.description = description.unwrap_or_default();

    for stop in stops {
        let snapshot = type_and_wait(&mut session, &stop.query).await?;
        if snapshot.candidates.is_empty() {
            bail!("no location area matches '{}'", stop.query);
        }
        let Some(temporary_id) = session.select_candidate(0) else {
            bail!("could not add a stop for '{}'", stop.query);
        };
        let patch = StopPatch {
            arrival_date: stop.arrival_date,
            duration_days: stop.duration_days,
        };
        session.draft.update(temporary_id, patch);
        if let Some(added) = session.draft.stops().last() {
            println!(
                "#{} – {} ({}, {})",
                added.order(),
                added.location_name,
                format_date(added.arrival_date),
                format_days(i64::from(added.duration_days))
            );
        }
    }

    match session.submit().await {
        Ok(trip_id) => Ok(trip_id),
        Err(err) => {
            warn!("trip creation rejected: {err}");
            bail!(session.error().unwrap_or("Failed to create trip").to_string())
        }
    }
}

async fn show_trip(
    api: Arc<dyn TripApi>,
    trip_id: TripId,
    sort: &[SortColumn],
    pokemon: Option<&str>,
) -> Result<()> {
    let view = TripDetailView::new(api);
    let mut events = view.subscribe_events();
    view.navigate(trip_id).await;
    wait_until_settled(&view, &mut events).await;

    for column in sort {
        view.click_header(*column).await;
    }
    if let Some(name) = pokemon {
        if view.select_creature(name).await {
            wait_until_settled(&view, &mut events).await;
        } else {
            warn!(pokemon = name, "trip is not loaded; skipping other locations");
        }
    }

    print!("{}", view.page().await);
    Ok(())
}

async fn wait_until_settled(
    view: &TripDetailView,
    events: &mut tokio::sync::broadcast::Receiver<client_core::TripDetailEvent>,
) {
    while !view.is_settled().await {
        match events.recv().await {
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}
