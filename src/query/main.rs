//! Query server for location lookups.
//!
//! Provides an HTTP API that resolves partial place descriptions to
//! coordinates, fingerprints requests, and resets the reference tables.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use georef::{Config, Coordinates, ErrorKind, Gazetteer, GazetteerError, LocationRequest, TableStats};

mod cache;
use cache::LookupCache;

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Location lookup server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database URL (overrides the configuration file)
    #[arg(long)]
    database_url: Option<String>,

    /// Load every reference table before accepting requests
    #[arg(long)]
    preload: bool,

    /// Most lookup results kept in memory
    #[arg(long, default_value_t = 10_000)]
    cache_capacity: usize,
}

/// Application state shared across handlers
struct AppState {
    gazetteer: Gazetteer,
    cache: LookupCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(url) = args.database_url {
        config.database.url = url;
    }

    info!("Georef Query Server");

    let gazetteer = Gazetteer::connect(&config)
        .await
        .context("Failed to connect to the reference store")?;

    if args.preload {
        gazetteer
            .ensure_all_loaded()
            .await
            .context("Failed to load reference tables")?;
    }

    let state = Arc::new(AppState {
        gazetteer,
        cache: LookupCache::new(args.cache_capacity),
    });

    let app = router(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/lookup", post(lookup_handler))
        .route("/fingerprint", post(fingerprint_handler))
        .route("/reset", post(reset_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Map a library error onto one of the three response classes.
fn error_response(e: GazetteerError) -> (StatusCode, String) {
    match e.kind() {
        ErrorKind::InvalidRequest => (StatusCode::BAD_REQUEST, e.to_string()),
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, e.to_string()),
        ErrorKind::Internal => {
            error!("Request failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Resolve a location to coordinates
async fn lookup_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LocationRequest>,
) -> Result<Json<Coordinates>, (StatusCode, String)> {
    let key = state.gazetteer.lookup_key(&request);
    if let Some(coordinates) = state.cache.get(&key) {
        debug!("Cache hit for {}", key);
        return Ok(Json(coordinates));
    }

    let generation = state.cache.generation();
    let coordinates = state
        .gazetteer
        .resolve(&request)
        .await
        .map_err(error_response)?;
    if !state.cache.insert(generation, key, coordinates) {
        debug!("Reset during lookup, result not cached");
    }

    Ok(Json(coordinates))
}

#[derive(Serialize)]
struct FingerprintResponse {
    fingerprint: String,
}

async fn fingerprint_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LocationRequest>,
) -> Json<FingerprintResponse> {
    Json(FingerprintResponse {
        fingerprint: state.gazetteer.fingerprint(&request),
    })
}

/// Truncate and reload every reference table
async fn reset_handler(
    State(state): State<Arc<AppState>>,
) -> Result<&'static str, (StatusCode, String)> {
    state.cache.clear();
    let result = state.gazetteer.reset_all().await;
    state.cache.clear();
    result.map_err(error_response)?;
    Ok("All tables reset")
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tables: Option<TableStats>,
    cached_lookups: usize,
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let tables = match state.gazetteer.stats().await {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!("Health check could not read table stats: {}", e);
            None
        }
    };

    Json(HealthResponse {
        status: if tables.is_some() { "ok" } else { "degraded" },
        tables,
        cached_lookups: state.cache.len(),
    })
}
