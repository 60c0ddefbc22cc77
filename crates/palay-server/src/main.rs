//! Palay Server - HTTP control plane for one simulation engine.
//!
//! Hosts a single owned [`Engine`] behind a small JSON API and drives it
//! at display-refresh cadence from a background task. The server relays
//! commands and snapshots; all simulation semantics live in the engine.

mod handlers;
mod state;

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use tokio::time::MissedTickBehavior;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use palay_engine::{Engine, SimParams};

use crate::state::AppState;

/// Engine drive cadence, roughly one display refresh.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Parser, Debug)]
#[command(name = "palay-server")]
#[command(about = "HTTP control plane for the rice-yield simulation engine")]
struct Cli {
    /// TCP address to bind the API server
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: SocketAddr,

    /// Random seed for reproducible simulation runs
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "palay_server=info,palay_engine=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let engine = match cli.seed {
        Some(seed) => Engine::with_seed(SimParams::default(), seed),
        None => Engine::new(SimParams::default()),
    };
    let state = AppState::new(engine);

    tokio::spawn(drive(state.clone()));

    let app = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/snapshot", get(handlers::snapshot))
        .route("/control", post(handlers::control))
        .route("/speed", post(handlers::speed))
        .route("/params", post(handlers::params))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = match tokio::net::TcpListener::bind(cli.bind).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed to bind {}: {err}", cli.bind);
            std::process::exit(1);
        }
    };

    info!("Palay server listening on http://{}", cli.bind);

    if let Err(err) = axum::serve(listener, app).await {
        error!("Server error: {err}");
    }
}

/// Feed elapsed wall time into the engine's fixed-step accumulator at
/// display-refresh cadence.
async fn drive(state: AppState) {
    let mut interval = tokio::time::interval(FRAME_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last = Instant::now();
    loop {
        interval.tick().await;
        let now = Instant::now();
        let elapsed = now - last;
        last = now;

        let mut engine = state.engine.lock().expect("engine mutex poisoned");
        engine.advance(elapsed);
    }
}
