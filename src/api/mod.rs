//! REST API over a finished run.
//!
//! Provides three GET endpoints:
//! - `/state`: timing config, KPI report, and latest station snapshot
//! - `/telemetry`: station snapshots with optional tick range filtering
//! - `/agents`: per-vehicle snapshots, optionally for a single tick

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::sim::kpi::KpiReport;
use crate::sim::types::{AgentRecord, SimConfig, TickRecord};

pub use types::{AgentView, ErrorResponse, StateResponse, TelemetryRecord};

/// Read-only application state shared by all handlers.
pub struct AppState {
    /// Timing configuration of the run.
    pub config: SimConfig,
    pub kpi: KpiReport,
    /// Station snapshots, one per tick.
    pub ticks: Vec<TickRecord>,
    /// Agent snapshots, grouped by tick.
    pub agents: Vec<AgentRecord>,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/telemetry", get(handlers::get_telemetry))
        .route("/agents", get(handlers::get_agents))
        .with_state(state)
}

/// Binds to `addr` and serves the API until the process stops.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
