//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{
    AgentView, AgentsQuery, ErrorResponse, StateResponse, TelemetryQuery, TelemetryRecord,
};

/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(StateResponse {
        config: state.config.clone(),
        kpi: state.kpi.clone(),
        latest_tick: state.ticks.last().map(TelemetryRecord::from),
    })
}

/// Returns station snapshots, optionally filtered by tick range.
///
/// `GET /telemetry` → 200 + `Vec<TelemetryRecord>` JSON
/// `GET /telemetry?from=N&to=M` → filtered range (inclusive)
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let records: Vec<TelemetryRecord> = state
        .ticks
        .iter()
        .filter(|r| (from..=to).contains(&r.tick))
        .map(TelemetryRecord::from)
        .collect();

    Ok(Json(records))
}

/// Returns vehicle snapshots of one tick, or of every tick.
///
/// `GET /agents` → 200 + `Vec<AgentView>` JSON
/// `GET /agents?tick=N` → snapshots of tick `N`
/// `GET /agents?tick=N` past the last tick → 404 + `ErrorResponse`
pub async fn get_agents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AgentsQuery>,
) -> impl IntoResponse {
    let Some(tick) = query.tick else {
        return Ok(Json(
            state.agents.iter().map(AgentView::from).collect::<Vec<_>>(),
        ));
    };

    if tick >= state.ticks.len() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("tick {tick} is outside the run (0..{})", state.ticks.len()),
            }),
        ));
    }

    Ok(Json(
        state
            .agents
            .iter()
            .filter(|a| a.tick == tick)
            .map(AgentView::from)
            .collect(),
    ))
}
