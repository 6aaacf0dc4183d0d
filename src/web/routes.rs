//! REST API routes for the web server.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::{SimCommand, SimState, WorldSnapshot};

use super::state::AppState;

/// How long a request waits for the tick thread to apply a placement
const PLACE_FOOD_TIMEOUT: Duration = Duration::from_secs(2);

/// Create the API router
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/config", get(get_config))
        .route("/api/place-food", post(place_food))
        // Simulation control
        .route("/api/sim/pause", post(pause))
        .route("/api/sim/resume", post(resume))
        .route("/api/sim/step", post(step))
        .route("/api/sim/save", post(save))
        // State
        .route("/api/state", get(get_state))
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

// --- Info ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    app_version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        app_version: crate::VERSION,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigResponse {
    state_update_interval: u64,
    grid_size: usize,
    max_food_count: usize,
    visibility_radius: f32,
    visibility_fov: f32,
    max_energy: f32,
}

async fn get_config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    let config = &state.config;
    Json(ConfigResponse {
        state_update_interval: config.simulation.tick_interval_ms,
        grid_size: config.world.grid_size,
        max_food_count: config.world.food_max_count,
        visibility_radius: round2(config.creatures.visibility_radius),
        visibility_fov: round2(config.creatures.visibility_fov),
        max_energy: config.creatures.max_energy,
    })
}

// --- Food placement ---

#[derive(Deserialize)]
struct PlaceFoodRequest {
    #[serde(default)]
    x: Value,
    #[serde(default)]
    y: Value,
}

#[derive(Serialize)]
struct PlaceFoodResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn place_food_response(status: StatusCode, error: Option<String>) -> Response {
    let body = PlaceFoodResponse {
        success: error.is_none(),
        error,
    };
    (status, Json(body)).into_response()
}

/// Finite JSON number floored to its cell coordinate
fn cell_coordinate(v: &Value) -> Option<i64> {
    v.as_f64().filter(|n| n.is_finite()).map(|n| n.floor() as i64)
}

async fn place_food(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlaceFoodRequest>, JsonRejection>,
) -> Response {
    let coords = payload
        .ok()
        .and_then(|Json(req)| Some((cell_coordinate(&req.x)?, cell_coordinate(&req.y)?)));
    let Some((x, y)) = coords else {
        return place_food_response(StatusCode::BAD_REQUEST, Some("Invalid coordinates".to_string()));
    };

    let Some(outcome) = state.request_place_food(x, y).await else {
        return place_food_response(StatusCode::SERVICE_UNAVAILABLE, Some("Simulation not running".to_string()));
    };

    let reply = tokio::task::spawn_blocking(move || outcome.recv_timeout(PLACE_FOOD_TIMEOUT)).await;
    match reply {
        Ok(Ok(Ok(()))) => {
            log::debug!("Placed food at ({}, {})", x, y);
            place_food_response(StatusCode::CREATED, None)
        }
        Ok(Ok(Err(e))) => place_food_response(StatusCode::BAD_REQUEST, Some(e.to_string())),
        _ => place_food_response(StatusCode::SERVICE_UNAVAILABLE, Some("Simulation did not respond".to_string())),
    }
}

// --- Simulation Control ---

async fn command(state: &AppState, command: SimCommand) -> StatusCode {
    if state.send_command(command).await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn pause(State(state): State<Arc<AppState>>) -> StatusCode {
    command(&state, SimCommand::Pause).await
}

async fn resume(State(state): State<Arc<AppState>>) -> StatusCode {
    command(&state, SimCommand::Resume).await
}

async fn step(State(state): State<Arc<AppState>>) -> StatusCode {
    command(&state, SimCommand::Step).await
}

async fn save(State(state): State<Arc<AppState>>) -> StatusCode {
    command(&state, SimCommand::Save).await
}

// --- State ---

#[derive(Serialize)]
struct StateResponse {
    state: SimState,
    snapshot: Option<WorldSnapshot>,
}

async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let sim_state = state.get_state().await;
    let snapshot = state.latest_snapshot().await.map(|s| (*s).clone());
    Json(StateResponse {
        state: sim_state,
        snapshot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_coordinate() {
        assert_eq!(cell_coordinate(&json!(3.7)), Some(3));
        assert_eq!(cell_coordinate(&json!(-0.5)), Some(-1));
        assert_eq!(cell_coordinate(&json!(12)), Some(12));
        assert_eq!(cell_coordinate(&json!("4")), None);
        assert_eq!(cell_coordinate(&Value::Null), None);
    }

    #[test]
    fn test_place_food_body() {
        let ok = serde_json::to_value(PlaceFoodResponse {
            success: true,
            error: None,
        })
        .unwrap();
        assert_eq!(ok, json!({ "success": true }));

        let rejected = serde_json::to_value(PlaceFoodResponse {
            success: false,
            error: Some("Cell is occupied".to_string()),
        })
        .unwrap();
        assert_eq!(rejected, json!({ "success": false, "error": "Cell is occupied" }));
    }
}
