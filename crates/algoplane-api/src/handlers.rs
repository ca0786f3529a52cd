//! REST API handlers.
//!
//! Each handler reads/writes via `StateStore` and returns JSON. Request
//! bodies are decoded as raw JSON first so that malformed or
//! wrongly-typed bodies produce the `{code, message}` envelope instead
//! of the extractor's default rejection.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::debug;

use algoplane_state::{
    AlgorithmStatusPatch, ClientPatch, NewAlgorithmStatus, NewClient, StateError,
};

use crate::ApiState;

/// The `{code, message}` envelope used for errors and simple acks.
#[derive(serde::Serialize)]
struct Envelope {
    code: u16,
    message: String,
}

fn envelope(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(Envelope {
            code: status.as_u16(),
            message: message.into(),
        }),
    )
        .into_response()
}

fn store_error(e: StateError) -> Response {
    if e.is_not_found() {
        envelope(StatusCode::NOT_FOUND, e.to_string())
    } else {
        envelope(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

fn parse_id(raw: &str) -> Result<u64, Response> {
    raw.parse()
        .map_err(|_| envelope(StatusCode::BAD_REQUEST, format!("invalid id: {raw}")))
}

fn decode<T: serde::de::DeserializeOwned>(body: serde_json::Value) -> Result<T, Response> {
    serde_json::from_value(body).map_err(|e| envelope(StatusCode::BAD_REQUEST, e.to_string()))
}

// ── Root ───────────────────────────────────────────────────────────

/// GET /
pub async fn index() -> Response {
    envelope(StatusCode::OK, "application running")
}

/// Fallback for unknown routes.
pub async fn no_route() -> Response {
    envelope(StatusCode::NOT_FOUND, "route not found")
}

// ── Clients ────────────────────────────────────────────────────────

/// POST /api/client/add
pub async fn add_client(
    State(state): State<ApiState>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let new: NewClient = match decode(body) {
        Ok(new) => new,
        Err(resp) => return resp,
    };

    match state.store.create_client(&new) {
        Ok(client) => {
            debug!(client_id = client.id, name = %client.name, "client registered");
            Json(serde_json::json!({
                "id": client.id,
                "message": "client registered",
            }))
            .into_response()
        }
        Err(e) => store_error(e),
    }
}

/// GET /api/client
pub async fn list_clients(State(state): State<ApiState>) -> Response {
    match state.store.list_clients() {
        Ok(clients) => Json(clients).into_response(),
        Err(e) => store_error(e),
    }
}

/// PATCH /api/client/{id}
pub async fn update_client(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let patch: ClientPatch = match decode(body) {
        Ok(patch) => patch,
        Err(resp) => return resp,
    };

    match state.store.update_client(id, &patch) {
        Ok(_) => Json(serde_json::json!({
            "id": id,
            "message": "client updated",
        }))
        .into_response(),
        Err(e) => store_error(e),
    }
}

/// DELETE /api/client/{id}
pub async fn delete_client(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.store.delete_client(id) {
        Ok(true) => Json(serde_json::json!({
            "id": id,
            "message": "client deleted",
        }))
        .into_response(),
        Ok(false) => envelope(StatusCode::NOT_FOUND, format!("client {id} not found")),
        Err(e) => store_error(e),
    }
}

// ── Algorithm statuses ─────────────────────────────────────────────

/// POST /api/client/algorithm/create
pub async fn create_algorithm_status(
    State(state): State<ApiState>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let new: NewAlgorithmStatus = match decode(body) {
        Ok(new) => new,
        Err(resp) => return resp,
    };

    match state.store.create_algorithm_status(&new) {
        Ok(status) => Json(status).into_response(),
        Err(e) => store_error(e),
    }
}

/// PATCH /api/client/algorithm/{id}
pub async fn update_algorithm_status(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let patch: AlgorithmStatusPatch = match decode(body) {
        Ok(patch) => patch,
        Err(resp) => return resp,
    };

    match state.store.update_algorithm_status(id, &patch) {
        Ok(_) => Json(serde_json::json!({
            "id": id,
            "message": "algorithm status updated",
        }))
        .into_response(),
        Err(e) => store_error(e),
    }
}
