//! algoplane-api — REST API for algoplane.
//!
//! Provides axum route handlers for registering clients and toggling
//! their algorithm flags. Handlers only mutate the desired-state store;
//! the reconciler picks the changes up on its next tick.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Liveness message |
//! | POST | `/api/client/add` | Register a client (creates its status record) |
//! | GET | `/api/client` | List all clients |
//! | PATCH | `/api/client/{id}` | Partially update a client |
//! | DELETE | `/api/client/{id}` | Delete a client |
//! | POST | `/api/client/algorithm/create` | Create an algorithm status record |
//! | PATCH | `/api/client/algorithm/{id}` | Toggle algorithm flags by status id |
//!
//! Errors are returned as a `{code, message}` JSON envelope.

pub mod handlers;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use algoplane_state::StateStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
}

/// Build the complete API router.
pub fn build_router(store: StateStore) -> Router {
    let api_state = ApiState { store };

    let client_routes = Router::new()
        .route("/client/add", post(handlers::add_client))
        .route("/client", get(handlers::list_clients))
        .route(
            "/client/{id}",
            patch(handlers::update_client).delete(handlers::delete_client),
        )
        .route(
            "/client/algorithm/create",
            post(handlers::create_algorithm_status),
        )
        .route(
            "/client/algorithm/{id}",
            patch(handlers::update_algorithm_status),
        )
        .with_state(api_state);

    Router::new()
        .route("/", get(handlers::index))
        .nest("/api", client_routes)
        .fallback(handlers::no_route)
        .layer(CorsLayer::permissive())
}
