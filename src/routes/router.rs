/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Details
 *
 * ## WebSocket Routes
 *
 * - `GET /ws/chat/{conversation_id}` - Upgrade to a chat connection.
 *   The credential travels as a `Authorization: Bearer` header or a
 *   `token` query parameter; authentication and authorization outcomes
 *   are reported through WebSocket close codes, not HTTP statuses.
 *
 * ## Operational Routes
 *
 * - `GET /health` - Liveness probe
 *
 * ## Fallback
 *
 * The fallback handler returns 404 for unknown routes.
 */

use axum::{http::StatusCode, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::chat::handler::chat_ws_upgrade;
use crate::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    Router::new()
        .route("/ws/chat/{conversation_id}", get(chat_ws_upgrade))
        .route("/health", get(health))
        .fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") })
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn health() -> &'static str {
    "ok"
}
