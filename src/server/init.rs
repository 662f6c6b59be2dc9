/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP
 * server, including state creation, database loading, and route
 * configuration.
 *
 * # Initialization Process
 *
 * 1. Load the optional PostgreSQL pool and pick the store backend
 * 2. Build the token verifier from the environment
 * 3. Assemble `AppState` (registry, broadcaster, presence, store)
 * 4. Create and configure the router
 *
 * # Error Handling
 *
 * The function is designed to be resilient: a missing or unreachable
 * database downgrades the server to the in-memory store instead of
 * aborting startup. Chat history then lives only for the process
 * lifetime, which is acceptable for local development.
 */

use axum::Router;
use std::sync::Arc;

use crate::auth::JwtVerifier;
use crate::chat::store::{ConversationStore, MemoryStore, PgStore};
use crate::routes::create_router;
use crate::server::config::load_database;
use crate::server::state::AppState;

/// Create and configure the Axum application
pub async fn create_app() -> Router<()> {
    tracing::info!("Initializing XFChat server");

    let store: Arc<dyn ConversationStore> = match load_database().await {
        Some(pool) => Arc::new(PgStore::new(pool)),
        None => {
            tracing::warn!("Running with in-memory store; chat history will not survive restarts");
            Arc::new(MemoryStore::new())
        }
    };

    let verifier = Arc::new(JwtVerifier::from_env());
    let app_state = AppState::new(store, verifier);

    tracing::info!("Session registry and broadcaster initialized");

    create_router(app_state)
}
