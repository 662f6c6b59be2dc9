/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container for the
 * application, holding:
 * - The session registry of live chat connections
 * - The fan-out broadcaster and presence tracker built on top of it
 * - The conversation store (PostgreSQL in production, in-memory fallback)
 * - The token verifier used during the WebSocket handshake
 *
 * # Thread Safety
 *
 * All fields are cheap to clone: the registry, broadcaster and presence
 * tracker share one interior-mutable map; the store and verifier are
 * `Arc`'d trait objects. Cloning `AppState` never duplicates connection
 * state.
 *
 * # State Extraction
 *
 * The `FromRef` implementations allow Axum handlers to extract specific
 * parts of the state without needing the entire `AppState`. This follows
 * Axum's recommended pattern for state management.
 */

use axum::extract::FromRef;
use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::chat::broadcast::Broadcaster;
use crate::chat::presence::PresenceTracker;
use crate::chat::registry::SessionRegistry;
use crate::chat::store::ConversationStore;

/// Application state shared by every handler
///
/// The registry is the single source of truth for who is connected; the
/// broadcaster and presence tracker are views over it and must be built
/// from the same instance, which `AppState::new` guarantees.
#[derive(Clone)]
pub struct AppState {
    /// Live connection registry, keyed by conversation then user
    pub registry: SessionRegistry,

    /// Fan-out delivery over the registry
    pub broadcaster: Broadcaster,

    /// Presence derived from registry occupancy
    pub presence: PresenceTracker,

    /// Conversation and message persistence
    pub store: Arc<dyn ConversationStore>,

    /// Credential resolution for the WebSocket handshake
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    /// Build the state graph around a fresh registry
    pub fn new(store: Arc<dyn ConversationStore>, verifier: Arc<dyn TokenVerifier>) -> Self {
        let registry = SessionRegistry::new();
        Self {
            broadcaster: Broadcaster::new(registry.clone()),
            presence: PresenceTracker::new(registry.clone()),
            registry,
            store,
            verifier,
        }
    }
}

/// Allows handlers to take `State(SessionRegistry)` directly
impl FromRef<AppState> for SessionRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

/// Allows handlers to take `State(Broadcaster)` directly
impl FromRef<AppState> for Broadcaster {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.broadcaster.clone()
    }
}

/// Allows handlers to take `State(PresenceTracker)` directly
impl FromRef<AppState> for PresenceTracker {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.presence.clone()
    }
}

/// Allows handlers to take `State(Arc<dyn ConversationStore>)` directly
impl FromRef<AppState> for Arc<dyn ConversationStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.store.clone()
    }
}
