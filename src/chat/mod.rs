//! Chat Module
//!
//! This module contains the realtime chat core: the WebSocket connection
//! handler, the in-memory session registry, presence derivation, fan-out
//! broadcasting, the wire protocol and the conversation store adapter.
//!
//! # Architecture
//!
//! The chat core is organized into focused submodules:
//!
//! - **`model`** - Conversation and message domain types
//! - **`protocol`** - Inbound/outbound JSON frame definitions
//! - **`registry`** - Session registry (who is attached where)
//! - **`presence`** - Derived online/offline status
//! - **`broadcast`** - Per-conversation fan-out with dead-socket reaping
//! - **`store`** - Conversation store adapter (Postgres + in-memory)
//! - **`handler`** - WebSocket connection lifecycle
//!
//! # Data Flow
//!
//! ```text
//! client socket
//!   └─> handler (authenticate -> authorize -> register)
//!         ├─> store     (persist messages, read receipts)
//!         └─> broadcast (fan out persisted events via registry snapshot)
//! ```
//!
//! The session registry is the only shared mutable state in the subsystem.
//! Everything else either owns its state per connection or delegates to the
//! store, which handles its own concurrency.

pub mod broadcast;
pub mod handler;
pub mod model;
pub mod presence;
pub mod protocol;
pub mod registry;
pub mod store;

/// User identity as carried on the wire and in the store.
pub type UserId = i64;

/// Conversation identity.
pub type ConversationId = i64;

/// Message identity, assigned by the store on persist.
pub type MessageId = i64;
