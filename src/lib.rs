//! XFChat - Main Library
//!
//! XFChat is the real-time chat subsystem of the XFCollab platform: a
//! WebSocket server that fans persisted messages, typing indicators,
//! presence changes and read receipts out to conversation participants.
//!
//! # Overview
//!
//! This library provides:
//! - A per-conversation session registry tracking every live socket
//! - Persist-then-broadcast message delivery that excludes the sender
//! - Presence derived from registry occupancy (no heartbeats)
//! - A pluggable conversation store (PostgreSQL or in-memory)
//! - JWT-based connection authentication and membership authorization
//!
//! # Module Structure
//!
//! - **`chat`** - The chat core: wire protocol, registry, broadcaster,
//!   presence tracker, connection handler and store backends
//! - **`auth`** - Token verification and credential extraction
//! - **`server`** - Application state, configuration and initialization
//! - **`routes`** - HTTP route assembly
//! - **`error`** - The error taxonomy and its HTTP/WebSocket mappings
//!
//! # Usage
//!
//! ```rust,no_run
//! use xfchat::server::create_app;
//!
//! # async fn example() {
//! let app = create_app().await;
//! // Serve app with axum
//! # }
//! ```

pub mod auth;
pub mod chat;
pub mod error;
pub mod routes;
pub mod server;
