//! Route Configuration Module
//!
//! This module configures all HTTP routes for the chat server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! └── router.rs       - Main router creation
//! ```
//!
//! # Route Organization
//!
//! - **WebSocket Routes** - `/ws/chat/{conversation_id}` upgrade endpoint
//! - **Operational Routes** - `/health` liveness probe
//! - **Fallback Handler** - 404 for unknown paths

/// Main router creation
pub mod router;

pub use router::create_router;
