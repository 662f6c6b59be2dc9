//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Seeded application state fixtures
//! - Authentication test helpers
//! - A live test server with WebSocket client plumbing

pub mod fixtures;
pub mod ws_client;

pub use fixtures::*;
pub use ws_client::*;
