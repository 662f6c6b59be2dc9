//! Error Module
//!
//! Error types for the chat server and their HTTP conversions.

pub mod conversion;
pub mod types;

pub use types::ChatError;
