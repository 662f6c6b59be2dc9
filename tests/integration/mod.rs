//! Cross-module integration tests

pub mod chat_core;
