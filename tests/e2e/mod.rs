//! End-to-end tests over live WebSocket connections
