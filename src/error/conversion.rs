/**
 * Error Conversion
 *
 * This module provides the `IntoResponse` implementation for `ChatError`,
 * used when an error surfaces through a plain HTTP route rather than an
 * established WebSocket.
 *
 * # Response Format
 *
 * Error responses are returned as JSON:
 * ```json
 * {
 *   "error": "Error message",
 *   "status": 400
 * }
 * ```
 */

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::types::ChatError;

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
