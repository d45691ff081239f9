/*
 * Responsibility
 * - Errors that become HTTP responses (IntoResponse)
 * - Bodies stay generic: token contents and claim names go to the debug log only
 */
use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("request rejected with status {0}")]
    Rejected(StatusCode),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Rejected(status) = self;

        let body = if status == StatusCode::BAD_REQUEST {
            "Bad request"
        } else {
            status.canonical_reason().unwrap_or("Error")
        };

        (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
    }
}
