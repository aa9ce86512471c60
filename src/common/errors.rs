//! Error taxonomy for the upload endpoint.
//!
//! The phone's browser only ever sees a plain form post, so anything it did
//! wrong is answered with a readable 200 body instead of an error status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Body sent to the phone when the photo could not be written.
pub const SAVE_FAILED: &str = "Could not save the photo. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Upload refused; the message is shown to the uploading device as-is.
    #[error("{0}")]
    Rejected(String),

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Rejected(message) => {
                tracing::debug!("Upload rejected: {}", message);
                (StatusCode::OK, message).into_response()
            }
            AppError::PayloadTooLarge(message) => {
                tracing::warn!("Upload too large: {}", message);
                (StatusCode::PAYLOAD_TOO_LARGE, message).into_response()
            }
            AppError::Internal(err) => {
                tracing::error!("Upload failed: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, SAVE_FAILED).into_response()
            }
        }
    }
}
