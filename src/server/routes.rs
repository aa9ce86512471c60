//! Router definition for the upload listener

use crate::receive::{handlers, ReceiveAppState};
use axum::{extract::DefaultBodyLimit, routing::get, Router};

/// Build the router serving the upload page and accepting photos.
///
/// `/` is session-agnostic; `/s/:token` is what the pairing URL points at.
pub fn create_upload_router(state: &ReceiveAppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::upload_page).post(handlers::receive_upload),
        )
        .route(
            "/s/:token",
            get(handlers::session_page).post(handlers::receive_session_upload),
        )
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
