//! HTTP handlers for the phone-facing upload page and photo intake.

use std::panic::{self, AssertUnwindSafe};

use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crate::common::{AppError, LookupError};
use crate::receive::completion::{CompletionHandler, UploadEvent};
use crate::receive::state::ReceiveAppState;
use crate::receive::storage;
use crate::ui::web;

/// Multipart field carrying the photo.
pub const FILE_FIELD: &str = "file";

pub const NO_FILE_FOUND: &str = "No file found in the upload";
pub const NO_FILE_SELECTED: &str = "No file was selected";
pub const NO_ACTIVE_SESSION: &str = "No capture session is active on the desktop";
pub const SESSION_EXPIRED: &str = "This pairing code has expired. Scan the new code on the desktop.";

struct ReceivedFile {
    file_name: String,
    data: Bytes,
}

/// Session-agnostic upload page.
pub async fn upload_page() -> Response {
    web::serve_upload_page().into_response()
}

/// Upload page behind a pairing token; stale tokens get the expiry notice.
pub async fn session_page(
    State(state): State<ReceiveAppState>,
    Path(token): Path<String>,
) -> Response {
    if state.sessions.is_current(&token) {
        web::serve_upload_page().into_response()
    } else {
        AppError::Rejected(SESSION_EXPIRED.to_string()).into_response()
    }
}

/// Accept a photo for whichever session is armed.
pub async fn receive_upload(
    State(state): State<ReceiveAppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    accept_upload(&state, None, multipart).await
}

/// Accept a photo for the session named in the path.
pub async fn receive_session_upload(
    State(state): State<ReceiveAppState>,
    Path(token): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    accept_upload(&state, Some(&token), multipart).await
}

async fn accept_upload(
    state: &ReceiveAppState,
    token: Option<&str>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Upload without a multipart body: {}", e);
        AppError::Rejected(NO_FILE_FOUND.to_string())
    })?;

    let upload = read_file_field(&mut multipart).await?;

    let ticket = state.sessions.ticket(token).map_err(|e| match e {
        LookupError::NoSession => AppError::Rejected(NO_ACTIVE_SESSION.to_string()),
        LookupError::Expired => AppError::Rejected(SESSION_EXPIRED.to_string()),
    })?;

    let bytes = upload.data.len() as u64;
    let saved_path =
        storage::save_upload(state.save_dir(), &ticket.target_filename, &upload.data).await?;

    tracing::info!(
        session_id = %ticket.session_id,
        bytes,
        client_name = %upload.file_name,
        path = %saved_path.display(),
        "Photo received"
    );

    state.sessions.record_upload(&ticket.session_id);

    let event = UploadEvent {
        session_id: ticket.session_id,
        target_filename: ticket.target_filename,
        saved_path,
        bytes,
    };
    notify(ticket.handler.as_ref(), &event);

    Ok(web::serve_upload_done().into_response())
}

/// Finds the `file` part. Parts without a filename are form fields, not files.
async fn read_file_field(multipart: &mut Multipart) -> Result<ReceivedFile, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if file_name.is_empty() {
            return Err(AppError::Rejected(NO_FILE_SELECTED.to_string()));
        }

        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok(ReceivedFile { file_name, data });
    }

    Err(AppError::Rejected(NO_FILE_FOUND.to_string()))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        tracing::debug!("Malformed multipart body: {}", err);
        AppError::Rejected(NO_FILE_FOUND.to_string())
    }
}

/// Host code runs here; a panic in it must not take the listener down.
fn notify(handler: &dyn CompletionHandler, event: &UploadEvent) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.on_complete(event)));
    if outcome.is_err() {
        tracing::error!(
            session_id = %event.session_id,
            "Completion handler panicked; photo is saved at {}",
            event.saved_path.display()
        );
    }
}
