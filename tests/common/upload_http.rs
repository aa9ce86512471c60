use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use http_body_util::BodyExt;

use photobridge::common::config::DEFAULT_MAX_UPLOAD_BYTES;
use photobridge::common::SessionSlot;
use photobridge::receive::ReceiveAppState;
use photobridge::server::routes;
use photobridge::{CompletionHandler, SessionInfo};

pub const BOUNDARY: &str = "----WebKitFormBoundary7MA4YWxkTrZu0gW";

//===========
// App Factory
//===========
pub fn create_upload_test_app(save_dir: PathBuf) -> (Router, ReceiveAppState) {
    create_upload_test_app_with_limit(save_dir, DEFAULT_MAX_UPLOAD_BYTES)
}

pub fn create_upload_test_app_with_limit(
    save_dir: PathBuf,
    max_upload_bytes: usize,
) -> (Router, ReceiveAppState) {
    let state = ReceiveAppState::new(SessionSlot::new(), save_dir);
    let app = routes::create_upload_router(&state, max_upload_bytes);
    (app, state)
}

pub fn arm(state: &ReceiveAppState, target: &str, handler: impl CompletionHandler) -> SessionInfo {
    state.sessions.arm(target, Arc::new(handler))
}

//=================
// Request Builders
//=================
pub fn build_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

/// Multipart body with one part named `field`.
/// `file_name: None` sends a plain form field instead of a file part.
pub fn build_upload_request(
    uri: &str,
    field: &str,
    file_name: Option<&str>,
    data: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();

    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    match file_name {
        Some(name) => {
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{field}\"; filename=\"{name}\"\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
        }
        None => {
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n").as_bytes(),
            );
        }
    }
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    multipart_request(uri, body)
}

/// Multipart body with no parts at all.
pub fn build_empty_multipart_request(uri: &str) -> Request<Body> {
    multipart_request(uri, format!("--{BOUNDARY}--\r\n").into_bytes())
}

fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("Failed to build multipart request")
}

//================
// Response Helpers
//================
pub async fn extract_text(response: axum::response::Response) -> String {
    let body_bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect body")
        .to_bytes();
    String::from_utf8(body_bytes.to_vec()).expect("Body is not UTF-8")
}
