use axum::{http::header, response::Html, response::IntoResponse};

//-- HELPER FUNCS
// Pages are self-contained: inline style and script, nothing fetched
const CONTENT_SECURITY_POLICY: &str = "default-src 'none'; script-src 'unsafe-inline'; style-src 'unsafe-inline'; img-src data:; form-action 'self'; base-uri 'none'; frame-ancestors 'none'";

fn hardening_headers() -> [(header::HeaderName, &'static str); 5] {
    [
        (header::CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY),
        (header::X_FRAME_OPTIONS, "DENY"),
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::REFERRER_POLICY, "no-referrer"),
        (header::CACHE_CONTROL, "no-store"),
    ]
}

fn serve_html(content: &'static str) -> impl IntoResponse {
    (hardening_headers(), Html(content))
}

//-- UPLOAD PAGE
pub fn serve_upload_page() -> impl IntoResponse {
    serve_html(include_str!("upload.html"))
}

//-- RESULT FRAGMENT
pub fn serve_upload_done() -> impl IntoResponse {
    serve_html(include_str!("done.html"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_page_has_camera_picker_and_submit() {
        let page = include_str!("upload.html");
        assert!(page.contains(r#"name="file""#));
        assert!(page.contains(r#"capture="environment""#));
        assert!(page.contains(r#"type="submit""#));
        assert!(page.contains(r#"enctype="multipart/form-data""#));
    }

    #[test]
    fn pages_are_served_as_html_with_hardening() {
        let response = serve_upload_done().into_response();
        let headers = response.headers();
        assert!(headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    }
}
