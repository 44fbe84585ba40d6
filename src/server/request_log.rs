use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, info};

/// Longest body excerpt written to the log
const BODY_PREVIEW_CHARS: usize = 512;

/// Log method, URL, headers and body of every incoming request.
///
/// Only textual bodies (JSON, plain text) are buffered and previewed;
/// multipart and binary uploads are logged by size.
pub async fn log_request(State(body_limit): State<usize>, request: Request, next: Next) -> Response {
    info!("Incoming request: {} {}", request.method(), request.uri());
    debug!("Headers: {:?}", request.headers());

    if !is_textual(&request) {
        let length = request
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        debug!("Body: <{} bytes, not logged>", length);
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, body_limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, format!("Failed to read request body: {}", e))
                .into_response();
        }
    };

    debug!("Body: {}", preview(&bytes));

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn is_textual(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json") || ct.starts_with("text/"))
        .unwrap_or(false)
}

fn preview(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let mut preview: String = text.chars().take(BODY_PREVIEW_CHARS).collect();
    if text.chars().count() > BODY_PREVIEW_CHARS {
        preview.push_str(&format!("... ({} bytes total)", bytes.len()));
    }
    preview
}
