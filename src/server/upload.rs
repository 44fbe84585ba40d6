use axum::body::Bytes;
use axum::extract::{FromRequest, Json, Multipart, Request, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::AppState;
use crate::error::{Result, RelayError};

const DEFAULT_MIME_TYPE: &str = "video/mp4";

#[derive(Debug, Default, Deserialize)]
struct UploadRequest {
    #[serde(default)]
    video: Option<Value>,
}

/// POST /upload
///
/// Multipart bodies are transcribed directly. Every other body goes through
/// the media host and URL transcription; the two contracts stay separate.
pub async fn upload(State(state): State<AppState>, request: Request) -> Result<Response> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        upload_multipart(state, request).await
    } else {
        upload_json(state, &content_type, request).await
    }
}

/// Host the payload, then transcribe it from its public URL
async fn upload_json(state: AppState, content_type: &str, request: Request) -> Result<Response> {
    let bytes = match Bytes::from_request(request, &state).await {
        Ok(bytes) => bytes,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    // Only JSON bodies carry a payload; anything else counts as no video
    let body = if content_type.starts_with("application/json") && !bytes.is_empty() {
        serde_json::from_slice::<UploadRequest>(&bytes)
            .map_err(|e| RelayError::MissingInput(format!("Invalid JSON body: {}", e)))?
    } else {
        UploadRequest::default()
    };

    let payload = body
        .video
        .and_then(video_payload)
        .ok_or_else(|| RelayError::MissingInput("No video data provided".to_string()))?;

    info!("Called with {} bytes of video data", payload.len());

    let hosted = state.host.upload(payload).await?;
    let result = state.transcriber.transcribe_by_url(&hosted.secure_url).await?;

    Ok(Json(json!({ "result": result })).into_response())
}

/// Transcribe the uploaded `video` file directly
async fn upload_multipart(state: AppState, request: Request) -> Result<Response> {
    let mut multipart = Multipart::from_request(request, &state)
        .await
        .map_err(|e| RelayError::MissingInput(format!("Invalid multipart body: {}", e.body_text())))?;

    let mut video: Option<(Vec<u8>, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RelayError::MissingInput(format!("Invalid multipart body: {}", e.body_text())))?
    {
        if field.name() != Some("video") {
            continue;
        }

        let mime_type = field.content_type().unwrap_or(DEFAULT_MIME_TYPE).to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| RelayError::MissingInput(format!("Failed to read video: {}", e.body_text())))?;
        video = Some((data.to_vec(), mime_type));
    }

    let (data, mime_type) = video
        .filter(|(data, _)| !data.is_empty())
        .ok_or_else(|| RelayError::MissingInput("No file uploaded".to_string()))?;

    let transcription = state.transcriber.transcribe_by_upload(data, &mime_type).await?;

    Ok(Json(json!({ "transcription": transcription })).into_response())
}

/// The payload to forward, or None when the client sent nothing usable
fn video_payload(video: Value) -> Option<String> {
    match video {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
