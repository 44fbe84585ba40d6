use std::path::Path;

use axum::extract::{Json, Multipart, State};
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::info;

use super::AppState;
use crate::error::{Result, RelayError};
use crate::subtitle::CaptionEntry;

const OUTPUT_CONTENT_TYPE: &str = "video/mp4";
const ATTACHMENT_NAME: &str = "captioned.mp4";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCaptionsRequest {
    #[serde(default)]
    video_uri: Option<String>,
    #[serde(default)]
    captions: Option<String>,
}

/// POST /update-captions: soft-mux a subtitle body into a remote video
pub async fn update_captions(
    State(state): State<AppState>,
    body: std::result::Result<Json<UpdateCaptionsRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(body) =
        body.map_err(|e| RelayError::MissingInput(format!("Invalid JSON body: {}", e.body_text())))?;

    let (video_uri, captions) = match (non_empty(body.video_uri), non_empty(body.captions)) {
        (Some(video_uri), Some(captions)) => (video_uri, captions),
        _ => {
            return Err(RelayError::MissingInput(
                "Missing required fields: videoUri and captions".to_string(),
            ));
        }
    };

    info!("Updating captions for {}", video_uri);
    let video = state.pipeline.mux(&video_uri, &captions).await?;

    Ok((
        [(header::CONTENT_TYPE, OUTPUT_CONTENT_TYPE)],
        video.into_body().await?,
    )
        .into_response())
}

/// POST /adjust-captions: burn caption entries into an uploaded video
pub async fn adjust_captions(State(state): State<AppState>, mut multipart: Multipart) -> Result<Response> {
    let mut video: Option<(Vec<u8>, String)> = None;
    let mut captions: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RelayError::MissingInput(format!("Invalid multipart body: {}", e.body_text())))?
    {
        match field.name() {
            Some("video") => {
                let extension = video_extension(field.file_name());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| RelayError::MissingInput(format!("Failed to read video: {}", e.body_text())))?;
                video = Some((data.to_vec(), extension));
            }
            Some("captions") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| RelayError::MissingInput(format!("Failed to read captions: {}", e.body_text())))?;
                captions = Some(text);
            }
            _ => {}
        }
    }

    let ((video, extension), captions) = match (
        video.filter(|(data, _)| !data.is_empty()),
        non_empty(captions),
    ) {
        (Some(video), Some(captions)) => (video, captions),
        _ => {
            return Err(RelayError::MissingInput(
                "Missing required fields: video and captions".to_string(),
            ));
        }
    };

    let captions: Vec<CaptionEntry> = serde_json::from_str(&captions)
        .map_err(|e| RelayError::MissingInput(format!("Invalid captions: {}", e)))?;

    info!("Adjusting captions: {} entries on {} bytes of video", captions.len(), video.len());
    let output = state.pipeline.burn(&video, &extension, &captions).await?;

    Ok((
        [
            (header::CONTENT_TYPE, OUTPUT_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", ATTACHMENT_NAME),
            ),
        ],
        output.into_body().await?,
    )
        .into_response())
}

/// Present means non-empty; whitespace still counts
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Extension for the scratch copy of an upload, `mp4` unless the client
/// sent a plausible one
fn video_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "mp4".to_string())
}
