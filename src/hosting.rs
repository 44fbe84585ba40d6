//! Media hosting relay (Cloudinary unsigned uploads)

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::Form;
use serde::Deserialize;
use tracing::{error, info};

use crate::config::HostingConfig;
use crate::error::{Result, RelayError};

/// What the host hands back for a stored video
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostedMedia {
    pub secure_url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaHostTrait: Send + Sync {
    /// Store the payload and return its public URL
    async fn upload(&self, payload: String) -> Result<HostedMedia>;
}

pub struct CloudinaryHost {
    client: Client,
    upload_url: String,
    upload_preset: String,
}

impl CloudinaryHost {
    pub fn new(config: &HostingConfig, client: Client) -> Self {
        let upload_url = format!(
            "{}/v1_1/{}/video/upload",
            config.base_url.trim_end_matches('/'),
            config.cloud_name
        );

        Self {
            client,
            upload_url,
            upload_preset: config.upload_preset.clone(),
        }
    }
}

#[async_trait]
impl MediaHostTrait for CloudinaryHost {
    async fn upload(&self, payload: String) -> Result<HostedMedia> {
        info!("Uploading {} bytes to {}", payload.len(), self.upload_url);

        // `file` may be a data URI, a remote URL or base64; the host decides
        let form = Form::new()
            .text("file", payload)
            .text("upload_preset", self.upload_preset.clone());

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!("Cloudinary API error ({}): {}", status, error_text);
            return Err(RelayError::Upstream(format!(
                "Cloudinary API error ({}): {}",
                status, error_text
            )));
        }

        let hosted: HostedMedia = response.json().await?;

        info!("Cloudinary URL: {}", hosted.secure_url);
        Ok(hosted)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Multipart, Path, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::config::Config;
    use crate::test_support::spawn;

    type Fields = Arc<Mutex<Vec<(String, String, String)>>>;

    async fn upload(
        State(fields): State<Fields>,
        Path(cloud): Path<String>,
        mut multipart: Multipart,
    ) -> impl IntoResponse {
        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().unwrap_or_default().to_string();
            let value = field.text().await.unwrap_or_default();
            fields.lock().unwrap().push((cloud.clone(), name, value));
        }

        Json(json!({
            "public_id": "abc",
            "secure_url": format!("https://res.cloudinary.com/{}/video/upload/abc.mp4", cloud)
        }))
    }

    async fn host_against(router: Router) -> CloudinaryHost {
        let base_url = spawn(router).await;
        let mut config = Config::default().hosting;
        config.base_url = base_url;
        config.cloud_name = "demo".to_string();
        config.upload_preset = "preset-1".to_string();
        CloudinaryHost::new(&config, Client::new())
    }

    #[tokio::test]
    async fn test_upload_sends_file_and_preset() {
        let fields = Fields::default();
        let router = Router::new()
            .route("/v1_1/{cloud}/video/upload", post(upload))
            .with_state(fields.clone());
        let host = host_against(router).await;

        let hosted = host.upload("data:video/mp4;base64,AAAA".to_string()).await.unwrap();

        assert_eq!(
            hosted.secure_url,
            "https://res.cloudinary.com/demo/video/upload/abc.mp4"
        );

        let fields = fields.lock().unwrap().clone();
        assert!(fields.contains(&(
            "demo".to_string(),
            "file".to_string(),
            "data:video/mp4;base64,AAAA".to_string()
        )));
        assert!(fields.contains(&(
            "demo".to_string(),
            "upload_preset".to_string(),
            "preset-1".to_string()
        )));
    }

    #[tokio::test]
    async fn test_rejected_upload_is_upstream_failure() {
        let router = Router::new().route(
            "/v1_1/{cloud}/video/upload",
            post(|| async { (StatusCode::BAD_REQUEST, "Upload preset not found") }),
        );
        let host = host_against(router).await;

        let err = host.upload("x".to_string()).await.unwrap_err();
        assert!(matches!(err, RelayError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_response_without_url_is_http_error() {
        let router = Router::new().route(
            "/v1_1/{cloud}/video/upload",
            post(|| async { Json(json!({ "public_id": "abc" })) }),
        );
        let host = host_against(router).await;

        let err = host.upload("x".to_string()).await.unwrap_err();
        assert!(matches!(err, RelayError::Http(_)));
    }
}
