use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, error, info};

use crate::config::TranscriptionConfig;
use crate::error::{Result, RelayError};
use super::TranscriberTrait;

/// Deepgram pre-recorded transcription client
pub struct DeepgramTranscriber {
    client: Client,
    base_url: String,
    api_key: SecretString,
    url_model: String,
    upload_language: String,
}

impl DeepgramTranscriber {
    pub fn new(config: &TranscriptionConfig, api_key: SecretString, client: Client) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            url_model: config.url_model.clone(),
            upload_language: config.upload_language.clone(),
        }
    }

    fn listen(&self) -> RequestBuilder {
        self.client
            .post(format!("{}/listen", self.base_url))
            .header("Authorization", format!("Token {}", self.api_key.expose_secret()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!("Deepgram API error ({}): {}", status, error_text);
            return Err(RelayError::Upstream(format!(
                "Deepgram API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl TranscriberTrait for DeepgramTranscriber {
    async fn transcribe_by_url(&self, url: &str) -> Result<Value> {
        info!("Transcribing remote media {} with model {}", url, self.url_model);

        let request = self
            .listen()
            .query(&[("model", self.url_model.as_str()), ("smart_format", "true")])
            .json(&json!({ "url": url }));

        let result = self.send(request).await?;
        debug!("Deepgram result: {}", result);
        Ok(result)
    }

    async fn transcribe_by_upload(&self, media: Vec<u8>, mime_type: &str) -> Result<Value> {
        info!("Transcribing {} uploaded bytes ({})", media.len(), mime_type);

        let request = self
            .listen()
            .query(&[
                ("punctuate", "true"),
                ("utterances", "true"),
                ("language", self.upload_language.as_str()),
            ])
            .header("Content-Type", mime_type)
            .body(media);

        let result = self.send(request).await?;
        Ok(utterances(result))
    }
}

/// The utterance list of a Deepgram result, or an empty list when absent
fn utterances(mut result: Value) -> Value {
    match result.pointer_mut("/results/utterances") {
        Some(utterances) => utterances.take(),
        None => Value::Array(vec![]),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    use super::*;
    use crate::config::Config;
    use crate::test_support::spawn;

    #[derive(Debug, Default, Clone)]
    struct Seen {
        query: HashMap<String, String>,
        authorization: String,
        content_type: String,
        body: Vec<u8>,
    }

    type Captured = Arc<Mutex<Option<Seen>>>;

    async fn listen(
        State(captured): State<Captured>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
        body: axum::body::Bytes,
    ) -> Json<Value> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };

        *captured.lock().unwrap() = Some(Seen {
            query,
            authorization: header("authorization"),
            content_type: header("content-type"),
            body: body.to_vec(),
        });

        Json(json!({
            "metadata": { "request_id": "abc" },
            "results": {
                "channels": [{ "alternatives": [{ "transcript": "hello world" }] }],
                "utterances": [{ "start": 0.0, "end": 1.2, "transcript": "hello world" }]
            }
        }))
    }

    async fn transcriber_against(router: Router) -> DeepgramTranscriber {
        let base_url = spawn(router).await;
        let mut config = Config::default().transcription;
        config.base_url = format!("{}/v1", base_url);
        DeepgramTranscriber::new(&config, SecretString::from("dg-key"), Client::new())
    }

    #[tokio::test]
    async fn test_transcribe_by_url_sends_model_and_url() {
        let captured = Captured::default();
        let router = Router::new()
            .route("/v1/listen", post(listen))
            .with_state(captured.clone());
        let transcriber = transcriber_against(router).await;

        let result = transcriber
            .transcribe_by_url("https://res.cloudinary.com/x/video.mp4")
            .await
            .unwrap();

        assert_eq!(result["metadata"]["request_id"], "abc");

        let seen = captured.lock().unwrap().clone().unwrap();
        assert_eq!(seen.authorization, "Token dg-key");
        assert_eq!(seen.query["model"], "nova-2");
        assert_eq!(seen.query["smart_format"], "true");
        let body: Value = serde_json::from_slice(&seen.body).unwrap();
        assert_eq!(body, json!({ "url": "https://res.cloudinary.com/x/video.mp4" }));
    }

    #[tokio::test]
    async fn test_transcribe_by_upload_returns_utterances() {
        let captured = Captured::default();
        let router = Router::new()
            .route("/v1/listen", post(listen))
            .with_state(captured.clone());
        let transcriber = transcriber_against(router).await;

        let result = transcriber
            .transcribe_by_upload(b"RIFF....".to_vec(), "video/mp4")
            .await
            .unwrap();

        assert_eq!(result[0]["transcript"], "hello world");

        let seen = captured.lock().unwrap().clone().unwrap();
        assert_eq!(seen.content_type, "video/mp4");
        assert_eq!(seen.query["punctuate"], "true");
        assert_eq!(seen.query["utterances"], "true");
        assert_eq!(seen.query["language"], "en-US");
        assert_eq!(seen.body, b"RIFF....");
    }

    #[tokio::test]
    async fn test_service_error_is_upstream_failure() {
        let router = Router::new().route(
            "/v1/listen",
            post(|| async { (StatusCode::UNAUTHORIZED, "Invalid credentials") }),
        );
        let transcriber = transcriber_against(router).await;

        let err = transcriber.transcribe_by_url("https://x/v.mp4").await.unwrap_err();
        match err {
            RelayError::Upstream(message) => assert!(message.contains("Invalid credentials")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_is_http_error() {
        let mut config = Config::default().transcription;
        config.base_url = "http://127.0.0.1:1".to_string();
        let transcriber = DeepgramTranscriber::new(&config, SecretString::from("k"), Client::new());

        let err = transcriber
            .transcribe_by_upload(vec![1, 2, 3], "video/mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Http(_)));
        assert_eq!(err.client_message(), "Processing failed");
    }

    #[tokio::test]
    async fn test_non_json_reply_is_http_error() {
        let router = Router::new().route("/v1/listen", post(|| async { "not json" }));
        let transcriber = transcriber_against(router).await;

        let err = transcriber.transcribe_by_url("https://x/v.mp4").await.unwrap_err();
        assert!(matches!(err, RelayError::Http(_)));
    }

    #[test]
    fn test_utterances_missing_is_empty_list() {
        assert_eq!(utterances(json!({ "results": {} })), json!([]));
    }
}
