// HTTP surface
//
// - upload: POST /upload, JSON (host + URL transcription) or multipart (direct transcription)
// - captions: POST /update-captions (soft-mux) and POST /adjust-captions (burn-in)
// - request_log: diagnostic logging of every incoming request

mod captions;
mod request_log;
mod upload;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::{Router, middleware};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{Config, ServerConfig};
use crate::error::{Result, RelayError};
use crate::hosting::{CloudinaryHost, MediaHostTrait};
use crate::http_client::http_client;
use crate::media::{MediaProcessorFactory, MediaProcessorTrait};
use crate::pipeline::CaptionPipeline;
use crate::transcribe::{DeepgramTranscriber, TranscriberTrait};

/// Services shared by every request. Nothing in here is mutable.
#[derive(Clone)]
pub struct AppState {
    pub transcriber: Arc<dyn TranscriberTrait>,
    pub host: Arc<dyn MediaHostTrait>,
    pub pipeline: Arc<CaptionPipeline>,
}

impl AppState {
    pub fn new(
        transcriber: Arc<dyn TranscriberTrait>,
        host: Arc<dyn MediaHostTrait>,
        media: Arc<dyn MediaProcessorTrait>,
        config: &Config,
    ) -> Self {
        Self {
            transcriber,
            host,
            pipeline: Arc::new(CaptionPipeline::new(media, config.media.scratch_dir.clone())),
        }
    }

    /// Wire up the hosted services described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = http_client()?;
        let transcriber = DeepgramTranscriber::new(&config.transcription, config.api_key()?, client.clone());
        let host = CloudinaryHost::new(&config.hosting, client);
        let media: Arc<dyn MediaProcessorTrait> =
            Arc::from(MediaProcessorFactory::create_processor(config.media.clone()));

        Ok(Self::new(Arc::new(transcriber), Arc::new(host), media, config))
    }
}

/// Build the router with all endpoints and middleware
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/upload", post(upload::upload))
        .route("/update-captions", post(captions::update_captions))
        .route("/adjust-captions", post(captions::adjust_captions))
        .layer(middleware::from_fn_with_state(
            config.body_limit_bytes,
            request_log::log_request,
        ))
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| RelayError::Config(format!("Invalid listen address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    info!("Server running on {}", local_addr);

    axum::serve(listener, router(state, config))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Graceful shutdown initiated");
        })
        .await?;

    Ok(())
}
