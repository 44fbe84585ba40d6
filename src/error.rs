use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// HTTP status reported to the client for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message that is safe to show to API consumers.
    ///
    /// Caller errors echo their message; everything else collapses into a
    /// generic body so upstream details never leak.
    pub fn client_message(&self) -> String {
        match self {
            Self::MissingInput(message) => message.clone(),
            Self::Upstream(_) | Self::Http(_) => "Processing failed".to_string(),
            _ => "Error processing video".to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status, self.client_message()).into_response()
    }
}
