use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, RelayError};

/// Environment variable holding the Deepgram API key
pub const API_KEY_ENV: &str = "DEEPGRAM_API_KEY";

/// Environment variable overriding the listen port
pub const PORT_ENV: &str = "PORT";

fn default_body_limit() -> usize {
    // 1000 MiB, the JSON limit the upload endpoint has always accepted
    1000 << 20
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub transcription: TranscriptionConfig,
    pub hosting: HostingConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Maximum accepted request body in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Deepgram API base URL
    pub base_url: String,
    /// API key; usually supplied through DEEPGRAM_API_KEY instead of the file
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,
    /// Recognition model used for URL transcription
    pub url_model: String,
    /// Language tag used for uploaded-buffer transcription
    pub upload_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostingConfig {
    /// Cloudinary API base URL
    pub base_url: String,
    /// Cloudinary account (cloud name)
    pub cloud_name: String,
    /// Unsigned upload preset
    pub upload_preset: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Additional encoding options for subtitle burn-in
    /// Common options: ["-preset", "veryfast", "-crf", "23", "-pix_fmt", "yuv420p"]
    pub subtitle_options: Vec<String>,
    /// Upper bound on simultaneous ffmpeg jobs; unlimited when unset
    #[serde(default)]
    pub max_concurrent_jobs: Option<usize>,
    /// Directory for per-request scratch files; system temp dir when unset
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                body_limit_bytes: default_body_limit(),
            },
            transcription: TranscriptionConfig {
                base_url: "https://api.deepgram.com/v1".to_string(),
                api_key: None,
                url_model: "nova-2".to_string(),
                upload_language: "en-US".to_string(),
            },
            hosting: HostingConfig {
                base_url: "https://api.cloudinary.com".to_string(),
                cloud_name: "dojwag3u1".to_string(),
                upload_preset: "qmakq1p3".to_string(),
            },
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
                subtitle_options: vec![],
                max_concurrent_jobs: None,
                scratch_dir: None,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RelayError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment overrides (API key, port)
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(PORT_ENV).ok(),
        )
    }

    fn apply_overrides(&mut self, api_key: Option<String>, port: Option<String>) -> Result<()> {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.transcription.api_key = Some(SecretString::from(key));
        }

        if let Some(port) = port.filter(|p| !p.is_empty()) {
            self.server.port = port
                .parse()
                .map_err(|e| RelayError::Config(format!("Invalid {}: {} ({})", PORT_ENV, port, e)))?;
        }

        Ok(())
    }

    /// The API key, or a configuration error naming the variable to set
    pub fn api_key(&self) -> Result<SecretString> {
        self.transcription
            .api_key
            .clone()
            .ok_or_else(|| RelayError::Config(format!("{} is not set", API_KEY_ENV)))
    }
}
