// Speech-to-text relay
//
// The endpoints only see `TranscriberTrait`; `deepgram` is the hosted
// implementation. Results are opaque JSON and passed through untouched.

pub mod deepgram;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub use deepgram::DeepgramTranscriber;

/// Main trait for transcription operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriberTrait: Send + Sync {
    /// Have the service fetch and transcribe media at a public URL.
    /// Returns the service's full result.
    async fn transcribe_by_url(&self, url: &str) -> Result<Value>;

    /// Transcribe raw media bytes. Returns the utterance-level result.
    async fn transcribe_by_upload(&self, media: Vec<u8>, mime_type: &str) -> Result<Value>;
}
