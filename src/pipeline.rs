//! Caption pipeline: scratch files in, ffmpeg, captioned video out

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, RelayError};
use crate::media::MediaProcessorTrait;
use crate::scratch::ScratchSpace;
use crate::subtitle::{CaptionEntry, write_srt};

/// Output of a successful pipeline run, still inside its scratch space
pub struct CaptionedVideo {
    scratch: ScratchSpace,
    path: PathBuf,
}

impl CaptionedVideo {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stream the video; the scratch space goes away once the body is done
    pub async fn into_body(self) -> Result<Body> {
        let Self { scratch, path } = self;
        scratch.into_body(&path).await.map_err(processing)
    }
}

pub struct CaptionPipeline {
    media: Arc<dyn MediaProcessorTrait>,
    scratch_root: Option<PathBuf>,
}

impl CaptionPipeline {
    pub fn new(media: Arc<dyn MediaProcessorTrait>, scratch_root: Option<PathBuf>) -> Self {
        Self { media, scratch_root }
    }

    fn scratch(&self) -> Result<ScratchSpace> {
        ScratchSpace::new(self.scratch_root.as_deref()).map_err(processing)
    }

    /// Attach `captions` (an SRT body, written verbatim) to the video at
    /// `video_uri` as a soft subtitle track.
    pub async fn mux(&self, video_uri: &str, captions: &str) -> Result<CaptionedVideo> {
        let scratch = self.scratch()?;
        let subtitle_path = scratch.file("srt");
        let output_path = scratch.file("mp4");

        fs::write(&subtitle_path, captions).await.map_err(processing)?;
        debug!("Wrote {} caption bytes to {}", captions.len(), subtitle_path.display());

        self.media
            .mux_subtitles(video_uri, &subtitle_path, &output_path)
            .await
            .map_err(processing)?;

        info!("Muxed captions into {}", video_uri);
        Ok(CaptionedVideo {
            scratch,
            path: output_path,
        })
    }

    /// Render `captions` as SRT and burn them into the uploaded video
    pub async fn burn(
        &self,
        video: &[u8],
        video_extension: &str,
        captions: &[CaptionEntry],
    ) -> Result<CaptionedVideo> {
        let scratch = self.scratch()?;
        let video_path = scratch.file(video_extension);
        let subtitle_path = scratch.file("srt");
        let output_path = scratch.file("mp4");

        fs::write(&video_path, video).await.map_err(processing)?;
        write_srt(captions, &subtitle_path).await.map_err(processing)?;

        self.media
            .burn_subtitles(&video_path, &subtitle_path, &output_path)
            .await
            .map_err(processing)?;

        info!("Burned {} captions into uploaded video", captions.len());
        Ok(CaptionedVideo {
            scratch,
            path: output_path,
        })
    }
}

fn processing<E: Into<RelayError>>(err: E) -> RelayError {
    match err.into() {
        err @ RelayError::Processing(_) => err,
        other => RelayError::Processing(other.to_string()),
    }
}
