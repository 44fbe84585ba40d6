use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, debug};

use crate::config::MediaConfig;
use crate::error::{Result, RelayError};
use super::{MediaProcessorTrait, MediaCommand, MediaCommandBuilder};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
    jobs: Option<Arc<Semaphore>>,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);
        let jobs = config
            .max_concurrent_jobs
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        Self {
            config,
            command_builder,
            jobs,
        }
    }

    /// Run a command, waiting for a job slot first when a cap is configured
    async fn run(&self, command: MediaCommand) -> Result<()> {
        let _permit = match &self.jobs {
            Some(jobs) => {
                debug!("Waiting for media job slot ({} free)", jobs.available_permits());
                Some(
                    jobs.clone()
                        .acquire_owned()
                        .await
                        .map_err(|e| RelayError::Media(format!("Job limiter closed: {}", e)))?,
                )
            }
            None => None,
        };

        command.execute().await
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!("Burning subtitles from {} into {} -> {}",
              subtitle_path.display(), video_path.display(), output_path.display());

        let command = self.command_builder.burn_subtitles(
            video_path,
            subtitle_path,
            output_path,
            &self.config.subtitle_options,
        );

        self.run(command).await?;

        info!("Subtitle burn-in completed successfully");
        Ok(())
    }

    async fn mux_subtitles(
        &self,
        video_source: &str,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!("Muxing subtitles from {} into {} -> {}",
              subtitle_path.display(), video_source, output_path.display());

        let command = self.command_builder.mux_subtitles(video_source, subtitle_path, output_path);
        self.run(command).await?;

        info!("Subtitle mux completed successfully");
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        self.command_builder.version_check().capture().await?;
        info!("Media processor is available");
        Ok(())
    }

    async fn get_version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");

        let version_info = self.command_builder.version_check().capture().await?;
        // The first line carries the version
        let first_line = version_info.lines().next().unwrap_or("Unknown version");
        Ok(first_line.to_string())
    }
}
