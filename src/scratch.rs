use std::io;
use std::path::{Path, PathBuf};

use axum::body::{Body, Bytes};
use futures::{Stream, StreamExt};
use tempfile::TempDir;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::Result;

/// Per-request directory for the video, caption and output files.
///
/// Every file gets a random name. The directory and everything in it is
/// removed when the value is dropped; removal failures are only logged.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: Option<TempDir>,
}

impl ScratchSpace {
    /// Create a scratch directory under `root`, or the system temp dir
    pub fn new(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("subrelay-");

        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };

        debug!("Created scratch space {}", dir.path().display());
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }

    /// A fresh, unused file path with the given extension
    pub fn file(&self, extension: &str) -> PathBuf {
        self.path().join(format!("{}.{}", Uuid::new_v4(), extension))
    }

    /// Stream `path` as a response body, keeping the scratch space alive
    /// until the body has been fully sent or dropped.
    pub async fn into_body(self, path: &Path) -> Result<Body> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Body::from_stream(self.attach(ReaderStream::new(file))))
    }

    fn attach<S>(self, stream: S) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        stream.map(move |chunk| {
            let _scratch = &self;
            chunk
        })
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!("Removed scratch space {}", path.display()),
                Err(e) => warn!("Failed to remove scratch space {}: {}", path.display(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_are_unique_and_inside() {
        let scratch = ScratchSpace::new(None).unwrap();
        let a = scratch.file("mp4");
        let b = scratch.file("mp4");

        assert_ne!(a, b);
        assert!(a.starts_with(scratch.path()));
        assert_eq!(a.extension().unwrap(), "mp4");
    }

    #[test]
    fn test_drop_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::new(Some(root.path())).unwrap();
        let path = scratch.path().to_path_buf();
        std::fs::write(scratch.file("srt"), "1\n").unwrap();

        drop(scratch);

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_body_keeps_directory_until_dropped() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::new(Some(root.path())).unwrap();
        let dir = scratch.path().to_path_buf();
        let output = scratch.file("mp4");
        std::fs::write(&output, b"video-bytes").unwrap();

        let body = scratch.into_body(&output).await.unwrap();
        assert!(dir.exists());

        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"video-bytes");
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_missing_output_fails_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::new(Some(root.path())).unwrap();
        let dir = scratch.path().to_path_buf();
        let output = scratch.file("mp4");

        assert!(scratch.into_body(&output).await.is_err());
        assert!(!dir.exists());
    }
}
