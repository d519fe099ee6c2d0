//! Local filesystem blob store.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::core::{BlobStore, RemeshError};

/// Writes blobs under a root directory, gzip-encoded by default.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
    gzip: bool,
}

impl FileBlobStore {
    /// Store gzip-encoded objects under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            gzip: true,
        }
    }

    /// Toggle gzip content encoding.
    #[must_use]
    pub const fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    /// Filesystem location of the object at `path`.
    ///
    /// # Errors
    ///
    /// [`RemeshError::Publish`] if `path` is absolute or escapes the root.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, RemeshError> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(RemeshError::Publish(format!("refusing object path {path}")));
        }
        Ok(self.root.join(relative))
    }

    fn encode(&self, bytes: Vec<u8>) -> Result<Vec<u8>, RemeshError> {
        if !self.gzip {
            return Ok(bytes);
        }
        let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::default());
        encoder
            .write_all(&bytes)
            .map_err(|e| RemeshError::Publish(format!("gzip: {e}")))?;
        encoder
            .finish()
            .map_err(|e| RemeshError::Publish(format!("gzip: {e}")))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn write_blob(&self, path: &str, bytes: Vec<u8>) -> Result<(), RemeshError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RemeshError::Publish(format!("{}: {e}", parent.display())))?;
        }
        let encoded = self.encode(bytes)?;
        tokio::fs::write(&target, encoded)
            .await
            .map_err(|e| RemeshError::Publish(format!("{}: {e}", target.display())))
    }
}
