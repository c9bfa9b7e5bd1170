//! Filesystem Config Source
//!
//! Implements `ConfigSource` by reading files under the host root with
//! `tokio::fs`.

use crate::ports::outbound::ConfigSource;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads configuration sources relative to a root directory.
#[derive(Clone, Debug)]
pub struct FsConfigSource {
    root: PathBuf,
}

impl FsConfigSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of `path`.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl ConfigSource for FsConfigSource {
    async fn read(&self, path: &str) -> std::io::Result<String> {
        let resolved = self.resolve(path);
        debug!(path = %resolved.display(), "Reading config source");
        tokio::fs::read_to_string(resolved).await
    }
}
