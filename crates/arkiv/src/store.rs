//! # Archive Store
//!
//! The filesystem namespace of completed artifacts. Existence is always
//! determined by live inspection at call time; an external process may
//! complete a fetch between two checks, so nothing here is cached.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};

use crate::error::StoreError;
use crate::identity::Identity;

/// Completed-artifact namespace rooted at a single directory.
///
/// Artifacts are created by fetch backends and never mutated after
/// completion, so concurrent readers need no coordination.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    root: PathBuf,
}

impl ArchiveStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Compose the artifact path for `identity`.
    ///
    /// Re-validates the identity before joining. Resolution is expected to
    /// have sanitized already; the store still refuses to compose anything
    /// that could escape its root.
    pub fn path(&self, identity: &Identity) -> Result<PathBuf, StoreError> {
        let checked = Identity::new(identity.as_str())?;
        Ok(self.root.join(checked.as_str()))
    }

    /// Live existence check for the artifact.
    pub async fn exists(&self, identity: &Identity) -> Result<bool, StoreError> {
        let path = self.path(identity)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// Open a completed artifact for reading.
    pub async fn open(&self, identity: &Identity) -> Result<File, StoreError> {
        let path = self.path(identity)?;
        match File::open(&path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(identity.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
