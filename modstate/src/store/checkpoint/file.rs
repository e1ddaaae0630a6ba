use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::batch::BatchContext;
use crate::error::ModstateResult;
use crate::store::checkpoint::CheckpointStore;

/// Writes the batch context as JSON to a file.
///
/// Every write goes to a sibling temporary file first and is then renamed over the checkpoint, so
/// a crash mid-write leaves the previous checkpoint intact.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        file_name.push(".tmp");

        self.path.with_file_name(file_name)
    }
}

impl CheckpointStore for FileCheckpointStore {
    async fn load(&self) -> ModstateResult<Option<BatchContext>> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let context = serde_json::from_slice(&contents)?;
        debug!(path = %self.path.display(), "loaded batch checkpoint");

        Ok(Some(context))
    }

    async fn store(&self, context: &BatchContext) -> ModstateResult<()> {
        let contents = serde_json::to_vec(context)?;
        let temp_path = self.temp_path();

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&temp_path, contents).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        Ok(())
    }

    async fn clear(&self) -> ModstateResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
