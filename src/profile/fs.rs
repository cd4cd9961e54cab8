//! Filesystem capability used by the profile workspace

use std::io;
use std::path::Path;

use async_trait::async_trait;

use crate::common::{Error, Result};

/// The file operations the session needs, so tests can observe or fake them
#[async_trait]
pub trait FileOps: Send + Sync {
    /// Copy `from` to `to`, creating the destination directory if needed
    async fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;

    /// Create a directory and all missing parents
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Remove a file; a missing file is not an error
    async fn remove_file(&self, path: &Path) -> Result<()>;

    /// Remove a directory tree; a missing directory is not an error
    async fn remove_dir_all(&self, path: &Path) -> Result<()>;
}

/// [`FileOps`] on the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

#[async_trait]
impl FileOps for LocalFs {
    async fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::file_copy(from, to, e))?;
        }
        tokio::fs::copy(from, to)
            .await
            .map_err(|e| Error::file_copy(from, to, e))?;
        tracing::debug!("Copied {} to {}", from.display(), to.display());
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path).await?;
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{} already removed", path.display());
                Ok(())
            }
            Err(e) => Err(Error::file_remove(path, e)),
        }
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{} already removed", path.display());
                Ok(())
            }
            Err(e) => Err(Error::file_remove(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copy_creates_destination_dir() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("nvda.log");
        std::fs::write(&src, "log line\n").unwrap();
        let dst = dir.path().join("out").join("nvdaTestRunLogs").join("a-b-nvda.log");

        LocalFs.copy_file(&src, &dst).await.unwrap();

        assert_eq!(std::fs::read_to_string(dst).unwrap(), "log line\n");
    }

    #[tokio::test]
    async fn test_copy_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalFs
            .copy_file(&dir.path().join("nope"), &dir.path().join("dst"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileCopy { .. }));
    }

    #[tokio::test]
    async fn test_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        LocalFs.remove_file(&dir.path().join("gone.ini")).await.unwrap();
        LocalFs.remove_dir_all(&dir.path().join("gone")).await.unwrap();
    }
}
