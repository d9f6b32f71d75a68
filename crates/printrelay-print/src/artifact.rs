// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Temporary PDF artifacts handed to the print mechanism.
//
// Each artifact is owned by exactly one executor invocation.  The file is
// created with a unique `print_*.pdf` name, written in full, and deleted
// when the artifact is dropped or closed.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use printrelay_core::error::{PrintRelayError, Result};

/// Filename prefix of every artifact.
pub const ARTIFACT_PREFIX: &str = "print_";

/// Filename suffix of every artifact.
pub const ARTIFACT_SUFFIX: &str = ".pdf";

/// A uniquely named temporary PDF, removed on drop.
#[derive(Debug)]
pub struct TempArtifact {
    path: TempPath,
}

impl TempArtifact {
    /// Allocate a new empty artifact in `dir`, or the OS temp dir.
    pub fn create(dir: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(ARTIFACT_PREFIX).suffix(ARTIFACT_SUFFIX);
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| PrintRelayError::Artifact(format!("create temp file: {e}")))?;

        // Release our handle so the print mechanism can open the file on
        // platforms with mandatory locking.
        let path = file.into_temp_path();
        debug!(path = %path.display(), "temp artifact allocated");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `bytes` as the complete artifact contents.
    pub async fn write_all(&self, bytes: &[u8]) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&*self.path)
            .await
            .map_err(|e| self.write_error(e))?;
        file.write_all(bytes).await.map_err(|e| self.write_error(e))?;
        file.flush().await.map_err(|e| self.write_error(e))?;
        file.sync_all().await.map_err(|e| self.write_error(e))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "temp artifact written");
        Ok(())
    }

    /// Delete the artifact now, reporting failures instead of ignoring them.
    pub fn close(self) -> Result<()> {
        let shown: PathBuf = self.path.to_path_buf();
        self.path
            .close()
            .map_err(|e| PrintRelayError::Artifact(format!("remove {}: {e}", shown.display())))
    }

    fn write_error(&self, e: std::io::Error) -> PrintRelayError {
        PrintRelayError::Artifact(format!("write {}: {e}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn artifact_is_named_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = TempArtifact::create(Some(dir.path())).unwrap();
        let path = artifact.path().to_path_buf();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("print_"), "{name}");
        assert!(name.ends_with(".pdf"), "{name}");
        assert!(path.exists());

        drop(artifact);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn write_all_stores_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = TempArtifact::create(Some(dir.path())).unwrap();
        artifact.write_all(b"%PDF-1.7 body").await.unwrap();
        assert_eq!(std::fs::read(artifact.path()).unwrap(), b"%PDF-1.7 body");

        let path = artifact.path().to_path_buf();
        artifact.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn artifacts_never_share_a_path() {
        let dir = tempfile::tempdir().unwrap();
        let a = TempArtifact::create(Some(dir.path())).unwrap();
        let b = TempArtifact::create(Some(dir.path())).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn missing_directory_is_an_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("does-not-exist");
        let err = TempArtifact::create(Some(&gone)).unwrap_err();
        assert!(matches!(err, PrintRelayError::Artifact(_)));
    }
}
