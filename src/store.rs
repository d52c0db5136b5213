//! Artifact store for iTransfer.
//!
//! Filesystem-backed storage with two areas:
//! - the root, holding finalized deliverables (single files or archives)
//! - `temp/<transfer id>/`, a per-transfer scratch area for in-progress uploads
//!
//! Scratch directories never outlive an ingestion attempt; callers remove
//! them on both success and failure.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::{Result, TransferError};

/// Filesystem-backed store for finalized artifacts and upload scratch space.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a new ArtifactStore rooted at the given directory.
    ///
    /// The root and its scratch area are created if they don't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("temp"))?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a finalized artifact under the store root.
    pub fn artifact_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Scratch directory for one in-progress transfer.
    pub fn scratch_dir(&self, transfer_id: &str) -> PathBuf {
        self.root.join("temp").join(transfer_id)
    }

    /// Write one staged file into the transfer's scratch directory.
    ///
    /// `relative_path` has already been flattened to at most one folder
    /// level; the folder is created on demand.
    pub fn stage(&self, transfer_id: &str, relative_path: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.scratch_dir(transfer_id).join(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Move a finalized deliverable from the scratch area into the root.
    pub fn finalize(&self, staged: &Path, final_name: &str) -> Result<PathBuf> {
        let dest = self.artifact_path(final_name);
        if fs::rename(staged, &dest).is_err() {
            // rename fails across filesystems; fall back to copy+remove
            fs::copy(staged, &dest)?;
            fs::remove_file(staged)?;
        }
        Ok(dest)
    }

    /// Read a finalized artifact's bytes.
    ///
    /// A missing artifact is a recoverable not-found outcome, not a fatal
    /// error: the record may still exist while the file is gone.
    pub fn load(&self, filename: &str) -> Result<Vec<u8>> {
        match fs::read(self.artifact_path(filename)) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(TransferError::NotFound(format!("artifact {filename}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a finalized artifact exists.
    pub fn exists(&self, filename: &str) -> bool {
        self.artifact_path(filename).exists()
    }

    /// Delete a finalized artifact. An already-absent file counts as success.
    pub fn delete(&self, filename: &str) -> Result<()> {
        match fs::remove_file(self.artifact_path(filename)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a transfer's scratch directory and everything under it.
    ///
    /// Called unconditionally at the end of ingestion, success or failure.
    pub fn remove_scratch(&self, transfer_id: &str) {
        let dir = self.scratch_dir(transfer_id);
        if dir.exists() {
            if let Err(e) = fs::remove_dir_all(&dir) {
                tracing::warn!("Failed to remove scratch dir {:?}: {}", dir, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("uploads")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_new_creates_directories() {
        let (_dir, store) = temp_store();
        assert!(store.root().exists());
        assert!(store.root().join("temp").exists());
    }

    #[test]
    fn test_stage_flat_file() {
        let (_dir, store) = temp_store();
        let path = store.stage("t-1", "a.txt", b"hello").unwrap();
        assert_eq!(fs::read(path).unwrap(), b"hello");
    }

    #[test]
    fn test_stage_file_in_folder() {
        let (_dir, store) = temp_store();
        let path = store.stage("t-1", "notes/b.txt", b"world").unwrap();
        assert!(path.ends_with("temp/t-1/notes/b.txt"));
        assert_eq!(fs::read(path).unwrap(), b"world");
    }

    #[test]
    fn test_finalize_moves_out_of_scratch() {
        let (_dir, store) = temp_store();
        let staged = store.stage("t-1", "a.txt", b"data").unwrap();

        let final_path = store.finalize(&staged, "a.txt").unwrap();
        assert_eq!(final_path, store.artifact_path("a.txt"));
        assert!(!staged.exists());
        assert_eq!(store.load("a.txt").unwrap(), b"data");
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let (_dir, store) = temp_store();
        let err = store.load("ghost.bin").unwrap_err();
        assert!(matches!(err, TransferError::NotFound(_)));
    }

    #[test]
    fn test_delete_tolerates_absent_file() {
        let (_dir, store) = temp_store();
        store.delete("never-existed.zip").unwrap();

        let staged = store.stage("t-1", "x.bin", b"x").unwrap();
        store.finalize(&staged, "x.bin").unwrap();
        store.delete("x.bin").unwrap();
        assert!(!store.exists("x.bin"));
    }

    #[test]
    fn test_remove_scratch() {
        let (_dir, store) = temp_store();
        store.stage("t-1", "folder/a.txt", b"a").unwrap();
        assert!(store.scratch_dir("t-1").exists());

        store.remove_scratch("t-1");
        assert!(!store.scratch_dir("t-1").exists());

        // Idempotent
        store.remove_scratch("t-1");
    }
}
