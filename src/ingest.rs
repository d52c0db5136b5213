//! Upload ingestion pipeline.
//!
//! Takes a batch of `(relative path, bytes)` pairs, stages them in the
//! transfer's scratch area, reconstructs at most one level of folder
//! nesting, decides between single-file and archive packaging, hashes the
//! finalized deliverable and moves it into the artifact store root.
//!
//! Everything here is synchronous file I/O; callers run it on a blocking
//! worker. The caller also owns scratch cleanup, which must happen on both
//! success and failure.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::store::ArtifactStore;
use crate::{Result, TransferError};

/// One file of an upload batch, as received from the client.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Client-supplied relative path (may be arbitrarily nested).
    pub relative_path: String,
    /// File bytes.
    pub content: Vec<u8>,
}

/// A file staged in the scratch area.
#[derive(Debug)]
struct StagedFile {
    /// Flattened relative name, used as the archive entry name.
    name: String,
    /// Top-level folder, empty for files at the batch root.
    folder: String,
    /// Absolute path in the scratch directory.
    path: PathBuf,
}

/// Outcome of staging and packaging one upload batch.
#[derive(Debug)]
pub struct Packaged {
    /// Final artifact name under the store root.
    pub final_name: String,
    /// SHA-256 hex digest of the finalized deliverable bytes.
    pub content_hash: String,
    /// Size of the finalized deliverable in bytes.
    pub size: u64,
}

/// Flatten a client-supplied relative path to at most one folder level.
///
/// Deeper nesting is collapsed to `<top folder>/<basename>`; paths without a
/// folder keep just their name. The empty folder is a sentinel distinct from
/// any real folder name. Dot components are treated as "no folder" so a path
/// can never escape the scratch directory.
pub fn flatten_path(raw: &str) -> (String, String) {
    let clean = raw.trim_start_matches('/');
    let parts: Vec<&str> = clean.split('/').collect();

    if parts.len() > 1 {
        let folder = match parts[0] {
            "." | ".." => "",
            f => f,
        };
        let base = parts[parts.len() - 1];
        let name = if folder.is_empty() {
            base.to_string()
        } else {
            format!("{folder}/{base}")
        };
        (folder.to_string(), name)
    } else {
        (String::new(), clean.to_string())
    }
}

/// Stage an upload batch and package it into a single deliverable.
///
/// More than one file, or any file inside a folder, produces a deflate zip
/// named `iTransfer_<YYMMDDHHMM>.zip` whose entry names are the flattened
/// relative paths. A lone folderless file becomes the deliverable directly.
///
/// On success the deliverable sits under the store root; the scratch
/// directory is left for the caller to remove. Any failure propagates
/// without touching the record store.
pub fn stage_and_package(
    store: &ArtifactStore,
    transfer_id: &str,
    files: &[UploadFile],
) -> Result<Packaged> {
    if files.is_empty() {
        return Err(TransferError::Validation("no files to package".to_string()));
    }

    // Stage every file, reconstructing one folder level
    let mut staged = Vec::with_capacity(files.len());
    for file in files {
        let (folder, name) = flatten_path(&file.relative_path);
        let base = name.rsplit('/').next().unwrap_or("");
        if base.is_empty() || base == "." || base == ".." {
            return Err(TransferError::Validation(format!(
                "invalid file path: {:?}",
                file.relative_path
            )));
        }
        let path = store.stage(transfer_id, &name, &file.content)?;
        tracing::debug!("Staged {} ({} bytes)", name, file.content.len());
        staged.push(StagedFile { name, folder, path });
    }

    let needs_archive = staged.len() > 1 || staged.iter().any(|f| !f.folder.is_empty());

    let (final_name, staged_deliverable) = if needs_archive {
        // Archive names have minute resolution: a later batch packaged in
        // the same minute replaces the earlier archive in the store root
        let final_name = format!("iTransfer_{}.zip", Utc::now().format("%y%m%d%H%M"));
        let zip_path = write_archive(store, transfer_id, &final_name, &staged)?;
        (final_name, zip_path)
    } else {
        let single = &staged[0];
        (single.name.clone(), single.path.clone())
    };

    // Hash the final bytes, then move into the store root (rename preserves them)
    let bytes = fs::read(&staged_deliverable)?;
    let content_hash = hex::encode(Sha256::digest(&bytes));
    let size = bytes.len() as u64;

    store.finalize(&staged_deliverable, &final_name)?;
    tracing::info!(
        "Packaged transfer {} as {} ({} bytes, sha256 {})",
        transfer_id,
        final_name,
        size,
        content_hash
    );

    Ok(Packaged {
        final_name,
        content_hash,
        size,
    })
}

/// Write all staged files into a deflate-compressed zip in the scratch area.
fn write_archive(
    store: &ArtifactStore,
    transfer_id: &str,
    archive_name: &str,
    staged: &[StagedFile],
) -> Result<PathBuf> {
    let zip_path = store.scratch_dir(transfer_id).join(archive_name);
    let file = fs::File::create(&zip_path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in staged {
        zip.start_file(entry.name.as_str(), options)?;
        let content = fs::read(&entry.path)?;
        zip.write_all(&content)?;
    }

    zip.finish()?;
    Ok(zip_path)
}
