//! Enumeration of the local files to upload.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// A local file to upload, with the basename it is published under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAsset {
    path: PathBuf,
    name: String,
}

impl LocalAsset {
    /// Build from a file path; `None` when the path has no UTF-8 basename
    pub fn new(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = path.file_name()?.to_str()?.to_string();
        Some(Self { path, name })
    }

    /// Path on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remote asset name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Collect the files to upload from `path`
///
/// A file yields itself. A directory yields its non-hidden regular files
/// (no recursion), sorted by name.
pub fn local_assets(path: &Path) -> Result<Vec<LocalAsset>> {
    let path = std::path::absolute(path)?;
    let metadata = std::fs::metadata(&path)?;

    let mut files: Vec<PathBuf> = if metadata.is_dir() {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&path)? {
            let entry = entry?;
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            // Follows symlinks so links to files are uploaded
            if hidden || !std::fs::metadata(entry.path())?.is_file() {
                continue;
            }
            files.push(entry.path());
        }
        files
    } else {
        vec![path.clone()]
    };
    files.sort();

    let assets: Vec<LocalAsset> = files
        .into_iter()
        .filter_map(|file| {
            let asset = LocalAsset::new(&file);
            if asset.is_none() {
                log::warn!("Skipping file with non UTF-8 name: {}", file.display());
            }
            asset
        })
        .collect();

    if assets.is_empty() {
        return Err(ConfigError::NoLocalAssets {
            path: path.display().to_string(),
        }
        .into());
    }

    Ok(assets)
}
