//! Locating inputs on disk: source images and the latest tag-set file.

use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::error::{PipelineError, PipelineResult};
use crate::types::TagSet;

/// Resolve an image reference to a file on disk.
///
/// An existing path is used as is; otherwise the reference is treated as a
/// file name inside `input_dir`.
pub fn resolve_image(reference: &Path, input_dir: &Path) -> PipelineResult<PathBuf> {
    if reference.is_file() {
        return Ok(reference.to_path_buf());
    }
    let candidate = input_dir.join(reference);
    if candidate.is_file() {
        Ok(candidate)
    } else {
        Err(PipelineError::MissingInput(candidate))
    }
}

/// A tag set read from disk, with the file it came from.
#[derive(Debug, Clone)]
pub struct TagSource {
    pub tags: TagSet,
    pub path: PathBuf,
}

impl TagSource {
    /// Load the most recently modified `.json` file directly inside `dir`.
    ///
    /// Whatever file was written last wins, even if another process is still
    /// producing tags for a different image.
    pub fn latest(dir: &Path) -> PipelineResult<Self> {
        let path = latest_json(dir)?;
        let content = std::fs::read_to_string(&path).map_err(|e| {
            PipelineError::InvalidTagFile {
                path: path.clone(),
                message: e.to_string(),
            }
        })?;
        let tags: TagSet =
            serde_json::from_str(&content).map_err(|e| PipelineError::InvalidTagFile {
                path: path.clone(),
                message: e.to_string(),
            })?;
        tracing::debug!("Loaded {} tags from {:?}", tags.len(), path);
        Ok(Self { tags, path })
    }

    /// File name without the directory.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Path of the newest `.json` file in `dir` (non-recursive).
pub fn latest_json(dir: &Path) -> PipelineResult<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_json(e.path()))
        .filter_map(|e| {
            let modified = e.metadata().ok()?.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            Some((modified, e.into_path()))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
        .ok_or_else(|| PipelineError::MissingTagSource {
            dir: dir.to_path_buf(),
        })
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("json")
}
