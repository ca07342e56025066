//! Artifact naming and writing.
//!
//! Two naming policies coexist:
//! - [`unique_path`] (tags, descriptions): `<prefix>_<ts>.<ext>`, then
//!   `<prefix>_<ts>_1.<ext>`, `_2`, … until a name is free. The file is created
//!   exclusively so the name is claimed.
//! - [`timestamped_path`] (location): bare `<prefix>_<ts>.<ext>`. Two writes
//!   within the same second overwrite each other.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};
use crate::output::{OutputFormat, OutputWriter};

/// Local wall-clock timestamp with one-second resolution.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// `<dir>/<prefix>_<ts>.<ext>` with no collision check.
pub fn timestamped_path(dir: &Path, prefix: &str, ts: &str, ext: &str) -> PathBuf {
    dir.join(format!("{prefix}_{ts}.{ext}"))
}

/// Create the first free `<prefix>_<ts>[_N].<ext>` in `dir`.
///
/// Creates `dir` if needed. Returns the claimed path and the open file.
pub fn unique_path(dir: &Path, prefix: &str, ts: &str, ext: &str) -> io::Result<(PathBuf, File)> {
    std::fs::create_dir_all(dir)?;
    let mut counter = 0u32;
    loop {
        let name = if counter == 0 {
            format!("{prefix}_{ts}.{ext}")
        } else {
            format!("{prefix}_{ts}_{counter}.{ext}")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => counter += 1,
            Err(e) => return Err(e),
        }
    }
}

/// Write `value` as pretty JSON to a freshly claimed unique path.
pub fn write_unique_json<T: Serialize + ?Sized>(
    dir: &Path,
    prefix: &str,
    value: &T,
) -> PipelineResult<PathBuf> {
    let (path, file) = unique_path(dir, prefix, &timestamp(), "json").map_err(|e| {
        PipelineError::Artifact {
            path: dir.to_path_buf(),
            message: e.to_string(),
        }
    })?;
    write_json(file, value).map_err(|e| artifact_error(&path, e))?;
    Ok(path)
}

/// Write `text` to a freshly claimed unique path.
pub fn write_unique_text(dir: &Path, prefix: &str, text: &str) -> PipelineResult<PathBuf> {
    let (path, mut file) = unique_path(dir, prefix, &timestamp(), "txt").map_err(|e| {
        PipelineError::Artifact {
            path: dir.to_path_buf(),
            message: e.to_string(),
        }
    })?;
    file.write_all(text.as_bytes())
        .map_err(|e| artifact_error(&path, e))?;
    Ok(path)
}

/// Write `value` as pretty JSON to `path`, replacing any existing file.
pub fn overwrite_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| artifact_error(path, e))?;
    }
    let file = File::create(path).map_err(|e| artifact_error(path, e))?;
    write_json(file, value).map_err(|e| artifact_error(path, e))
}

fn write_json<T: Serialize + ?Sized>(file: File, value: &T) -> io::Result<()> {
    let mut writer = OutputWriter::new(BufWriter::new(file), OutputFormat::Json);
    writer.write(value)?;
    writer.flush()
}

pub(crate) fn artifact_error(path: &Path, e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Artifact {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TagSet;

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp();
        // 2026-10-17_09-05-03
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "_");
        assert!(!ts.contains(':'));
    }

    #[test]
    fn test_unique_path_appends_counter() {
        let dir = tempfile::tempdir().unwrap();
        let ts = "2026-01-01_00-00-00";

        let (first, _) = unique_path(dir.path(), "description_llava", ts, "txt").unwrap();
        let (second, _) = unique_path(dir.path(), "description_llava", ts, "txt").unwrap();
        let (third, _) = unique_path(dir.path(), "description_llava", ts, "txt").unwrap();

        assert_eq!(first.file_name().unwrap(), "description_llava_2026-01-01_00-00-00.txt");
        assert_eq!(second.file_name().unwrap(), "description_llava_2026-01-01_00-00-00_1.txt");
        assert_eq!(third.file_name().unwrap(), "description_llava_2026-01-01_00-00-00_2.txt");
    }

    #[test]
    fn test_unique_path_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let (path, _) = unique_path(&nested, "tags", "ts", "json").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_timestamped_path_has_no_counter() {
        let dir = Path::new("/out");
        let path = timestamped_path(dir, "location_gdino", "2026-01-01_00-00-00", "json");
        assert_eq!(path, PathBuf::from("/out/location_gdino_2026-01-01_00-00-00.json"));
    }

    #[test]
    fn test_overwrite_json_replaces_silently() {
        let dir = tempfile::tempdir().unwrap();
        let path = timestamped_path(dir.path(), "location_gdino", "same-second", "json");

        overwrite_json(&path, &vec!["first"]).unwrap();
        overwrite_json(&path, &vec!["second"]).unwrap();

        let content: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content, vec!["second".to_string()]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_unique_json_is_readable_tag_set() {
        let dir = tempfile::tempdir().unwrap();
        let tags = TagSet::from_labels(["cup", "table"]);
        let path = write_unique_json(dir.path(), "tags_ram_plus", &tags).unwrap();

        let parsed: TagSet = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed, tags);
    }
}
