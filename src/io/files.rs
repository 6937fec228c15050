use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::ops::export::{ExportFormat, export_filename};
use crate::ops::import::ImportFormat;

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Write an export body into `dir` as `tasks-YYYY-MM-DD.{json,csv}`.
/// Returns the path written.
pub fn write_export(
    dir: &Path,
    format: ExportFormat,
    date: NaiveDate,
    body: &str,
) -> Result<PathBuf, FileError> {
    let path = dir.join(export_filename(format, date));
    write_file(&path, body)?;
    Ok(path)
}

/// Write `body` to `path`, creating parent directories
pub fn write_file(path: &Path, body: &str) -> Result<(), FileError> {
    let write_err = |source| FileError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, body).map_err(write_err)
}

/// Read an import file; the format follows the extension
pub fn read_import(path: &Path) -> Result<(String, ImportFormat), FileError> {
    let text = fs::read_to_string(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((text, ImportFormat::from_path(path)))
}
