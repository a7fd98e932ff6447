//! Shared record store utilities.
//!
//! Records are claimed by creating their directory or file atomically. A second writer that
//! computed the same key sees `AlreadyExists` and fails cleanly instead of overwriting.

use crate::error::{RecordError, RecordResult};
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

/// Atomically creates `dir`, creating its parents as needed.
///
/// Returns `Ok(false)` when the directory already exists.
///
/// # Errors
///
/// Returns `RecordError::StorageDirCreation` if a parent cannot be created and
/// `RecordError::RecordDirCreation` for any other failure creating `dir` itself.
pub(crate) fn try_create_dir(dir: &Path) -> RecordResult<bool> {
    if let Some(parent) = dir.parent() {
        fs::create_dir_all(parent).map_err(RecordError::StorageDirCreation)?;
    }

    match fs::create_dir(dir) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(RecordError::RecordDirCreation(e)),
    }
}

/// Writes `content` to a file that must not exist yet.
///
/// Returns `Ok(false)` when the file already exists; its content is left untouched.
pub(crate) fn try_create_file(path: &Path, content: &str) -> RecordResult<bool> {
    let mut file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(RecordError::FileWrite(e)),
    };

    file.write_all(content.as_bytes())
        .map_err(RecordError::FileWrite)?;
    Ok(true)
}

/// Runs `fill` on a freshly claimed directory and removes the directory if it fails.
///
/// If removal also fails, both errors are reported in
/// [`RecordError::CleanupAfterCreateFailed`].
pub(crate) fn fill_or_remove<T>(
    dir: &Path,
    fill: impl FnOnce() -> RecordResult<T>,
) -> RecordResult<T> {
    match fill() {
        Ok(value) => Ok(value),
        Err(create_error) => match fs::remove_dir_all(dir) {
            Ok(()) => Err(create_error),
            Err(cleanup_error) => Err(RecordError::CleanupAfterCreateFailed {
                path: dir.to_path_buf(),
                create_error: Box::new(create_error),
                cleanup_error,
            }),
        },
    }
}

/// Lists the entries of `dir`. A missing directory is treated as empty.
pub(crate) fn read_dir_paths(dir: &Path) -> RecordResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(RecordError::DirRead(e)),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(RecordError::DirRead)?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

/// Next free numeric key among the entries of `dir`, ignoring `extension` if given.
///
/// Keys start at 1. Entries whose names are not plain integers are ignored.
pub(crate) fn next_numeric_key(dir: &Path, extension: Option<&str>) -> RecordResult<u64> {
    let max = read_dir_paths(dir)?
        .iter()
        .filter_map(|path| numeric_key(path, extension))
        .max()
        .unwrap_or(0);

    max.checked_add(1).ok_or_else(|| {
        RecordError::InvalidInput(format!("key sequence in {} is exhausted", dir.display()))
    })
}

pub(crate) fn numeric_key(path: &Path, extension: Option<&str>) -> Option<u64> {
    let name = path.file_name()?.to_str()?;
    let stem = match extension {
        Some(ext) => name.strip_suffix(ext)?.strip_suffix('.')?,
        None => name,
    };
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// Reads a record file, mapping a missing file to `not_found`.
pub(crate) fn read_record_file(
    path: &Path,
    not_found: impl FnOnce() -> RecordError,
) -> RecordResult<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found()),
        Err(e) => Err(RecordError::FileRead(e)),
    }
}

/// Parses every file in `paths`, skipping (with a warning) those that cannot be read or parsed.
pub(crate) fn load_all<T>(
    paths: impl IntoIterator<Item = PathBuf>,
    parse: impl Fn(&str) -> records::RecordsResult<T>,
) -> Vec<T> {
    let mut loaded = Vec::new();
    for path in paths {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("failed to read record {}: {err}", path.display());
                continue;
            }
        };
        match parse(&content) {
            Ok(record) => loaded.push(record),
            Err(err) => tracing::warn!("skipping unparseable record {}: {err}", path.display()),
        }
    }
    loaded
}
