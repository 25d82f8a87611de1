// src/utils/files.rs

//! Crash-safe file writes.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{EditorError, Result};

/// Sibling path the data is staged in before it replaces `path`.
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Writes `value` as pretty JSON into a staging file, flushes it to disk and
/// renames it over `path`. On failure `path` is left as it was.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let tmp = staging_path(path);
    let result = write_json(&tmp, value)
        .and_then(|()| fs::rename(&tmp, path).map_err(|e| EditorError::io(path, e)));
    if result.is_err() && tmp.is_file() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| EditorError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| EditorError::json(path, e))?;
    writer.flush().map_err(|e| EditorError::io(path, e))?;
    writer.get_ref().sync_all().map_err(|e| EditorError::io(path, e))?;
    Ok(())
}
