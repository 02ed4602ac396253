//! Records-oriented JSON files.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::AnalyticsError;

/// Reads a JSON array of records.
///
/// # Errors
///
/// Returns [`AnalyticsError::Io`] if the file cannot be read and
/// [`AnalyticsError::Json`] if it does not deserialize into `T`.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, AnalyticsError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Writes records as pretty-printed JSON, replacing any existing file.
///
/// Writes to a `.tmp` sibling first and renames it into place, creating the
/// parent directory if needed.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if serialization or any file operation fails.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), AnalyticsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    let contents = serde_json::to_string_pretty(records)?;
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)?;
    log::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
