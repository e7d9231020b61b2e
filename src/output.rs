//! Atomic CSV output.
//!
//! The table is written to a temporary file next to the destination and
//! renamed into place once complete. A failed or interrupted write leaves
//! any previous file untouched and no partial file behind.

use crate::error::{Error, Result};
use crate::table::Table;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Write `table` to `path`, creating the parent directory if needed.
///
/// Returns the path written.
pub fn write_table(table: &Table, path: &Path) -> Result<PathBuf> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let temp_file = NamedTempFile::new_in(&parent).map_err(|e| Error::Output {
        path: path.to_path_buf(),
        reason: format!("failed to create temporary file: {}", e),
    })?;

    let mut writer = csv::Writer::from_writer(BufWriter::new(temp_file));
    table.write_csv(&mut writer)?;

    let buf_writer = writer.into_inner().map_err(|e| Error::Output {
        path: path.to_path_buf(),
        reason: format!("failed to flush CSV writer: {}", e.error()),
    })?;
    let temp_file = buf_writer.into_inner().map_err(|e| Error::Output {
        path: path.to_path_buf(),
        reason: format!("failed to flush buffer: {}", e.error()),
    })?;

    temp_file.persist(path).map_err(|e| Error::Output {
        path: path.to_path_buf(),
        reason: format!("failed to persist file: {}", e.error),
    })?;

    Ok(path.to_path_buf())
}

/// Async wrapper that runs [`write_table`] on the blocking pool
pub async fn write_table_blocking(table: Table, path: PathBuf) -> Result<PathBuf> {
    tokio::task::spawn_blocking(move || write_table(&table, &path))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(format!("CSV writer task failed: {}", e))))?
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten_observation;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn one_row_table() -> Table {
        let record = json!({
            "id": 1, "observed_on_string": null, "time_observed_at": null,
            "created_time_zone": null, "created_at": null, "updated_at": null,
            "description": "fox, red", "user": {"id": 2, "login": "l"},
            "quality_grade": "casual", "reviewed_by": [], "faves_count": 0,
            "num_identification_agreements": 0, "num_identification_disagreements": 0,
            "identifications_most_agree": false, "identifications_most_disagree": false,
            "captive": true, "place_guess": null, "place_ids": [], "location": null,
            "positional_accuracy": null, "geoprivacy": null, "taxon_geoprivacy": null,
            "obscured": false, "species_guess": null, "taxon": null, "identifications": null
        });
        Table::from_rows(vec![flatten_observation(&record).unwrap()])
    }

    #[test]
    fn writes_header_and_rows_without_index_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CNC_Test.csv");

        let written = write_table(&one_row_table(), &path).unwrap();
        assert_eq!(written, path);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "id");
        let records: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(&records[0][0], "1");
        assert_eq!(&records[0][6], "fox, red");
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/raw/CNC_Test.csv");

        write_table(&one_row_table(), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn leaves_no_temporary_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CNC_Test.csv");
        write_table(&one_row_table(), &path).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CNC_Test.csv");
        fs::write(&path, "stale").unwrap();

        write_table(&one_row_table(), &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("id,"));
    }

    #[test]
    fn empty_table_writes_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CNC_Empty.csv");

        write_table(&Table::default(), &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[tokio::test]
    async fn blocking_wrapper_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CNC_Async.csv");

        let written = write_table_blocking(one_row_table(), path.clone())
            .await
            .unwrap();
        assert_eq!(written, path);
        assert!(path.exists());
    }
}
