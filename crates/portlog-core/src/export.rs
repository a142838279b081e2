use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::schema::{UnifiedRecord, UNIFIED_KEYS};

pub const CSV_FILE_NAME: &str = "combined_output.csv";
pub const JSON_FILE_NAME: &str = "combined_output.json";

/// Write records as CSV with the unified column order. `ml_entities` is
/// JSON-encoded inside its cell.
pub fn write_csv<W: Write>(writer: W, records: &[UnifiedRecord]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(UNIFIED_KEYS)?;

    for record in records {
        let entities = serde_json::to_string(&record.ml_entities)?;
        csv.write_record([
            record.id.as_str(),
            record.document_type.as_str(),
            record.event.as_str(),
            record.start_time.as_str(),
            record.end_time.as_str(),
            record.detail.as_str(),
            entities.as_str(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(mut writer: W, records: &[UnifiedRecord]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// Per-request dump of combined output for offline inspection.
#[derive(Debug, Clone)]
pub struct DebugSink {
    root: PathBuf,
}

impl DebugSink {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write both dumps under `<root>/<request_id>/`, returning the directory.
    pub fn write(&self, request_id: &str, records: &[UnifiedRecord]) -> Result<PathBuf> {
        let dir = self.root.join(request_id);
        std::fs::create_dir_all(&dir)?;

        let csv_file = std::fs::File::create(dir.join(CSV_FILE_NAME))?;
        write_csv(std::io::BufWriter::new(csv_file), records)?;

        let json_file = std::fs::File::create(dir.join(JSON_FILE_NAME))?;
        write_json(std::io::BufWriter::new(json_file), records)?;

        tracing::debug!(dir = %dir.display(), records = records.len(), "Debug dump written");
        Ok(dir)
    }

    /// Like [`DebugSink::write`], but failures are only logged.
    pub fn dump(&self, request_id: &str, records: &[UnifiedRecord]) -> Option<PathBuf> {
        match self.write(request_id, records) {
            Ok(dir) => Some(dir),
            Err(e) => {
                tracing::warn!(
                    request_id,
                    root = %self.root.display(),
                    error = %e,
                    "Failed to write debug dump"
                );
                None
            }
        }
    }
}
