//! One CSV file per sheet.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{validate_sheet_names, ReportSink, Sheet};
use crate::error::ReportError;

/// Writes `<stem>_<Sheet>.csv` files into a directory.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
    stem: String,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
        }
    }

    /// Path of the file a sheet named `name` is written to.
    pub fn sheet_path(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}.csv", self.stem, name.replace(' ', "_")))
    }

    fn write_sheet(&self, sheet: &Sheet) -> Result<PathBuf, ReportError> {
        let path = self.sheet_path(&sheet.name);
        let csv_error = |source| ReportError::Csv {
            path: path.clone(),
            source,
        };

        let mut wtr = csv::Writer::from_path(&path).map_err(csv_error)?;
        wtr.write_record(&sheet.columns).map_err(csv_error)?;
        for row in &sheet.rows {
            wtr.write_record(row.iter().map(|cell| cell.display()))
                .map_err(csv_error)?;
        }
        wtr.flush()?;

        Ok(path)
    }
}

impl ReportSink for CsvSink {
    fn write(&mut self, sheets: &[Sheet]) -> Result<(), ReportError> {
        validate_sheet_names(sheets)?;
        std::fs::create_dir_all(&self.dir)?;

        for sheet in sheets {
            let path = self.write_sheet(sheet)?;
            debug!("Wrote {} rows to {}", sheet.rows.len(), path.display());
        }
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.dir
    }
}
