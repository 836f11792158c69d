//! Report aggregation, table projection, and persistence.

mod aggregate;
mod csv;
mod table;
mod xlsx;

pub use self::aggregate::{aggregate, legend, Aggregation, NoMatches};
pub use self::csv::CsvSink;
pub use self::table::{
    details_sheet, legend_sheet, summary_sheet, text_blocks_sheet, Cell, Sheet, DETAILS_SHEET,
    LEGEND_SHEET, SUMMARY_SHEET, TEXT_BLOCKS_SHEET,
};
pub use self::xlsx::XlsxSink;

use std::collections::HashSet;
use std::path::Path;

use crate::error::ReportError;

/// Longest sheet name spreadsheet applications accept.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Destination for a set of named sheets.
pub trait ReportSink {
    /// Persist every sheet, in order, as one artifact.
    fn write(&mut self, sheets: &[Sheet]) -> Result<(), ReportError>;

    /// Where the artifact is written.
    fn location(&self) -> &Path;
}

/// Reject empty, overlong, reserved, or repeated sheet names.
pub(crate) fn validate_sheet_names(sheets: &[Sheet]) -> Result<(), ReportError> {
    let mut seen = HashSet::new();
    for sheet in sheets {
        let name = sheet.name.as_str();
        if name.is_empty()
            || name.chars().count() > MAX_SHEET_NAME_LEN
            || name.contains(['[', ']', ':', '*', '?', '/', '\\'])
        {
            return Err(ReportError::InvalidSheetName(name.to_string()));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(ReportError::DuplicateSheet(name.to_string()));
        }
    }
    Ok(())
}
