//! Core library for PDF pattern reports.
//!
//! This crate provides:
//! - PDF text line extraction with page coordinates
//! - Case-insensitive pattern search over the extracted lines
//! - Aggregation into counted summary rows and a pattern legend
//! - Report output as an Excel workbook or CSV files

pub mod error;
pub mod matcher;
pub mod models;
pub mod pdf;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod text;

pub use error::{ConfigError, PatrepError, PatternError, PdfError, ReportError, Result};
pub use matcher::PatternMatcher;
pub use models::{
    BoundingBox, LegendRow, MatchResult, OutputFormat, PatrepConfig, PatternSpec, SourceRef,
    SummaryRow, TextLineRecord,
};
pub use pdf::{DocumentScanner, PageExtractor, PdfExtractor, PdfProcessor, ScanReport};
pub use pipeline::{Pipeline, PipelineOutcome, Report};
pub use progress::{NoProgress, ProgressObserver};
pub use report::{aggregate, CsvSink, NoMatches, ReportSink, Sheet, XlsxSink};
pub use text::sanitize;
