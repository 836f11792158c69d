//! Error types for the patrep-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the patrep library.
#[derive(Error, Debug)]
pub enum PatrepError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Pattern compilation error.
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Report writing error.
    #[error("report error: {0}")]
    Report(#[from] ReportError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to read or decode a page content stream.
    #[error("failed to read content of page {page}: {reason}")]
    Content { page: u32, reason: String },

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// No document has been loaded yet.
    #[error("no document loaded")]
    NotLoaded,
}

/// Errors related to search patterns.
#[derive(Error, Debug)]
pub enum PatternError {
    /// A configured expression is not a valid regular expression.
    #[error("Pattern_{ordinal} ({expression:?}) is not a valid regular expression: {source}")]
    Invalid {
        ordinal: usize,
        expression: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while persisting report sheets.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Failed to build the workbook archive.
    #[error("failed to write workbook {path}: {reason}")]
    Workbook { path: PathBuf, reason: String },

    /// Failed to write a CSV sheet.
    #[error("failed to write CSV sheet {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Two sheets share a name.
    #[error("duplicate sheet name: {0}")]
    DuplicateSheet(String),

    /// A sheet name is empty, too long, or contains reserved characters.
    #[error("invalid sheet name: {0:?}")]
    InvalidSheetName(String),

    /// I/O error while writing the report.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has wrong value types.
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The configuration could not be serialized.
    #[error("failed to encode configuration: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Result type for the patrep library.
pub type Result<T> = std::result::Result<T, PatrepError>;
