//! Progress notifications emitted while the pipeline runs.
//!
//! Observers only watch; nothing they do feeds back into scanning or
//! matching, so the pipeline runs the same with [`NoProgress`].

use std::path::Path;

/// Receives progress events from the scanner and the matcher.
#[allow(unused_variables)]
pub trait ProgressObserver {
    /// Scanning is about to start on `documents` files.
    fn scan_started(&mut self, documents: usize) {}

    /// A document was read completely and contributed `lines` text lines.
    fn document_finished(&mut self, path: &Path, lines: usize) {}

    /// A document could not be read and was left out of the report.
    fn document_skipped(&mut self, path: &Path, reason: &str) {}

    /// Pattern search is about to start on `records` text lines.
    fn matching_started(&mut self, records: usize) {}

    /// One text line was searched and produced `matches` matches.
    fn record_searched(&mut self, matches: usize) {}

    /// The run is complete.
    fn finished(&mut self) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}
