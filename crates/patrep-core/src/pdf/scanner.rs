//! Sequential scanning of PDF documents into one ordered corpus.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::extractor::PdfExtractor;
use super::page::PageExtractor;
use super::PdfProcessor;
use crate::error::Result;
use crate::models::{SourceRef, TextLineRecord};
use crate::progress::ProgressObserver;

/// A document left out of the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

/// Per-run scan statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Documents handed to the scanner.
    pub documents: usize,
    /// Documents read completely.
    pub scanned: usize,
    /// Pages read across all scanned documents.
    pub pages: usize,
    /// Documents that failed and contributed nothing.
    pub skipped: Vec<SkippedDocument>,
}

/// Records extracted from a batch of documents.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    /// Every extracted line in document, page, then line order.
    pub records: Vec<TextLineRecord>,
    pub report: ScanReport,
}

/// Reads documents one at a time and concatenates their text lines.
pub struct DocumentScanner<P = PdfExtractor> {
    processor: PhantomData<fn() -> P>,
}

impl DocumentScanner<PdfExtractor> {
    /// Create a scanner backed by [`PdfExtractor`].
    pub fn new() -> Self {
        Self::with_processor()
    }
}

impl Default for DocumentScanner<PdfExtractor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PdfProcessor + Default> DocumentScanner<P> {
    /// Create a scanner backed by a custom processor type.
    pub fn with_processor() -> Self {
        Self {
            processor: PhantomData,
        }
    }

    /// Scan `paths` in order.
    ///
    /// A document that fails at any point is skipped as a whole and the scan
    /// continues with the next one.
    pub fn scan<T: AsRef<Path>>(
        &self,
        paths: &[T],
        observer: &mut dyn ProgressObserver,
    ) -> ScanOutput {
        let mut output = ScanOutput::default();
        output.report.documents = paths.len();
        observer.scan_started(paths.len());

        for path in paths {
            let path = path.as_ref();
            debug!("Processing file: {}", path.display());

            match self.scan_document(path) {
                Ok((records, pages)) => {
                    observer.document_finished(path, records.len());
                    output.report.scanned += 1;
                    output.report.pages += pages as usize;
                    output.records.extend(records);
                }
                Err(e) => {
                    let reason = e.to_string();
                    warn!("Skipping {}: {}", path.display(), reason);
                    observer.document_skipped(path, &reason);
                    output.report.skipped.push(SkippedDocument {
                        path: path.to_path_buf(),
                        reason,
                    });
                }
            }
        }

        info!("Total files processed: {}", output.report.documents);
        output
    }

    /// Read every page of one document. Returns its records and page count.
    ///
    /// The document is released before this returns, on success and on error.
    pub fn scan_document(&self, path: &Path) -> Result<(Vec<TextLineRecord>, u32)> {
        let data = std::fs::read(path)?;
        let source = Arc::new(SourceRef::from_path(path)?);

        let mut processor = P::default();
        processor.load(&data)?;

        let pages = processor.page_count();
        let extractor = PageExtractor::new(source);
        let mut records = Vec::new();

        for page in 1..=pages {
            let layout = processor.page_layout(page)?;
            records.extend(extractor.extract(&layout));
        }

        debug!("{}: {} pages, {} lines", path.display(), pages, records.len());
        Ok((records, pages))
    }
}
