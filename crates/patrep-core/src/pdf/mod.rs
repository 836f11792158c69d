//! PDF processing module.

mod cmap;
mod extractor;
mod layout;
mod page;
mod scanner;

#[cfg(test)]
#[path = "../../tests/common/mod.rs"]
pub(crate) mod testing;

pub use cmap::{decode_text_simple, FontDecoder, ToUnicodeMap};
pub use extractor::PdfExtractor;
pub use layout::{layout_lines, LayoutLine, LayoutSpan, PageLayout};
pub use page::PageExtractor;
pub use scanner::{DocumentScanner, ScanOutput, ScanReport, SkippedDocument};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Reconstruct the text lines of a specific page (1-indexed).
    fn page_layout(&self, page: u32) -> Result<PageLayout>;
}
