//! Conversion of page layouts into text line records.

use std::sync::Arc;

use super::layout::PageLayout;
use crate::models::{SourceRef, TextLineRecord};
use crate::text::sanitize;

/// Turns the layout lines of one document's pages into sanitized records.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    source: Arc<SourceRef>,
}

impl PageExtractor {
    /// Create an extractor for pages of the document identified by `source`.
    pub fn new(source: Arc<SourceRef>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<SourceRef> {
        &self.source
    }

    /// One record per text line, in layout order.
    ///
    /// Span texts are joined with a single space regardless of their original
    /// spacing; patterns may depend on this exact join.
    pub fn extract(&self, page: &PageLayout) -> Vec<TextLineRecord> {
        page.lines
            .iter()
            .filter_map(|line| {
                let bbox = line.bbox()?;
                Some(TextLineRecord::new(
                    Arc::clone(&self.source),
                    page.number,
                    sanitize(&line.text()),
                    bbox,
                ))
            })
            .collect()
    }
}
