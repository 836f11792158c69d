//! Case-insensitive regular-expression search over extracted lines.

use regex::{Regex, RegexBuilder};
use tracing::{debug, info};

use crate::error::PatternError;
use crate::models::{MatchResult, PatternSpec, TextLineRecord};
use crate::progress::ProgressObserver;

/// A pattern compiled for matching.
#[derive(Debug, Clone)]
struct CompiledPattern {
    ordinal: usize,
    regex: Regex,
}

/// Searches text lines for an ordered set of patterns.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    patterns: Vec<CompiledPattern>,
}

impl PatternMatcher {
    /// Compile `specs` case-insensitively, keeping their order.
    ///
    /// An empty list is valid and matches nothing.
    pub fn new(specs: &[PatternSpec]) -> Result<Self, PatternError> {
        let patterns = specs
            .iter()
            .map(|spec| {
                RegexBuilder::new(&spec.expression)
                    .case_insensitive(true)
                    .build()
                    .map(|regex| CompiledPattern {
                        ordinal: spec.ordinal,
                        regex,
                    })
                    .map_err(|source| PatternError::Invalid {
                        ordinal: spec.ordinal,
                        expression: spec.expression.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Compiled {} patterns", patterns.len());
        Ok(Self { patterns })
    }

    /// Number of compiled patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// All matches within one record: patterns in ordinal order, occurrences
    /// in text order. Empty matches are never reported.
    pub fn match_record(&self, record: &TextLineRecord) -> Vec<MatchResult> {
        let mut results = Vec::new();

        for pattern in &self.patterns {
            for m in pattern.regex.find_iter(&record.text) {
                if m.as_str().is_empty() {
                    continue;
                }
                results.push(MatchResult {
                    record: record.clone(),
                    pattern: pattern.ordinal,
                    value: m.as_str().to_string(),
                    span: (m.start(), m.end()),
                });
            }
        }

        results
    }

    /// Search every record in corpus order.
    pub fn match_corpus(
        &self,
        corpus: &[TextLineRecord],
        observer: &mut dyn ProgressObserver,
    ) -> Vec<MatchResult> {
        info!("Searching for patterns in {} text blocks...", corpus.len());
        observer.matching_started(corpus.len());

        let mut results = Vec::new();
        for record in corpus {
            let matches = self.match_record(record);
            observer.record_searched(matches.len());
            results.extend(matches);
        }

        info!("Total matches found: {}", results.len());
        results
    }
}
