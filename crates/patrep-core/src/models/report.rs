//! Patterns, matches, and the aggregated report rows derived from them.

use std::sync::Arc;

use super::record::{SourceRef, TextLineRecord};

/// A configured search pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSpec {
    /// Position in the configured list (1-indexed).
    pub ordinal: usize,
    /// Regular expression, matched case-insensitively.
    pub expression: String,
}

impl PatternSpec {
    pub fn new(ordinal: usize, expression: impl Into<String>) -> Self {
        Self {
            ordinal,
            expression: expression.into(),
        }
    }

    /// Number a list of expressions starting at 1.
    pub fn from_expressions<I, S>(expressions: I) -> Vec<PatternSpec>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        expressions
            .into_iter()
            .enumerate()
            .map(|(i, expr)| PatternSpec::new(i + 1, expr))
            .collect()
    }

    /// Display identity used in every report table.
    pub fn label(&self) -> String {
        pattern_label(self.ordinal)
    }
}

/// Display label for a pattern ordinal.
pub fn pattern_label(ordinal: usize) -> String {
    format!("Pattern_{ordinal}")
}

/// One occurrence of a pattern inside an extracted line.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Line the occurrence was found in.
    pub record: TextLineRecord,
    /// Ordinal of the matching pattern.
    pub pattern: usize,
    /// Matched substring.
    pub value: String,
    /// Byte offsets of the match within the line text.
    pub span: (usize, usize),
}

impl MatchResult {
    pub fn pattern_label(&self) -> String {
        pattern_label(self.pattern)
    }
}

/// Count of identical matches per document, page, and pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub source: Arc<SourceRef>,
    pub page: u32,
    /// Ordinal of the matching pattern.
    pub pattern: usize,
    /// Matched substring.
    pub value: String,
    /// Number of occurrences sharing this key.
    pub count: usize,
}

impl SummaryRow {
    pub fn pattern_label(&self) -> String {
        pattern_label(self.pattern)
    }
}

/// A row of the legend sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendRow {
    /// First column text (link label when `link` is set).
    pub id: String,
    /// Optional hyperlink target for the first column.
    pub link: Option<String>,
    /// Second column text.
    pub expression: String,
}

impl LegendRow {
    pub fn text(id: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            link: None,
            expression: expression.into(),
        }
    }

    pub fn link(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: label.into(),
            link: Some(target.into()),
            expression: String::new(),
        }
    }

    pub fn blank() -> Self {
        Self::text("", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_expressions_numbers_from_one() {
        let specs = PatternSpec::from_expressions(["HOLD \\d+", "REV [A-Z]"]);
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].ordinal, 1);
        assert_eq!(specs[1].label(), "Pattern_2");
        assert_eq!(specs[1].expression, "REV [A-Z]");
    }
}
