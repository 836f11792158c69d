//! Grouping of matches into counted summary rows and the pattern legend.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::models::{LegendRow, MatchResult, PatternSpec, SourceRef, SummaryRow};

/// Returned by [`aggregate`] when there is nothing to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoMatches;

impl std::fmt::Display for NoMatches {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("no matches found")
    }
}

impl std::error::Error for NoMatches {}

/// Summary and legend rows built from one run's matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub summary: Vec<SummaryRow>,
    pub legend: Vec<LegendRow>,
}

/// Count matches per document, page, pattern, and value.
///
/// Rows are ordered by document, page, and pattern ordinal ascending, then by
/// count descending, then by value in case-sensitive byte order.
pub fn aggregate(
    matches: &[MatchResult],
    patterns: &[PatternSpec],
) -> Result<Aggregation, NoMatches> {
    if matches.is_empty() {
        return Err(NoMatches);
    }

    let mut groups: HashMap<(&Arc<SourceRef>, u32, usize, &str), usize> = HashMap::new();
    for m in matches {
        *groups
            .entry((&m.record.source, m.record.page, m.pattern, m.value.as_str()))
            .or_default() += 1;
    }

    let mut summary: Vec<SummaryRow> = groups
        .into_iter()
        .map(|((source, page, pattern, value), count)| SummaryRow {
            source: Arc::clone(source),
            page,
            pattern,
            value: value.to_string(),
            count,
        })
        .collect();
    summary.sort_by(summary_order);

    debug!("Aggregated {} matches into {} summary rows", matches.len(), summary.len());

    Ok(Aggregation {
        summary,
        legend: legend(patterns),
    })
}

fn summary_order(a: &SummaryRow, b: &SummaryRow) -> Ordering {
    a.source
        .cmp(&b.source)
        .then(a.page.cmp(&b.page))
        .then(a.pattern.cmp(&b.pattern))
        .then(b.count.cmp(&a.count))
        .then_with(|| a.value.cmp(&b.value))
}

/// One row per pattern in ordinal order, followed by the attribution rows.
pub fn legend(patterns: &[PatternSpec]) -> Vec<LegendRow> {
    let mut ordered: Vec<&PatternSpec> = patterns.iter().collect();
    ordered.sort_by_key(|p| p.ordinal);

    let mut rows: Vec<LegendRow> = ordered
        .into_iter()
        .map(|p| LegendRow::text(p.label(), p.expression.clone()))
        .collect();
    rows.extend(attribution());
    rows
}

fn attribution() -> Vec<LegendRow> {
    let repository = env!("CARGO_PKG_REPOSITORY");
    vec![
        LegendRow::blank(),
        LegendRow::text(concat!("Generated by patrep ", env!("CARGO_PKG_VERSION")), ""),
        LegendRow::link("Readme", format!("{repository}#readme")),
        LegendRow::blank(),
        LegendRow::text("Have a problem or suggestion?", ""),
        LegendRow::link("Report an issue", format!("{repository}/issues/new")),
    ]
}
