//! End-to-end run: scan, match, aggregate.

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::matcher::PatternMatcher;
use crate::models::{LegendRow, MatchResult, PatrepConfig, PatternSpec, SummaryRow, TextLineRecord};
use crate::pdf::{DocumentScanner, ScanReport};
use crate::progress::ProgressObserver;
use crate::report::{
    aggregate, details_sheet, legend_sheet, summary_sheet, text_blocks_sheet, ReportSink, Sheet,
};

/// Everything needed to write one report.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub scan: ScanReport,
    pub summary: Vec<SummaryRow>,
    pub details: Vec<MatchResult>,
    /// Every extracted line, kept only when full text export is enabled.
    pub text_blocks: Option<Vec<TextLineRecord>>,
    pub legend: Vec<LegendRow>,
}

impl Report {
    /// Sheets in output order: Summary, Details, Text Blocks, Legend.
    pub fn sheets(&self) -> Vec<Sheet> {
        let mut sheets = vec![summary_sheet(&self.summary), details_sheet(&self.details)];
        if let Some(blocks) = &self.text_blocks {
            sheets.push(text_blocks_sheet(blocks));
        }
        sheets.push(legend_sheet(&self.legend));
        sheets
    }

    /// Project and hand every sheet to `sink`.
    pub fn write_to(&self, sink: &mut dyn ReportSink) -> Result<()> {
        info!("Generating Report...");
        sink.write(&self.sheets())?;
        info!("Report generated: {}", sink.location().display());
        Ok(())
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Matches were found and a report is ready to write.
    Report(Report),
    /// No document produced any text.
    NoText(ScanReport),
    /// Text was extracted but no pattern matched.
    NoMatches(ScanReport),
}

/// A configured run over a list of documents.
pub struct Pipeline<'a> {
    config: &'a PatrepConfig,
    patterns: Vec<PatternSpec>,
    matcher: PatternMatcher,
    scanner: DocumentScanner,
}

impl<'a> Pipeline<'a> {
    /// Prepare a run, compiling every configured pattern up front.
    pub fn new(config: &'a PatrepConfig) -> Result<Self> {
        let patterns = config.pattern_specs();
        let matcher = PatternMatcher::new(&patterns)?;
        Ok(Self {
            config,
            patterns,
            matcher,
            scanner: DocumentScanner::new(),
        })
    }

    /// Compile `config` and run it over `paths`.
    pub fn run<P: AsRef<Path>>(
        config: &PatrepConfig,
        paths: &[P],
        observer: &mut dyn ProgressObserver,
    ) -> Result<PipelineOutcome> {
        Ok(Pipeline::new(config)?.execute(paths, observer))
    }

    pub fn patterns(&self) -> &[PatternSpec] {
        &self.patterns
    }

    pub fn execute<P: AsRef<Path>>(
        &self,
        paths: &[P],
        observer: &mut dyn ProgressObserver,
    ) -> PipelineOutcome {
        let output = self.scanner.scan(paths, observer);
        info!("Total text blocks extracted: {}", output.records.len());

        if output.records.is_empty() {
            info!("No text blocks extracted. Exiting without generating report.");
            observer.finished();
            return PipelineOutcome::NoText(output.report);
        }

        let details = self.matcher.match_corpus(&output.records, observer);
        observer.finished();

        let aggregation = match aggregate(&details, &self.patterns) {
            Ok(aggregation) => aggregation,
            Err(_) => {
                info!("No matches found. Exiting without generating report.");
                return PipelineOutcome::NoMatches(output.report);
            }
        };

        let text_blocks = self.config.export_all_text.then_some(output.records);

        PipelineOutcome::Report(Report {
            scan: output.report,
            summary: aggregation.summary,
            details,
            text_blocks,
            legend: aggregation.legend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PatrepError, PatternError};
    use crate::pdf::testing::{write_pdf, TestPage};
    use crate::progress::NoProgress;
    use crate::report::Cell;

    fn config(patterns: &[&str], export_all_text: bool) -> PatrepConfig {
        PatrepConfig {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            export_all_text,
            ..PatrepConfig::default()
        }
    }

    #[test]
    fn test_invalid_pattern_fails_before_scanning() {
        let cfg = config(&[r"HOLD \d+", "("], false);
        let err = Pipeline::new(&cfg).err().unwrap();
        assert!(matches!(err, PatrepError::Pattern(PatternError::Invalid { ordinal: 2, .. })));
    }

    #[test]
    fn test_sheet_order_with_text_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write_pdf(dir.path(), "a.pdf", &[TestPage::lines(&["HOLD 1", "other"])]);

        let cfg = config(&[r"HOLD \d+"], true);
        let outcome = Pipeline::run(&cfg, &[pdf], &mut NoProgress).unwrap();
        let PipelineOutcome::Report(report) = outcome else {
            panic!("expected a report");
        };

        let names: Vec<String> = report.sheets().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Summary", "Details", "Text Blocks", "Legend"]);
        assert_eq!(report.text_blocks.as_ref().map(Vec::len), Some(2));
        assert_eq!(report.sheets()[0].rows[0][3], Cell::text("HOLD 1"));
    }

    #[test]
    fn test_text_blocks_omitted_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write_pdf(dir.path(), "a.pdf", &[TestPage::lines(&["HOLD 1"])]);

        let cfg = config(&[r"HOLD \d+"], false);
        let outcome = Pipeline::run(&cfg, &[pdf], &mut NoProgress).unwrap();
        let PipelineOutcome::Report(report) = outcome else {
            panic!("expected a report");
        };

        assert!(report.text_blocks.is_none());
        let names: Vec<String> = report.sheets().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Summary", "Details", "Legend"]);
    }

    #[test]
    fn test_no_text_and_no_matches() {
        let dir = tempfile::tempdir().unwrap();
        let blank = write_pdf(dir.path(), "blank.pdf", &[TestPage::lines(&[])]);
        let plain = write_pdf(dir.path(), "plain.pdf", &[TestPage::lines(&["nothing to see"])]);
        let cfg = config(&[r"HOLD \d+"], false);

        let outcome = Pipeline::run(&cfg, &[blank], &mut NoProgress).unwrap();
        assert!(matches!(outcome, PipelineOutcome::NoText(ref scan) if scan.scanned == 1));

        let outcome = Pipeline::run(&cfg, &[plain], &mut NoProgress).unwrap();
        assert!(matches!(outcome, PipelineOutcome::NoMatches(_)));

        let outcome = Pipeline::run::<&Path>(&cfg, &[], &mut NoProgress).unwrap();
        assert!(matches!(outcome, PipelineOutcome::NoText(_)));
    }

    #[test]
    fn test_empty_pattern_list_finds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write_pdf(dir.path(), "a.pdf", &[TestPage::lines(&["HOLD 1"])]);
        let cfg = PatrepConfig::from_toml("PATTERNS = []").unwrap();

        let outcome = Pipeline::run(&cfg, &[pdf], &mut NoProgress).unwrap();
        assert!(matches!(outcome, PipelineOutcome::NoMatches(ref scan) if scan.scanned == 1));
    }
}
