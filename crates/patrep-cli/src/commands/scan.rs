//! Scan command - search a folder of PDFs and write a report.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context as _;
use clap::{Args, ValueEnum};
use console::style;
use glob::{glob_with, MatchOptions, Pattern};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{debug, info};

use patrep_core::pdf::ScanReport;
use patrep_core::{
    CsvSink, OutputFormat, Pipeline, PipelineOutcome, ProgressObserver, ReportSink, XlsxSink,
};

use super::{Context, Status};

/// Report file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Excel workbook
    Xlsx,
    /// One CSV file per sheet
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Xlsx => OutputFormat::Xlsx,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Folder to scan for PDF files (overrides DOCUMENT_PATH)
    #[arg(short, long)]
    documents: Option<PathBuf>,

    /// Folder to write the report into [default: <base>/Reports]
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Report format (overrides OUTPUT_FORMAT)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Add a sheet with every extracted line
    #[arg(long)]
    export_all_text: bool,

    /// Hide progress bars
    #[arg(long)]
    no_progress: bool,
}

pub fn run(args: ScanArgs, ctx: &Context) -> anyhow::Result<Status> {
    let start = Instant::now();

    let mut config = ctx.load_config();
    if let Some(format) = args.format {
        config.output_format = format.into();
    }
    if args.export_all_text {
        config.export_all_text = true;
    }

    let scan_root = args.documents.clone().unwrap_or_else(|| config.scan_dir(&ctx.base_dir));
    if !scan_root.exists() {
        fs::create_dir_all(&scan_root)
            .with_context(|| format!("Failed to create document folder {}", scan_root.display()))?;
        info!("Document folder created: {}", scan_root.display());
        println!(
            "{} Created document folder {}. Add PDF files there and run again.",
            style("ℹ").blue(),
            scan_root.display()
        );
        return Ok(Status::NothingFound);
    }
    if !scan_root.is_dir() {
        anyhow::bail!("Document path is not a folder: {}", scan_root.display());
    }

    // Compile patterns before touching any document.
    let pipeline = Pipeline::new(&config)?;

    let files = discover_pdfs(&scan_root)?;
    if files.is_empty() {
        println!(
            "{} No PDF files found in {}",
            style("ℹ").blue(),
            scan_root.display()
        );
        return Ok(Status::NothingFound);
    }

    println!(
        "{} Found {} PDF files in {}",
        style("ℹ").blue(),
        files.len(),
        scan_root.display()
    );

    let output_dir = args.output_dir.clone().unwrap_or_else(|| ctx.reports_dir());
    if !output_dir.exists() {
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output folder {}", output_dir.display()))?;
        info!("Output directory created: {}", output_dir.display());
    }

    let mut progress = ScanProgress::new(!args.no_progress);
    let outcome = pipeline.execute(&files, &mut progress);

    let status = match outcome {
        PipelineOutcome::Report(report) => {
            let stem = report_stem();
            let mut sink: Box<dyn ReportSink> = match config.output_format {
                OutputFormat::Xlsx => {
                    Box::new(XlsxSink::new(output_dir.join(format!("{stem}.xlsx"))))
                }
                OutputFormat::Csv => {
                    Box::new(CsvSink::new(output_dir.join(&stem), stem.as_str()))
                }
            };
            report.write_to(sink.as_mut())?;

            print_skipped(&report.scan);
            println!();
            println!(
                "{} Report written to {}",
                style("✓").green(),
                sink.location().display()
            );
            println!(
                "   {} documents, {} pages, {} matches, {} summary rows in {:?}",
                report.scan.scanned,
                report.scan.pages,
                style(report.details.len()).green(),
                report.summary.len(),
                start.elapsed()
            );
            Status::Done
        }
        PipelineOutcome::NoText(scan) => {
            print_skipped(&scan);
            println!(
                "{} No text could be extracted. No report generated.",
                style("ℹ").yellow()
            );
            Status::NothingFound
        }
        PipelineOutcome::NoMatches(scan) => {
            print_skipped(&scan);
            println!(
                "{} No matches found. No report generated.",
                style("ℹ").yellow()
            );
            Status::NothingFound
        }
    };

    Ok(status)
}

/// Every `*.pdf` file below `root`, extension matched case-insensitively,
/// in sorted order.
pub fn discover_pdfs(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/**/*.pdf",
        Pattern::escape(&root.to_string_lossy())
    );
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let mut files: Vec<PathBuf> = glob_with(&pattern, options)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    debug!("Discovered {} PDF files under {}", files.len(), root.display());
    Ok(files)
}

/// File name stem for a report written now.
fn report_stem() -> String {
    chrono::Local::now().format("Report_%Y-%m-%d_%H-%M-%S").to_string()
}

fn print_skipped(scan: &ScanReport) {
    if scan.skipped.is_empty() {
        return;
    }

    println!();
    println!("{}", style("Skipped files:").red());
    for skipped in &scan.skipped {
        println!("  - {}: {}", skipped.path.display(), skipped.reason);
    }
}

/// Progress bars for the scan and match phases.
struct ScanProgress {
    visible: bool,
    bar: Option<ProgressBar>,
}

impl ScanProgress {
    fn new(visible: bool) -> Self {
        Self { visible, bar: None }
    }

    fn start(&mut self, len: usize, unit: &str) {
        if let Some(previous) = self.bar.take() {
            previous.finish_and_clear();
        }

        let target = if self.visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let template = format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {unit} {{msg}}"
        );
        let style = ProgressStyle::default_bar()
            .template(&template)
            .map(|s| s.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());

        let bar = ProgressBar::with_draw_target(Some(len as u64), target);
        bar.set_style(style);
        self.bar = Some(bar);
    }

    fn tick(&self, message: Option<String>) {
        if let Some(bar) = &self.bar {
            if let Some(message) = message {
                bar.set_message(message);
            }
            bar.inc(1);
        }
    }
}

impl ProgressObserver for ScanProgress {
    fn scan_started(&mut self, documents: usize) {
        self.start(documents, "files");
    }

    fn document_finished(&mut self, path: &Path, _lines: usize) {
        self.tick(file_name(path));
    }

    fn document_skipped(&mut self, path: &Path, _reason: &str) {
        self.tick(file_name(path));
    }

    fn matching_started(&mut self, records: usize) {
        self.start(records, "text blocks");
    }

    fn record_searched(&mut self, _matches: usize) {
        self.tick(None);
    }

    fn finished(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_pdfs_is_recursive_sorted_and_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::write(root.join("b.pdf"), b"").unwrap();
        fs::write(root.join("A.PDF"), b"").unwrap();
        fs::write(root.join("sub/deeper/c.Pdf"), b"").unwrap();
        fs::write(root.join("notes.txt"), b"").unwrap();
        fs::create_dir_all(root.join("folder.pdf")).unwrap();

        let files = discover_pdfs(root).unwrap();
        let relative: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(relative, vec!["A.PDF", "b.pdf", "sub/deeper/c.Pdf"]);
    }

    #[test]
    fn test_report_stem_format() {
        let stem = report_stem();
        assert!(stem.starts_with("Report_"));
        assert_eq!(stem.len(), "Report_2024-01-31_12-00-00".len());
    }
}
