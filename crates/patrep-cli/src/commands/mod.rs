//! Subcommands and the state they share.

pub mod config;
pub mod scan;

use std::path::PathBuf;
use std::process::ExitCode;

use patrep_core::models::config::CONFIG_FILE_NAME;
use patrep_core::PatrepConfig;

/// How a command finished when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The command did its work.
    Done,
    /// The command ran correctly but there was nothing to report.
    NothingFound,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Done => ExitCode::SUCCESS,
            Status::NothingFound => ExitCode::from(1),
        }
    }
}

/// Locations resolved from the global options.
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory that relative document, report, and log paths hang off.
    pub base_dir: PathBuf,
    /// Configuration file in use.
    pub config_path: PathBuf,
}

impl Context {
    pub fn new(base_dir: PathBuf, config_path: Option<PathBuf>) -> Self {
        let config_path = config_path.unwrap_or_else(|| base_dir.join(CONFIG_FILE_NAME));
        Self {
            base_dir,
            config_path,
        }
    }

    /// Read the configuration, falling back to defaults.
    pub fn load_config(&self) -> PatrepConfig {
        PatrepConfig::load_or_default(&self.config_path)
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.base_dir.join("Reports")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }
}
