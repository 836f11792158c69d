//! Console and file logging.

use std::fs;
use std::io;
use std::path::Path;

use tracing::warn;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Log files are named `app.<date>.log` inside the log directory.
pub const LOG_FILE_PREFIX: &str = "app";
pub const LOG_FILE_SUFFIX: &str = "log";

/// Rotated files kept besides the current one.
const LOG_FILES_KEPT: usize = 7;

/// Install the global subscriber.
///
/// Console output goes to stderr at a level chosen by `verbose` (or
/// `RUST_LOG`). Everything at DEBUG and above is also written to a daily
/// rotated file under `log_dir`; when that file cannot be opened only the
/// console layer is installed.
pub fn init(verbose: u8, log_dir: &Path) {
    let console_level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level.to_string()));

    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let (file_layer, file_error) = match file_appender(log_dir) {
        Ok(appender) => {
            let layer = fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_filter(LevelFilter::DEBUG);
            (Some(layer), None)
        }
        Err(e) => (None, Some(e)),
    };

    let _ = tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init();

    if let Some(e) = file_error {
        warn!("File logging disabled ({}): {:#}", log_dir.display(), e);
    }
}

/// Appender rotating at midnight and pruning all but the newest files.
fn file_appender(log_dir: &Path) -> anyhow::Result<RollingFileAppender> {
    fs::create_dir_all(log_dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(LOG_FILES_KEPT + 1)
        .build(log_dir)?;
    Ok(appender)
}
