//! Logging for the client and CLI.
//!
//! Every run writes to its own timestamped file under `.mouldtrack/logs`;
//! stderr gets a copy only when asked for, so command output on stdout stays
//! clean. Only the newest [`MAX_LOG_FILES`] runs are kept.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::OnceLock,
};

use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs;

/// Number of run logs kept in the log directory.
pub const MAX_LOG_FILES: usize = 10;
/// Filter directives that replace the verbosity default, e.g. `mouldtrack=trace`.
pub const LOG_FILTER_ENV: &str = "MOULDTRACK_LOG";

const LOG_FILE_PREFIX: &str = "mouldtrack_";
const LOG_FILE_SUFFIX: &str = ".log";
/// HTTP and TLS internals stay at warn unless a directive names them.
const QUIET_DEPENDENCIES: &str = "ureq=warn,rustls=warn";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// How much the client reports about itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    /// Debug output from this crate, e.g. request paths and skipped rows.
    Verbose,
}

impl Verbosity {
    pub fn from_flag(verbose: bool) -> Self {
        if verbose { Self::Verbose } else { Self::Normal }
    }

    fn directives(self) -> String {
        let own = match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Verbose => "info,mouldtrack=debug",
        };
        format!("{own},{QUIET_DEPENDENCIES}")
    }
}

/// Knobs for [`init_with`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoggingOptions {
    pub verbosity: Verbosity,
    /// Mirror log lines to stderr in addition to the run log.
    pub console: bool,
}

impl LoggingOptions {
    /// CLI setup: `-v` raises the level and mirrors the log to stderr.
    pub fn for_cli(verbose: bool) -> Self {
        Self {
            verbosity: Verbosity::from_flag(verbose),
            console: verbose,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("No app directory available for logs")]
    NoLogDir,
    #[error("Failed to prepare log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to list run logs in {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to remove old run log {path}: {source}")]
    RemoveFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to name the run log: {0}")]
    FormatTime(time::error::Format),
    #[error("Invalid {LOG_FILTER_ENV} directives: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(tracing::subscriber::SetGlobalDefaultError),
    #[error("Failed to create run log {path}: {source}")]
    CreateLogFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Initialize logging with normal verbosity and console output.
pub fn init() -> Result<(), LoggingError> {
    init_with(LoggingOptions {
        console: true,
        ..LoggingOptions::default()
    })
}

/// Install the global subscriber. Later calls are no-ops.
///
/// Errors are returned so the CLI can carry on without a log file.
pub fn init_with(options: LoggingOptions) -> Result<(), LoggingError> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }

    let env_filter = build_env_filter(
        options.verbosity,
        std::env::var(LOG_FILTER_ENV).ok().as_deref(),
    )?;
    let log_dir = app_dirs::logs_dir().map_err(map_app_dir_error)?;
    let log_path = create_run_log(&log_dir, now_local_or_utc())?;
    let removed = prune_run_logs(&log_dir, MAX_LOG_FILES)?;

    let file_name = log_path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    let (file_writer, guard) = tracing_appender::non_blocking(rolling::never(&log_dir, file_name));

    let timer = build_timer();
    let console_layer = options.console.then(|| {
        fmt::layer()
            .with_target(false)
            .with_timer(timer.clone())
            .with_writer(std::io::stderr)
    });
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_thread_names(true)
        .with_timer(timer)
        .with_writer(file_writer);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber).map_err(LoggingError::SetGlobal)?;
    let _ = LOG_GUARD.set(guard);

    tracing::debug!(
        "Run log at {} ({removed} old log(s) removed)",
        log_path.display()
    );
    Ok(())
}

/// `override_directives` (from [`LOG_FILTER_ENV`]) wins over the verbosity
/// default when set and non-blank.
fn build_env_filter(
    verbosity: Verbosity,
    override_directives: Option<&str>,
) -> Result<EnvFilter, LoggingError> {
    match override_directives.map(str::trim).filter(|text| !text.is_empty()) {
        Some(directives) => Ok(EnvFilter::try_new(directives)?),
        None => Ok(EnvFilter::try_new(verbosity.directives())?),
    }
}

fn run_log_name(now: OffsetDateTime) -> Result<String, LoggingError> {
    const NAME_FORMAT: &[FormatItem<'_>] =
        format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    let stamp = now.format(NAME_FORMAT).map_err(LoggingError::FormatTime)?;
    Ok(format!("{LOG_FILE_PREFIX}{stamp}{LOG_FILE_SUFFIX}"))
}

fn create_run_log(dir: &Path, now: OffsetDateTime) -> Result<PathBuf, LoggingError> {
    let path = dir.join(run_log_name(now)?);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LoggingError::CreateLogFile {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

fn is_run_log(name: &str) -> bool {
    name.starts_with(LOG_FILE_PREFIX) && name.ends_with(LOG_FILE_SUFFIX)
}

/// Delete the oldest run logs beyond `keep`. Run log names sort by start
/// time, so no file metadata is needed. Returns how many were removed.
fn prune_run_logs(dir: &Path, keep: usize) -> Result<usize, LoggingError> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map_err(|source| LoggingError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_run_log(name))
        .collect();
    names.sort();
    let excess = names.len().saturating_sub(keep);
    for name in names.iter().take(excess) {
        let path = dir.join(name);
        fs::remove_file(&path).map_err(|source| LoggingError::RemoveFile { path, source })?;
    }
    Ok(excess)
}

fn build_timer() -> fmt::time::OffsetTime<time::format_description::BorrowedFormatItem<'static>> {
    const DISPLAY_FORMAT: &[FormatItem<'static>] =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    fmt::time::OffsetTime::new(offset, DISPLAY_FORMAT.into())
}

fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> LoggingError {
    match error {
        app_dirs::AppDirError::NoBaseDir => LoggingError::NoLogDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            LoggingError::CreateDir { path, source }
        }
    }
}
