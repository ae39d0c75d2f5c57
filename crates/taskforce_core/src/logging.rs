//! Rolling file logs for the core and its hosts.
//!
//! The active level follows the `is_debug_mode` setting: debug lines are
//! written when the setting is on, or always in debug builds.
//!
//! # Invariants
//! - One log directory per process; the level may change at runtime.
//! - Initialization never panics.
//! - Log lines carry record ids and counts only. Names, emails, passwords
//!   and session tokens stay out of the logs.

use flexi_logger::{
    Cleanup, Criterion, FileSpec, LogSpecification, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

const LOG_FILE_BASENAME: &str = "taskforce";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGER: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

/// Severity threshold for the file logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Parses `debug|info|warn|error`, case-insensitive; `warning` is
    /// accepted for `warn`.
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unsupported log level `{other}`; expected debug|info|warn|error"
            )),
        }
    }

    /// Level for the app's debug-mode switch.
    pub fn for_debug_mode(is_debug_mode: bool) -> Self {
        if is_debug_mode || cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Info
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

struct ActiveLogger {
    log_dir: PathBuf,
    level: Mutex<LogLevel>,
    handle: LoggerHandle,
}

impl ActiveLogger {
    fn level(&self) -> LogLevel {
        *self.level.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn switch_to(&self, level: LogLevel) -> Result<(), String> {
        let mut current = self.level.lock().unwrap_or_else(PoisonError::into_inner);
        if *current == level {
            return Ok(());
        }
        let spec = LogSpecification::parse(level.as_str())
            .map_err(|err| format!("invalid log level `{level}`: {err}"))?;
        self.handle.set_new_spec(spec);
        info!("event=log_level module=core status=ok from={} to={}", *current, level);
        *current = level;
        Ok(())
    }
}

/// Starts file logging in `log_dir` at `level`.
///
/// Calling again with the same directory only switches the level.
///
/// # Errors
/// - `log_dir` is empty, relative, cannot be created, or differs from the
///   directory already in use.
/// - The logger backend fails to start.
pub fn init_logging(level: LogLevel, log_dir: &str) -> Result<(), String> {
    let log_dir = normalize_log_dir(log_dir)?;

    let active = LOGGER.get_or_try_init(|| start_logger(level, &log_dir))?;
    if active.log_dir != log_dir {
        return Err(format!(
            "logging already writes to `{}`; refusing to switch to `{}`",
            active.log_dir.display(),
            log_dir.display()
        ));
    }
    active.switch_to(level)
}

/// Applies the debug-mode setting to running logs. A no-op before
/// `init_logging`.
pub fn apply_debug_mode(is_debug_mode: bool) -> Result<(), String> {
    match LOGGER.get() {
        Some(active) => active.switch_to(LogLevel::for_debug_mode(is_debug_mode)),
        None => Ok(()),
    }
}

fn start_logger(level: LogLevel, log_dir: &Path) -> Result<ActiveLogger, String> {
    std::fs::create_dir_all(log_dir).map_err(|err| {
        format!(
            "failed to create log directory `{}`: {err}",
            log_dir.display()
        )
    })?;

    let handle = Logger::try_with_str(level.as_str())
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    install_panic_hook_once();
    info!(
        "event=app_start module=core status=ok platform={} version={} level={} log_dir={}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION"),
        level,
        log_dir.display()
    );

    Ok(ActiveLogger {
        log_dir: log_dir.to_path_buf(),
        level: Mutex::new(level),
        handle,
    })
}

fn normalize_log_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log_dir cannot be empty".to_string());
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(format!("log_dir must be an absolute path, got `{trimmed}`"));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.set(()).is_err() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Payloads may echo form input.
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = if let Some(message) = panic_info.payload().downcast_ref::<&str>() {
            sanitize_message(message, MAX_PANIC_PAYLOAD_CHARS)
        } else if let Some(message) = panic_info.payload().downcast_ref::<String>() {
            sanitize_message(message, MAX_PANIC_PAYLOAD_CHARS)
        } else {
            "non-string panic payload".to_string()
        };
        error!("event=panic_captured module=core status=error location={location} payload={payload}");
        previous_hook(panic_info);
    }));
}

/// Flattens to one line and cuts after `max_chars` characters.
fn sanitize_message(value: &str, max_chars: usize) -> String {
    let flat = value.replace(['\n', '\r'], " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::{apply_debug_mode, init_logging, normalize_log_dir, sanitize_message, LogLevel};
    use super::LOGGER;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(suffix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "taskforce-logging-{suffix}-{}-{nanos}",
            std::process::id()
        ))
    }

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!(LogLevel::parse(" INFO "), Ok(LogLevel::Info));
        assert_eq!(LogLevel::parse("warning"), Ok(LogLevel::Warn));
        assert!(LogLevel::parse("verbose").is_err());
    }

    #[test]
    fn debug_mode_always_selects_debug() {
        assert_eq!(LogLevel::for_debug_mode(true), LogLevel::Debug);
        let expected = if cfg!(debug_assertions) {
            LogLevel::Debug
        } else {
            LogLevel::Info
        };
        assert_eq!(LogLevel::for_debug_mode(false), expected);
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let error = normalize_log_dir("logs/dev").expect_err("relative paths must be rejected");
        assert!(error.contains("absolute"));
        assert!(normalize_log_dir("  ").is_err());
    }

    #[test]
    fn sanitize_message_flattens_and_truncates_by_chars() {
        assert_eq!(sanitize_message("line1\nline2", 20), "line1 line2");
        assert_eq!(sanitize_message("תורנות מטבח", 6), "תורנות...");
    }

    #[test]
    fn reinit_switches_level_but_not_directory() {
        let log_dir = unique_temp_dir("level");
        let log_dir_str = log_dir.to_str().expect("temp dir should be valid UTF-8");

        init_logging(LogLevel::Warn, log_dir_str).expect("first init should succeed");
        init_logging(LogLevel::Error, log_dir_str).expect("same directory should be accepted");
        let active = LOGGER.get().expect("logging should be active");
        assert_eq!(active.level(), LogLevel::Error);

        apply_debug_mode(true).expect("debug mode should apply");
        assert_eq!(active.level(), LogLevel::Debug);

        let other_dir = unique_temp_dir("other");
        let error = init_logging(
            LogLevel::Info,
            other_dir.to_str().expect("temp dir should be valid UTF-8"),
        )
        .expect_err("directory switch should fail");
        assert!(error.contains("refusing to switch"));
        assert_eq!(active.log_dir, log_dir);
    }
}
