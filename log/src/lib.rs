//! Logging setup for Arbor with file output and optional stdout.
//!
//! Logs always go to a file at `warn` level (or higher if a filter is set).
//! Stdout logging is enabled when `ARBOR_LOG` or `RUST_LOG` is set, or in debug builds.
//!
//! ## Environment Variables
//!
//! 1. **`ARBOR_LOG`** (highest priority) - Arbor-specific logging control
//! 2. **`RUST_LOG`** - Standard tracing environment variable
//! 3. **Default** - `warn` globally, `info` for arbor crates
//!
//! ## Log File Location
//!
//! Default: `<data_local_dir>/arbor/logs/arbor-<pid>.log`
//! - macOS: `~/Library/Application Support/arbor/logs/arbor-12345.log`
//! - Linux: `~/.local/share/arbor/logs/arbor-12345.log`
//!
//! Override with `LogConfig::log_file_path` or `ARBOR_LOG_FILE`.

use std::{env, path::PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Returned from [`init`]; must be held alive to ensure log file flushing.
pub struct LogGuard {
    _file_guard: WorkerGuard,
    pub log_file: PathBuf,
}

pub struct LogConfig {
    pub log_file_path: Option<PathBuf>,
}

/// Initialize logging.
///
/// This function respects the environment variable priority described in the module docs:
/// `ARBOR_LOG` > `RUST_LOG` > default settings.
///
/// The returned [`LogGuard`] must be held for the lifetime of the program --
/// dropping it flushes and stops the background file writer.
///
/// Safe to call multiple times -- will not crash if logging is already initialized.
pub fn init(config: LogConfig) -> Result<LogGuard, Box<dyn std::error::Error + Send + Sync>> {
    let (log_dir, filename) = resolve_log_path(config.log_file_path);

    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::never(&log_dir, &filename);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_filter = create_file_filter();
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_filter(file_filter);

    let stdout_enabled =
        env::var("ARBOR_LOG").is_ok() || env::var("RUST_LOG").is_ok() || cfg!(debug_assertions);

    let stdout_layer = if stdout_enabled {
        Some(fmt::layer().with_filter(create_filter()))
    } else {
        None
    };

    Registry::default()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    Ok(LogGuard {
        _file_guard: file_guard,
        log_file: log_dir.join(filename),
    })
}

/// Initialize logging for tests.
///
/// Identical to [`init`] but stdout-only (no file output), with a name that makes it
/// clear this is safe for test usage. Will not crash if called multiple times or if
/// logging is already initialized by another test.
pub fn test() {
    let _ = fmt().with_env_filter(create_filter()).try_init();
}

fn resolve_log_path(override_path: Option<PathBuf>) -> (PathBuf, String) {
    let filename = format!("arbor-{}.log", std::process::id());

    let override_path = override_path.or_else(|| env::var("ARBOR_LOG_FILE").ok().map(Into::into));

    if let Some(path) = override_path {
        if path.extension().is_some() {
            let dir = path
                .parent()
                .unwrap_or_else(|| std::path::Path::new("."))
                .to_path_buf();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or(filename);
            return (dir, name);
        }
        return (path, filename);
    }

    let dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("arbor")
        .join("logs");

    (dir, filename)
}

/// File filter: uses user-specified level if set, otherwise defaults to `warn`.
fn create_file_filter() -> EnvFilter {
    if env::var("ARBOR_LOG").is_ok() || env::var("RUST_LOG").is_ok() {
        return create_filter();
    }
    EnvFilter::new("warn")
}

/// Create the appropriate [`EnvFilter`] based on environment variables.
///
/// Implements the priority system: `ARBOR_LOG` > `RUST_LOG` > defaults.
fn create_filter() -> EnvFilter {
    if let Ok(arbor_log) = env::var("ARBOR_LOG") {
        return expand_arbor_log(&arbor_log);
    }

    if let Ok(rust_log) = env::var("RUST_LOG") {
        return EnvFilter::new(rust_log);
    }

    // Default: warn globally, info for arbor crates
    EnvFilter::new("warn,arbor=info,arbor_log=info")
}

/// Expand `ARBOR_LOG` values into full tracing filter strings.
///
/// This function provides the user-friendly experience where:
/// - `ARBOR_LOG=debug` becomes `warn,arbor=debug,arbor_log=debug`
/// - `ARBOR_LOG=arbor=trace` is used as-is (advanced syntax)
fn expand_arbor_log(arbor_log: &str) -> EnvFilter {
    // Module-specific syntax (contains '=', ':', or ',') is passed through untouched
    // to allow advanced usage like ARBOR_LOG=arbor=debug,arbor_log=trace.
    if arbor_log.contains('=') || arbor_log.contains(':') || arbor_log.contains(',') {
        return EnvFilter::new(arbor_log);
    }

    EnvFilter::new(format!("warn,arbor={arbor_log},arbor_log={arbor_log}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_path_with_extension_splits_dir_and_name() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let file = tmp.path().join("session.log");

        let (dir, name) = resolve_log_path(Some(file));

        assert_eq!(dir, tmp.path());
        assert_eq!(name, "session.log");
    }

    #[test]
    fn override_path_without_extension_is_treated_as_dir() {
        let tmp = tempfile::tempdir().expect("tempdir");

        let (dir, name) = resolve_log_path(Some(tmp.path().to_path_buf()));

        assert_eq!(dir, tmp.path());
        assert!(name.starts_with("arbor-"));
        assert!(name.ends_with(".log"));
    }
}
