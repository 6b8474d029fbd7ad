use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevels {
    pub console: LevelFilter,
    pub file: LevelFilter,
}

impl LogLevels {
    pub fn from_flags(quiet: bool, verbose: bool, progress: bool) -> Self {
        let file = if verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        };
        let console = if quiet {
            LevelFilter::ERROR
        } else if progress {
            // per-request lines would tear the spinner apart
            LevelFilter::WARN
        } else {
            file
        };
        Self { console, file }
    }
}

/// Build a dispatcher that logs to stderr and, when given, appends to
/// `log_file`. Nothing is installed globally; callers scope it to a run.
pub fn build_dispatch(log_file: Option<&Path>, levels: LogLevels) -> io::Result<Dispatch> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(levels.file),
            )
        }
        None => None,
    };

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_filter(levels.console);

    let subscriber = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer);

    Ok(Dispatch::new(subscriber))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_levels_from_flags() {
        let default = LogLevels::from_flags(false, false, false);
        assert_eq!(default.console, LevelFilter::INFO);
        assert_eq!(default.file, LevelFilter::INFO);

        let verbose = LogLevels::from_flags(false, true, false);
        assert_eq!(verbose.console, LevelFilter::DEBUG);
        assert_eq!(verbose.file, LevelFilter::DEBUG);

        let quiet = LogLevels::from_flags(true, true, false);
        assert_eq!(quiet.console, LevelFilter::ERROR);
        assert_eq!(quiet.file, LevelFilter::DEBUG);

        let progress = LogLevels::from_flags(false, false, true);
        assert_eq!(progress.console, LevelFilter::WARN);
    }

    #[test]
    fn test_dispatch_writes_to_log_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spider.log");
        let levels = LogLevels::from_flags(true, false, false);

        let dispatch = build_dispatch(Some(&path), levels).unwrap();
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::info!("GET http://example.com/ - Status: 200");
            tracing::debug!("not at info");
        });

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("INFO"));
        assert!(content.contains("GET http://example.com/ - Status: 200"));
        assert!(!content.contains("not at info"));
    }

    #[test]
    fn test_unopenable_log_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("spider.log");
        assert!(build_dispatch(Some(&path), LogLevels::from_flags(false, false, false)).is_err());
    }
}
