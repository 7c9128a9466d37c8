//! Console and log-file sinks for the `sysgeo` binary.
//!
//! The console follows `-v`/`-q`. The file given by `--log-file` is meant for bug reports, so it
//! always records this tool's debug events, whatever the console shows. Events from the HTTP
//! stack are kept at warnings unless `-vvv` asks for everything.

use crate::cli::Cli;
use crate::error::{CliError, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Both the library and the binary log under this target.
const OWN_TARGET: &str = "sysgeo";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    pub verbosity: u8,
    pub quiet: bool,
    pub file: Option<PathBuf>,
}

impl LogOptions {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            verbosity: cli.verbose,
            quiet: cli.quiet,
            file: cli.log_file.clone(),
        }
    }

    pub fn console_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// At least `DEBUG`, and `TRACE` when the console asks for it. `-q` does not apply.
    pub fn file_level(&self) -> LevelFilter {
        let requested = Self {
            quiet: false,
            ..self.clone()
        };
        requested.console_level().max(LevelFilter::DEBUG)
    }
}

/// Own targets at `level`; other crates at `level` only for `TRACE`, otherwise at most `WARN`.
fn targets(level: LevelFilter) -> Targets {
    let foreign = if level == LevelFilter::TRACE {
        level
    } else {
        level.min(LevelFilter::WARN)
    };
    Targets::new()
        .with_default(foreign)
        .with_target(OWN_TARGET, level)
}

/// Opens the log file for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Builds the subscriber without installing it.
pub fn subscriber(options: &LogOptions) -> Result<impl Subscriber + Send + Sync + 'static> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_filter(targets(options.console_level()));

    let file = match &options.file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(Mutex::new(open_log_file(path)?))
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_filter(targets(options.file_level())),
        ),
        None => None,
    };

    Ok(tracing_subscriber::registry().with(console).with(file))
}

pub fn setup_logging(options: &LogOptions) -> Result<()> {
    subscriber(options)?
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serial_test::serial;
    use tracing::{debug, info, trace, warn};

    fn options(verbosity: u8, quiet: bool) -> LogOptions {
        LogOptions {
            verbosity,
            quiet,
            file: None,
        }
    }

    #[test]
    fn console_level_follows_verbose_and_quiet() {
        assert_eq!(options(0, false).console_level(), LevelFilter::WARN);
        assert_eq!(options(1, false).console_level(), LevelFilter::INFO);
        assert_eq!(options(2, false).console_level(), LevelFilter::DEBUG);
        assert_eq!(options(7, false).console_level(), LevelFilter::TRACE);
        assert_eq!(options(3, true).console_level(), LevelFilter::ERROR);
    }

    #[test]
    fn file_level_is_at_least_debug_and_ignores_quiet() {
        assert_eq!(options(0, true).file_level(), LevelFilter::DEBUG);
        assert_eq!(options(1, false).file_level(), LevelFilter::DEBUG);
        assert_eq!(options(3, false).file_level(), LevelFilter::TRACE);
    }

    #[test]
    fn options_are_read_from_global_flags() {
        let cli = Cli::parse_from(["sysgeo", "-vv", "--log-file", "run.log", "inspect", "a.sysml"]);
        let options = LogOptions::from_cli(&cli);
        assert_eq!(options.verbosity, 2);
        assert!(!options.quiet);
        assert_eq!(options.file, Some(PathBuf::from("run.log")));
    }

    #[test]
    #[serial]
    fn quiet_run_still_records_debug_events_in_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("sysgeo.log");
        let options = LogOptions {
            verbosity: 0,
            quiet: true,
            file: Some(path.clone()),
        };

        tracing::subscriber::with_default(subscriber(&options).unwrap(), || {
            debug!("Resolved credentials from the environment");
            trace!("Too detailed for the file");
            info!(target: "hyper::proto", "Connection noise");
            warn!(target: "hyper::proto", "Connection reset");
        });

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("DEBUG"));
        assert!(content.contains("Resolved credentials from the environment"));
        assert!(!content.contains("Too detailed"));
        assert!(!content.contains("Connection noise"));
        assert!(content.contains("Connection reset"));
    }

    #[test]
    #[serial]
    fn log_file_is_appended_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sysgeo.log");
        let options = LogOptions {
            file: Some(path.clone()),
            ..options(0, false)
        };
        for run in ["first", "second"] {
            tracing::subscriber::with_default(subscriber(&options).unwrap(), || {
                debug!("{run} run");
            });
        }
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("first run"));
        assert!(content.contains("second run"));
    }

    #[test]
    #[serial]
    fn directory_as_log_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let options = LogOptions {
            file: Some(dir.path().to_path_buf()),
            ..options(0, false)
        };
        assert!(matches!(subscriber(&options), Err(CliError::Io(_))));
    }
}
