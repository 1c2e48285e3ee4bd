use core::fmt::Display;
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::PathBuf,
};

use super::GlobalConfig;

/// Configuration for logging, parameterized by a log level type.
///
/// Note that you can use multiple loggers at the same time.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(bound = "")]
pub struct LoggerConfig<L: LogLevel> {
    /// Path to the log file, if file logging is enabled.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Whether to append to the log file (true) or overwrite it (false). Defaults to true.
    #[serde(default = "append_default")]
    pub append: bool,

    /// Whether to log to standard output.
    #[serde(default)]
    pub stdout: bool,

    /// Whether to log to standard error.
    #[serde(default)]
    pub stderr: bool,

    /// Optional crate-level logging configuration (e.g., info, debug, trace).
    #[serde(default)]
    pub log: Option<LogCrateLevel>,

    /// The log level for this logger, determining verbosity.
    #[serde(default)]
    pub level: L,
}

impl<L: LogLevel> Default for LoggerConfig<L> {
    fn default() -> Self {
        Self {
            file: None,
            append: true,
            stdout: false,
            stderr: false,
            log: None,
            level: L::default(),
        }
    }
}

/// Log levels using the `log` crate.
#[derive(
    Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize, Hash, PartialEq, Eq,
)]
pub enum LogCrateLevel {
    /// Logs informational messages.
    #[default]
    #[serde(rename = "info")]
    Info,

    /// Logs debugging messages.
    #[serde(rename = "debug")]
    Debug,

    /// Logs trace-level messages.
    #[serde(rename = "trace")]
    Trace,
}

fn append_default() -> bool {
    true
}

/// Trait for types that can be used as log levels in `LoggerConfig`.
pub trait LogLevel:
    serde::de::DeserializeOwned + serde::Serialize + Clone + Copy + core::fmt::Debug + Default
{
}

/// Log levels of the dispatch pipeline.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PipelineLogLevel {
    /// Pipeline logging is disabled.
    #[default]
    #[serde(rename = "disabled")]
    Disabled,

    /// Stage milestones are logged.
    #[serde(rename = "basic")]
    Basic,

    /// Stage timings and buffer details are logged too.
    #[serde(rename = "full")]
    Full,
}

impl LogLevel for PipelineLogLevel {}

/// Writes messages to every output configured for the pipeline.
#[derive(Debug)]
pub struct Logger {
    loggers: Vec<LoggerKind>,
    level: PipelineLogLevel,
}

impl Logger {
    /// Creates a logger from the pipeline logger configuration.
    ///
    /// Outputs that can't be opened are reported through the `log` crate and skipped.
    pub fn new(config: &GlobalConfig) -> Self {
        let settings = &config.logger;
        let mut loggers = Vec::new();

        if let PipelineLogLevel::Disabled = settings.level {
            return Self {
                loggers,
                level: settings.level,
            };
        }

        if let Some(file) = &settings.file {
            match FileLogger::new(file, settings.append) {
                Ok(logger) => loggers.push(LoggerKind::File(logger)),
                Err(err) => log::warn!("Can't open log file '{}': {err}", file.display()),
            }
        }

        if settings.stdout {
            loggers.push(LoggerKind::Stdout);
        }

        if settings.stderr {
            loggers.push(LoggerKind::Stderr);
        }

        if let Some(level) = settings.log {
            loggers.push(LoggerKind::Log(level));
        }

        Self {
            loggers,
            level: settings.level,
        }
    }

    /// The configured level.
    pub fn level(&self) -> PipelineLogLevel {
        self.level
    }

    /// Whether at least one output is active.
    pub fn is_active(&self) -> bool {
        !self.loggers.is_empty()
    }

    /// Logs a message to every output.
    pub fn log<S: Display>(&mut self, msg: &S) {
        for logger in self.loggers.iter_mut() {
            logger.log(msg);
        }
    }
}

/// Represents different types of loggers.
#[derive(Debug)]
enum LoggerKind {
    /// Logs to a file.
    File(FileLogger),

    /// Logs to standard output.
    Stdout,

    /// Logs to standard error.
    Stderr,

    /// Logs using the `log` crate with a specified level.
    Log(LogCrateLevel),
}

impl LoggerKind {
    fn log<S: Display>(&mut self, msg: &S) {
        match self {
            LoggerKind::File(file_logger) => file_logger.log(msg),
            LoggerKind::Stdout => println!("{msg}"),
            LoggerKind::Stderr => eprintln!("{msg}"),
            LoggerKind::Log(level) => match level {
                LogCrateLevel::Info => log::info!("{msg}"),
                LogCrateLevel::Debug => log::debug!("{msg}"),
                LogCrateLevel::Trace => log::trace!("{msg}"),
            },
        }
    }
}

/// Logger that writes messages to a file.
#[derive(Debug)]
struct FileLogger {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl FileLogger {
    fn new(path: &PathBuf, append: bool) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .append(append)
            .truncate(!append)
            .create(true)
            .open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: path.clone(),
        })
    }

    // Flushes after every message so a crash keeps the last lines.
    fn log<S: Display>(&mut self, msg: &S) {
        let result = writeln!(self.writer, "{msg}").and_then(|_| self.writer.flush());

        if let Err(err) = result {
            log::warn!("Can't write to log file '{}': {err}", self.path.display());
        }
    }
}
