use core::{fmt::Display, time::Duration};

use crate::config::{GlobalConfig, Logger, PipelineLogLevel};

/// Pipeline logger.
#[derive(Debug)]
pub struct PipelineLogger {
    kind: PipelineLoggerKind,
    stages: Vec<(String, Duration)>,
}

#[derive(Debug)]
enum PipelineLoggerKind {
    /// Activated logger.
    Activated(Logger),
    /// Don't log information.
    None,
}

impl PipelineLogger {
    /// Create the logger from the configuration.
    pub fn new(config: &GlobalConfig) -> Self {
        let logger = Logger::new(config);

        let kind = if logger.is_active() {
            PipelineLoggerKind::Activated(logger)
        } else {
            PipelineLoggerKind::None
        };

        Self {
            kind,
            stages: Vec::new(),
        }
    }

    /// The active level, disabled when no output is configured.
    pub fn level(&self) -> PipelineLogLevel {
        match &self.kind {
            PipelineLoggerKind::Activated(logger) => logger.level(),
            PipelineLoggerKind::None => PipelineLogLevel::Disabled,
        }
    }

    /// Log a stage milestone.
    pub fn log_basic<S: Display>(&mut self, msg: S) {
        if let PipelineLoggerKind::Activated(logger) = &mut self.kind {
            logger.log(&msg);
        }
    }

    /// Log a detail, only at the full level.
    pub fn log_full<S: Display>(&mut self, msg: S) {
        if let PipelineLoggerKind::Activated(logger) = &mut self.kind {
            if let PipelineLogLevel::Full = logger.level() {
                logger.log(&msg);
            }
        }
    }

    /// Register the wall-clock duration of a stage.
    pub fn register_stage<Name: Display>(&mut self, name: Name, duration: Duration) {
        let name = name.to_string();
        self.log_full(format!("| {duration:<10?} | {name}"));
        self.stages.push((name, duration));
    }

    /// Durations registered so far, in order.
    pub fn stages(&self) -> &[(String, Duration)] {
        &self.stages
    }

    /// Log the total time of the registered stages and reset them.
    pub fn stage_summary(&mut self) {
        let stages = core::mem::take(&mut self.stages);
        if stages.is_empty() {
            return;
        }

        let total: Duration = stages.iter().map(|(_, duration)| *duration).sum();
        self.log_full(format!("| {total:<10?} | total ({} stages)", stages.len()));
    }
}
