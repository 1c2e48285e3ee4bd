use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use super::{
    device::DeviceConfig, dispatch::DispatchConfig, logger::LoggerConfig,
    logger::PipelineLogLevel, program::ProgramConfig,
};

/// Static mutex holding the global configuration, initialized as `None`.
static CLMM_GLOBAL_CONFIG: spin::Mutex<Option<Arc<GlobalConfig>>> = spin::Mutex::new(None);

/// File name searched in the current directory and its parents.
pub const CONFIG_FILE_NAME: &str = "clmm.toml";

const DEFAULT_LOG_FILE: &str = "/tmp/clmm.log";

/// Represents the global configuration of the pipeline.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GlobalConfig {
    /// Configuration of the platform lookup.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Configuration of the program image.
    #[serde(default)]
    pub program: ProgramConfig,

    /// Configuration of the kernel launch.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Configuration of the pipeline logger.
    #[serde(default)]
    pub logger: LoggerConfig<PipelineLogLevel>,
}

/// Errors when loading a configuration file.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The file can't be read.
    #[error("Can't read config file '{path}'\nCaused by:\n  {reason}")]
    Io {
        /// The config path.
        path: PathBuf,
        /// The io error message.
        reason: String,
    },
    /// The file isn't valid for the config format.
    #[error("The config file '{path}' doesn't have the right format\nCaused by:\n  {reason}")]
    Parse {
        /// The config path.
        path: PathBuf,
        /// The toml error message.
        reason: String,
    },
}

impl GlobalConfig {
    /// Retrieves the current global configuration, loading it from the current directory if not
    /// set.
    ///
    /// If no configuration is set, it attempts to load one from `clmm.toml` in the current
    /// directory or its parents, then applies the environment overrides. If no file is found, a
    /// default configuration is used.
    pub fn get() -> Arc<Self> {
        let mut state = CLMM_GLOBAL_CONFIG.lock();

        match state.as_ref() {
            Some(config) => config.clone(),
            None => {
                let config = Arc::new(Self::load());
                *state = Some(config.clone());
                config
            }
        }
    }

    /// Loads `clmm.toml` from the current directory or its parents and applies the environment
    /// overrides, without installing the result as the global configuration.
    pub fn load() -> Self {
        Self::from_current_dir().override_from_env()
    }

    /// Sets the global configuration to the provided value.
    ///
    /// # Panics
    /// Panics if the configuration has already been set or read, as it cannot be overridden.
    ///
    /// # Warning
    /// This method must be called at the start of the program, before any calls to `get`.
    pub fn set(config: Self) {
        let mut state = CLMM_GLOBAL_CONFIG.lock();
        if state.is_some() {
            panic!("Cannot set the global configuration multiple times.");
        }
        *state = Some(Arc::new(config));
    }

    /// Save the current configuration to the provided file path.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, content)
    }

    /// Overrides configuration fields based on environment variables.
    ///
    /// - `CLMM_DEBUG_LOG`: `stdout`, `stderr`, `1`/`true` (log to `/tmp/clmm.log`),
    ///   `0`/`false` (disable) or a file path.
    /// - `CLMM_PROGRAM_DIR`: directory searched for the program image.
    pub fn override_from_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F: Fn(&str) -> Option<String>>(mut self, var: F) -> Self {
        if let Some(val) = var("CLMM_DEBUG_LOG") {
            self.logger.level = PipelineLogLevel::Full;

            match val.as_str() {
                "stdout" => self.logger.stdout = true,
                "stderr" => self.logger.stderr = true,
                "1" | "true" => self.logger.file = Some(DEFAULT_LOG_FILE.into()),
                "0" | "false" => self.logger.level = PipelineLogLevel::Disabled,
                file_path => self.logger.file = Some(file_path.into()),
            }
        }

        if let Some(dir) = var("CLMM_PROGRAM_DIR") {
            self.program.dir = Some(dir.into());
        }

        self
    }

    // Loads configuration from `clmm.toml` in the current directory or its parents.
    //
    // Traverses up the directory tree until a configuration file is found or the root is reached.
    fn from_current_dir() -> Self {
        let mut dir = match std::env::current_dir() {
            Ok(dir) => dir,
            Err(err) => {
                log::warn!("Can't resolve the current directory, using the default config: {err}");
                return Self::default();
            }
        };

        loop {
            let path = dir.join(CONFIG_FILE_NAME);

            if path.is_file() {
                return match Self::from_file_path(&path) {
                    Ok(config) => config,
                    Err(err) => {
                        log::warn!("{err}\nUsing the default config.");
                        Self::default()
                    }
                };
            }

            if !dir.pop() {
                break;
            }
        }

        Self::default()
    }

    /// Loads configuration from a specified file path.
    pub fn from_file_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        toml::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }
}
