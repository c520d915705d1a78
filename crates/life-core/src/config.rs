//! Configuration loading and typed config structures.
//!
//! The configuration lives in `life-config.yaml` at the working
//! directory. Every field has a default, so a missing file, an empty
//! file, or a file that sets a single key are all valid.

use std::path::Path;

use serde::Deserialize;

/// Default grid width in columns.
pub const DEFAULT_WIDTH: usize = 40;

/// Default grid height in rows.
pub const DEFAULT_HEIGHT: usize = 30;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an unusable setup.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration, mirroring `life-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LifeConfig {
    /// Grid dimensions.
    #[serde(default)]
    pub grid: GridConfig,

    /// Autoplay cadence and launch behaviour.
    #[serde(default)]
    pub autoplay: AutoplayConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LifeConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// `LIFE_LOG_LEVEL` overrides `logging.level` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if the grid has a zero dimension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if the grid has a zero dimension.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml reads an empty document as null rather than an
        // empty mapping.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.logging.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if width or height is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "grid must be at least 1x1, got {}x{}",
                    self.grid.width, self.grid.height
                ),
            });
        }
        Ok(())
    }
}

/// Grid dimensions, fixed for the lifetime of a simulation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GridConfig {
    /// Number of columns.
    #[serde(default = "default_width")]
    pub width: usize,

    /// Number of rows.
    #[serde(default = "default_height")]
    pub height: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

/// Autoplay settings used by the engine binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AutoplayConfig {
    /// Milliseconds between generations. Values under 50 run at 50.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Start autoplay as soon as the engine is up.
    #[serde(default = "default_true")]
    pub start_on_launch: bool,

    /// Seed the grid with a random layout before starting.
    #[serde(default = "default_true")]
    pub randomize_on_launch: bool,

    /// Stop after this many generations (0 = run until interrupted).
    #[serde(default)]
    pub max_generations: u64,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            start_on_launch: true,
            randomize_on_launch: true,
            max_generations: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins
    /// when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    /// Override the level with `LIFE_LOG_LEVEL` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LIFE_LOG_LEVEL") {
            self.level = val;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

const fn default_width() -> usize {
    DEFAULT_WIDTH
}

const fn default_height() -> usize {
    DEFAULT_HEIGHT
}

const fn default_interval_ms() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
