//! `config.toml` in the platform config directory: automation delay
//! overrides and logging options.

use crate::controller::Delays;
use crate::paths::AppDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const CONFIG_FILE: &str = "config.toml";
const CURRENT_CONFIG_VERSION: u32 = 1;
const DEFAULT_MAX_LOG_FILES: usize = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub config_version: u32,
    pub delays: DelaysConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CURRENT_CONFIG_VERSION,
            delays: DelaysConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Read the config file, or fall back to defaults when none exists.
    /// A file that exists but fails to parse or validate is an error, not
    /// a silent fallback.
    pub fn load_or_default(dirs: &AppDirs) -> Result<Self, ConfigError> {
        dirs.ensure_exists()?;
        let path = Self::config_path(dirs);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        let config: Config =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn config_path(dirs: &AppDirs) -> PathBuf {
        dirs.config_dir().join(CONFIG_FILE)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config_version != CURRENT_CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.config_version,
                expected: CURRENT_CONFIG_VERSION,
            });
        }
        self.delays.validate()
    }
}

/// Optional overrides (in seconds) for the automation wait durations.
/// Unset fields keep their [`Delays::default`] values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DelaysConfig {
    pub launch: Option<f64>,
    pub ui: Option<f64>,
    pub search_results: Option<f64>,
    pub keystroke: Option<f64>,
    pub overlay_settle: Option<f64>,
    pub result_select: Option<f64>,
    pub playlist_search: Option<f64>,
    pub playlist_open: Option<f64>,
    pub confirm: Option<f64>,
}

impl DelaysConfig {
    fn entries(&self) -> [(&'static str, Option<f64>); 9] {
        [
            ("launch", self.launch),
            ("ui", self.ui),
            ("search_results", self.search_results),
            ("keystroke", self.keystroke),
            ("overlay_settle", self.overlay_settle),
            ("result_select", self.result_select),
            ("playlist_search", self.playlist_search),
            ("playlist_open", self.playlist_open),
            ("confirm", self.confirm),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self
            .entries()
            .into_iter()
            .find(|(_, value)| matches!(value, Some(v) if !v.is_finite() || *v < 0.0))
        {
            Some((field, value)) => Err(ValidationError::InvalidDelay {
                field,
                value: value.unwrap_or_default(),
            }),
            None => Ok(()),
        }
    }

    /// Overlay the configured values on the built-in defaults. Values that
    /// would not survive `validate` are skipped.
    pub fn to_delays(&self) -> Delays {
        let defaults = Delays::default();
        let secs = |value: Option<f64>, fallback: Duration| {
            value
                .and_then(|s| Duration::try_from_secs_f64(s).ok())
                .unwrap_or(fallback)
        };
        Delays {
            launch: secs(self.launch, defaults.launch),
            ui: secs(self.ui, defaults.ui),
            search_results: secs(self.search_results, defaults.search_results),
            keystroke: secs(self.keystroke, defaults.keystroke),
            overlay_settle: secs(self.overlay_settle, defaults.overlay_settle),
            result_select: secs(self.result_select, defaults.result_select),
            playlist_search: secs(self.playlist_search, defaults.playlist_search),
            playlist_open: secs(self.playlist_open, defaults.playlist_open),
            confirm: secs(self.confirm, defaults.confirm),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub max_log_files: usize,
    pub stdout: bool,
    /// File stem for the rotated log; defaults to `spotkey.log`.
    pub file_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            max_log_files: DEFAULT_MAX_LOG_FILES,
            stdout: false,
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The `tracing_subscriber` filter directive for this level.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config file {path} is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Validation(#[from] ValidationError),
    #[error("failed to prepare configuration directories: {0}")]
    Directories(#[from] crate::paths::DirsError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("config_version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("delay '{field}' must be a non-negative number of seconds (got {value})")]
    InvalidDelay { field: &'static str, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.config_version, CURRENT_CONFIG_VERSION);
        assert_eq!(config.logging.max_log_files, DEFAULT_MAX_LOG_FILES);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(!config.logging.stdout);
    }

    #[test]
    fn empty_file_parses_to_defaults() {
        let config: Config = toml::from_str("").expect("should parse");
        assert!(config.validate().is_ok());
        assert_eq!(config.delays.to_delays(), Delays::default());
    }

    #[test]
    fn unknown_version_is_rejected() {
        let config: Config = toml::from_str("config_version = 99\n").expect("should parse");
        assert!(matches!(
            config.validate(),
            Err(ValidationError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn configured_delays_overlay_defaults() {
        let config: Config = toml::from_str(
            r#"
            [delays]
            ui = 0.05
            playlist_search = 3.5

            [logging]
            level = "debug"
            "#,
        )
        .expect("should parse");
        assert!(config.validate().is_ok());
        let delays = config.delays.to_delays();
        assert_eq!(delays.ui, Duration::from_millis(50));
        assert_eq!(delays.playlist_search, Duration::from_millis(3500));
        assert_eq!(delays.launch, Delays::default().launch);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn negative_delay_is_rejected() {
        let config: Config = toml::from_str("[delays]\nui = -0.5\n").expect("should parse");
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidDelay { field: "ui", .. })
        ));
    }

    #[test]
    fn load_or_default_round_trips_a_written_file() {
        let dir = tempfile::tempdir().expect("should create tempdir");
        let dirs = AppDirs::rooted_at(dir.path());
        fs::write(
            Config::config_path(&dirs),
            "[delays]\nplaylist_search = 4.0\n",
        )
        .expect("should write");

        let config = Config::load_or_default(&dirs).expect("should load");
        assert_eq!(
            config.delays.to_delays().playlist_search,
            Duration::from_secs(4)
        );
    }

    #[test]
    fn load_or_default_falls_back_when_file_is_missing() {
        let dir = tempfile::tempdir().expect("should create tempdir");
        let dirs = AppDirs::rooted_at(dir.path());
        let config = Config::load_or_default(&dirs).expect("should load");
        assert_eq!(config.config_version, CURRENT_CONFIG_VERSION);
    }

    #[test]
    fn load_or_default_surfaces_garbage_files() {
        let dir = tempfile::tempdir().expect("should create tempdir");
        let dirs = AppDirs::rooted_at(dir.path());
        fs::write(Config::config_path(&dirs), "not = [valid").expect("should write");
        assert!(matches!(
            Config::load_or_default(&dirs),
            Err(ConfigError::Parse { .. })
        ));
    }
}
