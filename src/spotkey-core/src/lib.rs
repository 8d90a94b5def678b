//! Automation for the Spotify desktop application.
//!
//! One controller contract ([`SpotifyController`]), one concrete backend
//! per platform: native AppleScript commands on macOS, media-key and
//! keyboard simulation on Windows. The [`Spotify`] facade detects the host
//! platform and delegates the full contract to the matching backend.
//!
//! Everything is synchronous and blocking; waits around UI operations are
//! blind, empirically chosen durations (see
//! [`Delays`](controller::Delays)). Controller instances are not safe for
//! concurrent use.

pub mod applescript;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod macos;
pub mod models;
pub mod paths;
pub mod platform;
pub mod window_title;
#[cfg(target_os = "windows")]
pub mod windows;

pub use config::{Config, ConfigError, DelaysConfig, LogLevel, LoggingConfig, ValidationError};
pub use controller::{Delays, Key, Modifier, SpotifyController};
pub use error::{ControllerError, ControllerResult};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use models::{PlayerState, TrackInfo};
pub use paths::{AppDirs, DirsError};
pub use platform::{create_controller, detect_platform, Spotify, SUPPORTED_PLATFORMS};

pub const APP_NAME: &str = "spotkey";
pub const APP_AUTHOR: &str = "Spotkey";
pub const APP_QUALIFIER: &str = "io";
