//! Platform detection, controller construction, and the delegating facade.

use std::ops::{Deref, DerefMut};

use crate::controller::SpotifyController;
use crate::error::{ControllerError, ControllerResult};
use crate::macos::MacController;
#[cfg(target_os = "windows")]
use crate::windows::WindowsController;

/// Platform tags with a backend. Backend availability is decided at build
/// time: the `windows` arm of [`create_controller`] only exists on Windows
/// builds.
pub const SUPPORTED_PLATFORMS: &[&str] = &["macos", "windows"];

/// Lower-cased tag for the host OS. Recognized systems map to the closed
/// tag set; anything else passes through unchanged rather than failing.
pub fn detect_platform() -> String {
    match std::env::consts::OS {
        "macos" => "macos".to_string(),
        "windows" => "windows".to_string(),
        "linux" => "linux".to_string(),
        other => other.to_ascii_lowercase(),
    }
}

/// Construct the controller for a platform tag.
///
/// Construction either fully succeeds or fails atomically with
/// [`ControllerError::UnsupportedPlatform`]; there is no partially
/// initialized controller.
pub fn create_controller(
    platform: &str,
    debug: bool,
) -> ControllerResult<Box<dyn SpotifyController>> {
    match platform {
        "macos" => Ok(Box::new(MacController::new(debug))),
        #[cfg(target_os = "windows")]
        "windows" => Ok(Box::new(WindowsController::new(debug))),
        other => Err(ControllerError::UnsupportedPlatform {
            platform: other.to_string(),
        }),
    }
}

/// Facade over the platform-appropriate controller.
///
/// Detects the host platform once at construction, builds the matching
/// backend, and forwards every contract operation to it verbatim via
/// `Deref`; there is no platform branching after construction.
///
/// Like the controllers it wraps, a `Spotify` instance is not safe for
/// concurrent use.
pub struct Spotify {
    platform: String,
    controller: Box<dyn SpotifyController>,
}

impl Spotify {
    pub fn new(debug: bool) -> ControllerResult<Self> {
        let platform = detect_platform();
        let controller = create_controller(&platform, debug)?;
        tracing::debug!(platform = %platform, "platform controller constructed");
        Ok(Self {
            platform,
            controller,
        })
    }

    /// The detected platform tag.
    pub fn platform(&self) -> &str {
        &self.platform
    }
}

impl Deref for Spotify {
    type Target = dyn SpotifyController;

    fn deref(&self) -> &Self::Target {
        self.controller.as_ref()
    }
}

impl DerefMut for Spotify {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.controller.as_mut()
    }
}
