use thiserror::Error;

/// Failures surfaced by controllers and the factory.
///
/// The core never retries and never swallows a transport failure; every
/// error propagates upward carrying its diagnostic text. Retry/verify
/// loops belong to the calling command layer.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// No backend exists for the host platform. Raised once, at
    /// construction, never recoverable within the process.
    #[error("platform '{platform}' is not supported (supported platforms: macos, windows)")]
    UnsupportedPlatform { platform: String },

    /// The backend exists but this capability is absent on the platform.
    /// Raised per call, before any automation-channel traffic.
    #[error("{operation} is not supported on this platform")]
    Unsupported { operation: &'static str },

    /// The native scripting channel errored (nonzero osascript exit).
    #[error("script execution failed: {message}")]
    Script { message: String },

    /// The UI-automation channel errored (window not found, input
    /// injection failure).
    #[error("automation failed: {message}")]
    Automation { message: String },

    /// Caller-supplied argument out of contract. Raised before any
    /// automation-channel call, so it has zero side effects.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// An operation that requires Spotify to be running was invoked while
    /// it is not.
    #[error("Spotify is not running")]
    NotRunning,
}

pub type ControllerResult<T> = Result<T, ControllerError>;
