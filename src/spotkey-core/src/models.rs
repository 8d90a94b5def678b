use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Metadata for the item Spotify is currently playing.
///
/// Values are produced fresh per query and never mutated; equality is
/// structural.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub name: String,
    pub artist: String,
    pub album: String,
    /// Track length in milliseconds.
    pub duration_ms: u64,
    /// Spotify URI in `spotify:type:id` form. May be empty when the backend
    /// cannot observe it (e.g. window-title inference).
    pub spotify_uri: String,
}

impl TrackInfo {
    pub fn duration_seconds(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }

    /// Shareable `https://open.spotify.com/...` URL for this item.
    ///
    /// The URI must split on `:` into exactly three fields with a `spotify`
    /// scheme; anything else yields `None` rather than an error.
    pub fn web_url(&self) -> Option<String> {
        let parts: Vec<&str> = self.spotify_uri.split(':').collect();
        if parts.len() != 3 || parts[0] != "spotify" {
            return None;
        }
        Some(format!("https://open.spotify.com/{}/{}", parts[1], parts[2]))
    }
}

/// Playback state reported by a controller.
///
/// The contract guarantees one of these three variants; backends never
/// surface an arbitrary string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Playing,
    Paused,
    Stopped,
}

impl PlayerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unrecognized player state '{0}'")]
pub struct ParsePlayerStateError(pub String);

impl FromStr for PlayerState {
    type Err = ParsePlayerStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "playing" => Ok(PlayerState::Playing),
            "paused" => Ok(PlayerState::Paused),
            "stopped" => Ok(PlayerState::Stopped),
            other => Err(ParsePlayerStateError(other.to_string())),
        }
    }
}
