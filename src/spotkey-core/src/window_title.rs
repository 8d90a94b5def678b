//! Playback-state and track inference from the Spotify window title.
//!
//! On platforms without a scripting interface the window title is the only
//! observable player state: `"<artist> - <title> - Spotify"` while playing,
//! one of a small set of idle titles otherwise. The functions here are pure
//! so the inference rules are testable on every target.

use crate::models::{PlayerState, TrackInfo};

/// Titles the Spotify window shows when nothing is playing.
pub const IDLE_TITLES: &[&str] = &["Spotify", "Spotify Free", "Spotify Premium"];

const TITLE_SUFFIX: &str = " - Spotify";

pub fn is_idle_title(title: &str) -> bool {
    IDLE_TITLES.contains(&title.trim())
}

/// An idle title means paused; anything else means playing, even when the
/// track itself cannot be recognized.
pub fn state_from_title(title: &str) -> PlayerState {
    if is_idle_title(title) {
        PlayerState::Paused
    } else {
        PlayerState::Playing
    }
}

/// Parse `"<artist> - <title> - Spotify"` into a track.
///
/// Album, duration, and URI are not observable through the title, so they
/// come back empty/zero. `None` for idle titles and titles that do not
/// match the pattern.
pub fn track_from_title(title: &str) -> Option<TrackInfo> {
    let title = title.trim();
    if is_idle_title(title) {
        return None;
    }
    let stem = title.strip_suffix(TITLE_SUFFIX)?;
    let (artist, name) = stem.split_once(" - ")?;
    if artist.is_empty() || name.is_empty() {
        return None;
    }
    Some(TrackInfo {
        name: name.to_string(),
        artist: artist.to_string(),
        album: String::new(),
        duration_ms: 0,
        spotify_uri: String::new(),
    })
}
