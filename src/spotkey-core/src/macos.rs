//! macOS backend: native Spotify AppleScript commands for playback control,
//! System Events for keyboard automation.

use std::time::Duration;

use crate::applescript::{escape, modifier_clause, Osascript, ScriptRunner};
use crate::controller::{Delays, Key, Modifier, SpotifyController};
use crate::error::{ControllerError, ControllerResult};
use crate::models::{PlayerState, TrackInfo};

/// Field separator for the batch track query; chosen to be unlikely to
/// appear in track metadata.
const TRACK_SEPARATOR: &str = "|||";

/// Sentinel returned by the batch track query when nothing is playing.
const STOPPED_SENTINEL: &str = "STOPPED";

const CURRENT_TRACK_SCRIPT: &str = r#"
tell application "Spotify"
    if player state is stopped then
        return "STOPPED"
    end if
    set trackName to name of current track
    set trackArtist to artist of current track
    set trackAlbum to album of current track
    set trackDuration to duration of current track
    set trackUri to spotify url of current track
    return trackName & "|||" & trackArtist & "|||" & trackAlbum & "|||" & trackDuration & "|||" & trackUri
end tell
"#;

const IS_RUNNING_SCRIPT: &str = r#"
tell application "System Events"
    return (name of processes) contains "Spotify"
end tell
"#;

/// Controller for the macOS Spotify client.
///
/// Every accessor and mutator maps 1:1 to a Spotify AppleScript command;
/// keyboard primitives go through System Events against the Spotify
/// process. Construction is infallible; failures surface per call as
/// [`ControllerError::Script`].
pub struct MacController {
    runner: Box<dyn ScriptRunner>,
    delays: Delays,
    debug: bool,
}

impl MacController {
    pub fn new(debug: bool) -> Self {
        Self::with_runner(Box::new(Osascript), debug)
    }

    pub(crate) fn with_runner(runner: Box<dyn ScriptRunner>, debug: bool) -> Self {
        Self {
            runner,
            delays: Delays::default(),
            debug,
        }
    }

    fn run(&self, script: &str) -> ControllerResult<String> {
        if self.debug {
            tracing::debug!(script = script.trim(), "running AppleScript");
        }
        self.runner.run(script)
    }

    fn spotify_tell(&self, command: &str) -> ControllerResult<String> {
        self.run(&format!("tell application \"Spotify\" to {command}"))
    }

    fn keystroke_script(key: &str, modifiers: &[Modifier]) -> String {
        format!(
            r#"
tell application "System Events"
    tell process "Spotify"
        keystroke "{}"{}
    end tell
end tell
"#,
            escape(key),
            modifier_clause(modifiers)
        )
    }

    fn key_code_script(code: u16, modifiers: &[Modifier]) -> String {
        format!(
            r#"
tell application "System Events"
    tell process "Spotify"
        key code {}{}
    end tell
end tell
"#,
            code,
            modifier_clause(modifiers)
        )
    }

    /// Name of the current track (single-field accessor).
    pub fn track_name(&self) -> ControllerResult<String> {
        self.spotify_tell("name of current track")
    }

    /// Artist of the current track.
    pub fn track_artist(&self) -> ControllerResult<String> {
        self.spotify_tell("artist of current track")
    }

    /// Album of the current track.
    pub fn track_album(&self) -> ControllerResult<String> {
        self.spotify_tell("album of current track")
    }

    /// Read a Spotify URI (or any text) from the system clipboard.
    pub fn uri_from_clipboard(&self) -> ControllerResult<String> {
        self.run("the clipboard as text")
    }
}

/// Parse the five-field `|||`-joined record produced by the batch track
/// query. `None` for the stopped sentinel, a wrong field count, or an
/// unparseable duration.
fn parse_track_record(record: &str) -> Option<TrackInfo> {
    if record == STOPPED_SENTINEL {
        return None;
    }
    let parts: Vec<&str> = record.split(TRACK_SEPARATOR).collect();
    if parts.len() != 5 {
        return None;
    }
    let duration_ms = parse_number(parts[3])? as u64;
    Some(TrackInfo {
        name: parts[0].to_string(),
        artist: parts[1].to_string(),
        album: parts[2].to_string(),
        duration_ms,
        spotify_uri: parts[4].to_string(),
    })
}

/// Parse an osascript numeric reply, tolerating locales that print a
/// decimal comma.
fn parse_number(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse().ok()
}

impl SpotifyController for MacController {
    fn launch(&self, wait: bool, delay: Option<Duration>) -> ControllerResult<()> {
        self.spotify_tell("activate")?;
        if wait {
            self.wait(delay.unwrap_or(self.delays.launch));
        }
        Ok(())
    }

    fn quit(&self) -> ControllerResult<()> {
        self.spotify_tell("quit")?;
        Ok(())
    }

    fn is_running(&self) -> ControllerResult<bool> {
        let result = self.run(IS_RUNNING_SCRIPT)?;
        Ok(result.eq_ignore_ascii_case("true"))
    }

    fn bring_to_front(&self) -> ControllerResult<()> {
        self.spotify_tell("activate")?;
        self.wait(self.delays.ui);
        Ok(())
    }

    fn play(&self) -> ControllerResult<()> {
        self.spotify_tell("play")?;
        Ok(())
    }

    fn pause(&self) -> ControllerResult<()> {
        self.spotify_tell("pause")?;
        Ok(())
    }

    fn play_pause(&self) -> ControllerResult<()> {
        self.spotify_tell("playpause")?;
        Ok(())
    }

    fn next_track(&self) -> ControllerResult<()> {
        self.spotify_tell("next track")?;
        Ok(())
    }

    fn previous_track(&self) -> ControllerResult<()> {
        self.spotify_tell("previous track")?;
        Ok(())
    }

    fn set_volume(&self, level: u8) -> ControllerResult<()> {
        if level > 100 {
            return Err(ControllerError::InvalidArgument {
                message: format!("volume must be between 0 and 100, got {level}"),
            });
        }
        self.spotify_tell(&format!("set sound volume to {level}"))?;
        Ok(())
    }

    fn volume(&self) -> ControllerResult<u8> {
        let result = self.spotify_tell("sound volume")?;
        result.parse().map_err(|_| ControllerError::Script {
            message: format!("unexpected volume reply '{result}'"),
        })
    }

    fn player_state(&self) -> ControllerResult<PlayerState> {
        let result = self.spotify_tell("player state as string")?;
        result.parse().map_err(|_| ControllerError::Script {
            message: format!("unexpected player state reply '{result}'"),
        })
    }

    fn player_position(&self) -> ControllerResult<f64> {
        let result = self.spotify_tell("player position")?;
        parse_number(&result).ok_or_else(|| ControllerError::Script {
            message: format!("unexpected player position reply '{result}'"),
        })
    }

    fn set_player_position(&self, seconds: f64) -> ControllerResult<()> {
        self.spotify_tell(&format!("set player position to {seconds}"))?;
        Ok(())
    }

    fn current_track(&self) -> ControllerResult<Option<TrackInfo>> {
        let record = self.run(CURRENT_TRACK_SCRIPT)?;
        Ok(parse_track_record(&record))
    }

    fn play_uri(&self, uri: &str) -> ControllerResult<()> {
        self.spotify_tell(&format!("play track \"{}\"", escape(uri)))?;
        Ok(())
    }

    fn is_shuffling(&self) -> ControllerResult<bool> {
        let result = self.spotify_tell("shuffling")?;
        Ok(result.eq_ignore_ascii_case("true"))
    }

    fn is_repeating(&self) -> ControllerResult<bool> {
        let result = self.spotify_tell("repeating")?;
        Ok(result.eq_ignore_ascii_case("true"))
    }

    fn set_shuffling(&self, enabled: bool) -> ControllerResult<()> {
        self.spotify_tell(&format!("set shuffling to {enabled}"))?;
        Ok(())
    }

    fn set_repeating(&self, enabled: bool) -> ControllerResult<()> {
        self.spotify_tell(&format!("set repeating to {enabled}"))?;
        Ok(())
    }

    fn keystroke(&self, key: char, modifiers: &[Modifier]) -> ControllerResult<()> {
        self.run(&Self::keystroke_script(&key.to_string(), modifiers))?;
        self.wait(self.delays.keystroke);
        Ok(())
    }

    fn key_code(&self, code: u16, modifiers: &[Modifier]) -> ControllerResult<()> {
        self.run(&Self::key_code_script(code, modifiers))?;
        self.wait(self.delays.keystroke);
        Ok(())
    }

    fn type_text(&self, text: &str, delay_per_char: Duration) -> ControllerResult<()> {
        self.run(&Self::keystroke_script(text, &[]))?;
        self.wait(delay_per_char * text.len() as u32 + self.delays.ui);
        Ok(())
    }

    fn code_for(&self, key: Key) -> u16 {
        match key {
            Key::Return => 36,
            Key::Escape => 53,
            Key::Tab => 48,
            Key::DownArrow => 125,
            Key::UpArrow => 126,
            Key::Space => 49,
        }
    }

    fn command_modifier(&self) -> Modifier {
        Modifier::Command
    }

    fn delays(&self) -> &Delays {
        &self.delays
    }

    fn set_delays(&mut self, delays: Delays) {
        self.delays = delays;
    }
}
