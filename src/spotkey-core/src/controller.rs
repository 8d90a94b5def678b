use std::thread;
use std::time::Duration;

use crate::error::ControllerResult;
use crate::models::{PlayerState, TrackInfo};

/// Keyboard modifier keys, named abstractly; each backend translates them
/// into its own automation channel's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// The platform's primary command modifier (Cmd on macOS, Ctrl on
    /// Windows).
    Command,
    Control,
    Option,
    Shift,
}

/// Non-character keys addressable through `SpotifyController::code_for`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Return,
    Escape,
    Tab,
    DownArrow,
    UpArrow,
    Space,
}

/// Per-character pause used when typing search queries.
pub const TYPE_CHAR_DELAY: Duration = Duration::from_millis(20);

/// Wait durations inserted around UI-affecting operations.
///
/// The UI has no observable "finished rendering" event, so every wait here
/// is blind and empirically chosen. All of them are settable (and zeroable
/// in tests); `ui` is the general-purpose settle knob, also reachable via
/// [`SpotifyController::set_ui_delay`].
#[derive(Debug, Clone, PartialEq)]
pub struct Delays {
    /// Blocking wait after requesting an app launch.
    pub launch: Duration,
    /// Settle time after a UI-affecting operation.
    pub ui: Duration,
    /// Wait for search results to render when requested.
    pub search_results: Duration,
    /// Pause between consecutive keystrokes.
    pub keystroke: Duration,
    /// Settle time after opening the search overlay, before typing or
    /// selecting.
    pub overlay_settle: Duration,
    /// Pause between highlighting a search result and confirming it.
    pub result_select: Duration,
    /// Default wait for playlist search results inside
    /// `play_playlist_by_name`.
    pub playlist_search: Duration,
    /// Wait for the selected playlist page to open.
    pub playlist_open: Duration,
    /// Pause before a final confirm press or play command.
    pub confirm: Duration,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            launch: Duration::from_secs(2),
            ui: Duration::from_millis(500),
            search_results: Duration::from_millis(1500),
            keystroke: Duration::from_millis(100),
            overlay_settle: Duration::from_millis(300),
            result_select: Duration::from_millis(200),
            playlist_search: Duration::from_secs(2),
            playlist_open: Duration::from_secs(1),
            confirm: Duration::from_millis(500),
        }
    }
}

impl Delays {
    /// All-zero delays, for tests that drive procedures against doubles.
    pub fn zero() -> Self {
        Self {
            launch: Duration::ZERO,
            ui: Duration::ZERO,
            search_results: Duration::ZERO,
            keystroke: Duration::ZERO,
            overlay_settle: Duration::ZERO,
            result_select: Duration::ZERO,
            playlist_search: Duration::ZERO,
            playlist_open: Duration::ZERO,
            confirm: Duration::ZERO,
        }
    }
}

/// Contract every platform backend satisfies.
///
/// Backends expose process lifecycle, transport-level playback commands,
/// state/track queries, and raw keystroke primitives; the higher-level
/// automation procedures are provided methods built only on those
/// primitives, so they run unmodified on every backend.
///
/// Commands are fire-and-forget: effects are asynchronous and unverified by
/// the call itself. An operation a platform cannot express fails with
/// [`ControllerError::Unsupported`](crate::error::ControllerError), never a
/// silent no-op.
///
/// Instances are NOT safe for concurrent use. The underlying automation
/// channel (subprocess invocation or window handle) has no internal
/// locking; callers that need concurrency must serialize access themselves.
pub trait SpotifyController {
    /// Request OS-level start/foreground of Spotify. When `wait` is true,
    /// block for `delay` (default [`Delays::launch`]) to let the app finish
    /// starting. Does not verify launch success.
    fn launch(&self, wait: bool, delay: Option<Duration>) -> ControllerResult<()>;

    /// Request termination.
    fn quit(&self) -> ControllerResult<()>;

    /// Whether Spotify is currently running. "Not found" is `Ok(false)`;
    /// only transport failures error.
    fn is_running(&self) -> ControllerResult<bool>;

    /// Request window focus.
    fn bring_to_front(&self) -> ControllerResult<()>;

    fn play(&self) -> ControllerResult<()>;
    fn pause(&self) -> ControllerResult<()>;
    fn play_pause(&self) -> ControllerResult<()>;
    fn next_track(&self) -> ControllerResult<()>;
    fn previous_track(&self) -> ControllerResult<()>;

    /// Set the player volume. Levels above 100 are rejected with a
    /// validation error before any automation-channel call.
    fn set_volume(&self, level: u8) -> ControllerResult<()>;
    fn volume(&self) -> ControllerResult<u8>;

    fn player_state(&self) -> ControllerResult<PlayerState>;

    /// Current playback position in seconds.
    fn player_position(&self) -> ControllerResult<f64>;
    fn set_player_position(&self, seconds: f64) -> ControllerResult<()>;

    /// Currently playing track, or `None` when stopped or when track
    /// fields cannot be parsed.
    fn current_track(&self) -> ControllerResult<Option<TrackInfo>>;

    /// Play a specific item by its `spotify:type:id` URI.
    fn play_uri(&self, uri: &str) -> ControllerResult<()>;

    fn is_shuffling(&self) -> ControllerResult<bool>;
    fn is_repeating(&self) -> ControllerResult<bool>;
    fn set_shuffling(&self, enabled: bool) -> ControllerResult<()>;
    fn set_repeating(&self, enabled: bool) -> ControllerResult<()>;

    /// Send a single character with optional modifiers.
    fn keystroke(&self, key: char, modifiers: &[Modifier]) -> ControllerResult<()>;

    /// Send a raw platform key code with optional modifiers.
    fn key_code(&self, code: u16, modifiers: &[Modifier]) -> ControllerResult<()>;

    /// Type a text string with a per-character delay.
    fn type_text(&self, text: &str, delay_per_char: Duration) -> ControllerResult<()>;

    /// Platform key code for the given key.
    fn code_for(&self, key: Key) -> u16;

    /// The platform's primary command modifier.
    fn command_modifier(&self) -> Modifier;

    fn delays(&self) -> &Delays;
    fn set_delays(&mut self, delays: Delays);

    // ------------------------------------------------------------------
    // Provided methods: shared across backends
    // ------------------------------------------------------------------

    /// Adjust only the general UI settle delay.
    fn set_ui_delay(&mut self, delay: Duration) {
        let mut delays = self.delays().clone();
        delays.ui = delay;
        self.set_delays(delays);
    }

    /// Block the calling thread.
    fn wait(&self, duration: Duration) {
        thread::sleep(duration);
    }

    fn press(&self, key: Key) -> ControllerResult<()> {
        self.key_code(self.code_for(key), &[])
    }

    fn is_playing(&self) -> ControllerResult<bool> {
        Ok(self.player_state()? == PlayerState::Playing)
    }

    /// Open the quick-search overlay (command-modifier + `k`).
    fn open_search(&self) -> ControllerResult<()> {
        self.bring_to_front()?;
        self.keystroke('k', &[self.command_modifier()])?;
        self.wait(self.delays().ui);
        Ok(())
    }

    /// Open search and type a query.
    ///
    /// There is no way to verify that results actually loaded; when
    /// `wait_for_results` is set this waits a fixed interval and hopes.
    fn search(&self, query: &str, wait_for_results: bool) -> ControllerResult<()> {
        tracing::debug!(query, wait_for_results, "searching");
        self.open_search()?;
        self.wait(self.delays().overlay_settle);
        self.type_text(query, TYPE_CHAR_DELAY)?;
        if wait_for_results {
            self.wait(self.delays().search_results);
        }
        Ok(())
    }

    /// Highlight and confirm the first entry in the search results.
    fn select_first_search_result(&self) -> ControllerResult<()> {
        self.wait(self.delays().overlay_settle);
        self.press(Key::DownArrow)?;
        self.wait(self.delays().result_select);
        self.press(Key::Return)?;
        self.wait(self.delays().ui);
        Ok(())
    }

    /// Tab to the first song row of an open playlist page and confirm.
    ///
    /// Positional heuristic that assumes a fixed UI tab order; brittle when
    /// the client layout changes.
    fn navigate_to_first_song(&self) -> ControllerResult<()> {
        for _ in 0..3 {
            self.press(Key::Tab)?;
            self.wait(self.delays().keystroke);
        }
        self.press(Key::Return)?;
        Ok(())
    }

    /// Find a playlist by name and start playing it.
    ///
    /// Launches Spotify when it is not running, otherwise focuses it; then
    /// searches, selects the first result, and (when `play_first_song`)
    /// presses a final confirm. All waits are blind; `search_delay`
    /// overrides [`Delays::playlist_search`] for this call.
    fn play_playlist_by_name(
        &self,
        name: &str,
        play_first_song: bool,
        search_delay: Option<Duration>,
    ) -> ControllerResult<()> {
        tracing::debug!(playlist = name, "playing playlist by name");
        if !self.is_running()? {
            self.launch(true, None)?;
        } else {
            self.bring_to_front()?;
        }

        self.search(name, false)?;
        self.wait(search_delay.unwrap_or(self.delays().playlist_search));

        self.select_first_search_result()?;
        self.wait(self.delays().playlist_open);

        if play_first_song {
            self.wait(self.delays().confirm);
            self.press(Key::Return)?;
        }
        Ok(())
    }

    /// Search for a query, select the first result, and start playback.
    fn search_and_play(&self, query: &str) -> ControllerResult<()> {
        self.search(query, true)?;
        self.select_first_search_result()?;
        self.wait(self.delays().confirm);
        self.play()
    }

    fn toggle_shuffle(&self) -> ControllerResult<()> {
        self.bring_to_front()?;
        self.keystroke('s', &[self.command_modifier()])
    }

    fn toggle_repeat(&self) -> ControllerResult<()> {
        self.bring_to_front()?;
        self.keystroke('r', &[self.command_modifier()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ControllerError;
    use std::cell::RefCell;

    /// Records every primitive call; provided trait methods run their real
    /// bodies, so their internal call sequences are observable.
    struct Recorder {
        calls: RefCell<Vec<String>>,
        running: bool,
        state: PlayerState,
        delays: Delays,
    }

    impl Recorder {
        fn new(running: bool, state: PlayerState) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                running,
                state,
                delays: Delays::zero(),
            }
        }

        fn log(&self, call: impl Into<String>) {
            self.calls.borrow_mut().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    fn modifier_tag(modifiers: &[Modifier]) -> String {
        modifiers
            .iter()
            .map(|m| format!("{m:?}"))
            .collect::<Vec<_>>()
            .join("+")
    }

    impl SpotifyController for Recorder {
        fn launch(&self, _wait: bool, _delay: Option<Duration>) -> ControllerResult<()> {
            self.log("launch");
            Ok(())
        }
        fn quit(&self) -> ControllerResult<()> {
            self.log("quit");
            Ok(())
        }
        fn is_running(&self) -> ControllerResult<bool> {
            Ok(self.running)
        }
        fn bring_to_front(&self) -> ControllerResult<()> {
            self.log("bring_to_front");
            Ok(())
        }
        fn play(&self) -> ControllerResult<()> {
            self.log("play");
            Ok(())
        }
        fn pause(&self) -> ControllerResult<()> {
            self.log("pause");
            Ok(())
        }
        fn play_pause(&self) -> ControllerResult<()> {
            self.log("play_pause");
            Ok(())
        }
        fn next_track(&self) -> ControllerResult<()> {
            self.log("next_track");
            Ok(())
        }
        fn previous_track(&self) -> ControllerResult<()> {
            self.log("previous_track");
            Ok(())
        }
        fn set_volume(&self, level: u8) -> ControllerResult<()> {
            self.log(format!("set_volume({level})"));
            Ok(())
        }
        fn volume(&self) -> ControllerResult<u8> {
            Ok(42)
        }
        fn player_state(&self) -> ControllerResult<PlayerState> {
            Ok(self.state)
        }
        fn player_position(&self) -> ControllerResult<f64> {
            Ok(0.0)
        }
        fn set_player_position(&self, _seconds: f64) -> ControllerResult<()> {
            Ok(())
        }
        fn current_track(&self) -> ControllerResult<Option<TrackInfo>> {
            Ok(None)
        }
        fn play_uri(&self, uri: &str) -> ControllerResult<()> {
            self.log(format!("play_uri({uri})"));
            Ok(())
        }
        fn is_shuffling(&self) -> ControllerResult<bool> {
            Ok(false)
        }
        fn is_repeating(&self) -> ControllerResult<bool> {
            Ok(false)
        }
        fn set_shuffling(&self, _enabled: bool) -> ControllerResult<()> {
            Ok(())
        }
        fn set_repeating(&self, _enabled: bool) -> ControllerResult<()> {
            Ok(())
        }
        fn keystroke(&self, key: char, modifiers: &[Modifier]) -> ControllerResult<()> {
            self.log(format!("keystroke({key}, {})", modifier_tag(modifiers)));
            Ok(())
        }
        fn key_code(&self, code: u16, modifiers: &[Modifier]) -> ControllerResult<()> {
            self.log(format!("key_code({code}, {})", modifier_tag(modifiers)));
            Ok(())
        }
        fn type_text(&self, text: &str, _delay_per_char: Duration) -> ControllerResult<()> {
            self.log(format!("type_text({text})"));
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

    /// Records at the procedure boundary: `search` and
    /// `select_first_search_result` are stubbed out so tests observe the
    /// call order of `play_playlist_by_name` itself.
    struct PlaylistProbe {
        inner: Recorder,
    }

    impl PlaylistProbe {
        fn new(running: bool) -> Self {
            Self {
                inner: Recorder::new(running, PlayerState::Stopped),
            }
        }
    }

    impl SpotifyController for PlaylistProbe {
        fn launch(&self, wait: bool, delay: Option<Duration>) -> ControllerResult<()> {
            self.inner.launch(wait, delay)
        }
        fn quit(&self) -> ControllerResult<()> {
            self.inner.quit()
        }
        fn is_running(&self) -> ControllerResult<bool> {
            self.inner.is_running()
        }
        fn bring_to_front(&self) -> ControllerResult<()> {
            self.inner.bring_to_front()
        }
        fn play(&self) -> ControllerResult<()> {
            self.inner.play()
        }
        fn pause(&self) -> ControllerResult<()> {
            self.inner.pause()
        }
        fn play_pause(&self) -> ControllerResult<()> {
            self.inner.play_pause()
        }
        fn next_track(&self) -> ControllerResult<()> {
            self.inner.next_track()
        }
        fn previous_track(&self) -> ControllerResult<()> {
            self.inner.previous_track()
        }
        fn set_volume(&self, level: u8) -> ControllerResult<()> {
            self.inner.set_volume(level)
        }
        fn volume(&self) -> ControllerResult<u8> {
            self.inner.volume()
        }
        fn player_state(&self) -> ControllerResult<PlayerState> {
            self.inner.player_state()
        }
        fn player_position(&self) -> ControllerResult<f64> {
            self.inner.player_position()
        }
        fn set_player_position(&self, seconds: f64) -> ControllerResult<()> {
            self.inner.set_player_position(seconds)
        }
        fn current_track(&self) -> ControllerResult<Option<TrackInfo>> {
            self.inner.current_track()
        }
        fn play_uri(&self, uri: &str) -> ControllerResult<()> {
            self.inner.play_uri(uri)
        }
        fn is_shuffling(&self) -> ControllerResult<bool> {
            self.inner.is_shuffling()
        }
        fn is_repeating(&self) -> ControllerResult<bool> {
            self.inner.is_repeating()
        }
        fn set_shuffling(&self, enabled: bool) -> ControllerResult<()> {
            self.inner.set_shuffling(enabled)
        }
        fn set_repeating(&self, enabled: bool) -> ControllerResult<()> {
            self.inner.set_repeating(enabled)
        }
        fn keystroke(&self, key: char, modifiers: &[Modifier]) -> ControllerResult<()> {
            self.inner.keystroke(key, modifiers)
        }
        fn key_code(&self, code: u16, modifiers: &[Modifier]) -> ControllerResult<()> {
            self.inner.key_code(code, modifiers)
        }
        fn type_text(&self, text: &str, delay_per_char: Duration) -> ControllerResult<()> {
            self.inner.type_text(text, delay_per_char)
        }
        fn code_for(&self, key: Key) -> u16 {
            self.inner.code_for(key)
        }
        fn command_modifier(&self) -> Modifier {
            self.inner.command_modifier()
        }
        fn delays(&self) -> &Delays {
            self.inner.delays()
        }
        fn set_delays(&mut self, delays: Delays) {
            self.inner.set_delays(delays)
        }

        fn search(&self, query: &str, wait_for_results: bool) -> ControllerResult<()> {
            self.inner
                .log(format!("search({query}, wait={wait_for_results})"));
            Ok(())
        }
        fn select_first_search_result(&self) -> ControllerResult<()> {
            self.inner.log("select_first_search_result");
            Ok(())
        }
    }

    #[test]
    fn is_playing_only_for_playing_state() {
        assert!(Recorder::new(true, PlayerState::Playing)
            .is_playing()
            .unwrap());
        assert!(!Recorder::new(true, PlayerState::Paused)
            .is_playing()
            .unwrap());
        assert!(!Recorder::new(true, PlayerState::Stopped)
            .is_playing()
            .unwrap());
    }

    #[test]
    fn open_search_brings_app_to_front_first() {
        let probe = Recorder::new(true, PlayerState::Paused);
        probe.open_search().expect("should open search");
        assert_eq!(
            probe.calls(),
            vec!["bring_to_front", "keystroke(k, Command)"]
        );
    }

    #[test]
    fn search_types_query_after_opening_overlay() {
        let probe = Recorder::new(true, PlayerState::Paused);
        probe.search("lo-fi beats", true).expect("should search");
        assert_eq!(
            probe.calls(),
            vec![
                "bring_to_front",
                "keystroke(k, Command)",
                "type_text(lo-fi beats)",
            ]
        );
    }

    #[test]
    fn select_first_search_result_arrows_down_then_confirms() {
        let probe = Recorder::new(true, PlayerState::Paused);
        probe
            .select_first_search_result()
            .expect("should select result");
        assert_eq!(probe.calls(), vec!["key_code(125, )", "key_code(36, )"]);
    }

    #[test]
    fn navigate_to_first_song_tabs_three_times() {
        let probe = Recorder::new(true, PlayerState::Paused);
        probe.navigate_to_first_song().expect("should navigate");
        assert_eq!(
            probe.calls(),
            vec![
                "key_code(48, )",
                "key_code(48, )",
                "key_code(48, )",
                "key_code(36, )",
            ]
        );
    }

    #[test]
    fn play_playlist_launches_when_not_running() {
        let probe = PlaylistProbe::new(false);
        probe
            .play_playlist_by_name("My Playlist", true, None)
            .expect("should play playlist");
        assert_eq!(
            probe.inner.calls(),
            vec![
                "launch",
                "search(My Playlist, wait=false)",
                "select_first_search_result",
                "key_code(36, )",
            ]
        );
        assert!(!probe.inner.calls().iter().any(|c| c == "bring_to_front"));
    }

    #[test]
    fn play_playlist_focuses_when_already_running() {
        let probe = PlaylistProbe::new(true);
        probe
            .play_playlist_by_name("My Playlist", true, None)
            .expect("should play playlist");
        let calls = probe.inner.calls();
        assert_eq!(calls[0], "bring_to_front");
        assert!(!calls.iter().any(|c| c == "launch"));
    }

    #[test]
    fn play_playlist_skips_confirm_press_when_asked() {
        let probe = PlaylistProbe::new(false);
        probe
            .play_playlist_by_name("My Playlist", false, None)
            .expect("should play playlist");
        assert_eq!(
            probe.inner.calls().last().map(String::as_str),
            Some("select_first_search_result")
        );
    }

    #[test]
    fn search_and_play_issues_play_command_last() {
        let probe = Recorder::new(true, PlayerState::Paused);
        probe.search_and_play("discover weekly").expect("should play");
        let calls = probe.calls();
        assert_eq!(calls.last().map(String::as_str), Some("play"));
    }

    #[test]
    fn toggle_shuffle_sends_command_chord() {
        let probe = Recorder::new(true, PlayerState::Playing);
        probe.toggle_shuffle().expect("should toggle");
        assert_eq!(
            probe.calls(),
            vec!["bring_to_front", "keystroke(s, Command)"]
        );
    }

    #[test]
    fn toggle_repeat_sends_command_chord() {
        let probe = Recorder::new(true, PlayerState::Playing);
        probe.toggle_repeat().expect("should toggle");
        assert_eq!(
            probe.calls(),
            vec!["bring_to_front", "keystroke(r, Command)"]
        );
    }

    #[test]
    fn set_ui_delay_touches_only_ui_field() {
        let mut probe = Recorder::new(true, PlayerState::Playing);
        probe.set_delays(Delays::default());
        probe.set_ui_delay(Duration::from_millis(50));
        assert_eq!(probe.delays().ui, Duration::from_millis(50));
        assert_eq!(probe.delays().launch, Delays::default().launch);
    }

    #[test]
    fn delays_default_matches_documented_values() {
        let delays = Delays::default();
        assert_eq!(delays.launch, Duration::from_secs(2));
        assert_eq!(delays.ui, Duration::from_millis(500));
        assert_eq!(delays.search_results, Duration::from_millis(1500));
        assert_eq!(delays.playlist_search, Duration::from_secs(2));
    }

    #[test]
    fn unsupported_errors_are_distinguishable_from_transport() {
        let unsupported = ControllerError::Unsupported {
            operation: "set_volume",
        };
        let transport = ControllerError::Automation {
            message: "window not found".into(),
        };
        assert!(matches!(
            unsupported,
            ControllerError::Unsupported { .. }
        ));
        assert!(matches!(transport, ControllerError::Automation { .. }));
    }
}
