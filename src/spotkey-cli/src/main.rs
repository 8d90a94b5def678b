use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use spotkey_core::{
    detect_platform, init_logging, AppDirs, Config, ControllerError, ControllerResult, LogLevel,
    PlayerState, Spotify,
};

#[derive(Debug, Parser)]
#[command(
    name = "spotkey",
    version,
    about = "Control the Spotify desktop app from the terminal"
)]
struct Cli {
    /// Enable debug output
    #[arg(short = 'd', long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Find a playlist by name and start playing it
    PlayPlaylist {
        /// Name of the playlist (use "playlist:name" to search playlists only)
        name: String,
        /// Seconds to wait for search results to load
        #[arg(long)]
        search_delay: Option<f64>,
        /// Open the playlist without starting the first song
        #[arg(long)]
        no_play_first: bool,
    },
    /// Search for songs, artists, or playlists
    Search {
        /// Search query
        query: String,
    },
    /// Start/resume playback
    Play,
    /// Pause playback
    Pause,
    /// Toggle between play and pause
    PlayPause,
    /// Skip to the next track
    Next,
    /// Go back to the previous track
    Prev,
    /// Show current playback status
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Get or set the volume (0-100). Omit the level to show the current volume
    Volume { level: Option<u8> },
    /// Get or set the playback position in seconds
    Position { seconds: Option<f64> },
    /// Get or set shuffle mode
    Shuffle { state: Option<Toggle> },
    /// Get or set repeat mode
    Repeat { state: Option<Toggle> },
    /// Play a specific item by its spotify:type:id URI
    PlayUri { uri: String },
    /// Launch the Spotify application
    Launch,
    /// Quit the Spotify application
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn enabled(self) -> bool {
        matches!(self, Toggle::On)
    }

    fn label(enabled: bool) -> &'static str {
        if enabled {
            "on"
        } else {
            "off"
        }
    }
}

const VERIFY_TIMEOUT: Duration = Duration::from_secs(3);
const VERIFY_POLL: Duration = Duration::from_millis(300);

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let dirs = AppDirs::discover()?;
    let mut config = Config::load_or_default(&dirs)?;
    if cli.debug {
        config.logging.level = LogLevel::Debug;
    }
    let _logging = init_logging(&config.logging, &dirs)?;

    tracing::debug!(platform = %detect_platform(), "platform detected");

    let mut spotify = Spotify::new(cli.debug)?;
    spotify.set_delays(config.delays.to_delays());

    match command {
        Command::PlayPlaylist {
            name,
            search_delay,
            no_play_first,
        } => cmd_play_playlist(&spotify, &name, search_delay, !no_play_first),
        Command::Search { query } => cmd_search(&spotify, &query),
        Command::Play => cmd_play(&spotify),
        Command::Pause => cmd_pause(&spotify),
        Command::PlayPause => cmd_play_pause(&spotify),
        Command::Next => cmd_next(&spotify),
        Command::Prev => cmd_prev(&spotify),
        Command::Status { json } => cmd_status(&spotify, json),
        Command::Volume { level } => cmd_volume(&spotify, level),
        Command::Position { seconds } => cmd_position(&spotify, seconds),
        Command::Shuffle { state } => cmd_shuffle(&spotify, state),
        Command::Repeat { state } => cmd_repeat(&spotify, state),
        Command::PlayUri { uri } => cmd_play_uri(&spotify, &uri),
        Command::Launch => cmd_launch(&spotify),
        Command::Quit => cmd_quit(&spotify),
    }
}

/// Precondition check for commands that act on a running player.
fn require_running(spotify: &Spotify) -> Result<()> {
    if spotify.is_running()? {
        Ok(())
    } else {
        Err(ControllerError::NotRunning.into())
    }
}

/// Bounded retry-poll for "did playback actually start".
///
/// The core issues commands fire-and-forget, so verification is
/// best-effort and lives out here in the command layer.
fn verify_playback(spotify: &Spotify, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if spotify.is_playing().unwrap_or(false) {
            return true;
        }
        thread::sleep(VERIFY_POLL);
    }
    false
}

/// Treat "not supported on this platform" as an absent value; anything
/// else propagates.
fn optional<T>(result: ControllerResult<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ControllerError::Unsupported { .. }) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn print_status(spotify: &Spotify) -> Result<()> {
    let state = spotify.player_state()?;
    println!("Status: {state}");

    if state == PlayerState::Stopped {
        return Ok(());
    }

    if let Some(track) = spotify.current_track()? {
        println!("Track:  {}", track.name);
        println!("Artist: {}", track.artist);
        println!("Album:  {}", track.album);
        if let Some(position) = optional(spotify.player_position())? {
            println!("Time:   {position:.0}s / {:.0}s", track.duration_seconds());
        }
        if let Some(url) = track.web_url() {
            println!("URL:    {url}");
        }
    }
    Ok(())
}

fn print_status_json(spotify: &Spotify) -> Result<()> {
    let state = spotify.player_state()?;
    let track = spotify.current_track()?;
    let status = serde_json::json!({
        "state": state,
        "track": track,
        "web_url": track.as_ref().and_then(|t| t.web_url()),
        "position_seconds": optional(spotify.player_position())?,
        "volume": optional(spotify.volume())?,
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn cmd_play_playlist(
    spotify: &Spotify,
    name: &str,
    search_delay: Option<f64>,
    play_first: bool,
) -> Result<ExitCode> {
    println!("Launching Spotify...");
    if !spotify.is_running()? {
        spotify.launch(true, None)?;
    } else {
        spotify.bring_to_front()?;
    }
    println!("Spotify is ready.");

    let search_delay = search_delay
        .map(|seconds| {
            Duration::try_from_secs_f64(seconds)
                .map_err(|_| anyhow::anyhow!("invalid search delay: {seconds}"))
        })
        .transpose()?;

    println!("Searching for playlist: {name}");
    spotify.play_playlist_by_name(name, play_first, search_delay)?;

    println!("Waiting for playback to start...");
    thread::sleep(Duration::from_secs(2));

    if verify_playback(spotify, VERIFY_TIMEOUT) {
        println!("Playback started successfully!");
        println!();
        print_status(spotify)?;
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Warning: could not verify that playback started.");
        println!("The playlist may still be loading. Check Spotify manually.");
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_search(spotify: &Spotify, query: &str) -> Result<ExitCode> {
    if !spotify.is_running()? {
        println!("Launching Spotify...");
        spotify.launch(true, None)?;
    } else {
        spotify.bring_to_front()?;
    }

    println!("Searching for: {query}");
    spotify.search(query, true)?;
    println!("Search results should now be visible in Spotify.");
    Ok(ExitCode::SUCCESS)
}

fn cmd_play(spotify: &Spotify) -> Result<ExitCode> {
    require_running(spotify)?;
    spotify.play()?;
    println!("Playback started.");
    thread::sleep(Duration::from_millis(500));
    print_status(spotify)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_pause(spotify: &Spotify) -> Result<ExitCode> {
    require_running(spotify)?;
    spotify.pause()?;
    println!("Playback paused.");
    Ok(ExitCode::SUCCESS)
}

fn cmd_play_pause(spotify: &Spotify) -> Result<ExitCode> {
    require_running(spotify)?;
    spotify.play_pause()?;
    thread::sleep(Duration::from_millis(500));
    print_status(spotify)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_next(spotify: &Spotify) -> Result<ExitCode> {
    require_running(spotify)?;
    spotify.next_track()?;
    println!("Skipped to next track.");
    thread::sleep(Duration::from_millis(500));
    print_status(spotify)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_prev(spotify: &Spotify) -> Result<ExitCode> {
    require_running(spotify)?;
    spotify.previous_track()?;
    println!("Went to previous track.");
    thread::sleep(Duration::from_millis(500));
    print_status(spotify)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_status(spotify: &Spotify, json: bool) -> Result<ExitCode> {
    if !spotify.is_running()? {
        println!("Spotify is not running.");
        return Ok(ExitCode::SUCCESS);
    }

    if json {
        print_status_json(spotify)?;
    } else {
        print_status(spotify)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_volume(spotify: &Spotify, level: Option<u8>) -> Result<ExitCode> {
    require_running(spotify)?;
    match level {
        None => println!("Current volume: {}", spotify.volume()?),
        Some(level) => {
            spotify.set_volume(level)?;
            println!("Volume set to: {level}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_position(spotify: &Spotify, seconds: Option<f64>) -> Result<ExitCode> {
    require_running(spotify)?;
    match seconds {
        None => println!("Position: {:.1}s", spotify.player_position()?),
        Some(seconds) => {
            spotify.set_player_position(seconds)?;
            println!("Position set to: {seconds:.1}s");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_shuffle(spotify: &Spotify, state: Option<Toggle>) -> Result<ExitCode> {
    require_running(spotify)?;
    match state {
        None => println!("Shuffle: {}", Toggle::label(spotify.is_shuffling()?)),
        Some(state) => {
            spotify.set_shuffling(state.enabled())?;
            println!("Shuffle {}", Toggle::label(state.enabled()));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_repeat(spotify: &Spotify, state: Option<Toggle>) -> Result<ExitCode> {
    require_running(spotify)?;
    match state {
        None => println!("Repeat: {}", Toggle::label(spotify.is_repeating()?)),
        Some(state) => {
            spotify.set_repeating(state.enabled())?;
            println!("Repeat {}", Toggle::label(state.enabled()));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_play_uri(spotify: &Spotify, uri: &str) -> Result<ExitCode> {
    require_running(spotify)?;
    spotify.play_uri(uri)?;
    println!("Playing: {uri}");
    Ok(ExitCode::SUCCESS)
}

fn cmd_launch(spotify: &Spotify) -> Result<ExitCode> {
    spotify.launch(true, None)?;
    println!("Spotify launched.");
    Ok(ExitCode::SUCCESS)
}

fn cmd_quit(spotify: &Spotify) -> Result<ExitCode> {
    require_running(spotify)?;
    spotify.quit()?;
    println!("Spotify quit.");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_playlist_parses_name_and_flags() {
        let cli = Cli::try_parse_from([
            "spotkey",
            "play-playlist",
            "Morning Mix",
            "--search-delay",
            "3.5",
            "--no-play-first",
        ])
        .expect("should parse");
        match cli.command {
            Some(Command::PlayPlaylist {
                name,
                search_delay,
                no_play_first,
            }) => {
                assert_eq!(name, "Morning Mix");
                assert_eq!(search_delay, Some(3.5));
                assert!(no_play_first);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn volume_level_is_optional() {
        let cli = Cli::try_parse_from(["spotkey", "volume"]).expect("should parse");
        assert!(matches!(cli.command, Some(Command::Volume { level: None })));

        let cli = Cli::try_parse_from(["spotkey", "volume", "80"]).expect("should parse");
        assert!(matches!(
            cli.command,
            Some(Command::Volume { level: Some(80) })
        ));
    }

    #[test]
    fn volume_rejects_non_numeric_level() {
        assert!(Cli::try_parse_from(["spotkey", "volume", "loud"]).is_err());
    }

    #[test]
    fn shuffle_accepts_on_and_off() {
        let cli = Cli::try_parse_from(["spotkey", "shuffle", "on"]).expect("should parse");
        match cli.command {
            Some(Command::Shuffle { state: Some(state) }) => assert!(state.enabled()),
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["spotkey", "shuffle", "maybe"]).is_err());
    }

    #[test]
    fn debug_flag_is_global() {
        let cli = Cli::try_parse_from(["spotkey", "status", "--debug"]).expect("should parse");
        assert!(cli.debug);
        let cli = Cli::try_parse_from(["spotkey", "-d", "play"]).expect("should parse");
        assert!(cli.debug);
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["spotkey"]).expect("should parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn toggle_labels_match_values() {
        assert_eq!(Toggle::label(true), "on");
        assert_eq!(Toggle::label(false), "off");
        assert!(Toggle::On.enabled());
        assert!(!Toggle::Off.enabled());
    }
}
