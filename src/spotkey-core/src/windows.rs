//! Windows backend: media-key events and keyboard input simulation.
//!
//! Spotify for Windows exposes no scripting interface, so playback control
//! degrades to OS media keys and player state is inferred from the window
//! title (see [`crate::window_title`]). Volume, seek position,
//! shuffle/repeat state, and direct-URI playback are not observable or
//! addressable at all on this channel; those operations fail with
//! [`ControllerError::Unsupported`] rather than approximating.

use std::process::Command;
use std::time::Duration;

use windows::core::PWSTR;
use windows::Win32::Foundation::{CloseHandle, BOOL, HWND, LPARAM, TRUE, WPARAM};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
    PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, VkKeyScanW, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, VIRTUAL_KEY, VK_CONTROL, VK_MEDIA_NEXT_TRACK,
    VK_MEDIA_PLAY_PAUSE, VK_MEDIA_PREV_TRACK, VK_MENU, VK_SHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId,
    IsWindowVisible, PostMessageW, SetForegroundWindow, ShowWindow, SW_RESTORE, WM_CLOSE,
};

use crate::controller::{Delays, Key, Modifier, SpotifyController};
use crate::error::{ControllerError, ControllerResult};
use crate::models::{PlayerState, TrackInfo};
use crate::window_title::{state_from_title, track_from_title};

const SPOTIFY_IMAGE_NAME: &str = "spotify.exe";

/// Controller for the Windows Spotify client.
pub struct WindowsController {
    delays: Delays,
    debug: bool,
}

impl WindowsController {
    pub fn new(debug: bool) -> Self {
        Self {
            delays: Delays::default(),
            debug,
        }
    }

    fn unsupported<T>(operation: &'static str) -> ControllerResult<T> {
        Err(ControllerError::Unsupported { operation })
    }

    fn title(&self) -> ControllerResult<String> {
        let hwnd = find_spotify_window()?;
        Ok(window_title(hwnd))
    }

    fn send_media_key(&self, vk: VIRTUAL_KEY) -> ControllerResult<()> {
        if self.debug {
            tracing::debug!(vk = vk.0, "sending media key");
        }
        send_inputs(&[
            key_input(vk, KEYBD_EVENT_FLAGS(0)),
            key_input(vk, KEYEVENTF_KEYUP),
        ])
    }

    fn modifier_keys(modifiers: &[Modifier]) -> Vec<VIRTUAL_KEY> {
        modifiers
            .iter()
            .map(|m| match m {
                // Ctrl doubles as the primary command modifier here.
                Modifier::Command | Modifier::Control => VK_CONTROL,
                Modifier::Option => VK_MENU,
                Modifier::Shift => VK_SHIFT,
            })
            .collect()
    }

    fn send_chord(&self, vk: VIRTUAL_KEY, modifiers: &[Modifier]) -> ControllerResult<()> {
        let held = Self::modifier_keys(modifiers);
        let mut inputs = Vec::with_capacity(held.len() * 2 + 2);
        for modifier in &held {
            inputs.push(key_input(*modifier, KEYBD_EVENT_FLAGS(0)));
        }
        inputs.push(key_input(vk, KEYBD_EVENT_FLAGS(0)));
        inputs.push(key_input(vk, KEYEVENTF_KEYUP));
        for modifier in held.iter().rev() {
            inputs.push(key_input(*modifier, KEYEVENTF_KEYUP));
        }
        send_inputs(&inputs)
    }
}

fn key_input(vk: VIRTUAL_KEY, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn unicode_input(unit: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(0),
                wScan: unit,
                dwFlags: KEYEVENTF_UNICODE | flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn send_inputs(inputs: &[INPUT]) -> ControllerResult<()> {
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        return Err(ControllerError::Automation {
            message: "keyboard input injection was blocked".into(),
        });
    }
    Ok(())
}

fn window_title(hwnd: HWND) -> String {
    let mut buffer = [0u16; 512];
    let len = unsafe { GetWindowTextW(hwnd, &mut buffer) };
    String::from_utf16_lossy(&buffer[..len.max(0) as usize])
}

fn process_image_name(hwnd: HWND) -> Option<String> {
    let mut pid = 0u32;
    unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };
    if pid == 0 {
        return None;
    }
    let handle = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) }.ok()?;
    let mut buffer = [0u16; 512];
    let mut len = buffer.len() as u32;
    let queried = unsafe {
        QueryFullProcessImageNameW(
            handle,
            PROCESS_NAME_WIN32,
            PWSTR(buffer.as_mut_ptr()),
            &mut len,
        )
    };
    unsafe {
        let _ = CloseHandle(handle);
    }
    queried.ok()?;
    let path = String::from_utf16_lossy(&buffer[..len as usize]);
    path.rsplit(['\\', '/'])
        .next()
        .map(|name| name.to_ascii_lowercase())
}

unsafe extern "system" fn collect_spotify_windows(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let found = &mut *(lparam.0 as *mut Vec<HWND>);
    if IsWindowVisible(hwnd).as_bool()
        && GetWindowTextLengthW(hwnd) > 0
        && process_image_name(hwnd).as_deref() == Some(SPOTIFY_IMAGE_NAME)
    {
        found.push(hwnd);
    }
    TRUE
}

fn find_spotify_window() -> ControllerResult<HWND> {
    let mut found: Vec<HWND> = Vec::new();
    unsafe {
        let _ = EnumWindows(
            Some(collect_spotify_windows),
            LPARAM(&mut found as *mut Vec<HWND> as isize),
        );
    }
    found
        .into_iter()
        .next()
        .ok_or_else(|| ControllerError::Automation {
            message: "could not locate the Spotify window".into(),
        })
}

impl SpotifyController for WindowsController {
    fn launch(&self, wait: bool, delay: Option<Duration>) -> ControllerResult<()> {
        // The spotify: URL handler starts or foregrounds the app.
        Command::new("cmd")
            .args(["/C", "start", "", "spotify:"])
            .spawn()
            .map_err(|source| ControllerError::Automation {
                message: format!("failed to start Spotify: {source}"),
            })?;
        if wait {
            self.wait(delay.unwrap_or(self.delays.launch));
        }
        Ok(())
    }

    fn quit(&self) -> ControllerResult<()> {
        let hwnd = find_spotify_window()?;
        unsafe { PostMessageW(hwnd, WM_CLOSE, WPARAM(0), LPARAM(0)) }.map_err(|source| {
            ControllerError::Automation {
                message: format!("failed to close the Spotify window: {source}"),
            }
        })
    }

    fn is_running(&self) -> ControllerResult<bool> {
        Ok(find_spotify_window().is_ok())
    }

    fn bring_to_front(&self) -> ControllerResult<()> {
        let hwnd = find_spotify_window()?;
        unsafe {
            let _ = ShowWindow(hwnd, SW_RESTORE);
            let _ = SetForegroundWindow(hwnd);
        }
        self.wait(self.delays.ui);
        Ok(())
    }

    fn play(&self) -> ControllerResult<()> {
        // The only playback primitive is a toggle; skip it when already
        // playing.
        if !self.is_playing()? {
            self.send_media_key(VK_MEDIA_PLAY_PAUSE)?;
        }
        Ok(())
    }

    fn pause(&self) -> ControllerResult<()> {
        if self.is_playing()? {
            self.send_media_key(VK_MEDIA_PLAY_PAUSE)?;
        }
        Ok(())
    }

    fn play_pause(&self) -> ControllerResult<()> {
        self.send_media_key(VK_MEDIA_PLAY_PAUSE)
    }

    fn next_track(&self) -> ControllerResult<()> {
        self.send_media_key(VK_MEDIA_NEXT_TRACK)
    }

    fn previous_track(&self) -> ControllerResult<()> {
        self.send_media_key(VK_MEDIA_PREV_TRACK)
    }

    fn set_volume(&self, _level: u8) -> ControllerResult<()> {
        Self::unsupported("set_volume")
    }

    fn volume(&self) -> ControllerResult<u8> {
        Self::unsupported("volume")
    }

    fn player_state(&self) -> ControllerResult<PlayerState> {
        Ok(state_from_title(&self.title()?))
    }

    fn player_position(&self) -> ControllerResult<f64> {
        Self::unsupported("player_position")
    }

    fn set_player_position(&self, _seconds: f64) -> ControllerResult<()> {
        Self::unsupported("set_player_position")
    }

    fn current_track(&self) -> ControllerResult<Option<TrackInfo>> {
        Ok(track_from_title(&self.title()?))
    }

    fn play_uri(&self, _uri: &str) -> ControllerResult<()> {
        Self::unsupported("play_uri")
    }

    fn is_shuffling(&self) -> ControllerResult<bool> {
        Self::unsupported("is_shuffling")
    }

    fn is_repeating(&self) -> ControllerResult<bool> {
        Self::unsupported("is_repeating")
    }

    fn set_shuffling(&self, _enabled: bool) -> ControllerResult<()> {
        Self::unsupported("set_shuffling")
    }

    fn set_repeating(&self, _enabled: bool) -> ControllerResult<()> {
        Self::unsupported("set_repeating")
    }

    fn keystroke(&self, key: char, modifiers: &[Modifier]) -> ControllerResult<()> {
        let scan = unsafe { VkKeyScanW(key as u16) };
        if scan == -1 {
            return Err(ControllerError::Automation {
                message: format!("no virtual key mapping for character '{key}'"),
            });
        }
        let vk = VIRTUAL_KEY((scan & 0xff) as u16);
        let mut chord_modifiers = modifiers.to_vec();
        if scan >> 8 & 1 != 0 && !chord_modifiers.contains(&Modifier::Shift) {
            chord_modifiers.push(Modifier::Shift);
        }
        self.send_chord(vk, &chord_modifiers)?;
        self.wait(self.delays.keystroke);
        Ok(())
    }

    fn key_code(&self, code: u16, modifiers: &[Modifier]) -> ControllerResult<()> {
        self.send_chord(VIRTUAL_KEY(code), modifiers)?;
        self.wait(self.delays.keystroke);
        Ok(())
    }

    fn type_text(&self, text: &str, delay_per_char: Duration) -> ControllerResult<()> {
        for unit in text.encode_utf16() {
            send_inputs(&[
                unicode_input(unit, KEYBD_EVENT_FLAGS(0)),
                unicode_input(unit, KEYEVENTF_KEYUP),
            ])?;
            self.wait(delay_per_char);
        }
        self.wait(self.delays.ui);
        Ok(())
    }

    fn code_for(&self, key: Key) -> u16 {
        match key {
            Key::Return => 0x0d,
            Key::Escape => 0x1b,
            Key::Tab => 0x09,
            Key::DownArrow => 0x28,
            Key::UpArrow => 0x26,
            Key::Space => 0x20,
        }
    }

    fn command_modifier(&self) -> Modifier {
        Modifier::Control
    }

    fn delays(&self) -> &Delays {
        &self.delays
    }

    fn set_delays(&mut self, delays: Delays) {
        self.delays = delays;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_key_codes_match_win32_constants() {
        let controller = WindowsController::new(false);
        assert_eq!(controller.code_for(Key::Return), 0x0d);
        assert_eq!(controller.code_for(Key::Tab), 0x09);
        assert_eq!(controller.code_for(Key::DownArrow), 0x28);
        assert_eq!(controller.command_modifier(), Modifier::Control);
    }

    #[test]
    fn command_modifier_lowers_to_ctrl() {
        assert_eq!(
            WindowsController::modifier_keys(&[Modifier::Command]),
            vec![VK_CONTROL]
        );
    }

    #[test]
    fn unsupported_operations_fail_immediately() {
        let controller = WindowsController::new(false);
        assert!(matches!(
            controller.set_volume(50),
            Err(ControllerError::Unsupported { .. })
        ));
        assert!(matches!(
            controller.volume(),
            Err(ControllerError::Unsupported { .. })
        ));
        assert!(matches!(
            controller.set_player_position(30.0),
            Err(ControllerError::Unsupported { .. })
        ));
        assert!(matches!(
            controller.play_uri("spotify:track:abc"),
            Err(ControllerError::Unsupported { .. })
        ));
        assert!(matches!(
            controller.is_shuffling(),
            Err(ControllerError::Unsupported { .. })
        ));
    }
}
