//! Plumbing for the macOS scripting channel.
//!
//! The real runner shells out to `osascript`; tests substitute their own
//! [`ScriptRunner`] to observe scripts and inject canned replies.

use std::process::Command;

use crate::controller::Modifier;
use crate::error::{ControllerError, ControllerResult};

/// Executes an AppleScript source string and returns its trimmed stdout.
pub trait ScriptRunner {
    fn run(&self, script: &str) -> ControllerResult<String>;
}

/// The real scripting channel: `osascript -e <script>`.
pub struct Osascript;

impl ScriptRunner for Osascript {
    fn run(&self, script: &str) -> ControllerResult<String> {
        let output = Command::new("osascript")
            .arg("-e")
            .arg(script)
            .output()
            .map_err(|source| ControllerError::Script {
                message: format!("failed to invoke osascript: {source}"),
            })?;

        if !output.status.success() {
            return Err(ControllerError::Script {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Escape text for embedding in an AppleScript string literal.
pub fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn modifier_name(modifier: Modifier) -> &'static str {
    match modifier {
        Modifier::Command => "command",
        Modifier::Control => "control",
        Modifier::Option => "option",
        Modifier::Shift => "shift",
    }
}

/// System Events `using {...}` clause for a modifier set; empty when there
/// are no modifiers.
pub fn modifier_clause(modifiers: &[Modifier]) -> String {
    if modifiers.is_empty() {
        return String::new();
    }
    let downs = modifiers
        .iter()
        .map(|m| format!("{} down", modifier_name(*m)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(" using {{{downs}}}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_handles_quotes_and_backslashes() {
        assert_eq!(escape(r#"say "hi" \ bye"#), r#"say \"hi\" \\ bye"#);
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn modifier_clause_is_empty_without_modifiers() {
        assert_eq!(modifier_clause(&[]), "");
    }

    #[test]
    fn modifier_clause_joins_multiple_modifiers() {
        assert_eq!(
            modifier_clause(&[Modifier::Command, Modifier::Shift]),
            " using {command down, shift down}"
        );
    }
}
