// src/system/clipboard.rs

use crate::constants::TEMPLATE_COMMAND;
use thiserror::Error;

/// Failure to read the clipboard.
#[derive(Error, Debug)]
pub enum ClipboardError {
    /// The clipboard is unavailable or holds no text; carries the backend's message.
    #[error("Could not read the clipboard: {0}")]
    Access(String),
}

/// Something that can hand out the current clipboard text.
pub trait ClipboardSource {
    /// Returns the clipboard content as text.
    fn read_text(&mut self) -> Result<String, ClipboardError>;
}

/// The desktop clipboard, via `arboard`.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSource for SystemClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Access(e.to_string()))?;
        let text = clipboard
            .get_text()
            .map_err(|e| ClipboardError::Access(e.to_string()))?;
        log::debug!("Read {} bytes from the clipboard", text.len());
        Ok(text)
    }
}

/// Where the clipboard bridge sends the clipboard text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeTarget {
    /// Render a template; the clipboard text is already appended as the last argument.
    Template(Vec<String>),
    /// Run a command with the clipboard text on its stdin.
    Command {
        /// Program and arguments.
        args: Vec<String>,
        /// The text to feed on stdin.
        input: String,
    },
}

/// Decides what to do with `clipboard` for the bridge arguments `args`.
///
/// `template ...` renders a template with the clipboard as its last argument; anything else
/// is a command that reads the clipboard from stdin.
pub fn route(args: &[String], clipboard: String) -> BridgeTarget {
    match args.split_first() {
        Some((first, rest)) if first == TEMPLATE_COMMAND => {
            let mut template_args = rest.to_vec();
            template_args.push(clipboard);
            BridgeTarget::Template(template_args)
        }
        _ => BridgeTarget::Command {
            args: args.to_vec(),
            input: clipboard,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_template_keyword_appends_clipboard() {
        let target = route(&strings(&["template", "Up: [[.|upper]]"]), "hello".to_string());
        assert_eq!(
            target,
            BridgeTarget::Template(strings(&["Up: [[.|upper]]", "hello"]))
        );
    }

    #[test]
    fn test_other_commands_receive_clipboard_on_stdin() {
        let target = route(&strings(&["html2md", "-x"]), "<b>hi</b>".to_string());
        assert_eq!(
            target,
            BridgeTarget::Command {
                args: strings(&["html2md", "-x"]),
                input: "<b>hi</b>".to_string(),
            }
        );
    }

    #[test]
    fn test_template_keyword_is_only_recognised_first() {
        let target = route(&strings(&["cat", "template"]), "x".to_string());
        assert!(matches!(target, BridgeTarget::Command { .. }));
    }
}
