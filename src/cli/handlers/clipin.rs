use crate::{
    cli::dispatcher::AppContext,
    core::template,
    system::{
        clipboard::{self, BridgeTarget, ClipboardSource, SystemClipboard},
        executor::Launcher,
    },
};
use anyhow::Result;
use std::io::{self, Write};

/// Entry point for `esplus clipboard-bridge` (alias `clipin`).
pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    let launcher = Launcher::new(&context.aliases);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    bridge(&args, &mut SystemClipboard, &launcher, &mut out)
}

/// Reads the clipboard and hands it to a template or to a command's stdin.
///
/// Nothing is read when there are no arguments, and nothing is started when the clipboard
/// cannot be read.
pub fn bridge<C, W>(args: &[String], clip: &mut C, launcher: &Launcher<'_>, out: &mut W) -> Result<()>
where
    C: ClipboardSource,
    W: Write,
{
    if args.is_empty() {
        return Ok(());
    }

    let text = clip.read_text()?;
    match clipboard::route(args, text) {
        BridgeTarget::Template(template_args) => {
            template::render_source(&template_args, out)?;
        }
        BridgeTarget::Command { args, input } => {
            out.flush()?;
            launcher.run_with_input(&args, &input)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aliases::AliasMap;
    use crate::system::clipboard::ClipboardError;

    struct FakeClipboard {
        text: Option<String>,
        reads: usize,
    }

    impl ClipboardSource for FakeClipboard {
        fn read_text(&mut self) -> Result<String, ClipboardError> {
            self.reads += 1;
            self.text
                .clone()
                .ok_or_else(|| ClipboardError::Access("no display".to_string()))
        }
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_arguments_does_not_touch_the_clipboard() {
        let aliases = AliasMap::new();
        let mut clip = FakeClipboard { text: None, reads: 0 };
        let mut out = Vec::new();
        bridge(&[], &mut clip, &Launcher::new(&aliases), &mut out).unwrap();
        assert_eq!(clip.reads, 0);
    }

    #[test]
    fn test_template_receives_clipboard_as_last_argument() {
        let aliases = AliasMap::new();
        let mut clip = FakeClipboard {
            text: Some("hello".to_string()),
            reads: 0,
        };
        let mut out = Vec::new();
        let args = strings(&["template", "Clipboard in uppercase: [[.|upper]]"]);
        bridge(&args, &mut clip, &Launcher::new(&aliases), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Clipboard in uppercase: HELLO");
    }

    #[test]
    fn test_template_with_extra_arguments_sees_a_list() {
        let aliases = AliasMap::new();
        let mut clip = FakeClipboard {
            text: Some("c".to_string()),
            reads: 0,
        };
        let mut out = Vec::new();
        let args = strings(&["template", "[[range .]]<[[.]]>[[end]]", "a", "b"]);
        bridge(&args, &mut clip, &Launcher::new(&aliases), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "<a><b><c>");
    }

    #[test]
    fn test_clipboard_failure_stops_the_bridge() {
        let aliases = AliasMap::new();
        let mut clip = FakeClipboard { text: None, reads: 0 };
        let mut out = Vec::new();
        let args = strings(&["template", "[[.]]"]);
        let err = bridge(&args, &mut clip, &Launcher::new(&aliases), &mut out).unwrap_err();
        assert!(err.downcast_ref::<ClipboardError>().is_some());
        assert!(out.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_receives_clipboard_on_stdin() {
        let aliases: AliasMap = [("check", "sh")].into_iter().collect();
        let mut clip = FakeClipboard {
            text: Some("from clipboard".to_string()),
            reads: 0,
        };
        let mut out = Vec::new();
        let args = strings(&["check", "-c", "test \"$(cat)\" = 'from clipboard'"]);
        bridge(&args, &mut clip, &Launcher::new(&aliases), &mut out).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_is_an_error() {
        let aliases = AliasMap::new();
        let mut clip = FakeClipboard {
            text: Some("x".to_string()),
            reads: 0,
        };
        let mut out = Vec::new();
        let args = strings(&["false"]);
        assert!(bridge(&args, &mut clip, &Launcher::new(&aliases), &mut out).is_err());
    }
}
