use anyhow::Result;
use thiserror::Error;

use crate::{
    cli::handlers,
    core::{
        aliases::AliasMap,
        config_loader::{self, ConfigError},
    },
};

/// State shared by every handler, built once per invocation.
#[derive(Debug, Default)]
pub struct AppContext {
    /// Short program names mapped to full paths, from `config.toml`.
    pub aliases: AliasMap,
}

/// Errors raised before a handler runs.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The first argument names no sub-command or alias of one.
    #[error("{}", t!("dispatch.error.unknown_command").replace("{name}", .0))]
    UnknownCommand(String),
}

/// Defines a sub-command, its alternative names and its handler.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    /// Whether the alias file has to be loaded before the handler runs.
    needs_config: bool,
    handler: fn(Vec<String>, &AppContext) -> Result<()>,
}

/// The single source of truth for all sub-commands.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "template",
        aliases: &[],
        needs_config: true,
        handler: handlers::template::handle,
    },
    CommandDefinition {
        name: "wait",
        aliases: &[],
        needs_config: true,
        handler: handlers::wait::handle,
    },
    CommandDefinition {
        name: "run",
        aliases: &[],
        needs_config: true,
        handler: handlers::run::handle,
    },
    CommandDefinition {
        name: "clipboard-bridge",
        aliases: &["clipin"],
        needs_config: true,
        handler: handlers::clipin::handle,
    },
    CommandDefinition {
        name: "help",
        aliases: &["-h", "--help"],
        needs_config: false,
        handler: handlers::help::handle,
    },
    CommandDefinition {
        name: "version",
        aliases: &["-V", "--version"],
        needs_config: false,
        handler: handlers::help::handle_version,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Routes the raw argument list to its handler, loading the configuration from disk.
pub fn dispatch(all_args: Vec<String>) -> Result<()> {
    dispatch_with(all_args, config_loader::load_aliases)
}

/// Routes the raw argument list, using `load_config` to obtain the aliases.
///
/// Help, version and unknown commands are settled before the configuration is touched, so a
/// broken `config.toml` never hides the help text.
pub fn dispatch_with<F>(all_args: Vec<String>, load_config: F) -> Result<()>
where
    F: FnOnce() -> Result<AliasMap, ConfigError>,
{
    log::debug!("Dispatching args: {:?}", all_args);

    let mut args = all_args.into_iter();
    let Some(name) = args.next() else {
        return handlers::help::handle(Vec::new(), &AppContext::default());
    };

    let command = find_command(&name).ok_or_else(|| DispatchError::UnknownCommand(name.clone()))?;

    let context = if command.needs_config {
        AppContext {
            aliases: load_config()?,
        }
    } else {
        AppContext::default()
    };

    log::debug!("Running '{}'", command.name);
    (command.handler)(args.collect(), &context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn broken_config() -> Result<AliasMap, ConfigError> {
        Err(ConfigError::Read {
            path: PathBuf::from("/nowhere/config.toml"),
            source: std::io::Error::other("unreadable"),
        })
    }

    #[test]
    fn test_registry_names_and_aliases() {
        assert_eq!(find_command("clipin").map(|c| c.name), Some("clipboard-bridge"));
        assert_eq!(find_command("--help").map(|c| c.name), Some("help"));
        assert_eq!(find_command("-V").map(|c| c.name), Some("version"));
        assert!(find_command("Template").is_none());
    }

    #[test]
    fn test_unknown_command_names_the_token() {
        let err = dispatch_with(strings(&["frobnicate"]), || Ok(AliasMap::new())).unwrap_err();
        let dispatch_err = err.downcast_ref::<DispatchError>().unwrap();
        assert!(matches!(dispatch_err, DispatchError::UnknownCommand(name) if name == "frobnicate"));
        assert!(err.to_string().contains("'frobnicate'"));
    }

    #[test]
    fn test_help_does_not_load_the_config() {
        dispatch_with(Vec::new(), broken_config).unwrap();
        dispatch_with(strings(&["help"]), broken_config).unwrap();
        dispatch_with(strings(&["--version"]), broken_config).unwrap();
    }

    #[test]
    fn test_unknown_command_is_reported_before_config_errors() {
        let err = dispatch_with(strings(&["nope"]), broken_config).unwrap_err();
        assert!(err.downcast_ref::<DispatchError>().is_some());
    }

    #[test]
    fn test_config_errors_stop_real_commands() {
        let err = dispatch_with(strings(&["run"]), broken_config).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_commands_without_arguments_succeed() {
        for name in ["template", "wait", "run", "clipin"] {
            dispatch_with(strings(&[name]), || Ok(AliasMap::new())).unwrap();
        }
    }
}
