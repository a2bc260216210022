// src/constants.rs

/// The name of the configuration directory inside `~/.config`.
pub const CONFIG_DIR_NAME: &str = "esplus";

/// The name of the configuration file holding the alias mapping.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Environment variable that overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "ESPLUS_CONFIG";

/// Delimiters used when the template comes from a file.
pub const FILE_DELIMITERS: (&str, &str) = ("{{", "}}");

/// Delimiters used for inline templates, chosen so they never clash with espanso's own `{{ }}`.
pub const INLINE_DELIMITERS: (&str, &str) = ("[[", "]]");

/// The internal sub-command `run` re-invokes to perform a delayed start.
pub const WAIT_COMMAND: &str = "wait";

/// The first argument that makes the clipboard bridge delegate to the template engine.
pub const TEMPLATE_COMMAND: &str = "template";
