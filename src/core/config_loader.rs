//! # Config Loader
//!
//! Reads `config.toml` into an [`AliasMap`]. A missing file (or a missing home directory) is
//! not an error: esplus works without configuration. A file that exists but cannot be read or
//! parsed is fatal, and is reported before any command runs.

use crate::core::aliases::AliasMap;
use crate::core::paths;
use crate::models::ConfigFile;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A config file that exists but is unusable.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("could not read config file '{}': {source}", path.display())]
    Read {
        /// The config file.
        path: PathBuf,
        /// The read error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or does not match the expected layout.
    #[error("could not parse config file '{}': {source}", path.display())]
    Parse {
        /// The config file.
        path: PathBuf,
        /// The TOML error, with its line and column.
        #[source]
        source: toml::de::Error,
    },
}

/// Loads the aliases from the default location (see [`paths::get_config_path`]).
pub fn load_aliases() -> Result<AliasMap, ConfigError> {
    match paths::get_config_path() {
        Some(path) => load_aliases_from(&path),
        None => {
            log::debug!("No home directory; running without configuration.");
            Ok(AliasMap::new())
        }
    }
}

/// Loads the aliases from `path`. A file that does not exist yields an empty mapping.
pub fn load_aliases_from(path: &Path) -> Result<AliasMap, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("No config file at '{}'.", path.display());
            return Ok(AliasMap::new());
        }
        Err(e) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let aliases = parse_aliases(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    log::debug!("Loaded {} aliases from '{}'.", aliases.len(), path.display());
    Ok(aliases)
}

/// Parses the TOML text of a config file. `~` at the start of a path is expanded.
pub fn parse_aliases(content: &str) -> Result<AliasMap, toml::de::Error> {
    let config: ConfigFile = toml::from_str(content)?;
    Ok(config
        .aliases
        .into_iter()
        .map(|(name, path)| {
            let expanded = paths::expand_tilde(&path).to_string_lossy().into_owned();
            (name, expanded)
        })
        .collect())
}
