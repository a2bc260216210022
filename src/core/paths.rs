// src/core/paths.rs

use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILENAME, CONFIG_PATH_ENV};
use lazy_static::lazy_static;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

lazy_static! {
    static ref CONFIG_PATH: Mutex<Option<Option<PathBuf>>> = Mutex::new(None);
}

/// Returns the location of `config.toml`.
///
/// `ESPLUS_CONFIG` wins when set to a non-empty value; otherwise the file lives at
/// `~/.config/esplus/config.toml` on every platform. `None` means no home directory could be
/// determined, which callers treat as "no configuration".
///
/// The result is computed once per process.
pub fn get_config_path() -> Option<PathBuf> {
    let mut cached = match CONFIG_PATH.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(path) = &*cached {
        return path.clone();
    }

    let path = config_path_from(env::var(CONFIG_PATH_ENV).ok(), dirs::home_dir());
    log::debug!("Configuration path: {:?}", path);
    *cached = Some(path.clone());
    path
}

/// Pure form of [`get_config_path`], for a given override and home directory.
pub fn config_path_from(override_path: Option<String>, home: Option<PathBuf>) -> Option<PathBuf> {
    match override_path.filter(|p| !p.trim().is_empty()) {
        Some(path) => Some(expand_tilde(&path)),
        None => home.map(|h| default_config_path(&h)),
    }
}

/// `<home>/.config/esplus/config.toml`.
pub fn default_config_path(home: &Path) -> PathBuf {
    home.join(".config").join(CONFIG_DIR_NAME).join(CONFIG_FILENAME)
}

/// Expands a leading `~` to the home directory. Other text is left alone.
pub fn expand_tilde(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_location_is_under_dot_config() {
        let path = config_path_from(None, Some(PathBuf::from("/home/ann"))).unwrap();
        assert_eq!(path, PathBuf::from("/home/ann/.config/esplus/config.toml"));
    }

    #[test]
    fn test_override_takes_precedence() {
        let path = config_path_from(
            Some("/etc/esplus.toml".to_string()),
            Some(PathBuf::from("/home/ann")),
        );
        assert_eq!(path, Some(PathBuf::from("/etc/esplus.toml")));
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let path = config_path_from(Some("  ".to_string()), Some(PathBuf::from("/h")));
        assert_eq!(path, Some(PathBuf::from("/h/.config/esplus/config.toml")));
    }

    #[test]
    fn test_no_home_means_no_path() {
        assert_eq!(config_path_from(None, None), None);
    }

    #[test]
    fn test_expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("/usr/bin/code"), PathBuf::from("/usr/bin/code"));
    }
}
