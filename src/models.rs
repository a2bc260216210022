// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::constants::{FILE_DELIMITERS, INLINE_DELIMITERS};

// --- CONFIGURATION MODELS (FOR TOML) ---

/// The on-disk shape of `config.toml`.
///
/// Only the `[aliases]` table is recognised; any other table is ignored so that older or
/// newer configuration files keep loading.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    /// Short name -> full executable path.
    #[serde(default, alias = "Aliases")]
    pub aliases: HashMap<String, String>,
}

// --- TEMPLATE MODELS ---

/// Where a template body comes from.
///
/// The choice is made once per invocation by checking the filesystem: anything that can be
/// `stat`ed is a file, everything else is the template text itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// A template stored on disk. Parsed with `{{` and `}}`.
    File(PathBuf),
    /// A template passed on the command line. Parsed with `[[` and `]]`.
    Inline(String),
}

impl TemplateSource {
    /// The delimiter pair this source is parsed with.
    pub fn delimiters(&self) -> Delimiters {
        match self {
            Self::File(_) => Delimiters::new(FILE_DELIMITERS.0, FILE_DELIMITERS.1),
            Self::Inline(_) => Delimiters::new(INLINE_DELIMITERS.0, INLINE_DELIMITERS.1),
        }
    }
}

/// The left/right markers that open and close a template action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    /// Opening marker, e.g. `{{`.
    pub left: String,
    /// Closing marker, e.g. `}}`.
    pub right: String,
}

impl Delimiters {
    /// Creates a delimiter pair.
    pub fn new(left: &str, right: &str) -> Self {
        Self {
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new(FILE_DELIMITERS.0, FILE_DELIMITERS.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_source_uses_double_braces() {
        let source = TemplateSource::File(PathBuf::from("greeting.txt"));
        assert_eq!(source.delimiters(), Delimiters::new("{{", "}}"));
    }

    #[test]
    fn test_inline_source_uses_double_brackets() {
        let source = TemplateSource::Inline("Hello [[.]]".to_string());
        assert_eq!(source.delimiters(), Delimiters::new("[[", "]]"));
    }

    #[test]
    fn test_config_file_accepts_capitalised_section() {
        let config: ConfigFile = toml::from_str("[Aliases]\ncode = \"/usr/bin/code\"").unwrap();
        assert_eq!(config.aliases.get("code").map(String::as_str), Some("/usr/bin/code"));
    }

    #[test]
    fn test_config_file_ignores_unknown_sections() {
        let config: ConfigFile =
            toml::from_str("[aliases]\nmd = \"html2md\"\n\n[theme]\ncolor = \"dark\"").unwrap();
        assert_eq!(config.aliases.len(), 1);
    }
}
