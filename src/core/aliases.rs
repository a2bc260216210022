// src/core/aliases.rs

use std::collections::HashMap;

/// Maps short command names to full executable paths.
///
/// Built once at startup from the `[aliases]` table and passed by reference afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    entries: HashMap<String, String>,
}

impl AliasMap {
    /// An empty mapping: every name resolves to itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mapped path for `name`, or `name` unchanged.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        match self.entries.get(name) {
            Some(path) => {
                log::debug!("Alias '{}' resolved to '{}'", name, path);
                path
            }
            None => name,
        }
    }

    /// Number of aliases defined.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no alias is defined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<HashMap<String, String>> for AliasMap {
    fn from(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AliasMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_name_resolves_to_path() {
        let aliases: AliasMap = [("code", "/usr/local/bin/code")].into_iter().collect();
        assert_eq!(aliases.resolve("code"), "/usr/local/bin/code");
    }

    #[test]
    fn test_unknown_name_is_returned_unchanged() {
        let aliases: AliasMap = [("code", "/usr/local/bin/code")].into_iter().collect();
        assert_eq!(aliases.resolve("html2md"), "html2md");
        assert_eq!(AliasMap::new().resolve("ls"), "ls");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let aliases: AliasMap = [("Code", "/opt/code")].into_iter().collect();
        assert_eq!(aliases.resolve("code"), "code");
        assert_eq!(aliases.len(), 1);
    }
}
