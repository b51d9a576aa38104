//! TOML-backed configuration loading (§6.2, §11.3), following the
//! reference `GameConfig` pattern: values load through `serdeconv`, and a
//! parallel alias table maps deprecated keys to their canonical form so
//! callers can look a value up under either name without duplicating it.
//!
//! The store itself is generic over nothing fancier than a string-keyed
//! TOML document; the game crate layers a typed schema on top (see
//! `sampgame::config`) by deserializing the same document.

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serdeconv::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config io error: {}", e),
            ConfigError::Parse(e) => write!(f, "config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serdeconv::Error> for ConfigError {
    fn from(e: serdeconv::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Deprecated-key -> canonical-key table, loaded from a small TOML map
/// alongside the main configuration document.
#[derive(Default, Debug, Clone)]
pub struct AliasTable {
    /// canonical -> set of deprecated spellings that resolve to it.
    deprecated_to_canonical: HashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        AliasTable::default()
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let raw: HashMap<String, String> = serdeconv::from_toml_str(s)?;
        Ok(AliasTable {
            deprecated_to_canonical: raw,
        })
    }

    pub fn insert(&mut self, deprecated: impl Into<String>, canonical: impl Into<String>) {
        self.deprecated_to_canonical
            .insert(deprecated.into(), canonical.into());
    }

    /// Resolves `key` to `(was_deprecated, canonical_key)`. Keys that
    /// aren't in the alias table resolve to themselves.
    pub fn resolve<'a>(&'a self, key: &'a str) -> (bool, &'a str) {
        match self.deprecated_to_canonical.get(key) {
            Some(canonical) => (true, canonical.as_str()),
            None => (false, key),
        }
    }
}

/// A loaded configuration document plus its alias table. `T` is the
/// caller's typed schema (e.g. `sampgame::config::GameConfig`).
pub struct ConfigStore<T> {
    pub values: T,
    pub aliases: AliasTable,
    raw: toml::Value,
}

impl<T: DeserializeOwned> ConfigStore<T> {
    pub fn load(path: impl AsRef<Path>, aliases: AliasTable) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let values: T = serdeconv::from_toml_str(&text)?;
        let raw: toml::Value = serdeconv::from_toml_str(&text)?;
        Ok(ConfigStore {
            values,
            aliases,
            raw,
        })
    }

    pub fn from_str(text: &str, aliases: AliasTable) -> Result<Self, ConfigError> {
        let values: T = serdeconv::from_toml_str(text)?;
        let raw: toml::Value = serdeconv::from_toml_str(text)?;
        Ok(ConfigStore {
            values,
            aliases,
            raw,
        })
    }

    /// Looks a raw string-valued key up by alias, returning `(was_deprecated,
    /// canonical_key, value)` if the canonical key is present anywhere in
    /// the loaded document (sections are flattened by dotted path, e.g.
    /// `"network.stream_rate_ms"`).
    pub fn get_by_alias(&self, key: &str) -> Option<(bool, &str, &toml::Value)> {
        let (was_deprecated, canonical) = self.aliases.resolve(key);
        let value = lookup_dotted(&self.raw, canonical)?;
        Some((was_deprecated, canonical, value))
    }

    /// Invokes `visit(dotted_key, value)` once per leaf value in the
    /// document, in a single pass, for admin-facing "show all config"
    /// surfaces.
    pub fn enumerate(&self, mut visit: impl FnMut(&str, &toml::Value)) {
        let mut path = String::new();
        enumerate_into(&self.raw, &mut path, &mut visit);
    }
}

fn lookup_dotted<'a>(value: &'a toml::Value, dotted: &str) -> Option<&'a toml::Value> {
    let mut current = value;
    for segment in dotted.split('.') {
        current = current.as_table()?.get(segment)?;
    }
    Some(current)
}

fn enumerate_into(value: &toml::Value, path: &mut String, visit: &mut impl FnMut(&str, &toml::Value)) {
    if let Some(table) = value.as_table() {
        for (key, child) in table {
            let prefix_len = path.len();
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(key);
            match child {
                toml::Value::Table(_) => enumerate_into(child, path, visit),
                _ => visit(path.as_str(), child),
            }
            path.truncate(prefix_len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_derive::Deserialize;

    #[derive(Deserialize)]
    struct Dummy {
        #[allow(dead_code)]
        server: DummyServer,
    }

    #[derive(Deserialize)]
    struct DummyServer {
        #[allow(dead_code)]
        server_name: String,
    }

    const DOC: &str = r#"
[server]
server_name = "test"
password = ""

[network]
stream_radius = 200.0
stream_rate_ms = 100
"#;

    #[test]
    fn alias_resolves_deprecated_key() {
        let mut aliases = AliasTable::new();
        aliases.insert("network.streamdistance", "network.stream_radius");
        let store: ConfigStore<Dummy> = ConfigStore::from_str(DOC, aliases).unwrap();
        let (deprecated, canonical, value) = store.get_by_alias("network.streamdistance").unwrap();
        assert!(deprecated);
        assert_eq!(canonical, "network.stream_radius");
        assert_eq!(value.as_float(), Some(200.0));
    }

    #[test]
    fn unaliased_key_resolves_to_itself() {
        let store: ConfigStore<Dummy> = ConfigStore::from_str(DOC, AliasTable::new()).unwrap();
        let (deprecated, canonical, value) = store.get_by_alias("server.server_name").unwrap();
        assert!(!deprecated);
        assert_eq!(canonical, "server.server_name");
        assert_eq!(value.as_str(), Some("test"));
    }

    #[test]
    fn enumerate_visits_every_leaf_once() {
        let store: ConfigStore<Dummy> = ConfigStore::from_str(DOC, AliasTable::new()).unwrap();
        let mut seen = Vec::new();
        store.enumerate(|key, _| seen.push(key.to_string()));
        seen.sort();
        assert_eq!(
            seen,
            vec![
                "network.stream_radius",
                "network.stream_rate_ms",
                "server.password",
                "server.server_name",
            ]
        );
    }
}
