//! Server configuration schema (§6.2, §11.3). Grounded on the reference
//! `GameConfig`'s `Server`/`Game` split and `serdeconv::from_toml_file`
//! loading, widened to the full key set §6.2 names plus the
//! deprecated-key alias table §11.3 calls out as normative.

use std::net::SocketAddr;
use std::path::Path;

use serde_derive::{Deserialize, Serialize};
use wireproto::config::{AliasTable, ConfigError};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ServerSection {
    pub server_name: String,
    pub mode_text: String,
    pub map_name: String,
    pub language: String,
    pub url: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub admin_password: String,
    pub address: SocketAddr,
    pub max_clients: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        ServerSection {
            server_name: "open.mp server".into(),
            mode_text: "Freeroam".into(),
            map_name: "San Andreas".into(),
            language: "English".into(),
            url: String::new(),
            password: String::new(),
            admin_password: String::new(),
            address: "0.0.0.0:7777".parse().unwrap(),
            max_clients: 500,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct NetworkSection {
    pub stream_radius: f32,
    pub stream_rate_ms: u32,
}

impl Default for NetworkSection {
    fn default() -> Self {
        NetworkSection { stream_radius: 200.0, stream_rate_ms: 100 }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct ArtworkSection {
    pub enabled: bool,
}

impl Default for ArtworkSection {
    fn default() -> Self {
        ArtworkSection { enabled: true }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct GameConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub artwork: ArtworkSection,
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<GameConfig, ConfigError> {
        serdeconv::from_toml_file(path.as_ref()).map_err(ConfigError::from)
    }
}

/// Deprecated option names kept working for server owners upgrading
/// from the original protocol's `server.cfg` naming.
pub fn default_aliases() -> AliasTable {
    let mut aliases = AliasTable::new();
    aliases.insert("port", "server.address");
    aliases.insert("bind", "server.address");
    aliases.insert("gamemodetext", "server.mode_text");
    aliases.insert("weburl", "server.url");
    aliases.insert("rcon_password", "server.admin_password");
    aliases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_server_address() {
        let config = GameConfig::default();
        assert_eq!(config.server.address.port(), 7777);
        assert_eq!(config.network.stream_rate_ms, 100);
    }

    #[test]
    fn default_aliases_resolve_legacy_port_key() {
        let aliases = default_aliases();
        let (deprecated, canonical) = aliases.resolve("port");
        assert!(deprecated);
        assert_eq!(canonical, "server.address");
    }
}
