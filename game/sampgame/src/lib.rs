//! Glue between the on-disk configuration schema and the transport-and-pool
//! runtime in `corert`. Grounded on the reference `gamecore` crate's role
//! as the thin layer that turns a loaded `GameConfig` into a running
//! `World`, without owning any wire or pool logic itself.

pub mod config;

use std::time::Duration;

use corert::world::{World, WorldConfig};
use slog::Logger;
use wireproto::error::NetworkResult;

use config::GameConfig;

/// Protocol version this build speaks; handshakes from a mismatched
/// client version are rejected (§4.2, §6.2).
pub const PROTOCOL_VERSION: u32 = 1;

/// Builds a `WorldConfig` from a loaded `GameConfig`, applying the
/// defaults §6.2 and §5 name for anything the schema doesn't carry
/// directly (tick rate, handshake leniency).
pub fn world_config(config: &GameConfig) -> WorldConfig {
    WorldConfig {
        bind_address: config.server.address,
        protocol_version: PROTOCOL_VERSION,
        allow_modded_clients: false,
        max_players: config.server.max_clients as usize,
        tick_duration: Duration::from_millis(1000 / 20.max(1)),
        debug_timeouts: false,
    }
}

/// Binds and constructs the running `World` for this configuration.
pub fn build_world(config: &GameConfig, log: Logger) -> NetworkResult<World> {
    World::new(world_config(config), log)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_config_carries_bind_address_and_client_cap() {
        let game_config = GameConfig::default();
        let world_config = world_config(&game_config);
        assert_eq!(world_config.bind_address, game_config.server.address);
        assert_eq!(world_config.max_players, game_config.server.max_clients as usize);
        assert_eq!(world_config.protocol_version, PROTOCOL_VERSION);
    }
}
