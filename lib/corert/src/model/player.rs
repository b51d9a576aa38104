//! Player entity record (§3.2). Grounded on `SDK/include/player.hpp`'s
//! `IPlayer`/`PlayerState`; the reference also keeps a second,
//! near-identical state enum under a "game_types" header; per the
//! design ledger's resolution of that duplication, this is the single
//! canonical copy every other module imports.

use std::collections::HashSet;

use crate::ids::{PlayerId, VehicleId, WEAPON_SLOTS};
use crate::motion::Vec3;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PlayerState {
    None,
    OnFoot,
    Driver,
    Passenger,
    ExitVehicle,
    EnterVehicleDriver,
    EnterVehiclePassenger,
    Wasted,
    Spawned,
    Spectating,
}

/// Orientation as a unit quaternion in the game's left-handed,
/// Z-up basis (§4.1's normalized-quaternion wire encoding operates on
/// these components directly).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Quat {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct WeaponSlot {
    pub weapon_id: u8,
    pub ammo: u32,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct KeyState {
    pub keys: u32,
    pub up_down: i16,
    pub left_right: i16,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct AimData {
    pub camera_front_vector: Vec3,
    pub camera_pos: Vec3,
    pub aim_z: f32,
    pub weapon_state: u8,
    pub camera_mode: u8,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct BulletData {
    pub origin: Vec3,
    pub hit_pos: Vec3,
    pub offset: Vec3,
    pub weapon_type: u8,
    pub hit_type: u8,
    pub hit_id: u16,
}

pub struct Player {
    pub id: PlayerId,
    pub pos: Vec3,
    pub rot: Quat,
    pub virtual_world: i32,
    pub interior: u8,
    pub health: f32,
    pub armour: f32,
    pub team: u8,
    pub skin: i32,
    pub colour: u32,
    pub name: String,
    pub serial: String,
    pub client_version: crate::net::ConnectionRequest,
    pub weapons: [WeaponSlot; WEAPON_SLOTS],
    pub keys: KeyState,
    pub aim: AimData,
    pub bullet: BulletData,
    pub streamed_in: HashSet<PlayerId>,
    pub state: PlayerState,
    pub spectating: Option<PlayerId>,
    pub vehicle: Option<VehicleId>,
}

impl Player {
    pub fn new(id: PlayerId, name: String, client_version: crate::net::ConnectionRequest) -> Self {
        Player {
            id,
            pos: Vec3::default(),
            rot: Quat::default(),
            virtual_world: 0,
            interior: 0,
            health: 100.0,
            armour: 0.0,
            team: 0xFF,
            skin: 0,
            colour: 0,
            name,
            serial: client_version.auth_token.clone(),
            client_version,
            weapons: [WeaponSlot::default(); WEAPON_SLOTS],
            keys: KeyState::default(),
            aim: AimData::default(),
            bullet: BulletData::default(),
            streamed_in: HashSet::new(),
            state: PlayerState::None,
            spectating: None,
            vehicle: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::ConnectionRequest;

    fn request() -> ConnectionRequest {
        ConnectionRequest {
            protocol_version: 1,
            modded: false,
            name: "Tester".into(),
            challenge_response: 0,
            auth_token: "abc123".into(),
            version_string: "0.3.7".into(),
        }
    }

    #[test]
    fn new_player_starts_with_full_health_and_no_team() {
        let p = Player::new(PlayerId(0), "Tester".into(), request());
        assert_eq!(p.health, 100.0);
        assert_eq!(p.team, 0xFF);
        assert!(p.streamed_in.is_empty());
        assert_eq!(p.state, PlayerState::None);
    }
}
