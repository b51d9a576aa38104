//! Wire-identity newtypes and the capacity ranges that back every pool
//! in the runtime (§3.1). Every pooled entity carries a stable integer
//! identifier drawn from a configured half-open range `[Lower, Upper)`;
//! packets and RPCs refer to entities exclusively by this integer, so
//! the types here exist to keep a player id from being accidentally
//! passed where a vehicle id was expected.

use std::fmt;

macro_rules! pool_id {
    ($name:ident, $repr:ty, $doc:expr) => {
        #[doc = $doc]
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
        #[repr(transparent)]
        pub struct $name(pub $repr);

        impl $name {
            #[inline]
            pub fn get(self) -> $repr {
                self.0
            }

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<$repr> for $name {
            #[inline]
            fn from(v: $repr) -> Self {
                $name(v)
            }
        }

        impl From<$name> for $repr {
            #[inline]
            fn from(v: $name) -> Self {
                v.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

pool_id!(PlayerId, u16, "Stable wire identifier of a player, range 0..1000.");
pool_id!(
    VehicleId,
    u16,
    "Stable wire identifier of a vehicle, range 0..2000. 0xFFFF is the wire-invalid sentinel."
);
pool_id!(
    ObjectId,
    u16,
    "Stable wire identifier of a global object, range 1..2000 (shared with per-player objects, see §4.4)."
);
pool_id!(ActorId, u16, "Stable wire identifier of an actor.");
pool_id!(TextLabelId, u16, "Stable wire identifier of a 3D text label.");
pool_id!(PickupId, u16, "Stable wire identifier of a pickup.");
pool_id!(TextDrawId, u16, "Stable wire identifier of a textdraw.");
pool_id!(MenuId, u8, "Stable wire identifier of a menu.");
pool_id!(DialogId, u16, "Stable wire identifier of a dialog.");
pool_id!(GangZoneId, u16, "Stable wire identifier of a gangzone.");

/// The wire-invalid vehicle id, used in place of `Option<VehicleId>` on
/// the wire because the client expects this exact sentinel value.
pub const INVALID_VEHICLE_ID: u16 = 0xFFFF;
/// Matching in-memory sentinel for "no object" (0 is reserved: objects
/// are numbered `1..OBJECT_POOL_SIZE`).
pub const INVALID_OBJECT_ID: u16 = 0;

pub const PLAYER_POOL_SIZE: usize = 1000;
pub const VEHICLE_POOL_SIZE: usize = 2000;
/// Global and per-player objects share one id space per §3.3; both pools
/// are sized identically and indices 0 is never claimed (1-based).
pub const OBJECT_POOL_SIZE: usize = 2000;
pub const ACTOR_POOL_SIZE: usize = 1000;
pub const TEXT_LABEL_POOL_SIZE: usize = 1024;
pub const PICKUP_POOL_SIZE: usize = 4096;
pub const TEXTDRAW_POOL_SIZE: usize = 2048;
pub const MENU_POOL_SIZE: usize = 128;
pub const DIALOG_POOL_SIZE: usize = 32768;
pub const GANGZONE_POOL_SIZE: usize = 1024;

/// Weapon slots carried per player (§3.1).
pub const WEAPON_SLOTS: usize = 13;
/// Vehicle passenger slot capacity (§3.2).
pub const VEHICLE_PASSENGER_SLOTS: usize = 4;
/// Per-object material override slots (§3.2).
pub const OBJECT_MATERIAL_SLOTS: usize = 16;
