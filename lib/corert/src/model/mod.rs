//! Player/vehicle/object entity records (§3.2). These are the plain
//! data held inside each pool's slots; the pools themselves
//! ([`crate::pool::Pool`]) and the motion timeline
//! ([`crate::motion::MotionState`]) are generic infrastructure, kept
//! separate from the attribute sets specific to each entity kind.

pub mod object;
pub mod player;
pub mod vehicle;

pub use object::{GlobalObjectPool, Object, PlayerObject};
pub use player::{Player, PlayerState};
pub use vehicle::Vehicle;
