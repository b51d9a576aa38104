//! Common re-exports for consumers of this crate (`sampgame` and
//! `samptools` both `use corert::prelude::*;`).

pub use crate::demux::{Demultiplexer, NetworkInHandler, NetworkOutHandler, SingleNetworkInHandler, SingleNetworkOutHandler};
pub use crate::dispatch::{EventDispatcher, Handler, IndexedEventDispatcher, Priority, PRIORITY_DEFAULT};
pub use crate::events::{CoreEventHandler, CoreEvents};
pub use crate::extensions::{ComponentDescriptor, ComponentHooks, Extensions};
pub use crate::ids::*;
pub use crate::model::{GlobalObjectPool, Object, Player, PlayerObject, PlayerState, Vehicle};
pub use crate::motion::{AttachTarget, Attachment, MotionEngine, MotionState, ObjectMoveData, Vec3};
pub use crate::net::{BanEntry, BanList, Channel, ConnectionRequest, DisconnectReason, Endpoint, HandshakeOutcome, SendMode};
pub use crate::pool::{LifetimeMode, Pool, PoolEventHandler, ScopedLock};
pub use crate::world::{World, WorldConfig};
