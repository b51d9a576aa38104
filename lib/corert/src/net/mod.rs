//! The reliability/transport layer (§4.2): UDP endpoint, per-peer
//! channel bookkeeping, framing/channel taxonomy, and the ban list.

pub mod ban;
pub mod channel;
pub mod endpoint;
pub mod frame;

pub use ban::{BanEntry, BanList};
pub use channel::{PeerChannel, PingHistory};
pub use endpoint::{evaluate_handshake, Connection, Endpoint, Incoming};
pub use frame::{Channel, ConnectionRequest, DisconnectReason, HandshakeOutcome, SendMode, CHANNEL_COUNT};
