//! Channel assignment and send-mode taxonomy for the reliability layer
//! (§4.2). Grounded on `SDK/include/network.hpp`'s `OrderingChannel`
//! enum and `NetworkBitStream`/`sendPacket`/`sendRPC`'s `channel`
//! argument.

/// The five delivery guarantees a send call can request.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SendMode {
    /// No delivery or ordering guarantee.
    Unreliable,
    /// No delivery guarantee; stale duplicates are dropped in favor of
    /// the newest sequence number on the same channel.
    UnreliableSequenced,
    /// Guaranteed delivery, no ordering guarantee across channels.
    Reliable,
    /// Guaranteed delivery; a receiver block until every earlier
    /// message on the same channel has arrived.
    ReliableOrdered,
    /// Guaranteed delivery; a late-arriving older message is discarded
    /// in favor of whatever sequence number is already newest.
    ReliableSequenced,
}

/// Fixed ordering-channel assignment (§4.2). Channel number is carried
/// on the wire per message and determines which per-channel sequencer
/// a `ReliableOrdered`/`*Sequenced` message participates in.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Channel {
    Internal = 0,
    SyncPacket = 1,
    SyncRpc = 2,
    Unordered = 3,
    Reliable = 4,
    DownloadRequest = 5,
}

pub const CHANNEL_COUNT: usize = 32;

impl Channel {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Why a peer's connection ended (§4.2). Only `Timeout` and `Quit` are
/// raised by the transport itself; `Kicked` is raised by higher-level
/// moderation code that then asks the transport to close the socket.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DisconnectReason {
    Timeout,
    Quit,
    Kicked,
}

/// Outcome of the connection handshake (§4.2), mirroring
/// `NewConnectionResult`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum HandshakeOutcome {
    VersionMismatch,
    BadName,
    BadMod,
    NoPlayerSlot,
    Success,
}

/// Fields carried by the connection-request RPC (wire RPC 25 in the
/// legacy protocol), used to decide `HandshakeOutcome`.
#[derive(Clone, Debug)]
pub struct ConnectionRequest {
    pub protocol_version: u32,
    pub modded: bool,
    pub name: String,
    pub challenge_response: u32,
    pub auth_token: String,
    pub version_string: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_indices_match_fixed_assignment() {
        assert_eq!(Channel::Internal.index(), 0);
        assert_eq!(Channel::SyncPacket.index(), 1);
        assert_eq!(Channel::SyncRpc.index(), 2);
        assert_eq!(Channel::Unordered.index(), 3);
        assert_eq!(Channel::Reliable.index(), 4);
        assert_eq!(Channel::DownloadRequest.index(), 5);
    }
}
