//! UDP endpoint (§4.2): the socket-facing half of the reliability
//! layer. Grounded on `server/impl/legacy_network_impl.hpp`'s
//! peer-table-over-a-single-socket shape and `SDK/include/network.hpp`'s
//! `NewConnectionResult`/`PeerDisconnectReason`; translated from a
//! RakNet wrapper into a plain non-blocking `UdpSocket` poll loop
//! because this pack carries no RakPeer implementation to ground a
//! byte-exact framing against (see the design ledger). Frames carry a
//! CRC32 so a corrupted or foreign datagram is silently dropped with a
//! counter bump rather than risk desyncing a channel's sequencer.

use std::collections::HashMap;
use std::io::ErrorKind as IoErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use crc32fast::Hasher;
use wireproto::error::{ErrorKind, NetworkError, NetworkResult};

use super::ban::BanList;
use super::channel::PeerChannel;
use super::frame::{Channel, ConnectionRequest, DisconnectReason, HandshakeOutcome, SendMode};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECTED_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECTED_TIMEOUT_DEBUG: Duration = Duration::from_secs(30);
const PING_BROADCAST_INTERVAL: Duration = Duration::from_secs(30);
const PING_BROADCAST_PEER_LIMIT: usize = 32;

const FRAME_HEADER_LEN: usize = 4 + 1 + 1 + 4; // crc32, channel, send_mode, sequence

/// Events the tick loop drains from the endpoint each pass and feeds to
/// the packet/RPC demultiplexer (§4.6).
pub enum Incoming {
    PeerConnectRequested(SocketAddr, ConnectionRequest),
    Payload(SocketAddr, Channel, Vec<u8>),
    Disconnected(SocketAddr, DisconnectReason),
}

struct PendingHandshake {
    since: Instant,
}

/// One connected peer's address-facing state; the player-model pool
/// entry (§3.1) stores the id that maps back to this via
/// `Endpoint::addr_of`.
pub struct Connection {
    pub addr: SocketAddr,
    pub channel: PeerChannel,
}

pub struct Endpoint {
    socket: UdpSocket,
    pending: HashMap<SocketAddr, PendingHandshake>,
    connections: HashMap<SocketAddr, Connection>,
    pub ban_list: BanList,
    debug_timeouts: bool,
    last_ping_broadcast: Option<Instant>,
    dropped_bad_crc: u64,
}

impl Endpoint {
    pub fn bind(addr: SocketAddr) -> NetworkResult<Self> {
        let socket = UdpSocket::bind(addr).map_err(NetworkError::from)?;
        socket.set_nonblocking(true).map_err(NetworkError::from)?;
        Ok(Endpoint {
            socket,
            pending: HashMap::new(),
            connections: HashMap::new(),
            ban_list: BanList::new(),
            debug_timeouts: false,
            last_ping_broadcast: None,
            dropped_bad_crc: 0,
        })
    }

    pub fn set_debug_timeouts(&mut self, enabled: bool) {
        self.debug_timeouts = enabled;
    }

    fn timeout(&self) -> Duration {
        if self.debug_timeouts {
            CONNECTED_TIMEOUT_DEBUG
        } else {
            CONNECTED_TIMEOUT
        }
    }

    pub fn dropped_bad_crc(&self) -> u64 {
        self.dropped_bad_crc
    }

    pub fn is_connected(&self, addr: &SocketAddr) -> bool {
        self.connections.contains_key(addr)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Accepts `addr` as a full peer after the handshake RPC validated.
    /// The caller decides `outcome` (serial/name checks, free slot
    /// lookup) and only calls this on `Success`.
    pub fn complete_handshake(&mut self, addr: SocketAddr, now: Instant) {
        self.pending.remove(&addr);
        self.connections.insert(addr, Connection { addr, channel: PeerChannel::new(now) });
    }

    pub fn reject_handshake(&mut self, addr: SocketAddr) {
        self.pending.remove(&addr);
    }

    pub fn disconnect(&mut self, addr: &SocketAddr) -> Option<Connection> {
        self.connections.remove(addr)
    }

    fn frame(channel: Channel, mode: SendMode, sequence: u32, payload: &[u8]) -> Vec<u8> {
        let mut body = Vec::with_capacity(1 + 1 + 4 + payload.len());
        body.push(channel.index() as u8);
        body.push(mode as u8);
        body.extend_from_slice(&sequence.to_le_bytes());
        body.extend_from_slice(payload);

        let mut hasher = Hasher::new();
        hasher.update(&body);
        let crc = hasher.finalize();

        let mut frame = Vec::with_capacity(4 + body.len());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&body);
        frame
    }

    fn unframe(raw: &[u8]) -> Option<(Channel, SendMode, u32, &[u8])> {
        if raw.len() < FRAME_HEADER_LEN {
            return None;
        }
        let crc = u32::from_le_bytes(raw[0..4].try_into().ok()?);
        let body = &raw[4..];
        let mut hasher = Hasher::new();
        hasher.update(body);
        if hasher.finalize() != crc {
            return None;
        }
        let channel = channel_from_wire(body[0])?;
        let mode = mode_from_wire(body[1])?;
        let sequence = u32::from_le_bytes(body[2..6].try_into().ok()?);
        Some((channel, mode, sequence, &body[6..]))
    }

    pub fn send(&mut self, addr: SocketAddr, channel: Channel, mode: SendMode, payload: Vec<u8>) -> NetworkResult<()> {
        let now = Instant::now();
        let conn = self.connections.get_mut(&addr).ok_or(NetworkError::Fatal(ErrorKind::BadArgument))?;
        let seq = conn.channel.prepare_send(channel, mode, payload.clone(), now);
        let frame = Self::frame(channel, mode, seq, &payload);
        self.socket.send_to(&frame, addr).map_err(NetworkError::from)?;
        Ok(())
    }

    pub fn broadcast(&mut self, channel: Channel, mode: SendMode, payload: &[u8], except: Option<SocketAddr>) {
        let addrs: Vec<SocketAddr> = self.connections.keys().copied().filter(|a| Some(*a) != except).collect();
        for addr in addrs {
            let _ = self.send(addr, channel, mode, payload.to_vec());
        }
    }

    /// Drains every pending datagram this tick, handling the connection
    /// handshake inline and returning application payloads and
    /// lifecycle events for the demultiplexer to fan out.
    pub fn poll(&mut self) -> Vec<Incoming> {
        let mut out = Vec::new();
        let now = Instant::now();
        let mut buf = [0u8; 4096];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((len, addr)) => self.handle_datagram(addr, &buf[..len], now, &mut out),
                Err(e) if e.kind() == IoErrorKind::WouldBlock => break,
                Err(_) => break,
            }
        }
        self.expire_timeouts(now, &mut out);
        out
    }

    fn handle_datagram(&mut self, addr: SocketAddr, raw: &[u8], now: Instant, out: &mut Vec<Incoming>) {
        if self.ban_list.is_banned(&addr.ip().to_string()) {
            return;
        }

        if !self.connections.contains_key(&addr) {
            if let Some(request) = parse_connection_request(raw) {
                self.pending.entry(addr).or_insert(PendingHandshake { since: now });
                out.push(Incoming::PeerConnectRequested(addr, request));
            }
            return;
        }

        let (channel, mode, sequence, payload) = match Self::unframe(raw) {
            Some(parsed) => parsed,
            None => {
                self.dropped_bad_crc += 1;
                return;
            }
        };

        let conn = self.connections.get_mut(&addr).expect("checked contains_key above");
        conn.channel.touch(now);
        if channel == Channel::Internal && payload == b"pong" {
            conn.channel.complete_ping(now);
            return;
        }
        for delivered in conn.channel.accept(channel, mode, sequence, payload.to_vec()) {
            out.push(Incoming::Payload(addr, channel, delivered));
        }
    }

    fn expire_timeouts(&mut self, now: Instant, out: &mut Vec<Incoming>) {
        self.pending.retain(|_, p| now.saturating_duration_since(p.since) < HANDSHAKE_TIMEOUT);

        let timeout = self.timeout();
        let timed_out: Vec<SocketAddr> = self
            .connections
            .values()
            .filter(|c| c.channel.has_timed_out(now, timeout))
            .map(|c| c.addr)
            .collect();
        for addr in timed_out {
            self.connections.remove(&addr);
            out.push(Incoming::Disconnected(addr, DisconnectReason::Timeout));
        }

        if self
            .last_ping_broadcast
            .map_or(true, |last| now.saturating_duration_since(last) >= PING_BROADCAST_INTERVAL)
        {
            self.last_ping_broadcast = Some(now);
            let addrs: Vec<SocketAddr> = self.connections.keys().copied().take(PING_BROADCAST_PEER_LIMIT).collect();
            for addr in addrs {
                if let Some(conn) = self.connections.get_mut(&addr) {
                    conn.channel.begin_ping(now);
                }
                let _ = self.send(addr, Channel::Internal, SendMode::Unreliable, b"ping".to_vec());
            }
        }
    }
}

fn channel_from_wire(byte: u8) -> Option<Channel> {
    match byte {
        0 => Some(Channel::Internal),
        1 => Some(Channel::SyncPacket),
        2 => Some(Channel::SyncRpc),
        3 => Some(Channel::Unordered),
        4 => Some(Channel::Reliable),
        5 => Some(Channel::DownloadRequest),
        _ => None,
    }
}

fn mode_from_wire(byte: u8) -> Option<SendMode> {
    match byte {
        0 => Some(SendMode::Unreliable),
        1 => Some(SendMode::UnreliableSequenced),
        2 => Some(SendMode::Reliable),
        3 => Some(SendMode::ReliableOrdered),
        4 => Some(SendMode::ReliableSequenced),
        _ => None,
    }
}

/// A connection-request datagram is tagged with a leading magic byte
/// the reliability frame never produces (frames always start with a
/// CRC, which is effectively random, so collisions are possible but
/// exceedingly rare and simply fail the handshake field parse below).
const HANDSHAKE_MAGIC: u8 = 0xFF;

fn parse_connection_request(raw: &[u8]) -> Option<ConnectionRequest> {
    if raw.first() != Some(&HANDSHAKE_MAGIC) {
        return None;
    }
    let mut bs = wireproto::bitstream::BitStream::from_bytes(&raw[1..]);
    let protocol_version = bs.read_u32_le()?;
    let modded = bs.read_bit()?;
    let name = bs.read_prefixed_string()?;
    let challenge_response = bs.read_u32_le()?;
    let auth_token = bs.read_prefixed_string()?;
    let version_string = bs.read_prefixed_string()?;
    Some(ConnectionRequest {
        protocol_version,
        modded,
        name,
        challenge_response,
        auth_token,
        version_string,
    })
}

/// Builds the outcome the caller should apply after validating a
/// [`ConnectionRequest`] against the running server's configuration.
pub fn evaluate_handshake(
    request: &ConnectionRequest,
    expected_protocol_version: u32,
    allow_modded: bool,
    has_free_slot: bool,
    name_is_valid: bool,
) -> HandshakeOutcome {
    if request.protocol_version != expected_protocol_version {
        HandshakeOutcome::VersionMismatch
    } else if !name_is_valid {
        HandshakeOutcome::BadName
    } else if request.modded && !allow_modded {
        HandshakeOutcome::BadMod
    } else if !has_free_slot {
        HandshakeOutcome::NoPlayerSlot
    } else {
        HandshakeOutcome::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trips_and_detects_corruption() {
        let frame = Endpoint::frame(Channel::Reliable, SendMode::ReliableOrdered, 7, b"hello");
        let (channel, mode, seq, payload) = Endpoint::unframe(&frame).unwrap();
        assert_eq!(channel, Channel::Reliable);
        assert_eq!(mode, SendMode::ReliableOrdered);
        assert_eq!(seq, 7);
        assert_eq!(payload, b"hello");

        let mut corrupted = frame.clone();
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0xFF;
        assert!(Endpoint::unframe(&corrupted).is_none());
    }

    #[test]
    fn handshake_outcome_prioritizes_version_check() {
        let req = ConnectionRequest {
            protocol_version: 1,
            modded: false,
            name: "Player".into(),
            challenge_response: 0,
            auth_token: String::new(),
            version_string: "0.3.7".into(),
        };
        assert_eq!(evaluate_handshake(&req, 2, true, true, true), HandshakeOutcome::VersionMismatch);
        assert_eq!(evaluate_handshake(&req, 1, true, true, false), HandshakeOutcome::BadName);
        assert_eq!(evaluate_handshake(&req, 1, true, true, true), HandshakeOutcome::Success);
    }
}
