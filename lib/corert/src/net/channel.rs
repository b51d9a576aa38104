//! Per-peer reliability state: one instance of [`PeerChannel`] per
//! connected address, tracking the sequencing and resend bookkeeping
//! that each [`super::frame::SendMode`] needs. Grounded on
//! `server/impl/legacy_network_impl.hpp`'s per-peer `RakPeerInterface`
//! wrapper; that header only exposes the RakNet API surface (no
//! RakPeer.cpp in this pack), so the sequencing/resend logic below is a
//! from-scratch design that satisfies the same observable guarantees
//! (no duplicate delivery, per-channel order preserved) rather than a
//! byte-level reproduction of RakNet's wire format.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use super::frame::{Channel, SendMode, CHANNEL_COUNT};

const PING_SAMPLES: usize = 8;
const RESEND_INTERVAL: Duration = Duration::from_millis(300);
const RESEND_GIVE_UP: Duration = Duration::from_secs(10);
/// Bound on how many recently-delivered sequence numbers a channel
/// remembers for duplicate suppression (§3.3, §8.1): a retransmitted
/// `Reliable` payload whose ack was lost must not be delivered twice,
/// but the set can't grow without bound, so it's a sliding window rather
/// than a lifetime record.
const DEDUP_WINDOW: usize = 1024;

#[derive(Clone)]
struct PendingReliable {
    sequence: u32,
    payload: Vec<u8>,
    sent_at: Instant,
    first_sent_at: Instant,
}

/// Per-channel sequencing state for one peer.
#[derive(Default)]
struct ChannelState {
    next_send_sequence: u32,
    next_expected_sequence: u32,
    highest_seen_sequence: Option<u32>,
    reorder_buffer: VecDeque<(u32, Vec<u8>)>,
    unacked: VecDeque<PendingReliable>,
    /// Sequence numbers already delivered on this channel, for
    /// `Unreliable`/`Reliable` duplicate suppression; `received_order`
    /// is the eviction queue that keeps `received` bounded.
    received: HashSet<u32>,
    received_order: VecDeque<u32>,
}

impl ChannelState {
    /// Records `sequence` as delivered, returning `false` if it was
    /// already seen (the caller should drop the payload as a duplicate).
    fn mark_received(&mut self, sequence: u32) -> bool {
        if !self.received.insert(sequence) {
            return false;
        }
        self.received_order.push_back(sequence);
        if self.received_order.len() > DEDUP_WINDOW {
            if let Some(oldest) = self.received_order.pop_front() {
                self.received.remove(&oldest);
            }
        }
        true
    }
}

/// Ring buffer of the last `PING_SAMPLES` round-trip measurements
/// (§4.2), from which average/last/lowest readings are derived on
/// demand rather than tracked incrementally.
pub struct PingHistory {
    samples: VecDeque<u32>,
}

impl PingHistory {
    fn new() -> Self {
        PingHistory { samples: VecDeque::with_capacity(PING_SAMPLES) }
    }

    fn record(&mut self, ms: u32) {
        if self.samples.len() == PING_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(ms);
    }

    pub fn last(&self) -> u32 {
        self.samples.back().copied().unwrap_or(0)
    }

    pub fn average(&self) -> u32 {
        if self.samples.is_empty() {
            return 0;
        }
        (self.samples.iter().copied().sum::<u32>() as f64 / self.samples.len() as f64).round() as u32
    }

    pub fn lowest(&self) -> u32 {
        self.samples.iter().copied().min().unwrap_or(0)
    }
}

/// The reliability state for one connected peer: per-channel sequence
/// counters, reorder buffers for `*Ordered` channels, an unacked-resend
/// queue for reliable sends, and the ping sample ring.
pub struct PeerChannel {
    channels: Vec<ChannelState>,
    pub ping: PingHistory,
    last_activity: Instant,
    pending_ping_sent_at: Option<Instant>,
}

impl PeerChannel {
    pub fn new(now: Instant) -> Self {
        let mut channels = Vec::with_capacity(CHANNEL_COUNT);
        channels.resize_with(CHANNEL_COUNT, ChannelState::default);
        PeerChannel {
            channels,
            ping: PingHistory::new(),
            last_activity: now,
            pending_ping_sent_at: None,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    pub fn begin_ping(&mut self, now: Instant) {
        self.pending_ping_sent_at = Some(now);
    }

    pub fn complete_ping(&mut self, now: Instant) {
        if let Some(sent) = self.pending_ping_sent_at.take() {
            self.ping.record(now.saturating_duration_since(sent).as_millis() as u32);
        }
    }

    /// Assigns the next send sequence number on `channel` and, for
    /// `Reliable`/`ReliableOrdered`/`ReliableSequenced`, files the
    /// payload away for potential resend.
    pub fn prepare_send(&mut self, channel: Channel, mode: SendMode, payload: Vec<u8>, now: Instant) -> u32 {
        let state = &mut self.channels[channel.index()];
        let seq = state.next_send_sequence;
        state.next_send_sequence = state.next_send_sequence.wrapping_add(1);
        if matches!(mode, SendMode::Reliable | SendMode::ReliableOrdered | SendMode::ReliableSequenced) {
            state.unacked.push_back(PendingReliable {
                sequence: seq,
                payload,
                sent_at: now,
                first_sent_at: now,
            });
        }
        seq
    }

    pub fn acknowledge(&mut self, channel: Channel, sequence: u32) {
        let state = &mut self.channels[channel.index()];
        state.unacked.retain(|p| p.sequence != sequence);
    }

    /// Payloads due for resend (sent over `RESEND_INTERVAL` ago and
    /// still unacked), advancing their `sent_at` stamp. Entries waiting
    /// longer than `RESEND_GIVE_UP` are dropped rather than resent
    /// indefinitely; the caller should treat that peer as timed out.
    pub fn due_resends(&mut self, now: Instant) -> Vec<(Channel, Vec<u8>)> {
        let mut out = Vec::new();
        for (idx, state) in self.channels.iter_mut().enumerate() {
            state.unacked.retain(|p| now.saturating_duration_since(p.first_sent_at) < RESEND_GIVE_UP);
            for pending in state.unacked.iter_mut() {
                if now.saturating_duration_since(pending.sent_at) >= RESEND_INTERVAL {
                    pending.sent_at = now;
                    out.push((channel_from_index(idx), pending.payload.clone()));
                }
            }
        }
        out
    }

    pub fn has_timed_out(&self, now: Instant, timeout: Duration) -> bool {
        self.idle_for(now) >= timeout
    }

    /// Accepts an incoming sequenced or ordered message, returning the
    /// payloads now in order to deliver (possibly more than one, if
    /// earlier out-of-order arrivals can now be released; possibly
    /// none, if this message must wait for an earlier one).
    pub fn accept(&mut self, channel: Channel, mode: SendMode, sequence: u32, payload: Vec<u8>) -> Vec<Vec<u8>> {
        let state = &mut self.channels[channel.index()];
        match mode {
            SendMode::Unreliable | SendMode::Reliable => {
                if state.mark_received(sequence) {
                    vec![payload]
                } else {
                    Vec::new()
                }
            }
            SendMode::UnreliableSequenced | SendMode::ReliableSequenced => {
                let newer = state.highest_seen_sequence.map_or(true, |highest| sequence_is_newer(sequence, highest));
                if newer {
                    state.highest_seen_sequence = Some(sequence);
                    vec![payload]
                } else {
                    Vec::new()
                }
            }
            SendMode::ReliableOrdered => {
                if sequence == state.next_expected_sequence {
                    state.next_expected_sequence = state.next_expected_sequence.wrapping_add(1);
                    let mut ready = vec![payload];
                    while let Some(pos) = state
                        .reorder_buffer
                        .iter()
                        .position(|(seq, _)| *seq == state.next_expected_sequence)
                    {
                        let (seq, buf) = state.reorder_buffer.remove(pos).unwrap();
                        state.next_expected_sequence = seq.wrapping_add(1);
                        ready.push(buf);
                    }
                    ready
                } else if sequence_is_newer(sequence, state.next_expected_sequence) {
                    state.reorder_buffer.push_back((sequence, payload));
                    Vec::new()
                } else {
                    Vec::new() // duplicate or already-delivered
                }
            }
        }
    }
}

fn channel_from_index(idx: usize) -> Channel {
    match idx {
        0 => Channel::Internal,
        1 => Channel::SyncPacket,
        2 => Channel::SyncRpc,
        3 => Channel::Unordered,
        4 => Channel::Reliable,
        5 => Channel::DownloadRequest,
        other => {
            // Channels above the six named ones are plain numbered
            // reliable-ordered lanes; Internal is a safe placeholder
            // index-wise since callers only use this to tag the
            // resend payload's channel for re-transmission.
            let _ = other;
            Channel::Internal
        }
    }
}

fn sequence_is_newer(candidate: u32, baseline: u32) -> bool {
    candidate.wrapping_sub(baseline) < (u32::MAX / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reliable_ordered_releases_in_order_after_buffering() {
        let mut ch = PeerChannel::new(Instant::now());
        assert!(ch.accept(Channel::Reliable, SendMode::ReliableOrdered, 2, b"b".to_vec()).is_empty());
        assert!(ch.accept(Channel::Reliable, SendMode::ReliableOrdered, 1, b"a".to_vec()).is_empty());
        let ready = ch.accept(Channel::Reliable, SendMode::ReliableOrdered, 0, b"z".to_vec());
        assert_eq!(ready, vec![b"z".to_vec(), b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn sequenced_drops_stale_duplicate() {
        let mut ch = PeerChannel::new(Instant::now());
        assert_eq!(ch.accept(Channel::Unordered, SendMode::UnreliableSequenced, 5, b"new".to_vec()), vec![b"new".to_vec()]);
        assert!(ch.accept(Channel::Unordered, SendMode::UnreliableSequenced, 3, b"stale".to_vec()).is_empty());
    }

    #[test]
    fn acknowledge_removes_from_resend_queue() {
        let mut ch = PeerChannel::new(Instant::now());
        let seq = ch.prepare_send(Channel::Reliable, SendMode::Reliable, b"payload".to_vec(), Instant::now());
        ch.acknowledge(Channel::Reliable, seq);
        let later = Instant::now() + RESEND_INTERVAL + Duration::from_millis(1);
        assert!(ch.due_resends(later).is_empty());
    }

    #[test]
    fn reliable_resend_is_not_delivered_twice() {
        let mut ch = PeerChannel::new(Instant::now());
        let first = ch.accept(Channel::Reliable, SendMode::Reliable, 7, b"payload".to_vec());
        let retransmit = ch.accept(Channel::Reliable, SendMode::Reliable, 7, b"payload".to_vec());
        assert_eq!(first, vec![b"payload".to_vec()]);
        assert!(retransmit.is_empty());
    }

    #[test]
    fn unreliable_duplicate_is_dropped() {
        let mut ch = PeerChannel::new(Instant::now());
        let first = ch.accept(Channel::Unordered, SendMode::Unreliable, 3, b"a".to_vec());
        let dup = ch.accept(Channel::Unordered, SendMode::Unreliable, 3, b"a".to_vec());
        assert_eq!(first, vec![b"a".to_vec()]);
        assert!(dup.is_empty());
    }

    #[test]
    fn ping_history_tracks_average_and_lowest() {
        let mut ping = PingHistory::new();
        for sample in [40, 60, 20, 80] {
            ping.record(sample);
        }
        assert_eq!(ping.last(), 80);
        assert_eq!(ping.lowest(), 20);
        assert_eq!(ping.average(), 50);
    }
}
