//! Packet/RPC demultiplexer (§4.6). Grounded on
//! `SDK/include/network.hpp`'s `NetworkInEventHandler` /
//! `SingleNetworkInEventHandler` / `NetworkOutEventHandler` /
//! `SingleNetworkOutEventHandler` pair: one unindexed dispatcher that
//! sees every message regardless of id, and 256 id-keyed dispatchers
//! that see only messages for their specific id. The reference runs the
//! global handler first and only proceeds to the indexed handler if it
//! didn't veto; this module keeps that order for both the incoming and
//! outgoing directions.

use crate::dispatch::{EventDispatcher, Handler, IndexedEventDispatcher};
use crate::net::Channel;
use wireproto::bitstream::BitStream;
use wireproto::UserId;

const ID_SPACE: usize = 256;

/// Sees every inbound packet or RPC before it reaches an id-specific
/// handler; returning `false` drops the message silently.
pub trait NetworkInHandler {
    fn on_receive_packet(&mut self, peer: UserId, id: u8, bs: &mut BitStream) -> bool {
        let _ = (peer, id, bs);
        true
    }
    fn on_receive_rpc(&mut self, peer: UserId, id: u8, bs: &mut BitStream) -> bool {
        let _ = (peer, id, bs);
        true
    }
}

/// Bound to exactly one packet or RPC id.
pub trait SingleNetworkInHandler {
    fn on_receive(&mut self, peer: UserId, bs: &mut BitStream) -> bool;
}

/// Sees every outbound packet or RPC before it is handed to the socket;
/// returning `false` cancels the send.
pub trait NetworkOutHandler {
    fn on_send_packet(&mut self, peer: Option<UserId>, id: u8, bs: &mut BitStream) -> bool {
        let _ = (peer, id, bs);
        true
    }
    fn on_send_rpc(&mut self, peer: Option<UserId>, id: u8, bs: &mut BitStream) -> bool {
        let _ = (peer, id, bs);
        true
    }
}

pub trait SingleNetworkOutHandler {
    fn on_send(&mut self, peer: Option<UserId>, bs: &mut BitStream) -> bool;
}

/// Fans incoming/outgoing packets and RPCs out to global and id-scoped
/// handlers. One instance serves both directions; packets and RPCs get
/// independent id spaces since the legacy protocol's packet ids and RPC
/// ids are unrelated namespaces (both carried as a single leading byte,
/// hence a 256-entry table each, matching `Channel`'s `u8` id width).
pub struct Demultiplexer {
    packets_in: EventDispatcher<dyn NetworkInHandler>,
    rpcs_in: EventDispatcher<dyn NetworkInHandler>,
    packet_in_by_id: IndexedEventDispatcher<dyn SingleNetworkInHandler>,
    rpc_in_by_id: IndexedEventDispatcher<dyn SingleNetworkInHandler>,

    packets_out: EventDispatcher<dyn NetworkOutHandler>,
    rpcs_out: EventDispatcher<dyn NetworkOutHandler>,
    packet_out_by_id: IndexedEventDispatcher<dyn SingleNetworkOutHandler>,
    rpc_out_by_id: IndexedEventDispatcher<dyn SingleNetworkOutHandler>,
}

impl Default for Demultiplexer {
    fn default() -> Self {
        Demultiplexer {
            packets_in: EventDispatcher::new(),
            rpcs_in: EventDispatcher::new(),
            packet_in_by_id: IndexedEventDispatcher::new(ID_SPACE),
            rpc_in_by_id: IndexedEventDispatcher::new(ID_SPACE),
            packets_out: EventDispatcher::new(),
            rpcs_out: EventDispatcher::new(),
            packet_out_by_id: IndexedEventDispatcher::new(ID_SPACE),
            rpc_out_by_id: IndexedEventDispatcher::new(ID_SPACE),
        }
    }
}

impl Demultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_global_in(&mut self, handler: Handler<dyn NetworkInHandler>) -> bool {
        self.packets_in.add_default(handler.clone()) && self.rpcs_in.add_default(handler)
    }

    pub fn add_packet_handler(&mut self, id: u8, handler: Handler<dyn SingleNetworkInHandler>) -> bool {
        self.packet_in_by_id.add(id as usize, handler, crate::dispatch::PRIORITY_DEFAULT)
    }

    pub fn add_rpc_handler(&mut self, id: u8, handler: Handler<dyn SingleNetworkInHandler>) -> bool {
        self.rpc_in_by_id.add(id as usize, handler, crate::dispatch::PRIORITY_DEFAULT)
    }

    pub fn add_global_out(&mut self, handler: Handler<dyn NetworkOutHandler>) -> bool {
        self.packets_out.add_default(handler.clone()) && self.rpcs_out.add_default(handler)
    }

    pub fn add_packet_out_handler(&mut self, id: u8, handler: Handler<dyn SingleNetworkOutHandler>) -> bool {
        self.packet_out_by_id.add(id as usize, handler, crate::dispatch::PRIORITY_DEFAULT)
    }

    pub fn add_rpc_out_handler(&mut self, id: u8, handler: Handler<dyn SingleNetworkOutHandler>) -> bool {
        self.rpc_out_by_id.add(id as usize, handler, crate::dispatch::PRIORITY_DEFAULT)
    }

    /// Dispatches an inbound packet: global handlers first, then the
    /// id-specific one. A `false` from either stage drops the message
    /// (the global stage's `stop_at_false` already short-circuits, so a
    /// vetoing global handler never even reaches the id-specific one).
    pub fn dispatch_packet(&self, channel: Channel, peer: UserId, id: u8, bs: &mut BitStream) -> bool {
        let _ = channel;
        if !self.packets_in.stop_at_false(|h| h.on_receive_packet(peer, id, bs)) {
            return false;
        }
        self.packet_in_by_id.stop_at_false(id as usize, |h| h.on_receive(peer, bs))
    }

    pub fn dispatch_rpc(&self, peer: UserId, id: u8, bs: &mut BitStream) -> bool {
        if !self.rpcs_in.stop_at_false(|h| h.on_receive_rpc(peer, id, bs)) {
            return false;
        }
        self.rpc_in_by_id.stop_at_false(id as usize, |h| h.on_receive(peer, bs))
    }

    pub fn dispatch_send_packet(&self, peer: Option<UserId>, id: u8, bs: &mut BitStream) -> bool {
        if !self.packets_out.stop_at_false(|h| h.on_send_packet(peer, id, bs)) {
            return false;
        }
        self.packet_out_by_id.stop_at_false(id as usize, |h| h.on_send(peer, bs))
    }

    pub fn dispatch_send_rpc(&self, peer: Option<UserId>, id: u8, bs: &mut BitStream) -> bool {
        if !self.rpcs_out.stop_at_false(|h| h.on_send_rpc(peer, id, bs)) {
            return false;
        }
        self.rpc_out_by_id.stop_at_false(id as usize, |h| h.on_send(peer, bs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RecordingGlobal {
        seen: Rc<RefCell<Vec<u8>>>,
        veto_id: Option<u8>,
    }
    impl NetworkInHandler for RecordingGlobal {
        fn on_receive_packet(&mut self, _peer: UserId, id: u8, _bs: &mut BitStream) -> bool {
            self.seen.borrow_mut().push(id);
            self.veto_id != Some(id)
        }
    }

    struct RecordingSingle {
        seen: Rc<RefCell<Vec<UserId>>>,
    }
    impl SingleNetworkInHandler for RecordingSingle {
        fn on_receive(&mut self, peer: UserId, _bs: &mut BitStream) -> bool {
            self.seen.borrow_mut().push(peer);
            true
        }
    }

    #[test]
    fn global_handler_runs_before_id_specific_handler() {
        let mut demux = Demultiplexer::new();
        let global_seen = Rc::new(RefCell::new(Vec::new()));
        let single_seen = Rc::new(RefCell::new(Vec::new()));

        demux.add_global_in(Rc::new(RefCell::new(RecordingGlobal { seen: global_seen.clone(), veto_id: None })));
        demux.add_packet_handler(7, Rc::new(RefCell::new(RecordingSingle { seen: single_seen.clone() })));

        let mut bs = BitStream::new();
        assert!(demux.dispatch_packet(Channel::Unordered, 42, 7, &mut bs));
        assert_eq!(*global_seen.borrow(), vec![7]);
        assert_eq!(*single_seen.borrow(), vec![42]);
    }

    #[test]
    fn global_veto_prevents_id_specific_dispatch() {
        let mut demux = Demultiplexer::new();
        let single_seen = Rc::new(RefCell::new(Vec::new()));
        demux.add_global_in(Rc::new(RefCell::new(RecordingGlobal { seen: Rc::new(RefCell::new(Vec::new())), veto_id: Some(9) })));
        demux.add_packet_handler(9, Rc::new(RefCell::new(RecordingSingle { seen: single_seen.clone() })));

        let mut bs = BitStream::new();
        assert!(!demux.dispatch_packet(Channel::Unordered, 1, 9, &mut bs));
        assert!(single_seen.borrow().is_empty());
    }

    #[test]
    fn packet_and_rpc_id_spaces_are_independent() {
        let mut demux = Demultiplexer::new();
        let packet_seen = Rc::new(RefCell::new(Vec::new()));
        let rpc_seen = Rc::new(RefCell::new(Vec::new()));
        demux.add_packet_handler(3, Rc::new(RefCell::new(RecordingSingle { seen: packet_seen.clone() })));
        demux.add_rpc_handler(3, Rc::new(RefCell::new(RecordingSingle { seen: rpc_seen.clone() })));

        let mut bs = BitStream::new();
        demux.dispatch_packet(Channel::Unordered, 1, 3, &mut bs);
        assert_eq!(*packet_seen.borrow(), vec![1]);
        assert!(rpc_seen.borrow().is_empty());
    }
}
