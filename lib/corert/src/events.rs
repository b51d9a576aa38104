//! Core domain event bus (§4.2, §4.4, §5). Grounded on `original_source/`'s
//! `PlayerEventHandler`/`ObjectEventHandler` split: registered game-mode
//! code observes connection and motion milestones through one ordered
//! dispatcher rather than peeking at transport or motion-engine internals.
//!
//! Handshake order is fixed by where `World::drain_network` calls each
//! method: `on_peer_connect`, then `on_incoming_connection`, then (only on
//! a successful handshake) `on_player_connect`. Motion completion fires
//! `on_moved` for a freestanding object or `on_player_object_moved` for one
//! owned by a player, exactly once per object per tick it finishes
//! travelling. `on_tick` fires once per server tick, after every other
//! phase has run (§5 phase 5).

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::dispatch::EventDispatcher;
use crate::ids::{ObjectId, PlayerId};
use crate::net::ConnectionRequest;

/// Handlers for the core events a running world fires. Every method
/// defaults to a no-op so a handler only needs to implement the events it
/// cares about.
pub trait CoreEventHandler {
    fn on_peer_connect(&mut self, _addr: SocketAddr) {}
    fn on_incoming_connection(&mut self, _addr: SocketAddr, _request: &ConnectionRequest) {}
    fn on_player_connect(&mut self, _player: PlayerId) {}
    fn on_player_disconnect(&mut self, _player: PlayerId) {}
    fn on_moved(&mut self, _object: ObjectId) {}
    fn on_player_object_moved(&mut self, _player: PlayerId, _object: ObjectId) {}
    fn on_tick(&mut self, _elapsed: Duration, _now: Instant) {}
}

pub type CoreEvents = EventDispatcher<dyn CoreEventHandler>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Handler;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        order: Vec<&'static str>,
        moved: Vec<ObjectId>,
        player_moved: Vec<(PlayerId, ObjectId)>,
        ticks: usize,
    }

    impl CoreEventHandler for Recorder {
        fn on_peer_connect(&mut self, _addr: SocketAddr) {
            self.order.push("peer_connect");
        }
        fn on_incoming_connection(&mut self, _addr: SocketAddr, _request: &ConnectionRequest) {
            self.order.push("incoming_connection");
        }
        fn on_player_connect(&mut self, _player: PlayerId) {
            self.order.push("player_connect");
        }
        fn on_moved(&mut self, object: ObjectId) {
            self.moved.push(object);
        }
        fn on_player_object_moved(&mut self, player: PlayerId, object: ObjectId) {
            self.player_moved.push((player, object));
        }
        fn on_tick(&mut self, _elapsed: Duration, _now: Instant) {
            self.ticks += 1;
        }
    }

    fn sample_request() -> ConnectionRequest {
        ConnectionRequest {
            protocol_version: 1,
            modded: false,
            name: "Player".into(),
            challenge_response: 0,
            auth_token: String::new(),
            version_string: "0.3.7".into(),
        }
    }

    #[test]
    fn handshake_events_fire_in_fixed_order() {
        let mut events: CoreEvents = EventDispatcher::new();
        let handler: Handler<dyn CoreEventHandler> = Rc::new(RefCell::new(Recorder::default()));
        events.add_default(handler.clone());

        let addr: SocketAddr = "127.0.0.1:7777".parse().unwrap();
        let request = sample_request();
        events.all(|h| h.on_peer_connect(addr));
        events.all(|h| h.on_incoming_connection(addr, &request));
        events.all(|h| h.on_player_connect(PlayerId(0)));

        assert_eq!(handler.borrow().order, vec!["peer_connect", "incoming_connection", "player_connect"]);
    }

    #[test]
    fn moved_event_fires_once_and_distinguishes_player_objects() {
        let mut events: CoreEvents = EventDispatcher::new();
        let handler: Handler<dyn CoreEventHandler> = Rc::new(RefCell::new(Recorder::default()));
        events.add_default(handler.clone());

        events.all(|h| h.on_moved(ObjectId(1)));
        events.all(|h| h.on_player_object_moved(PlayerId(0), ObjectId(2)));

        assert_eq!(handler.borrow().moved, vec![ObjectId(1)]);
        assert_eq!(handler.borrow().player_moved, vec![(PlayerId(0), ObjectId(2))]);
    }
}
