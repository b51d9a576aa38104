//! The runtime core: pools, dispatchers, transport, and motion engine
//! wired together behind one fixed five-phase tick (§5, §14). Grounded
//! on the reference `neutronium::world::World::run`'s
//! compute-delta-then-run-systems-then-sleep-remainder shape; the ECS
//! system schedule is replaced with the fixed phase sequence §5 names.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use slog::{debug, info, o, trace, warn, Logger};

use crate::demux::Demultiplexer;
use crate::dispatch::{Handler, Priority};
use crate::events::CoreEvents;
use crate::ids::{ObjectId, PlayerId, VehicleId, PLAYER_POOL_SIZE, VEHICLE_POOL_SIZE};
use crate::model::object::GlobalObjectPool;
use crate::model::player::Player;
use crate::model::vehicle::Vehicle;
use crate::motion::MotionEngine;
use crate::net::{evaluate_handshake, Channel, Endpoint, HandshakeOutcome, Incoming, SendMode};
use crate::pool::{LifetimeMode, Pool};
use wireproto::error::NetworkResult;

/// Server-wide settings the tick loop and handshake evaluator consult;
/// `sampgame` populates this from the configuration schema (§11.3).
pub struct WorldConfig {
    pub bind_address: SocketAddr,
    pub protocol_version: u32,
    pub allow_modded_clients: bool,
    pub max_players: usize,
    pub tick_duration: Duration,
    pub debug_timeouts: bool,
}

/// The running server: every pool, the transport endpoint, the motion
/// engine, and the demultiplexer that fans decoded messages out to
/// registered listeners.
pub struct World {
    pub players: Pool<Player>,
    pub vehicles: Pool<Vehicle>,
    pub objects: GlobalObjectPool,
    pub motion: MotionEngine,
    pub demux: Demultiplexer,
    pub endpoint: Endpoint,
    pub events: CoreEvents,
    config: WorldConfig,
    player_addrs: HashMap<PlayerId, SocketAddr>,
    addr_players: HashMap<SocketAddr, PlayerId>,
    /// Objects owned by a player's per-player pool rather than the global
    /// one; motion completion on one of these fires `on_player_object_moved`
    /// instead of `on_moved` (§4.4).
    player_object_owner: HashMap<ObjectId, PlayerId>,
    log: Logger,
    last_tick: Option<Instant>,
}

impl World {
    pub fn new(config: WorldConfig, log: Logger) -> NetworkResult<Self> {
        let mut endpoint = Endpoint::bind(config.bind_address)?;
        endpoint.set_debug_timeouts(config.debug_timeouts);
        Ok(World {
            players: Pool::new(0, PLAYER_POOL_SIZE, LifetimeMode::Marked),
            vehicles: Pool::new(0, VEHICLE_POOL_SIZE, LifetimeMode::Immediate),
            objects: GlobalObjectPool::new(),
            motion: MotionEngine::new(),
            demux: Demultiplexer::new(),
            endpoint,
            events: CoreEvents::new(),
            config,
            player_addrs: HashMap::new(),
            addr_players: HashMap::new(),
            player_object_owner: HashMap::new(),
            log: log.new(o!("component" => "world")),
            last_tick: None,
        })
    }

    /// Registers a core event handler at the given priority (§4.5).
    pub fn add_event_handler(&mut self, handler: Handler<dyn crate::events::CoreEventHandler>, priority: Priority) -> bool {
        self.events.add(handler, priority)
    }

    /// Marks `object` as belonging to `player`'s per-player pool, so its
    /// motion completion fires `on_player_object_moved` rather than
    /// `on_moved` (§4.4, §15.2).
    pub fn register_player_object(&mut self, object: ObjectId, player: PlayerId) {
        self.player_object_owner.insert(object, player);
    }

    pub fn unregister_player_object(&mut self, object: ObjectId) {
        self.player_object_owner.remove(&object);
    }

    fn free_player_slot(&self) -> bool {
        self.players.len() < self.config.max_players.min(PLAYER_POOL_SIZE)
    }

    fn name_is_valid(name: &str) -> bool {
        !name.is_empty() && name.len() <= 24 && name.chars().all(|c| c.is_ascii_alphanumeric() || "[]()$@._=".contains(c))
    }

    /// Phase 1+2+3: drain the socket, run reliability bookkeeping
    /// (handled inside `Endpoint::poll`), and dispatch decoded
    /// packets/RPCs through the demultiplexer.
    fn drain_network(&mut self) {
        for event in self.endpoint.poll() {
            match event {
                Incoming::PeerConnectRequested(addr, request) => {
                    // §4.2 fixed handshake event order: peer-connect, then
                    // incoming-connection, then (on success) player-connect.
                    self.events.all(|h| h.on_peer_connect(addr));
                    self.events.all(|h| h.on_incoming_connection(addr, &request));

                    let outcome = evaluate_handshake(
                        &request,
                        self.config.protocol_version,
                        self.config.allow_modded_clients,
                        self.free_player_slot(),
                        Self::name_is_valid(&request.name),
                    );
                    match outcome {
                        HandshakeOutcome::Success => {
                            let name = request.name.clone();
                            let player = match self.players.claim(|id| Player::new(PlayerId(id as u16), name, request)) {
                                Some(id) => id,
                                None => {
                                    self.endpoint.reject_handshake(addr);
                                    continue;
                                }
                            };
                            self.endpoint.complete_handshake(addr, Instant::now());
                            let pid = PlayerId(player as u16);
                            self.player_addrs.insert(pid, addr);
                            self.addr_players.insert(addr, pid);
                            info!(self.log, "player connected"; "player" => player, "addr" => addr.to_string());
                            self.events.all(|h| h.on_player_connect(pid));
                        }
                        other => {
                            warn!(self.log, "handshake rejected"; "addr" => addr.to_string(), "outcome" => format!("{:?}", other));
                            self.endpoint.reject_handshake(addr);
                        }
                    }
                }
                Incoming::Payload(addr, channel, payload) => {
                    let pid = match self.addr_players.get(&addr) {
                        Some(pid) => *pid,
                        None => continue,
                    };
                    if payload.is_empty() {
                        continue;
                    }
                    let id = payload[0];
                    let mut bs = wireproto::bitstream::BitStream::from_bytes(&payload[1..]);
                    if channel == Channel::SyncRpc || channel == Channel::Internal {
                        self.demux.dispatch_rpc(pid.get() as u64, id, &mut bs);
                    } else {
                        self.demux.dispatch_packet(channel, pid.get() as u64, id, &mut bs);
                    }
                }
                Incoming::Disconnected(addr, reason) => {
                    if let Some(pid) = self.addr_players.remove(&addr) {
                        self.player_addrs.remove(&pid);
                        self.motion.force_detach_from(crate::motion::AttachTarget::Player(pid));
                        self.players.release(pid.get() as usize);
                        debug!(self.log, "player disconnected"; "player" => pid.get(), "reason" => format!("{:?}", reason));
                        self.events.all(|h| h.on_player_disconnect(pid));
                    }
                }
            }
        }
    }

    /// Phase 4: advance the motion engine's processed set, firing
    /// `on_moved`/`on_player_object_moved` exactly once per object that
    /// finishes travelling this tick (§4.4).
    fn advance_motion(&mut self, elapsed: Duration) {
        let completed = self.motion.advance(elapsed, Instant::now());
        for id in completed {
            trace!(self.log, "object move completed"; "object" => id.get());
            match self.player_object_owner.get(&id) {
                Some(&player) => self.events.all(|h| h.on_player_object_moved(player, id)),
                None => self.events.all(|h| h.on_moved(id)),
            }
        }
    }

    /// Runs exactly one tick: drain socket, dispatch, advance motion, fire
    /// `on_tick`, and return the elapsed wall-clock delta used, matching
    /// the reference `World::run`'s per-iteration delta computation (§5
    /// phase 5 fires `on_tick` last, after every other phase has run).
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = match self.last_tick {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::ZERO,
        };
        self.last_tick = Some(now);

        self.drain_network();
        self.advance_motion(elapsed);
        self.events.all(|h| h.on_tick(elapsed, now));

        elapsed
    }

    /// Runs ticks back to back, sleeping the remainder of the configured
    /// tick duration after each one, forever. `sampserver`'s main loop
    /// calls this directly; tests drive `tick()` without the sleep.
    pub fn run(&mut self) -> ! {
        loop {
            let started = Instant::now();
            self.tick();
            let spent = started.elapsed();
            if spent < self.config.tick_duration {
                std::thread::sleep(self.config.tick_duration - spent);
            }
        }
    }

    pub fn send_to(&mut self, player: PlayerId, channel: Channel, mode: SendMode, payload: Vec<u8>) -> NetworkResult<()> {
        let addr = *self
            .player_addrs
            .get(&player)
            .ok_or(wireproto::error::NetworkError::Fatal(wireproto::error::ErrorKind::BadArgument))?;
        self.endpoint.send(addr, channel, mode, payload)
    }

    pub fn vehicle_claim(&mut self, build: impl FnOnce(VehicleId) -> Vehicle) -> Option<VehicleId> {
        self.vehicles.claim(|id| build(VehicleId(id as u16))).map(|id| VehicleId(id as u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_log() -> Logger {
        slog::Logger::root(slog::Discard, o!())
    }

    fn test_config(port: u16) -> WorldConfig {
        WorldConfig {
            bind_address: format!("127.0.0.1:{}", port).parse().unwrap(),
            protocol_version: 1,
            allow_modded_clients: false,
            max_players: 10,
            tick_duration: Duration::from_millis(20),
            debug_timeouts: false,
        }
    }

    #[test]
    fn world_binds_and_runs_a_tick_with_no_traffic() {
        let mut world = World::new(test_config(17771), test_log()).unwrap();
        let elapsed = world.tick();
        assert_eq!(elapsed, Duration::ZERO);
        assert_eq!(world.players.len(), 0);
    }

    #[test]
    fn name_validation_rejects_empty_and_overlong_names() {
        assert!(!World::name_is_valid(""));
        assert!(!World::name_is_valid(&"x".repeat(30)));
        assert!(World::name_is_valid("Player_One"));
    }

    #[test]
    fn on_tick_fires_once_per_tick() {
        use crate::events::CoreEventHandler;
        use std::cell::RefCell;
        use std::rc::Rc;

        #[derive(Default)]
        struct TickCounter(usize);
        impl CoreEventHandler for TickCounter {
            fn on_tick(&mut self, _elapsed: Duration, _now: Instant) {
                self.0 += 1;
            }
        }

        let mut world = World::new(test_config(17772), test_log()).unwrap();
        let counter = Rc::new(RefCell::new(TickCounter::default()));
        world.add_event_handler(counter.clone(), crate::dispatch::PRIORITY_DEFAULT);

        world.tick();
        world.tick();
        world.tick();

        assert_eq!(counter.borrow().0, 3);
    }

    #[test]
    fn moved_object_fires_on_player_object_moved_only_when_owned() {
        use crate::events::CoreEventHandler;
        use crate::motion::{ObjectMoveData, Vec3};
        use std::cell::RefCell;
        use std::rc::Rc;

        #[derive(Default)]
        struct Recorder {
            moved: Vec<ObjectId>,
            player_moved: Vec<(PlayerId, ObjectId)>,
        }
        impl CoreEventHandler for Recorder {
            fn on_moved(&mut self, object: ObjectId) {
                self.moved.push(object);
            }
            fn on_player_object_moved(&mut self, player: PlayerId, object: ObjectId) {
                self.player_moved.push((player, object));
            }
        }

        let mut world = World::new(test_config(17773), test_log()).unwrap();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        world.add_event_handler(recorder.clone(), crate::dispatch::PRIORITY_DEFAULT);

        let global_obj = ObjectId(1);
        let owned_obj = ObjectId(2);
        let owner = PlayerId(0);
        world.motion.register(global_obj, Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0));
        world.motion.register(owned_obj, Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0));
        world.register_player_object(owned_obj, owner);

        let move_data = ObjectMoveData {
            target_pos: Vec3::new(1.0, 0.0, 0.0),
            target_rot: Vec3::new(-1000.0, -1000.0, -1000.0),
            speed: 1.0,
        };
        world.motion.get_mut(global_obj).unwrap().begin_move(move_data);
        world.motion.get_mut(owned_obj).unwrap().begin_move(move_data);

        world.advance_motion(Duration::from_secs(2));

        assert_eq!(recorder.borrow().moved, vec![global_obj]);
        assert_eq!(recorder.borrow().player_moved, vec![(owner, owned_obj)]);
    }
}
