//! Object motion engine (§4.4). Grounded on
//! `Server/Components/Objects/object.hpp`'s `moveRPC`/`advanceMove` and
//! `object.cpp`'s delayed-processing handling around
//! `delayedProcessing_`/`delayedProcessingTime_`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::ids::ObjectId;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }

    pub fn distance(self, other: Vec3) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }

    fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    fn scaled(self, factor: f32) -> Vec3 {
        Vec3::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

/// Parameters of an in-flight `MoveObject` RPC; `target_rot` components
/// `<= -1000.0` mean "keep whatever rotation the object currently has on
/// that axis", resolved once at the start of the move in
/// [`MotionState::begin_move`].
#[derive(Copy, Clone, Debug)]
pub struct ObjectMoveData {
    pub target_pos: Vec3,
    pub target_rot: Vec3,
    /// World units per second.
    pub speed: f32,
}

/// Target to which an object can be welded (§4.4): the object follows
/// the target's position/rotation plus a fixed offset every tick the
/// target moves, instead of running its own motion timeline.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AttachTarget {
    Player(crate::ids::PlayerId),
    Vehicle(crate::ids::VehicleId),
    Object(ObjectId),
}

#[derive(Copy, Clone, Debug)]
pub struct Attachment {
    pub target: AttachTarget,
    pub offset: Vec3,
    pub rotation: Vec3,
}

/// Per-object motion timeline: position/rotation plus whatever move is
/// currently in flight. One instance per pooled object; the pool itself
/// only stores entity attributes, this is the subset that needs
/// per-tick advancement.
pub struct MotionState {
    pub pos: Vec3,
    pub rot: Vec3,
    moving: bool,
    move_data: Option<ObjectMoveData>,
    rot_speed: f32, // NaN when rotDistance was 0 at move start
    attachment: Option<Attachment>,
}

impl MotionState {
    pub fn new(pos: Vec3, rot: Vec3) -> Self {
        MotionState { pos, rot, moving: false, move_data: None, rot_speed: f32::NAN, attachment: None }
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn set_attachment(&mut self, attachment: Option<Attachment>) {
        self.attachment = attachment;
    }

    /// Starts a move: resolves "keep current" rotation sentinels and
    /// derives `rot_speed` from the distance ratio, matching `moveRPC`.
    pub fn begin_move(&mut self, mut data: ObjectMoveData) {
        if data.target_rot.x <= -1000.0 {
            data.target_rot.x = self.rot.x;
        }
        if data.target_rot.y <= -1000.0 {
            data.target_rot.y = self.rot.y;
        }
        if data.target_rot.z <= -1000.0 {
            data.target_rot.z = self.rot.z;
        }

        let rot_distance = self.rot.distance(data.target_rot);
        self.rot_speed = if rot_distance == 0.0 {
            f32::NAN
        } else {
            rot_distance * data.speed / self.pos.distance(data.target_pos)
        };
        self.moving = true;
        self.move_data = Some(data);
    }

    pub fn stop_move(&mut self) {
        self.moving = false;
        self.move_data = None;
    }

    /// Advances the current move by `elapsed`. Returns `true` if the
    /// move completed this call (target reached exactly), mirroring
    /// `advanceMove`'s return value, which callers use to fire a
    /// `MoveObject` completion event.
    ///
    /// The translation ratio is computed unconditionally because a
    /// non-moving or already-arrived object takes the early-return
    /// branch above before it is ever divided by; the rotation ratio
    /// guards its divisor against `f32::EPSILON` because it is reached
    /// even while still translating whenever the rotation already
    /// arrived (`travelled_rotation` can be exactly zero there). This
    /// asymmetry is carried over from the reference unchanged.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if !self.moving {
            return false;
        }
        let data = self.move_data.expect("moving implies move_data is set");
        let elapsed_secs = elapsed.as_secs_f32();

        let remaining_distance = self.pos.distance(data.target_pos);
        let travelled_distance = elapsed_secs * data.speed;

        if travelled_distance >= remaining_distance {
            self.moving = false;
            self.pos = data.target_pos;
            if !self.rot_speed.is_nan() {
                self.rot = data.target_rot;
            }
            return true;
        }

        let ratio = remaining_distance / travelled_distance;
        self.pos = self.pos.add(data.target_pos.sub(self.pos).scaled(1.0 / ratio));

        if !self.rot_speed.is_nan() {
            let remaining_rotation = self.rot.distance(data.target_rot);
            let travelled_rotation = elapsed_secs * self.rot_speed;
            if travelled_rotation > f32::EPSILON {
                let rotation_ratio = remaining_rotation / travelled_rotation;
                self.rot = self.rot.add(data.target_rot.sub(self.rot).scaled(1.0 / rotation_ratio));
            }
        }

        false
    }
}

/// One-second stream-in handshake and attachment graph bookkeeping
/// shared across every object (§4.4). Per-player objects additionally
/// key the delayed-processing set by the viewing player id (object.cpp
/// tracks this per-player since a global object can be "delayed" for
/// one observer and already settled for another); this engine models
/// that as `(object, Option<player>)`.
pub struct MotionEngine {
    states: HashMap<ObjectId, MotionState>,
    delayed_until: HashMap<(ObjectId, Option<crate::ids::PlayerId>), Instant>,
}

impl Default for MotionEngine {
    fn default() -> Self {
        MotionEngine { states: HashMap::new(), delayed_until: HashMap::new() }
    }
}

impl MotionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: ObjectId, pos: Vec3, rot: Vec3) {
        self.states.insert(id, MotionState::new(pos, rot));
    }

    pub fn unregister(&mut self, id: ObjectId) {
        self.states.remove(&id);
        self.delayed_until.retain(|(obj, _), _| *obj != id);
    }

    pub fn get(&self, id: ObjectId) -> Option<&MotionState> {
        self.states.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut MotionState> {
        self.states.get_mut(&id)
    }

    /// Marks `id` as needing a one-second delayed restream for `player`
    /// (stream-in handshake: the client must finish loading the model
    /// before attachment/material RPCs are meaningful).
    pub fn add_to_processed(&mut self, id: ObjectId, player: Option<crate::ids::PlayerId>, now: Instant) {
        self.delayed_until.insert((id, player), now + Duration::from_secs(1));
    }

    /// Cancels a pending delay outright. `force` is accepted for parity
    /// with the reference's `eraseFromProcessed(force)` but has no
    /// separate branch here: the reference's `force` skips an
    /// is-it-still-marked check that this map-based representation
    /// never needs, since removing an absent key is already a no-op.
    pub fn erase_from_processed(&mut self, id: ObjectId, player: Option<crate::ids::PlayerId>, _force: bool) {
        self.delayed_until.remove(&(id, player));
    }

    pub fn is_delayed(&self, id: ObjectId, player: Option<crate::ids::PlayerId>) -> bool {
        self.delayed_until.contains_key(&(id, player))
    }

    /// Runs one tick: settles expired delayed-processing entries and
    /// advances every object's motion by `elapsed`, skipping objects
    /// currently attached (their position is derived, not simulated).
    /// Returns the ids whose move completed this tick.
    pub fn advance(&mut self, elapsed: Duration, now: Instant) -> Vec<ObjectId> {
        self.delayed_until.retain(|_, deadline| *deadline > now);

        let mut completed = Vec::new();
        for (id, state) in self.states.iter_mut() {
            if state.attachment.is_some() {
                continue;
            }
            if state.advance(elapsed) {
                completed.push(*id);
            }
        }
        completed
    }

    /// Resolves an attached object's effective world position, following
    /// its target's own (already-resolved) transform. Returns `None` if
    /// the target object isn't registered (e.g. it has since despawned;
    /// callers should treat that as "force-detach").
    pub fn resolve_attached_position(&self, id: ObjectId) -> Option<(Vec3, Vec3)> {
        let state = self.states.get(&id)?;
        let attachment = state.attachment.as_ref()?;
        match attachment.target {
            AttachTarget::Object(target_id) => {
                let target = self.states.get(&target_id)?;
                let (base_pos, base_rot) = match target.attachment {
                    Some(_) => self.resolve_attached_position(target_id)?,
                    None => (target.pos, target.rot),
                };
                Some((base_pos.add(attachment.offset), base_rot.add(attachment.rotation)))
            }
            _ => Some((attachment.offset, attachment.rotation)),
        }
    }

    /// Whether attaching `id` to `target` would create a cycle in the
    /// object-to-object attachment graph (§4.4 invariant). Player and
    /// vehicle targets can never cycle back to an object.
    pub fn would_cycle(&self, id: ObjectId, target: AttachTarget) -> bool {
        let mut cursor = match target {
            AttachTarget::Object(target_id) => target_id,
            _ => return false,
        };
        loop {
            if cursor == id {
                return true;
            }
            match self.states.get(&cursor).and_then(|s| s.attachment.as_ref()) {
                Some(Attachment { target: AttachTarget::Object(next), .. }) => cursor = *next,
                _ => return false,
            }
        }
    }

    /// Detaches every object attached (directly or via a chain) to
    /// `target`, used when a player disconnects or a vehicle/object is
    /// destroyed while things are welded to it.
    pub fn force_detach_from(&mut self, target: AttachTarget) {
        for state in self.states.values_mut() {
            if state.attachment.as_ref().map(|a| a.target) == Some(target) {
                state.attachment = None;
            }
        }
    }
}
