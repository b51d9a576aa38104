//! Object / PlayerObject entity records (§3.2) and the shared-ID
//! discipline between the global object pool and each player's private
//! object pool (§3.3, §4.3 "Shared ID discipline").

use crate::ids::{ObjectId, OBJECT_MATERIAL_SLOTS, OBJECT_POOL_SIZE};
use crate::model::player::Quat;
use crate::motion::{AttachTarget, Vec3};
use crate::pool::Pool;

#[derive(Copy, Clone, Debug, Default)]
pub struct MaterialOverride {
    pub model: i16,
    pub texture_library: Option<u32>,
    pub texture_name: Option<u32>,
    pub colour: u32,
}

pub struct Object {
    pub id: ObjectId,
    pub model: i32,
    pub draw_distance: f32,
    pub camera_collision: bool,
    pub attachment: Option<AttachTarget>,
    pub materials: [MaterialOverride; OBJECT_MATERIAL_SLOTS],
}

impl Object {
    pub fn new(id: ObjectId, model: i32) -> Self {
        Object {
            id,
            model,
            draw_distance: 0.0,
            camera_collision: true,
            attachment: None,
            materials: [MaterialOverride::default(); OBJECT_MATERIAL_SLOTS],
        }
    }
}

/// A per-player object: identical attribute shape to [`Object`], but
/// only visible to (and only claimed from the pool of) its owning
/// player.
pub struct PlayerObject {
    pub object: Object,
}

impl PlayerObject {
    pub fn new(id: ObjectId, model: i32) -> Self {
        PlayerObject { object: Object::new(id, model) }
    }
}

/// The global object pool plus the shared-counter bookkeeping that
/// keeps it from handing out an index a per-player object already
/// occupies.
pub struct GlobalObjectPool {
    pool: Pool<Object>,
    /// Per-index count of per-player objects currently claiming this
    /// index across every player. Nonzero blocks the global allocator
    /// from claiming that index.
    shared_counters: Vec<u8>,
}

impl GlobalObjectPool {
    pub fn new() -> Self {
        GlobalObjectPool {
            pool: Pool::new(1, OBJECT_POOL_SIZE, crate::pool::LifetimeMode::Marked),
            shared_counters: vec![0; OBJECT_POOL_SIZE],
        }
    }

    pub fn pool(&self) -> &Pool<Object> {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut Pool<Object> {
        &mut self.pool
    }

    /// Claims the lowest index free in *both* the global pool's own
    /// bitset and the shared-counter table.
    pub fn claim(&mut self, build: impl FnOnce(ObjectId) -> Object) -> Option<ObjectId> {
        let mut from = self.pool.lower();
        loop {
            let candidate = self.pool.find_free_index_from(from)?;
            if self.shared_counters[candidate] == 0 {
                let id = self.pool.claim_hint(candidate, |idx| build(ObjectId(idx as u16)))?;
                return Some(ObjectId(id as u16));
            }
            from = candidate + 1;
        }
    }

    /// Records that a per-player object has claimed `index`, blocking
    /// the global pool from claiming it until released.
    pub fn mark_shared(&mut self, index: usize) {
        self.shared_counters[index] = self.shared_counters[index].saturating_add(1);
    }

    /// Releases one per-player claim on `index`. Once every player sharing
    /// this index has released it the counter returns to zero and the
    /// global pool is free to claim it again, matching the counter-based
    /// `isPlayerObject`/`incrementPlayerCounter`/`decrementPlayerCounter`
    /// scheme it's grounded on: a slot is blocked only while some player
    /// actually occupies it, not permanently.
    pub fn unmark_shared(&mut self, index: usize) {
        if self.shared_counters[index] > 0 {
            self.shared_counters[index] -= 1;
        }
    }

    pub fn is_shared(&self, index: usize) -> bool {
        self.shared_counters[index] > 0
    }
}

impl Default for GlobalObjectPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_claim_skips_indices_reserved_by_per_player_objects() {
        let mut pool = GlobalObjectPool::new();
        pool.mark_shared(1);
        pool.mark_shared(2);
        let id = pool.claim(|id| Object::new(id, 100)).unwrap();
        assert_eq!(id.index(), 3);
    }

    #[test]
    fn unmark_allows_future_claims_to_see_the_index_as_free_again() {
        let mut pool = GlobalObjectPool::new();
        pool.mark_shared(1);
        assert!(pool.is_shared(1));
        pool.unmark_shared(1);
        assert!(!pool.is_shared(1));
    }
}
