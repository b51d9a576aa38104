//! Entity pool and reference-counted lifetime (§4.3). A pool is a
//! fixed-range, index-addressable container parameterized by entity
//! type `T`, a capacity range `[lower, upper)`, and a lifetime mode
//! (`Immediate` or `Marked`). Grounded on
//! `SDK/include/Impl/pool_impl.hpp`'s `StaticPoolStorageBase` /
//! `ImmediatePoolStorageLifetimeBase` / `MarkedPoolStorageLifetimeBase`.
//!
//! The reference stores entries in a raw byte array and placement-news
//! into it; the safe Rust equivalent is a `Vec<Option<T>>` indexed by
//! slot, which gives the same O(1) claim/get/release behavior without
//! unsafe. "Inherits from `PoolIDProvider`" (§9) becomes: the caller's
//! `claim`/`claim_hint` closure receives the id the pool is about to
//! assign and builds `T` already carrying it, rather than the pool
//! reaching into the type after construction.

use crate::dispatch::EventDispatcher;

/// `{onPoolEntryCreated, onPoolEntryDestroyed}` (§4.3). Fires inside
/// `claim`/`release`: created fires once the slot holds the new entry,
/// destroyed fires while the slot still holds the outgoing entry, before
/// it is cleared.
pub trait PoolEventHandler<T> {
    fn on_pool_entry_created(&mut self, _entry: &mut T) {}
    fn on_pool_entry_destroyed(&mut self, _entry: &mut T) {}
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LifetimeMode {
    /// `release` runs the destructor and clears the slot immediately.
    Immediate,
    /// `release` defers to a delete-pending bit while the ref count is
    /// nonzero; `lock`/`unlock` manage that count.
    Marked,
}

pub struct Pool<T> {
    lower: usize,
    slots: Vec<Option<T>>,
    lowest_free_index: usize,
    mode: LifetimeMode,
    refs: Vec<u8>,
    pending_delete: Vec<bool>,
    lifecycle: EventDispatcher<dyn PoolEventHandler<T>>,
}

impl<T> Pool<T> {
    pub fn new(lower: usize, upper: usize, mode: LifetimeMode) -> Self {
        assert!(upper > lower, "pool range must be non-empty");
        let capacity = upper - lower;
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Pool {
            lower,
            slots,
            lowest_free_index: lower,
            mode,
            refs: vec![0; capacity],
            pending_delete: vec![false; capacity],
            lifecycle: EventDispatcher::new(),
        }
    }

    #[inline]
    pub fn lower(&self) -> usize {
        self.lower
    }

    #[inline]
    pub fn upper(&self) -> usize {
        self.lower + self.slots.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lifecycle(&mut self) -> &mut EventDispatcher<dyn PoolEventHandler<T>> {
        &mut self.lifecycle
    }

    #[inline]
    fn in_range(&self, id: usize) -> bool {
        id >= self.lower && id < self.upper()
    }

    #[inline]
    pub fn valid(&self, id: usize) -> bool {
        self.in_range(id) && self.slots[id - self.lower].is_some()
    }

    pub fn get(&self, id: usize) -> Option<&T> {
        if !self.in_range(id) {
            return None;
        }
        self.slots[id - self.lower].as_ref()
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut T> {
        if !self.in_range(id) {
            return None;
        }
        self.slots[id - self.lower].as_mut()
    }

    fn find_free_index(&self, from: usize) -> Option<usize> {
        let start = from.max(self.lower);
        for id in start..self.upper() {
            if self.slots[id - self.lower].is_none() {
                return Some(id);
            }
        }
        None
    }

    /// Lowest currently free index, for callers (e.g. the shared object
    /// id discipline of §4.3) that need to probe before claiming.
    pub fn find_free_index_from(&self, from: usize) -> Option<usize> {
        self.find_free_index(from)
    }

    /// Claims the lowest free index, constructs `T` via `build(id)`, and
    /// fires `onPoolEntryCreated`. Returns `None` if the pool is full.
    pub fn claim(&mut self, build: impl FnOnce(usize) -> T) -> Option<usize> {
        let id = self.find_free_index(self.lowest_free_index)?;
        self.claim_at(id, build);
        Some(id)
    }

    /// Tries `hint` first; falls back to `claim` if `hint` is out of
    /// range or already occupied.
    pub fn claim_hint(&mut self, hint: usize, build: impl FnOnce(usize) -> T) -> Option<usize> {
        if self.in_range(hint) && self.slots[hint - self.lower].is_none() {
            self.claim_at(hint, build);
            Some(hint)
        } else {
            self.claim(build)
        }
    }

    fn claim_at(&mut self, id: usize, build: impl FnOnce(usize) -> T) {
        if id == self.lowest_free_index {
            self.lowest_free_index += 1;
        }
        let idx = id - self.lower;
        self.slots[idx] = Some(build(id));
        self.refs[idx] = 0;
        self.pending_delete[idx] = false;

        let lifecycle = &self.lifecycle;
        let entry = self.slots[idx].as_mut().unwrap();
        lifecycle.all(|h| h.on_pool_entry_created(&mut *entry));
    }

    fn remove(&mut self, id: usize) -> bool {
        if !self.valid(id) {
            return false;
        }
        if id < self.lowest_free_index {
            self.lowest_free_index = id;
        }
        let idx = id - self.lower;
        {
            let lifecycle = &self.lifecycle;
            let entry = self.slots[idx].as_mut().unwrap();
            lifecycle.all(|h| h.on_pool_entry_destroyed(&mut *entry));
        }
        self.slots[idx] = None;
        self.refs[idx] = 0;
        self.pending_delete[idx] = false;
        true
    }

    /// Releases `id`. In `Immediate` mode this destroys the entry now.
    /// In `Marked` mode it defers if the ref count is nonzero, per
    /// `release(index, force=false)`.
    pub fn release(&mut self, id: usize) -> bool {
        self.release_inner(id, false)
    }

    /// Releases `id` bypassing the deferred-delete step, for pool
    /// teardown only (§4.3).
    pub fn release_forced(&mut self, id: usize) -> bool {
        self.release_inner(id, true)
    }

    fn release_inner(&mut self, id: usize, force: bool) -> bool {
        if !self.in_range(id) {
            return false;
        }
        match self.mode {
            LifetimeMode::Immediate => self.remove(id),
            LifetimeMode::Marked => {
                if !self.valid(id) {
                    return false;
                }
                let idx = id - self.lower;
                if !force && self.refs[idx] > 0 {
                    self.pending_delete[idx] = true;
                    false
                } else {
                    self.pending_delete[idx] = false;
                    self.remove(id)
                }
            }
        }
    }

    /// Increments the ref count on `id` (`Marked` mode only; a no-op
    /// elsewhere).
    pub fn lock(&mut self, id: usize) {
        if self.mode != LifetimeMode::Marked || !self.in_range(id) {
            return;
        }
        let idx = id - self.lower;
        self.refs[idx] = self.refs[idx].saturating_add(1);
    }

    /// Decrements the ref count on `id`; if it reaches zero and a
    /// deferred release is pending, performs it now. Returns whether
    /// this call triggered that deferred release.
    pub fn unlock(&mut self, id: usize) -> bool {
        if self.mode != LifetimeMode::Marked || !self.in_range(id) {
            return false;
        }
        let idx = id - self.lower;
        if self.refs[idx] > 0 {
            self.refs[idx] -= 1;
        }
        if self.refs[idx] == 0 && self.pending_delete[idx] {
            self.pending_delete[idx] = false;
            self.remove(id);
            true
        } else {
            false
        }
    }

    pub fn ref_count(&self, id: usize) -> u8 {
        if !self.in_range(id) {
            return 0;
        }
        self.refs[id - self.lower]
    }

    pub fn is_delete_pending(&self, id: usize) -> bool {
        self.in_range(id) && self.pending_delete[id - self.lower]
    }

    /// Snapshot of currently occupied ids, oldest-claimed-first by
    /// index; used as the basis for the iterator-safe release discipline
    /// below.
    pub fn occupied_ids(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.is_some().then(|| i + self.lower))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(move |(i, s)| s.as_ref().map(|v| (i + self.lower, v)))
    }

    /// The scoped-reference-lock iteration discipline (§4.3): locks the
    /// entry at the current position before invoking `f`, unlocks after.
    /// A handler that calls `pool.release(id)` on the entry it is
    /// currently visiting is deferred until the unlock below; a handler
    /// that releases a *different* entry is unaffected because the
    /// iteration walks a snapshot of ids, not raw slot positions.
    pub fn for_each_locked(&mut self, mut f: impl FnMut(&mut Pool<T>, usize)) {
        for id in self.occupied_ids() {
            if !self.valid(id) {
                continue;
            }
            self.lock(id);
            f(self, id);
            self.unlock(id);
        }
    }

    /// Destroys every live entry, bypassing the deferred-delete step
    /// (pool teardown).
    pub fn clear(&mut self) {
        for id in self.occupied_ids() {
            self.release_forced(id);
        }
        self.lowest_free_index = self.lower;
    }
}

/// RAII scoped reference-count increment (§4.3): acquires `lock(id)` on
/// construction, `unlock(id)` on drop. Any call path that dispatches an
/// event whose handler might release the entity holds one of these for
/// the call's duration.
pub struct ScopedLock<'a, T> {
    pool: &'a mut Pool<T>,
    id: usize,
}

impl<'a, T> ScopedLock<'a, T> {
    pub fn new(pool: &'a mut Pool<T>, id: usize) -> Option<Self> {
        if !pool.valid(id) {
            return None;
        }
        pool.lock(id);
        Some(ScopedLock { pool, id })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn get(&self) -> Option<&T> {
        self.pool.get(self.id)
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.pool.get_mut(self.id)
    }

    pub fn pool_mut(&mut self) -> &mut Pool<T> {
        self.pool
    }
}

impl<'a, T> Drop for ScopedLock<'a, T> {
    fn drop(&mut self) {
        self.pool.unlock(self.id);
    }
}
