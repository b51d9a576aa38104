//! Event dispatcher (§4.5): ordered, priority-keyed listener registries
//! with four dispatch modes. Grounded on
//! `SDK/include/Impl/events_impl.hpp`'s `DefaultEventDispatcher` and
//! `DefaultIndexedEventDispatcher`.
//!
//! The reference dispatcher stores raw `EventHandlerType*` pointers and
//! calls a member-function pointer on each; listeners are owned by
//! whichever component registered them, not by the dispatcher. The
//! idiomatic Rust shape for "shared, non-owning access to a trait
//! object, compared by identity" is `Rc<RefCell<dyn Trait>>` plus
//! `Rc::ptr_eq` for the `handler == it->handler` comparisons the
//! reference performs — the dispatcher clones the `Rc` in, the
//! registering component keeps its own clone, and `Rc::strong_count`
//! never implies ownership transfer. Per-call method dispatch (the
//! reference's `dispatch(&Handler::onFoo, args...)`) becomes a plain
//! closure passed to `all`/`stop_at_false`/etc., matching the generic
//! `Fn`-based `all`/`stopAtFalse`/`anyTrue`/`stopAtTrue`/`allTrue`
//! helpers the reference dispatcher itself already exposes alongside
//! its method-pointer `dispatch`.

use std::cell::RefCell;
use std::rc::Rc;

/// Handler priority: lower values fire first, ties broken by insertion
/// order (§4.5, §"Handler priority" in the glossary).
pub type Priority = i8;
pub const PRIORITY_DEFAULT: Priority = 0;

pub type Handler<H> = Rc<RefCell<H>>;

struct Entry<H: ?Sized> {
    priority: Priority,
    handler: Handler<H>,
}

/// An ordered collection of `(priority, handler)` entries, keyed unique
/// by handler identity.
pub struct EventDispatcher<H: ?Sized> {
    entries: Vec<Entry<H>>,
}

impl<H: ?Sized> Default for EventDispatcher<H> {
    fn default() -> Self {
        EventDispatcher { entries: Vec::new() }
    }
}

impl<H: ?Sized> EventDispatcher<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` at `priority`. Returns false if this handler
    /// (by `Rc` identity) is already registered.
    pub fn add(&mut self, handler: Handler<H>, priority: Priority) -> bool {
        if self.entries.iter().any(|e| Rc::ptr_eq(&e.handler, &handler)) {
            return false;
        }
        let pos = self
            .entries
            .iter()
            .position(|e| priority < e.priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, Entry { priority, handler });
        true
    }

    pub fn add_default(&mut self, handler: Handler<H>) -> bool {
        self.add(handler, PRIORITY_DEFAULT)
    }

    pub fn remove(&mut self, handler: &Handler<H>) -> bool {
        match self.entries.iter().position(|e| Rc::ptr_eq(&e.handler, handler)) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn has(&self, handler: &Handler<H>) -> Option<Priority> {
        self.entries
            .iter()
            .find(|e| Rc::ptr_eq(&e.handler, handler))
            .map(|e| e.priority)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Calls `f` on every handler in priority order, ignoring return
    /// values.
    pub fn all(&self, mut f: impl FnMut(&mut H)) {
        for entry in self.entries.iter() {
            f(&mut entry.handler.borrow_mut());
        }
    }

    /// Calls each handler until one returns false; overall result is
    /// whether all returned true (short-circuit).
    pub fn stop_at_false(&self, mut f: impl FnMut(&mut H) -> bool) -> bool {
        for entry in self.entries.iter() {
            if !f(&mut entry.handler.borrow_mut()) {
                return false;
            }
        }
        true
    }

    /// Calls each handler until one returns true (short-circuit).
    pub fn stop_at_true(&self, mut f: impl FnMut(&mut H) -> bool) -> bool {
        for entry in self.entries.iter() {
            if f(&mut entry.handler.borrow_mut()) {
                return true;
            }
        }
        false
    }

    /// Calls *every* handler regardless of return value; the result is
    /// the disjunction of the individual returns. Deliberately not
    /// short-circuiting: the reference source calls this out explicitly
    /// (`for_each` with an OR-accumulator, not `std::any_of`) because
    /// side effects of later handlers must still run.
    pub fn any_true(&self, mut f: impl FnMut(&mut H) -> bool) -> bool {
        let mut result = false;
        for entry in self.entries.iter() {
            result = f(&mut entry.handler.borrow_mut()) || result;
        }
        result
    }

    /// Symmetric conjunction of `any_true`: calls every handler, result
    /// is the conjunction of the individual returns.
    pub fn all_true(&self, mut f: impl FnMut(&mut H) -> bool) -> bool {
        let mut result = true;
        for entry in self.entries.iter() {
            result = f(&mut entry.handler.borrow_mut()) && result;
        }
        result
    }
}

/// An array of `N` plain dispatchers, indexed and bounds-checked; used
/// by the packet/RPC demultiplexer (§4.6) to fan out by message id.
pub struct IndexedEventDispatcher<H: ?Sized> {
    slots: Vec<EventDispatcher<H>>,
}

impl<H: ?Sized> IndexedEventDispatcher<H> {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, EventDispatcher::new);
        IndexedEventDispatcher { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn add(&mut self, index: usize, handler: Handler<H>, priority: Priority) -> bool {
        match self.slots.get_mut(index) {
            Some(d) => d.add(handler, priority),
            None => false,
        }
    }

    pub fn remove(&mut self, index: usize, handler: &Handler<H>) -> bool {
        match self.slots.get_mut(index) {
            Some(d) => d.remove(handler),
            None => false,
        }
    }

    pub fn has(&self, index: usize, handler: &Handler<H>) -> Option<Priority> {
        self.slots.get(index).and_then(|d| d.has(handler))
    }

    /// Total handler count across every index.
    pub fn count(&self) -> usize {
        self.slots.iter().map(|d| d.count()).sum()
    }

    /// Handler count at a single index; out-of-range returns 0.
    pub fn count_at(&self, index: usize) -> usize {
        self.slots.get(index).map(|d| d.count()).unwrap_or(0)
    }

    pub fn all(&self, index: usize, f: impl FnMut(&mut H)) {
        if let Some(d) = self.slots.get(index) {
            d.all(f);
        }
    }

    /// False (not "all true") if `index` is out of range, matching the
    /// reference's bounds-checked indexed `stopAtFalse`.
    pub fn stop_at_false(&self, index: usize, f: impl FnMut(&mut H) -> bool) -> bool {
        match self.slots.get(index) {
            Some(d) => d.stop_at_false(f),
            None => false,
        }
    }

    pub fn stop_at_true(&self, index: usize, f: impl FnMut(&mut H) -> bool) -> bool {
        match self.slots.get(index) {
            Some(d) => d.stop_at_true(f),
            None => false,
        }
    }

    pub fn any_true(&self, index: usize, f: impl FnMut(&mut H) -> bool) -> bool {
        match self.slots.get(index) {
            Some(d) => d.any_true(f),
            None => false,
        }
    }

    pub fn all_true(&self, index: usize, f: impl FnMut(&mut H) -> bool) -> bool {
        match self.slots.get(index) {
            Some(d) => d.all_true(f),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Counter {
        fn bump(&mut self, by: i32) -> bool;
    }

    struct Adder {
        total: i32,
        veto: bool,
    }

    impl Counter for Adder {
        fn bump(&mut self, by: i32) -> bool {
            self.total += by;
            !self.veto
        }
    }

    fn handler(veto: bool) -> Handler<dyn Counter> {
        Rc::new(RefCell::new(Adder { total: 0, veto }))
    }

    #[test]
    fn dispatches_in_priority_then_insertion_order() {
        let mut d: EventDispatcher<dyn Counter> = EventDispatcher::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        struct Tagged {
            tag: i32,
            order: Rc<RefCell<Vec<i32>>>,
        }
        impl Counter for Tagged {
            fn bump(&mut self, _by: i32) -> bool {
                self.order.borrow_mut().push(self.tag);
                true
            }
        }

        let h_a: Handler<dyn Counter> = Rc::new(RefCell::new(Tagged { tag: 1, order: order.clone() }));
        let h_b: Handler<dyn Counter> = Rc::new(RefCell::new(Tagged { tag: 2, order: order.clone() }));
        let h_c: Handler<dyn Counter> = Rc::new(RefCell::new(Tagged { tag: 3, order: order.clone() }));

        // b and c tie at priority 0; a comes in at -5 and should fire first.
        d.add(h_b.clone(), 0);
        d.add(h_c.clone(), 0);
        d.add(h_a.clone(), -5);

        d.all(|h| {
            h.bump(0);
        });

        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn add_rejects_duplicate_handler() {
        let mut d: EventDispatcher<dyn Counter> = EventDispatcher::new();
        let h = handler(false);
        assert!(d.add_default(h.clone()));
        assert!(!d.add_default(h));
        assert_eq!(d.count(), 1);
    }

    #[test]
    fn remove_then_has_is_false_and_count_unchanged() {
        let mut d: EventDispatcher<dyn Counter> = EventDispatcher::new();
        let h = handler(false);
        d.add_default(h.clone());
        assert!(d.remove(&h));
        assert!(d.has(&h).is_none());
        assert_eq!(d.count(), 0);
    }

    #[test]
    fn stop_at_false_short_circuits_and_reports_false() {
        let mut d: EventDispatcher<dyn Counter> = EventDispatcher::new();
        let vetoing = handler(true);
        let never_called = Rc::new(RefCell::new(Adder { total: 0, veto: false }));
        d.add_default(vetoing);
        d.add(never_called.clone(), 1);

        let result = d.stop_at_false(|h| h.bump(1));
        assert!(!result);
        assert_eq!(never_called.borrow().total, 0);
    }

    #[test]
    fn stop_at_true_short_circuits_on_first_true() {
        let mut d: EventDispatcher<dyn Counter> = EventDispatcher::new();
        let h1 = handler(true); // bump returns !veto == false
        let h2 = handler(false); // bump returns true
        let never_called = Rc::new(RefCell::new(Adder { total: 0, veto: false }));
        d.add(h1, -1);
        d.add(h2, 0);
        d.add(never_called.clone(), 1);

        assert!(d.stop_at_true(|h| h.bump(1)));
        assert_eq!(never_called.borrow().total, 0);
    }

    #[test]
    fn any_true_calls_every_handler_without_short_circuit() {
        let mut d: EventDispatcher<dyn Counter> = EventDispatcher::new();
        let h1 = handler(true); // returns false
        let h2 = Rc::new(RefCell::new(Adder { total: 0, veto: false })); // returns true
        d.add_default(h1);
        d.add(h2.clone(), 1);

        assert!(d.any_true(|h| h.bump(1)));
        assert_eq!(h2.borrow().total, 1);
    }

    #[test]
    fn all_true_calls_every_handler_without_short_circuit() {
        let mut d: EventDispatcher<dyn Counter> = EventDispatcher::new();
        let h1 = handler(true); // returns false (vetoing)
        let h2 = Rc::new(RefCell::new(Adder { total: 0, veto: false }));
        d.add_default(h1);
        d.add(h2.clone(), 1);

        assert!(!d.all_true(|h| h.bump(1)));
        // h2 still ran even though h1 already made the result false.
        assert_eq!(h2.borrow().total, 1);
    }

    #[test]
    fn indexed_dispatcher_bounds_checks() {
        let mut d: IndexedEventDispatcher<dyn Counter> = IndexedEventDispatcher::new(4);
        let h = handler(false);
        assert!(!d.add(10, h.clone(), 0));
        assert!(d.add(1, h.clone(), 0));
        assert_eq!(d.count_at(1), 1);
        assert!(!d.stop_at_false(99, |h| h.bump(1)));
    }
}
