//! Component/extension hook surface (§6.4, concretized by §13 of the
//! full specification). Grounded on the reference `neutronium::registry`
//! module's typed-UID extension map, restricted to `anymap`'s stable
//! safe API rather than the nightly unsafe trait-object extension that
//! module builds for its own ECS.

use anymap::AnyMap;

#[derive(Copy, Clone, Default, Debug)]
pub struct ComponentHooks {
    pub on_load: Option<fn()>,
    pub on_init: Option<fn()>,
    pub on_ready: Option<fn()>,
    pub on_free: Option<fn()>,
}

#[derive(Copy, Clone, Debug)]
pub struct ComponentDescriptor {
    pub uid: u64,
    pub name: &'static str,
    pub version: (u16, u16, u16),
    pub hooks: ComponentHooks,
}

/// A typed heterogeneous map keyed by Rust type, standing in for the
/// UID-keyed extension slots the reference's components attach
/// arbitrary per-entity data through.
#[derive(Default)]
pub struct Extensions {
    values: AnyMap,
}

impl Extensions {
    pub fn new() -> Self {
        Extensions { values: AnyMap::new() }
    }

    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.values.insert(value)
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.values.get()
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.values.get_mut()
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.values.remove()
    }
}

/// Runs every descriptor's `on_load`, then every `on_init`, then every
/// `on_ready`, never interleaved — the one ordering guarantee the
/// extension surface promises.
pub fn run_component_lifecycle(descriptors: &[ComponentDescriptor]) {
    for d in descriptors {
        if let Some(f) = d.hooks.on_load {
            f();
        }
    }
    for d in descriptors {
        if let Some(f) = d.hooks.on_init {
            f();
        }
    }
    for d in descriptors {
        if let Some(f) = d.hooks.on_ready {
            f();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn extensions_store_and_fetch_by_type() {
        let mut ext = Extensions::new();
        ext.insert(42u32);
        ext.insert("hello".to_string());
        assert_eq!(ext.get::<u32>(), Some(&42));
        assert_eq!(ext.get::<String>().unwrap(), "hello");
        assert_eq!(ext.remove::<u32>(), Some(42));
        assert!(ext.get::<u32>().is_none());
    }

    static ORDER: AtomicUsize = AtomicUsize::new(0);
    static LOAD_AT: AtomicUsize = AtomicUsize::new(usize::MAX);
    static READY_AT: AtomicUsize = AtomicUsize::new(usize::MAX);

    fn mark_load() {
        LOAD_AT.store(ORDER.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
    }
    fn mark_ready() {
        READY_AT.store(ORDER.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
    }

    #[test]
    fn lifecycle_runs_every_load_before_any_ready() {
        let descriptors = vec![
            ComponentDescriptor {
                uid: 1,
                name: "a",
                version: (1, 0, 0),
                hooks: ComponentHooks { on_load: Some(mark_load), on_ready: Some(mark_ready), ..Default::default() },
            },
            ComponentDescriptor {
                uid: 2,
                name: "b",
                version: (1, 0, 0),
                hooks: ComponentHooks::default(),
            },
        ];
        run_component_lifecycle(&descriptors);
        assert!(LOAD_AT.load(Ordering::SeqCst) < READY_AT.load(Ordering::SeqCst));
    }
}
