use std::cell::RefCell;
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use corert::dispatch::EventDispatcher;

trait Sink {
    fn push(&mut self, value: i32) -> bool;
}

struct Counter(i32);
impl Sink for Counter {
    fn push(&mut self, value: i32) -> bool {
        self.0 += value;
        true
    }
}

fn dispatch_all(c: &mut Criterion) {
    let mut d: EventDispatcher<dyn Sink> = EventDispatcher::new();
    for _ in 0..16 {
        d.add_default(Rc::new(RefCell::new(Counter(0))));
    }
    c.bench_function("dispatcher all (16 handlers)", |b| {
        b.iter(|| {
            d.all(|h| {
                h.push(black_box(1));
            })
        })
    });
}

fn dispatch_any_true(c: &mut Criterion) {
    let mut d: EventDispatcher<dyn Sink> = EventDispatcher::new();
    for _ in 0..16 {
        d.add_default(Rc::new(RefCell::new(Counter(0))));
    }
    c.bench_function("dispatcher any_true (16 handlers)", |b| {
        b.iter(|| black_box(d.any_true(|h| h.push(1))))
    });
}

criterion_group!(benches, dispatch_all, dispatch_any_true);
criterion_main!(benches);
