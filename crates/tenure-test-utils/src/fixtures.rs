//! Reusable scenario fixtures.
//!
//! - [`alloc_free`]: allocate, read, free. Always clean.
//! - [`free_twice`]: the smallest double free.
//! - [`stale_view`]: a view dereferenced after its slot was reset.
//! - [`leak_n`]: `n` buffers allocated and never freed.
//! - [`chain`]: ownership handed down a chain of slots, freed at the end.

use tenure_core::DefectKind;
use tenure_scenario::{Op, Scenario, Value};

/// Allocate a buffer of `len` bytes, read it and free it.
pub fn alloc_free(len: usize) -> Scenario {
    Scenario::builder("fixture-alloc-free")
        .steps([
            Op::construct("buf", Value::buffer(len)),
            Op::read("buf"),
            Op::reset("buf"),
        ])
        .build()
}

/// Reset one slot twice.
pub fn free_twice() -> Scenario {
    Scenario::builder("fixture-free-twice")
        .detects(DefectKind::DoubleFree)
        .steps([
            Op::construct("res", Value::Int(1)),
            Op::reset("res"),
            Op::reset("res"),
        ])
        .build()
}

/// Borrow, reset, then dereference the view.
pub fn stale_view() -> Scenario {
    Scenario::builder("fixture-stale-view")
        .detects(DefectKind::UseAfterFree)
        .steps([
            Op::construct("buf", Value::text("stale")),
            Op::borrow("buf", "view"),
            Op::reset("buf"),
            Op::deref("view"),
        ])
        .build()
}

/// Allocate `n` buffers named `buf0..bufN` and never free them.
pub fn leak_n(n: usize) -> Scenario {
    Scenario::builder(format!("fixture-leak-{n}"))
        .detects(DefectKind::Leak)
        .steps((0..n).map(|i| Op::construct(format!("buf{i}"), Value::buffer(8))))
        .build()
}

/// Transfer a value through `len` slots, reading it at every hop, then
/// free the last owner.
pub fn chain(len: usize) -> Scenario {
    let mut steps = vec![Op::construct("s0", Value::text("payload"))];
    for i in 0..len {
        steps.push(Op::transfer(format!("s{i}"), format!("s{}", i + 1)));
        steps.push(Op::read(format!("s{}", i + 1)));
    }
    steps.push(Op::reset(format!("s{len}")));
    Scenario::builder(format!("fixture-chain-{len}"))
        .steps(steps)
        .build()
}
