//! Built-in benchmark cases.
//!
//! Each case comes as a pair: the instrumented defective program, which
//! must be stopped with the named defect, and a `-fixed` twin that
//! performs the same work with correct ownership and must run clean.
//!
//! Name prefixes follow the defect: `mlk` (memory leak), `df` (double
//! free), `npd` (null pointer dereference), `uaf` (use after free).

use tenure_core::DefectKind;

use crate::payload::Value;
use crate::script::{Condition, Expectation, Field, Op, Scenario};

/// Suffix of the fixed twin of every case.
pub const FIXED_SUFFIX: &str = "-fixed";

/// Every built-in scenario, in a fixed order: each instrumented case
/// directly followed by its fixed twin.
pub fn catalogue() -> Vec<Scenario> {
    [
        mlk_early_return(),
        mlk_exception_unsafe(),
        mlk_conditional_free(),
        mlk_overwrite(),
        df_conditional_path(),
        npd_null_field(),
        npd_null_propagation(),
        uaf_return_freed(),
        uaf_conditional_free(),
        uaf_callback(),
        uaf_cleanup_flag(),
        uaf_owned_field(),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Look up a built-in scenario by exact name.
pub fn find(name: &str) -> Option<Scenario> {
    catalogue().into_iter().find(|s| s.name() == name)
}

fn case(
    name: &str,
    description: &str,
    defect: DefectKind,
    instrumented: impl IntoIterator<Item = Op>,
    fixed: impl IntoIterator<Item = Op>,
) -> [Scenario; 2] {
    [
        Scenario::builder(name)
            .description(description)
            .detects(defect)
            .steps(instrumented)
            .build(),
        Scenario::builder(format!("{name}{FIXED_SUFFIX}"))
            .description(format!("{description} (fixed)"))
            .expect(Expectation::Success)
            .steps(fixed)
            .build(),
    ]
}

fn mlk_early_return() -> [Scenario; 2] {
    case(
        "mlk-early-return",
        "buffer allocated, then an early return skips the free",
        DefectKind::Leak,
        [
            Op::construct("buffer", Value::buffer(100)),
            Op::when(Condition::Flag(true), [Op::Return]),
            Op::read("buffer"),
            Op::reset("buffer"),
        ],
        [
            Op::construct("buffer", Value::buffer(100)),
            Op::when(Condition::Flag(true), [Op::reset("buffer"), Op::Return]),
            Op::read("buffer"),
            Op::reset("buffer"),
        ],
    )
}

fn mlk_exception_unsafe() -> [Scenario; 2] {
    case(
        "mlk-exception-unsafe",
        "initialisation bails out for oversized input before the delete",
        DefectKind::Leak,
        [
            Op::construct("data", Value::buffer(1500)),
            Op::when(Condition::LenExceeds("data".into(), 1000), [Op::Return]),
            Op::reset("data"),
        ],
        [
            Op::construct("data", Value::buffer(1500)),
            Op::when(
                Condition::LenExceeds("data".into(), 1000),
                [Op::reset("data"), Op::Return],
            ),
            Op::reset("data"),
        ],
    )
}

fn mlk_conditional_free() -> [Scenario; 2] {
    case(
        "mlk-conditional-free",
        "buffer freed only on the success path",
        DefectKind::Leak,
        [
            Op::construct("buffer", Value::buffer(1024)),
            Op::construct("data", Value::text("")),
            Op::when(
                Condition::PayloadEmpty("data".into()),
                [Op::reset("data"), Op::Return],
            ),
            Op::read("data"),
            Op::reset("data"),
            Op::reset("buffer"),
        ],
        [
            Op::construct("buffer", Value::buffer(1024)),
            Op::construct("data", Value::text("")),
            Op::when(
                Condition::PayloadEmpty("data".into()),
                [Op::reset("data"), Op::reset("buffer"), Op::Return],
            ),
            Op::read("data"),
            Op::reset("data"),
            Op::reset("buffer"),
        ],
    )
}

fn mlk_overwrite() -> [Scenario; 2] {
    case(
        "mlk-overwrite",
        "second allocation stored over a live one orphans the first",
        DefectKind::Leak,
        [
            Op::construct("res", Value::buffer(64)),
            Op::construct("res", Value::buffer(128)),
            Op::reset("res"),
        ],
        [
            Op::construct("res", Value::buffer(64)),
            Op::reset("res"),
            Op::construct("res2", Value::buffer(128)),
            Op::reset("res2"),
        ],
    )
}

fn df_conditional_path() -> [Scenario; 2] {
    case(
        "df-conditional-path",
        "resource freed inside a branch and again unconditionally",
        DefectKind::DoubleFree,
        [
            Op::construct("res", Value::Int(4)),
            Op::read("res"),
            Op::when(Condition::IntIsEven("res".into()), [Op::reset("res")]),
            Op::reset("res"),
        ],
        [
            Op::construct("res", Value::Int(4)),
            Op::read("res"),
            Op::when(Condition::IntIsEven("res".into()), [Op::reset("res")]),
            Op::when(Condition::IsLive("res".into()), [Op::reset("res")]),
        ],
    )
}

fn npd_null_field() -> [Scenario; 2] {
    case(
        "npd-null-field",
        "struct with a null pointer field written through",
        DefectKind::NullDereference,
        [
            Op::construct("container", Value::Container { data: None }),
            Op::write_field("container", Field::Data, Value::Int(42)),
            Op::read_field("container", Field::Data),
            Op::reset_field("container", Field::Data),
            Op::reset("container"),
        ],
        [
            Op::construct("container", Value::Container { data: Some(0) }),
            Op::write_field("container", Field::Data, Value::Int(42)),
            Op::read_field("container", Field::Data),
            Op::reset_field("container", Field::Data),
            Op::reset("container"),
        ],
    )
}

fn npd_null_propagation() -> [Scenario; 2] {
    // null -> created -> processed -> used, read only at the last hop.
    let hand_off = || {
        [
            Op::declare("null"),
            Op::transfer("null", "created"),
            Op::transfer("created", "processed"),
            Op::transfer("processed", "used"),
        ]
    };
    case(
        "npd-null-propagation",
        "null handed through three callees and read by the last",
        DefectKind::NullDereference,
        hand_off().into_iter().chain([Op::read("used")]),
        hand_off().into_iter().chain([
            Op::when(Condition::IsNull("used".into()), [Op::Return]),
            Op::read("used"),
        ]),
    )
}

fn uaf_return_freed() -> [Scenario; 2] {
    case(
        "uaf-return-freed",
        "pointer returned after the buffer it points to was freed",
        DefectKind::UseAfterFree,
        [
            Op::construct("buffer", Value::text("Hello")),
            Op::borrow("buffer", "ptr"),
            Op::reset("buffer"),
            Op::deref("ptr"),
        ],
        [
            Op::construct("buffer", Value::text("Hello")),
            Op::borrow("buffer", "ptr"),
            Op::deref("ptr"),
            Op::reset("buffer"),
        ],
    )
}

fn uaf_conditional_free() -> [Scenario; 2] {
    case(
        "uaf-conditional-free",
        "callee frees on a flag, caller keeps reading",
        DefectKind::UseAfterFree,
        [
            Op::construct("data", Value::buffer(64)),
            Op::borrow("data", "alias"),
            Op::when(Condition::Flag(true), [Op::reset("data")]),
            Op::deref("alias"),
        ],
        [
            Op::construct("data", Value::buffer(64)),
            Op::borrow("data", "alias"),
            Op::deref("alias"),
            Op::when(Condition::Flag(true), [Op::reset("data")]),
            Op::when(Condition::IsLive("data".into()), [Op::reset("data")]),
        ],
    )
}

fn uaf_callback() -> [Scenario; 2] {
    case(
        "uaf-callback",
        "function pointer invoked through a freed handler",
        DefectKind::UseAfterFree,
        [
            Op::construct("handler", Value::Handler { data: 42 }),
            Op::borrow("handler", "cb"),
            Op::reset("handler"),
            Op::invoke("cb"),
        ],
        [
            Op::construct("handler", Value::Handler { data: 42 }),
            Op::borrow("handler", "cb"),
            Op::invoke("cb"),
            Op::reset("handler"),
        ],
    )
}

fn uaf_cleanup_flag() -> [Scenario; 2] {
    case(
        "uaf-cleanup-flag",
        "conditional cleanup runs before the buffer is modified",
        DefectKind::UseAfterFree,
        [
            Op::construct("buffer", Value::text("Hello, world!")),
            Op::when(
                Condition::Flag(true),
                [Op::when(Condition::IsLive("buffer".into()), [Op::reset("buffer")])],
            ),
            Op::write("buffer", Value::text("Modified content")),
            Op::read("buffer"),
        ],
        [
            Op::construct("buffer", Value::text("Hello, world!")),
            Op::write("buffer", Value::text("Modified content")),
            Op::read("buffer"),
            Op::when(
                Condition::Flag(true),
                [Op::when(Condition::IsLive("buffer".into()), [Op::reset("buffer")])],
            ),
        ],
    )
}

fn uaf_owned_field() -> [Scenario; 2] {
    let user = || Value::User {
        id: 1,
        name: "Test User".into(),
    };
    case(
        "uaf-owned-field",
        "name field read through a view after its user was freed",
        DefectKind::UseAfterFree,
        [
            Op::construct("user", user()),
            Op::borrow("user", "u"),
            Op::borrow_field("user", Field::Name, "name"),
            Op::increment("user"),
            Op::deref("u"),
            Op::reset_field("user", Field::Name),
            Op::reset("user"),
            Op::deref("name"),
        ],
        [
            Op::construct("user", user()),
            Op::borrow("user", "u"),
            Op::borrow_field("user", Field::Name, "name"),
            Op::increment("user"),
            Op::deref("u"),
            Op::deref("name"),
            Op::reset_field("user", Field::Name),
            Op::reset("user"),
        ],
    )
}
