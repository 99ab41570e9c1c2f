//! Values that scenarios allocate.
//!
//! [`Value`] is the immutable template stored in a script; [`Payload`] is
//! what a run actually allocates from it. Struct-like payloads own their
//! pointer fields through nested [`OwnedSlot`]s, so freeing the outer
//! value without first freeing a live field shows up as a leak, and a view
//! into a field dies with its owner.

use std::fmt;

use tenure_core::SlotError;
use tenure_slot::{Ledger, OwnedSlot};

/// Callback stored in a [`Handler`].
pub type Callback = fn() -> String;

/// The callback every catalogue handler points at.
pub fn actual_callback() -> String {
    "Callback executed".to_string()
}

/// A struct bundling a function pointer with some data.
#[derive(Clone, Debug)]
pub struct Handler {
    /// Function to invoke.
    pub callback: Callback,
    /// Data carried next to the callback.
    pub data: i32,
}

impl Handler {
    /// Call the stored function pointer.
    pub fn invoke(&self) -> String {
        (self.callback)()
    }
}

/// A record with an owned, heap-allocated name.
#[derive(Debug)]
pub struct User {
    /// Numeric identifier.
    pub id: i64,
    /// Owned name string. Must be freed before the user itself.
    pub name: OwnedSlot<Payload>,
}

/// A struct whose only field is a pointer that may be left null.
#[derive(Debug)]
pub struct Container {
    /// The pointed-to value; `Empty` models a null field.
    pub data: OwnedSlot<Payload>,
}

/// A live allocation inside a scenario run.
#[derive(Debug)]
pub enum Payload {
    /// A raw byte buffer.
    Bytes(Vec<u8>),
    /// A scalar.
    Int(i64),
    /// An owned string.
    Text(String),
    /// A callback-bearing struct.
    Handler(Handler),
    /// A struct with an owned string field.
    User(User),
    /// A struct with a nullable pointer field.
    Container(Container),
}

impl Payload {
    /// Short name of the variant, used in script errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "bytes",
            Self::Int(_) => "int",
            Self::Text(_) => "text",
            Self::Handler(_) => "handler",
            Self::User(_) => "user",
            Self::Container(_) => "container",
        }
    }

    /// Logical length: byte count for buffers and strings, 1 for scalars
    /// and structs.
    pub fn len(&self) -> usize {
        match self {
            Self::Bytes(b) => b.len(),
            Self::Text(s) => s.len(),
            _ => 1,
        }
    }

    /// Whether a buffer or string holds no data.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the value the way the demonstration programs print it.
    ///
    /// Reading a user also reads its name field, so a freed name surfaces
    /// as a use after free. A container prints its field's status without
    /// dereferencing it.
    pub fn observe(&self) -> Result<String, SlotError> {
        Ok(match self {
            Self::Bytes(b) => match b.first() {
                Some(&c) => format!("buffer[{}], first byte {:?}", b.len(), c as char),
                None => "buffer[0]".to_string(),
            },
            Self::Int(v) => format!("value {v}"),
            Self::Text(s) => format!("text {s:?}"),
            Self::Handler(h) => format!("handler data {}", h.data),
            Self::User(u) => {
                let name = u.name.read()?;
                format!("user id={} name={}", u.id, name.observe()?)
            }
            Self::Container(c) => format!("container data {}", c.data.status()),
        })
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.observe() {
            Ok(s) => f.write_str(&s),
            Err(e) => write!(f, "<{}: {e}>", self.kind()),
        }
    }
}

/// Script-side template of a [`Payload`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// A byte buffer with the given contents.
    Bytes(Vec<u8>),
    /// A scalar.
    Int(i64),
    /// A string.
    Text(String),
    /// A handler pointing at [`actual_callback`].
    Handler {
        /// Data stored next to the callback.
        data: i32,
    },
    /// A user whose name is allocated separately.
    User {
        /// Identifier.
        id: i64,
        /// Name copied into the owned field.
        name: String,
    },
    /// A container whose field is null when `data` is `None`.
    Container {
        /// Initial field value.
        data: Option<i64>,
    },
}

impl Value {
    /// A zero-filled buffer of `len` bytes.
    pub fn buffer(len: usize) -> Self {
        Self::Bytes(vec![0; len])
    }

    /// A string value.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Allocate a payload from this template.
    ///
    /// Nested pointer fields become slots tracked in `ledger` under
    /// `"<label>.<field>"`.
    pub fn materialize(&self, ledger: &Ledger, label: &str) -> Payload {
        match self {
            Self::Bytes(b) => Payload::Bytes(b.clone()),
            Self::Int(v) => Payload::Int(*v),
            Self::Text(s) => Payload::Text(s.clone()),
            Self::Handler { data } => Payload::Handler(Handler {
                callback: actual_callback,
                data: *data,
            }),
            Self::User { id, name } => Payload::User(User {
                id: *id,
                name: OwnedSlot::tracked_live(
                    ledger,
                    format!("{label}.name"),
                    Payload::Text(name.clone()),
                ),
            }),
            Self::Container { data } => {
                let label = format!("{label}.data");
                let data = match data {
                    Some(v) => OwnedSlot::tracked_live(ledger, label, Payload::Int(*v)),
                    None => OwnedSlot::tracked(ledger, label),
                };
                Payload::Container(Container { data })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_invokes_callback() {
        let ledger = Ledger::new();
        let p = Value::Handler { data: 42 }
            .materialize(&ledger, "handler");
        match p {
            Payload::Handler(h) => {
                assert_eq!(h.invoke(), "Callback executed");
                assert_eq!(h.data, 42);
            }
            other => panic!("expected handler, got {}", other.kind()),
        }
    }

    #[test]
    fn user_name_is_tracked() {
        let ledger = Ledger::new();
        let p = Value::User {
            id: 1,
            name: "Test User".into(),
        }
        .materialize(&ledger, "user");
        assert_eq!(p.observe().unwrap(), "user id=1 name=text \"Test User\"");
        assert_eq!(ledger.live_labels(), vec!["user.name".to_string()]);
        assert_eq!(ledger.allocations(), 1);
        // Dropping the user without freeing the name leaks it.
        drop(p);
        assert_eq!(ledger.leaks(), vec!["user.name".to_string()]);
    }

    #[test]
    fn null_container_field_stays_empty() {
        let ledger = Ledger::new();
        let p = Value::Container { data: None }
            .materialize(&ledger, "container");
        assert_eq!(p.observe().unwrap(), "container data empty");
        drop(p);
        assert!(ledger.leaks().is_empty());
    }

    #[test]
    fn filled_container_field_is_one_allocation() {
        let ledger = Ledger::new();
        let p = Value::Container { data: Some(5) }.materialize(&ledger, "container");
        assert_eq!(ledger.allocations(), 1);
        assert_eq!(ledger.live_labels(), vec!["container.data".to_string()]);
        drop(p);
        assert_eq!(ledger.leaks(), vec!["container.data".to_string()]);
    }

    #[test]
    fn lengths() {
        assert_eq!(Payload::Bytes(vec![0; 100]).len(), 100);
        assert!(Payload::Text(String::new()).is_empty());
        assert_eq!(Payload::Int(3).len(), 1);
    }

    #[test]
    fn freed_name_surfaces_on_observe() {
        let ledger = Ledger::new();
        let mut p = Value::User {
            id: 1,
            name: "x".into(),
        }
        .materialize(&ledger, "user");
        if let Payload::User(u) = &mut p {
            u.name.reset().unwrap();
        }
        assert!(matches!(p.observe(), Err(SlotError::UseAfterFree { .. })));
        assert!(p.to_string().starts_with("<user:"));
    }
}
