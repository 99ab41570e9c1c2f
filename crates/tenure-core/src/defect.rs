//! Memory-safety defect categories.
//!
//! Each [`SlotError`] that stands for a classic C/C++ memory defect maps
//! onto one [`DefectKind`], which in turn carries its CWE identifier.

use std::error::Error;
use std::fmt;
use std::str::FromStr;

use crate::error::SlotError;

/// A class of memory-safety defect a scenario can exhibit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DefectKind {
    /// An allocation was never freed (CWE-401).
    Leak,
    /// An allocation was freed twice (CWE-415).
    DoubleFree,
    /// An allocation was used after it was freed (CWE-416).
    UseAfterFree,
    /// A null handle was dereferenced (CWE-476).
    NullDereference,
}

impl DefectKind {
    /// All defect kinds, in declaration order.
    pub const ALL: [DefectKind; 4] = [
        DefectKind::Leak,
        DefectKind::DoubleFree,
        DefectKind::UseAfterFree,
        DefectKind::NullDereference,
    ];

    /// Classify a contract violation.
    ///
    /// Returns `None` for violations that have no memory-defect
    /// counterpart ([`SlotError::Borrowed`]).
    pub fn from_error(err: &SlotError) -> Option<Self> {
        match err {
            SlotError::AlreadyLive { .. } => Some(Self::Leak),
            SlotError::DoubleFree { .. } => Some(Self::DoubleFree),
            SlotError::UseAfterFree { .. } => Some(Self::UseAfterFree),
            SlotError::NullDereference { .. } => Some(Self::NullDereference),
            SlotError::Borrowed { .. } => None,
        }
    }

    /// Short kebab-case label, as accepted by [`FromStr`].
    pub fn label(self) -> &'static str {
        match self {
            Self::Leak => "leak",
            Self::DoubleFree => "double-free",
            Self::UseAfterFree => "use-after-free",
            Self::NullDereference => "null-deref",
        }
    }

    /// The CWE identifier, e.g. `"CWE-416"`.
    pub fn cwe(self) -> &'static str {
        match self {
            Self::Leak => "CWE-401",
            Self::DoubleFree => "CWE-415",
            Self::UseAfterFree => "CWE-416",
            Self::NullDereference => "CWE-476",
        }
    }

    /// The CWE title.
    pub fn title(self) -> &'static str {
        match self {
            Self::Leak => "Missing Release of Memory after Effective Lifetime",
            Self::DoubleFree => "Double Free",
            Self::UseAfterFree => "Use After Free",
            Self::NullDereference => "NULL Pointer Dereference",
        }
    }
}

impl fmt::Display for DefectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when parsing an unknown defect label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownDefect(pub String);

impl fmt::Display for UnknownDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown defect kind: '{}'", self.0)
    }
}

impl Error for UnknownDefect {}

impl FromStr for DefectKind {
    type Err = UnknownDefect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.label() == normalized || k.cwe().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| UnknownDefect(s.to_string()))
    }
}
