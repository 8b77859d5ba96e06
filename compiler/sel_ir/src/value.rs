//! Compile-time constant values.

use std::fmt;

/// A compile-time constant, representable as a literal of the parameter's
/// type.
///
/// `ConstValue` keys variant tables during specialization, so it must be
/// cheap to copy, hashable, and totally ordered (ordering makes variant
/// enumeration deterministic across runs).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    /// A closed-enum variant, identified by the declaring enum and the
    /// variant's tag.
    Variant { enum_id: u32, tag: u32 },
    Unit,
}

impl ConstValue {
    /// Render the value as a symbol-safe suffix for mangled function names.
    ///
    /// Negative integers use an `m` prefix (`-3` → `m3`) since `-` is not
    /// valid in a symbol. Enum variants render by tag (`v2`).
    pub fn mangle(self) -> String {
        match self {
            ConstValue::Bool(b) => b.to_string(),
            ConstValue::Int(i) if i < 0 => format!("m{}", i.unsigned_abs()),
            ConstValue::Int(i) => i.to_string(),
            ConstValue::Variant { tag, .. } => format!("v{tag}"),
            ConstValue::Unit => "unit".to_string(),
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Bool(b) => write!(f, "{b}"),
            ConstValue::Int(i) => write!(f, "{i}"),
            ConstValue::Variant { enum_id, tag } => write!(f, "enum{enum_id}#{tag}"),
            ConstValue::Unit => write!(f, "()"),
        }
    }
}
