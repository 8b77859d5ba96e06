//! Functions, parameters, and visibility.

use crate::body::Body;
use crate::domain::ParamDomain;

/// Function ID, stable across a program generation.
///
/// IDs are not required to be dense: a rewriting pass allocates fresh IDs
/// above the existing maximum for the functions it introduces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct FuncId(u32);

impl FuncId {
    /// Create a new function ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Linkage-level visibility of a function.
///
/// Whether a function's address is taken is a separate, derived fact —
/// passes compute it from [`crate::Operand::FuncRef`] occurrences rather
/// than trusting a frontend flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Visibility {
    /// Every call site is inside this program; the signature is ours to
    /// rewrite.
    Internal,
    /// Reachable from outside compiler-controlled call sites (dynamic
    /// symbol, fixed-ABI entry point). The signature is frozen.
    Exported,
}

/// A function parameter: a name for diagnostics plus its value domain.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    pub name: String,
    pub domain: ParamDomain,
}

/// A function in the frozen IR.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Function {
    pub id: FuncId,
    pub name: String,
    pub params: Vec<Param>,
    pub visibility: Visibility,
    pub body: Body,
}
