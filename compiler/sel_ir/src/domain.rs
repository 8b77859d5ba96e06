//! Parameter value domains.
//!
//! A parameter's domain is the full set of values its type can inhabit.
//! Finite domains (booleans, closed enums, bounded integer ranges) can be
//! exhaustively reasoned about; unbounded domains cannot.

use crate::value::ConstValue;

/// The full set of values a parameter's type can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamDomain {
    /// Exactly two values: `false` and `true`.
    Bool,
    /// A closed enum with `variants` tags, `0..variants`. Externally
    /// extensible enums must be modeled as [`ParamDomain::Unbounded`]
    /// by the frontend.
    Enum { enum_id: u32, variants: u32 },
    /// A bounded integer range, inclusive on both ends.
    IntRange { lo: i64, hi: i64 },
    /// No finite domain (unbounded integers, opaque handles).
    Unbounded,
}

impl ParamDomain {
    /// Returns `true` if the domain has a finite, known cardinality.
    #[inline]
    pub fn is_finite(self) -> bool {
        !matches!(self, ParamDomain::Unbounded)
    }

    /// The number of values in the domain, or `None` when unbounded.
    pub fn cardinality(self) -> Option<u128> {
        match self {
            ParamDomain::Bool => Some(2),
            ParamDomain::Enum { variants, .. } => Some(u128::from(variants)),
            ParamDomain::IntRange { lo, hi } => {
                if lo > hi {
                    Some(0)
                } else {
                    // hi - lo never overflows in i128, +1 never overflows u128.
                    Some((i128::from(hi) - i128::from(lo)).unsigned_abs() + 1)
                }
            }
            ParamDomain::Unbounded => None,
        }
    }

    /// Returns `true` if `value` is a legal inhabitant of this domain.
    pub fn contains(self, value: ConstValue) -> bool {
        match (self, value) {
            (ParamDomain::Bool, ConstValue::Bool(_)) => true,
            (ParamDomain::Enum { enum_id, variants }, ConstValue::Variant { enum_id: e, tag }) => {
                enum_id == e && tag < variants
            }
            (ParamDomain::IntRange { lo, hi }, ConstValue::Int(i)) => lo <= i && i <= hi,
            (ParamDomain::Unbounded, ConstValue::Int(_)) => true,
            _ => false,
        }
    }

    /// Iterate the domain's values in ascending order.
    ///
    /// Yields nothing for [`ParamDomain::Unbounded`]; callers deciding
    /// exhaustiveness must check [`is_finite`](Self::is_finite) first.
    pub fn values(self) -> DomainValues {
        DomainValues { domain: self, next: 0 }
    }
}

/// Iterator over the values of a finite domain.
pub struct DomainValues {
    domain: ParamDomain,
    next: u128,
}

impl Iterator for DomainValues {
    type Item = ConstValue;

    fn next(&mut self) -> Option<ConstValue> {
        let remaining = self.domain.cardinality()?;
        if self.next >= remaining {
            return None;
        }
        let i = self.next;
        self.next += 1;
        match self.domain {
            ParamDomain::Bool => Some(ConstValue::Bool(i == 1)),
            ParamDomain::Enum { enum_id, .. } => {
                #[allow(clippy::cast_possible_truncation)] // i < variants: u32
                Some(ConstValue::Variant { enum_id, tag: i as u32 })
            }
            ParamDomain::IntRange { lo, .. } => {
                #[allow(clippy::cast_possible_truncation)] // lo + i <= hi: i64
                Some(ConstValue::Int((i128::from(lo) + i as i128) as i64))
            }
            ParamDomain::Unbounded => None,
        }
    }
}
