//! Compiled match predicates.
//!
//! Matchers operate on the raw byte value extracted from a record, never on
//! typed values; the binding layer decides what a field looks like as bytes.
//! Regular expressions are compiled once, at snapshot compile time.

use memchr::memmem;
use regex::bytes::Regex;

use crate::def::MatchExprDef;
use crate::field::FieldRef;

/// A compiled match expression over an extracted byte value.
#[derive(Debug)]
pub enum MatchExpr {
    /// Byte-exact equality.
    Exact(Vec<u8>),
    /// Substring containment.
    Contains(Vec<u8>),
    /// Prefix match.
    StartsWith(Vec<u8>),
    /// Unanchored regular expression over bytes.
    Regex(Regex),
    /// Presence (`true`) or absence (`false`) of the value.
    Exists(bool),
}

impl MatchExpr {
    /// Compile a match expression definition.
    pub fn compile(def: &MatchExprDef) -> Result<Self, regex::Error> {
        Ok(match def {
            MatchExprDef::Exact(s) => Self::Exact(s.clone().into_bytes()),
            MatchExprDef::Contains(s) => Self::Contains(s.clone().into_bytes()),
            MatchExprDef::StartsWith(s) => Self::StartsWith(s.clone().into_bytes()),
            MatchExprDef::Regex(pattern) => Self::Regex(Regex::new(pattern)?),
            MatchExprDef::Exists(present) => Self::Exists(*present),
        })
    }

    /// Evaluate against an extracted value; `None` means the field is absent.
    ///
    /// An absent value fails every expression except `Exists(false)`.
    pub fn matches(&self, value: Option<&[u8]>) -> bool {
        let Some(value) = value else {
            return matches!(self, Self::Exists(false));
        };

        match self {
            Self::Exact(expected) => value == expected.as_slice(),
            Self::Contains(needle) => memmem::find(value, needle).is_some(),
            Self::StartsWith(prefix) => value.starts_with(prefix),
            Self::Regex(re) => re.is_match(value),
            Self::Exists(present) => *present,
        }
    }
}

/// A compiled `(field, expression)` pair.
#[derive(Debug)]
pub struct CompiledMatcher<F> {
    pub field: FieldRef<F>,
    pub expr: MatchExpr,
}
