//! Misuse-class errors.
//!
//! `OpError` covers the one error kind the spec actually calls an error:
//! calling `apply`/`inverse` with a document whose type doesn't match the
//! operation. Conflicts and no-fusion are not errors — they're ordinary
//! return values (`Result<_, Conflict>` and `Option<_>` respectively) — so
//! they live in `op.rs`, not here.

use std::fmt;

use crate::document::Document;

/// A document was the wrong shape for the operation applied to it.
#[derive(Debug, Clone, PartialEq)]
pub enum OpError {
    /// `apply`/`inverse` expected one of `expected` but found `found`.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// An index, offset, or length fell outside the document's bounds.
    OutOfBounds {
        index: usize,
        len: usize,
    },
    /// A `Splice`'s replacement was not the same container kind as the
    /// document it replaces within (e.g. splicing a string with an array).
    ContainerMismatch {
        document: &'static str,
        replacement: &'static str,
    },
    /// A malformed `rot` operand: the modulus must be a positive integer.
    InvalidRotModulus(i64),
    /// A `Patch` whose hunks are not in strictly increasing, non-overlapping
    /// order, or whose offsets are negative.
    MalformedPatch(String),
}

impl OpError {
    pub fn type_mismatch(expected: &'static str, found: &Document) -> OpError {
        OpError::TypeMismatch {
            expected,
            found: found.type_name(),
        }
    }
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpError::TypeMismatch { expected, found } => {
                write!(f, "expected a {expected} document, found a {found}")
            }
            OpError::OutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            OpError::ContainerMismatch { document, replacement } => {
                write!(f, "cannot splice a {replacement} into a {document}")
            }
            OpError::InvalidRotModulus(m) => write!(f, "rot modulus must be positive, got {m}"),
            OpError::MalformedPatch(reason) => write!(f, "malformed patch: {reason}"),
        }
    }
}

impl std::error::Error for OpError {}
