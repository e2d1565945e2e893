//! `Operation`: the closed sum type every operation kind is a member of.
//!
//! A match over this enum is the idiomatic stand-in for the registry-style
//! `(module, op) -> implementation` dispatch table: the compiler proves the
//! match exhaustive, so adding a new operation kind is a compile error at
//! every call site that forgot to handle it, which a runtime lookup table
//! can't offer. `registry.rs` holds the one dispatch that genuinely is a
//! runtime lookup: resolving a `(module_tag, op_tag)` pair read off the wire
//! back into a constructor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::OpError;
use crate::op::{BaseOperation, Conflict, ConflictlessContext};
use crate::sequence::{map_op::Map, move_op::Move, patch::Patch};
use crate::value::{self, Math};

/// Every operation this crate knows how to apply, simplify, invert,
/// compose, and rebase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Operation {
    NoOp,
    Set(Document),
    Math(Math),
    Move(Move),
    Patch(Patch),
    Map(Map),
}

impl BaseOperation for Operation {
    fn apply(&self, document: &Document) -> Result<Document, OpError> {
        match self {
            Operation::NoOp => Ok(document.clone()),
            Operation::Set(v) => Ok(v.clone()),
            Operation::Math(m) => m.apply(document),
            Operation::Move(m) => m.apply(document),
            Operation::Patch(p) => p.apply(document),
            Operation::Map(m) => m.apply(document),
        }
    }

    fn simplify(self) -> Operation {
        match self {
            Operation::NoOp => Operation::NoOp,
            Operation::Set(v) => Operation::Set(v),
            Operation::Math(m) => m.simplify(),
            Operation::Move(m) => m.simplify(),
            Operation::Patch(p) => p.simplify(),
            Operation::Map(m) => m.simplify(),
        }
    }

    fn inverse(&self, document: &Document) -> Result<Operation, OpError> {
        match self {
            Operation::NoOp => Ok(Operation::NoOp),
            Operation::Set(_) => Ok(Operation::Set(document.clone())),
            Operation::Math(m) => Ok(Operation::Math(m.inverse(document)?)),
            Operation::Move(m) => Ok(Operation::Move(m.inverse(document)?)),
            Operation::Patch(p) => Ok(Operation::Patch(p.inverse(document)?)),
            Operation::Map(m) => Ok(Operation::Map(m.inverse(document)?)),
        }
    }

    fn atomic_compose(&self, other: &Operation) -> Option<Operation> {
        // Anything followed by a whole-value Set collapses to that Set —
        // whatever self did no longer matters once other replaces the value
        // outright. This subsumes NoOp-then-anything and anything-then-Set.
        if let Operation::Set(v) = other {
            return Some(Operation::Set(v.clone()));
        }
        match (self, other) {
            (Operation::NoOp, _) => Some(other.clone()),
            (_, Operation::NoOp) => Some(self.clone()),
            (Operation::Set(v), _) => other.apply(v).ok().map(Operation::Set),
            (Operation::Math(a), Operation::Math(b)) => a.atomic_compose(b),
            (Operation::Move(a), Operation::Move(b)) => a.atomic_compose(b).map(Operation::Move),
            (Operation::Map(a), Operation::Map(b)) => a.atomic_compose(b).map(Operation::Map),
            (Operation::Patch(p), _) => p.atomic_compose(other),
            _ => None,
        }
    }

    fn rebase(&self, other: &Operation, ctx: Option<&ConflictlessContext>) -> Result<Operation, Conflict> {
        match self {
            Operation::NoOp => Ok(Operation::NoOp),
            Operation::Set(v) => value::rebase_set_vs_other(v, other, ctx),
            Operation::Math(m) => m.rebase(other, ctx),
            Operation::Move(m) => m.rebase(other, ctx),
            Operation::Patch(p) => p.rebase(other, ctx),
            Operation::Map(m) => m.rebase(other, ctx),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::NoOp => write!(f, "<values.NOOP>"),
            Operation::Set(v) => write!(f, "<values.SET {v}>"),
            Operation::Math(m) => match m.operator {
                value::MathOperator::Add(k) => write!(f, "<values.MATH add:{k}>"),
                value::MathOperator::Mult(k) => write!(f, "<values.MATH mult:{k}>"),
                value::MathOperator::Rot { increment, modulus } => {
                    write!(f, "<values.MATH rot:{increment}%{modulus}>")
                }
                value::MathOperator::And(k) => write!(f, "<values.MATH and:{k}>"),
                value::MathOperator::Or(k) => write!(f, "<values.MATH or:{k}>"),
                value::MathOperator::Xor(k) => write!(f, "<values.MATH xor:{k}>"),
                value::MathOperator::Not => write!(f, "<values.MATH not>"),
            },
            Operation::Move(m) => write!(f, "<sequences.MOVE @{}x{} => @{}>", m.length, m.from, m.to),
            Operation::Patch(p) => {
                write!(f, "<sequences.PATCH")?;
                let mut pos = 0usize;
                for hunk in &p.hunks {
                    pos += hunk.gap;
                    write!(f, " +{}x{} {}", pos, hunk.length, hunk.op)?;
                    pos += hunk.length;
                }
                write!(f, ">")
            }
            Operation::Map(m) => write!(f, "<sequences.MAP {}>", m.sub_op),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_is_identity_for_apply() {
        let doc = Document::int(7);
        assert_eq!(Operation::NoOp.apply(&doc).unwrap(), doc);
    }

    #[test]
    fn set_inverse_restores_prior_value() {
        let before = Document::int(3);
        let op = Operation::Set(Document::int(9));
        let after = op.apply(&before).unwrap();
        let inv = op.inverse(&before).unwrap();
        assert_eq!(inv.apply(&after).unwrap(), before);
    }

    #[test]
    fn compose_into_set_collapses_self() {
        let a = Operation::Math(Math { operator: value::MathOperator::Add(crate::document::Number::Int(1)) });
        let b = Operation::Set(Document::int(42));
        assert_eq!(a.atomic_compose(&b), Some(Operation::Set(Document::int(42))));
    }

    #[test]
    fn display_matches_expected_shapes() {
        let set = Operation::Set(Document::int(2));
        assert_eq!(set.to_string(), "<values.SET 2>");
    }
}
