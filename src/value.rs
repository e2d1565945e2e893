//! The value algebra: `NoOp`, `Set`, `Math`.
//!
//! These three operate on scalars (and, for `Set`, on whole sequences too —
//! replacing a string or array wholesale is a value-level operation even
//! though the value happens to be a sequence). The sequence-specific algebra
//! (`Patch`, `Move`, `Map`) lives in `sequence/`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::{Document, Number};
use crate::error::OpError;
use crate::harness::Operation;
use crate::op::{BaseOperation, Conflict, ConflictlessContext};
use crate::order;

/// The operand of a bitwise `Math` operator (`and`/`or`/`xor`/`not`):
/// integers use bitwise semantics, booleans use logical semantics, and the
/// two never mix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Bits {
    Int(i64),
    Bool(bool),
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bits::Int(i) => write!(f, "{i}"),
            Bits::Bool(b) => write!(f, "{b}"),
        }
    }
}

fn bits_not(b: Bits) -> Bits {
    match b {
        Bits::Int(i) => Bits::Int(!i),
        Bits::Bool(x) => Bits::Bool(!x),
    }
}

fn mismatched_bits() -> OpError {
    OpError::TypeMismatch {
        expected: "matching bit operand kind",
        found: "mismatched bit operand kind",
    }
}

fn bits_and(a: Bits, b: Bits) -> Result<Bits, OpError> {
    match (a, b) {
        (Bits::Int(x), Bits::Int(y)) => Ok(Bits::Int(x & y)),
        (Bits::Bool(x), Bits::Bool(y)) => Ok(Bits::Bool(x && y)),
        _ => Err(mismatched_bits()),
    }
}

fn bits_or(a: Bits, b: Bits) -> Result<Bits, OpError> {
    match (a, b) {
        (Bits::Int(x), Bits::Int(y)) => Ok(Bits::Int(x | y)),
        (Bits::Bool(x), Bits::Bool(y)) => Ok(Bits::Bool(x || y)),
        _ => Err(mismatched_bits()),
    }
}

fn bits_xor(a: Bits, b: Bits) -> Result<Bits, OpError> {
    match (a, b) {
        (Bits::Int(x), Bits::Int(y)) => Ok(Bits::Int(x ^ y)),
        (Bits::Bool(x), Bits::Bool(y)) => Ok(Bits::Bool(x ^ y)),
        _ => Err(mismatched_bits()),
    }
}

fn bits_to_document(b: Bits) -> Document {
    match b {
        Bits::Int(i) => Document::int(i),
        Bits::Bool(x) => Document::Bool(x),
    }
}

fn expect_bits(document: &Document) -> Result<Bits, OpError> {
    match document {
        Document::Number(n) => n.as_i64().map(Bits::Int).ok_or_else(|| OpError::type_mismatch("integer", document)),
        Document::Bool(b) => Ok(Bits::Bool(*b)),
        other => Err(OpError::type_mismatch("integer or bool", other)),
    }
}

fn apply_bitwise(
    document: &Document,
    k: Bits,
    int_op: fn(i64, i64) -> i64,
    bool_op: fn(bool, bool) -> bool,
) -> Result<Document, OpError> {
    match (document, k) {
        (Document::Number(n), Bits::Int(kk)) => {
            let base = n.as_i64().ok_or_else(|| OpError::type_mismatch("integer", document))?;
            Ok(Document::int(int_op(base, kk)))
        }
        (Document::Bool(b), Bits::Bool(kk)) => Ok(Document::Bool(bool_op(*b, kk))),
        _ => Err(OpError::type_mismatch("integer or bool matching operand", document)),
    }
}

/// `Math`'s operators. `add`/`mult` are commutative and associative, which is
/// what lets two concurrent `Math`s of the *same* operator always commute
/// without a tie-break; the bitwise operators and `rot` share that property
/// for their own families.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum MathOperator {
    Add(Number),
    Mult(Number),
    /// `(d + increment) mod modulus`, over non-negative integers.
    Rot { increment: i64, modulus: i64 },
    And(Bits),
    Or(Bits),
    Xor(Bits),
    Not,
}

fn same_math_family(a: MathOperator, b: MathOperator) -> bool {
    match (a, b) {
        (MathOperator::Add(_), MathOperator::Add(_)) => true,
        (MathOperator::Mult(_), MathOperator::Mult(_)) => true,
        (MathOperator::Rot { modulus: m1, .. }, MathOperator::Rot { modulus: m2, .. }) => m1 == m2,
        (MathOperator::And(_), MathOperator::And(_)) => true,
        (MathOperator::Or(_), MathOperator::Or(_)) => true,
        (MathOperator::Xor(_), MathOperator::Xor(_)) => true,
        (MathOperator::Not, MathOperator::Not) => true,
        _ => false,
    }
}

/// Apply a commutative arithmetic/bitwise function to a scalar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Math {
    pub operator: MathOperator,
}

impl Math {
    pub fn add(delta: Document) -> Operation {
        let n = expect_number(&delta).unwrap_or(Number::Int(0));
        Operation::Math(Math { operator: MathOperator::Add(n) })
    }

    pub fn mult(factor: Document) -> Operation {
        let n = expect_number(&factor).unwrap_or(Number::Int(1));
        Operation::Math(Math { operator: MathOperator::Mult(n) })
    }

    pub fn rot(increment: Document, modulus: Document) -> Operation {
        let inc = expect_number(&increment).ok().and_then(|n| n.as_i64()).unwrap_or(0);
        let m = expect_number(&modulus).ok().and_then(|n| n.as_i64()).unwrap_or(1);
        Operation::Math(Math { operator: MathOperator::Rot { increment: inc, modulus: m } })
    }

    pub fn and(k: Document) -> Operation {
        let bits = expect_bits(&k).unwrap_or(Bits::Int(0));
        Operation::Math(Math { operator: MathOperator::And(bits) })
    }

    pub fn or(k: Document) -> Operation {
        let bits = expect_bits(&k).unwrap_or(Bits::Int(0));
        Operation::Math(Math { operator: MathOperator::Or(bits) })
    }

    pub fn xor(k: Document) -> Operation {
        let bits = expect_bits(&k).unwrap_or(Bits::Int(0));
        Operation::Math(Math { operator: MathOperator::Xor(bits) })
    }

    pub fn not() -> Operation {
        Operation::Math(Math { operator: MathOperator::Not })
    }

    pub fn apply(&self, document: &Document) -> Result<Document, OpError> {
        match self.operator {
            MathOperator::Add(k) => Ok(Document::Number(expect_number(document)?.add(k))),
            MathOperator::Mult(k) => Ok(Document::Number(expect_number(document)?.mul(k))),
            MathOperator::Rot { increment, modulus } => {
                if modulus <= 0 {
                    return Err(OpError::InvalidRotModulus(modulus));
                }
                let n = expect_number(document)?;
                let base = n.as_i64().ok_or_else(|| OpError::type_mismatch("integer", document))?;
                let result = ((base + increment) % modulus + modulus) % modulus;
                Ok(Document::int(result))
            }
            MathOperator::And(k) => apply_bitwise(document, k, |a, b| a & b, |a, b| a && b),
            MathOperator::Or(k) => apply_bitwise(document, k, |a, b| a | b, |a, b| a || b),
            MathOperator::Xor(k) => apply_bitwise(document, k, |a, b| a ^ b, |a, b| a ^ b),
            MathOperator::Not => match document {
                Document::Number(n) => {
                    let base = n.as_i64().ok_or_else(|| OpError::type_mismatch("integer", document))?;
                    Ok(Document::int(!base))
                }
                Document::Bool(b) => Ok(Document::Bool(!b)),
                other => Err(OpError::type_mismatch("integer or bool", other)),
            },
        }
    }

    pub fn simplify(self) -> Operation {
        match self.operator {
            MathOperator::Add(k) if k.is_zero() => Operation::NoOp,
            MathOperator::Mult(k) if k.is_one() => Operation::NoOp,
            MathOperator::Rot { increment, modulus } if modulus > 0 => {
                let canonical = increment.rem_euclid(modulus);
                if canonical == 0 {
                    Operation::NoOp
                } else {
                    Operation::Math(Math { operator: MathOperator::Rot { increment: canonical, modulus } })
                }
            }
            MathOperator::And(Bits::Int(0)) => Operation::Set(Document::int(0)),
            MathOperator::And(Bits::Bool(false)) => Operation::Set(Document::Bool(false)),
            MathOperator::Or(Bits::Int(0)) | MathOperator::Or(Bits::Bool(false)) => Operation::NoOp,
            MathOperator::Xor(Bits::Int(0)) | MathOperator::Xor(Bits::Bool(false)) => Operation::NoOp,
            _ => Operation::Math(self),
        }
    }

    pub fn inverse(&self, document: &Document) -> Result<Math, OpError> {
        let operator = match self.operator {
            MathOperator::Add(k) => MathOperator::Add(k.neg()),
            MathOperator::Mult(k) => MathOperator::Mult(k.reciprocal()),
            MathOperator::Rot { increment, modulus } => MathOperator::Rot { increment: -increment, modulus },
            MathOperator::Xor(k) => MathOperator::Xor(k),
            MathOperator::Not => MathOperator::Not,
            MathOperator::And(k) => {
                let d = expect_bits(document)?;
                MathOperator::Or(bits_and(d, bits_not(k))?)
            }
            MathOperator::Or(k) => {
                let d = expect_bits(document)?;
                MathOperator::Xor(bits_and(bits_not(d), k)?)
            }
        };
        Ok(Math { operator })
    }

    /// Fuse two `Math`s into a single equivalent operation, or report that no
    /// fusion exists. Some mixed-operator fusions (`and k` then `or k`)
    /// collapse to a `Set` rather than another `Math`, hence `Operation`
    /// rather than `Math` as the return type.
    pub fn atomic_compose(&self, other: &Math) -> Option<Operation> {
        use MathOperator::*;
        match (self.operator, other.operator) {
            (Add(a), Add(b)) => Some(Operation::Math(Math { operator: Add(a.add(b)) })),
            (Mult(a), Mult(b)) => Some(Operation::Math(Math { operator: Mult(a.mul(b)) })),
            (Rot { increment: i1, modulus: m1 }, Rot { increment: i2, modulus: m2 }) if m1 == m2 && m1 > 0 => {
                Some(Operation::Math(Math { operator: Rot { increment: (i1 + i2).rem_euclid(m1), modulus: m1 } }))
            }
            (And(a), And(b)) => bits_and(a, b).ok().map(|r| Operation::Math(Math { operator: And(r) })),
            (Or(a), Or(b)) => bits_or(a, b).ok().map(|r| Operation::Math(Math { operator: Or(r) })),
            (Xor(a), Xor(b)) => bits_xor(a, b).ok().map(|r| Operation::Math(Math { operator: Xor(r) })),
            (Not, Not) => Some(Operation::NoOp),
            (And(a), Or(b)) if a == b => Some(Operation::Set(bits_to_document(a))),
            (Or(a), Xor(b)) if a == b => Some(Operation::Math(Math { operator: And(bits_not(a)) })),
            _ => None,
        }
    }

    pub fn rebase(&self, other: &Operation, ctx: Option<&ConflictlessContext>) -> Result<Operation, Conflict> {
        match other {
            Operation::NoOp => Ok(Operation::Math(*self)),
            Operation::Set(v2) => rebase_math_vs_set(self, v2),
            Operation::Math(m2) => {
                if same_math_family(self.operator, m2.operator) {
                    // Commutative within the family: both deltas apply
                    // independently, in either order, with the same result.
                    Ok(Operation::Math(*self))
                } else {
                    let Some(c) = ctx else { return Err(Conflict) };
                    let self_result = self.apply(&c.document).map_err(|_| Conflict)?;
                    let other_result = other.apply(&c.document).map_err(|_| Conflict)?;
                    tie_break(self_result, other_result)
                }
            }
            Operation::Patch(_) | Operation::Move(_) | Operation::Map(_) => Err(Conflict),
        }
    }
}

fn expect_number(document: &Document) -> Result<Number, OpError> {
    match document {
        Document::Number(n) => Ok(*n),
        other => Err(OpError::type_mismatch("number", other)),
    }
}

/// Deterministic resolution when two operations disagree about the final
/// value of the same scalar: identical results collapse to `NoOp` even
/// without a tie-break; otherwise the lower-ranked result (under
/// `order::cmp`) yields, and the winner is re-expressed as `Set` of its
/// result so both sites converge on the exact same document regardless of
/// which operator produced it.
fn tie_break(self_result: Document, other_result: Document) -> Result<Operation, Conflict> {
    if self_result == other_result {
        return Ok(Operation::NoOp);
    }
    if order::lower(&self_result, &other_result) {
        Ok(Operation::NoOp)
    } else {
        Ok(Operation::Set(self_result))
    }
}

pub fn rebase_set_vs_set(v1: &Document, v2: &Document, ctx: Option<&ConflictlessContext>) -> Result<Operation, Conflict> {
    if v1 == v2 {
        return Ok(Operation::NoOp);
    }
    if ctx.is_none() {
        return Err(Conflict);
    }
    if order::lower(v1, v2) {
        Ok(Operation::NoOp)
    } else {
        Ok(Operation::Set(v1.clone()))
    }
}

/// Set vs Math is a fixed rule, not a tie-break: Set is declared to come
/// "second" in the combined effect, so it always survives a concurrent Math
/// unchanged. Never conflicts; no pre-state needed.
fn rebase_set_vs_math(v: &Document, _math: &Math) -> Result<Operation, Conflict> {
    Ok(Operation::Set(v.clone()))
}

/// The converse of `rebase_set_vs_math`: Math always loses to a concurrent
/// Set and collapses to NoOp.
fn rebase_math_vs_set(_math: &Math, _v2: &Document) -> Result<Operation, Conflict> {
    Ok(Operation::NoOp)
}

/// `Set` rebased against anything other than another `Set` or a `Math`
/// (i.e. a sequence structural change) is the mirror image of
/// `rebase_sequence_vs_set` below: same tie-break, same total order.
pub fn rebase_set_vs_other(v: &Document, other: &Operation, ctx: Option<&ConflictlessContext>) -> Result<Operation, Conflict> {
    match other {
        Operation::NoOp => Ok(Operation::Set(v.clone())),
        Operation::Set(v2) => rebase_set_vs_set(v, v2, ctx),
        Operation::Math(m) => rebase_set_vs_math(v, m),
        Operation::Patch(_) | Operation::Move(_) | Operation::Map(_) => {
            let Some(c) = ctx else { return Err(Conflict) };
            let other_result = other.apply(&c.document).map_err(|_| Conflict)?;
            tie_break(v.clone(), other_result)
        }
    }
}

/// Shared by `Patch`/`Move`/`Map`'s `rebase` when `other` is `Set(v2)`: the
/// sequence operation's own result competes with `v2` under the same total
/// order as any other `Set`-involved pair.
pub fn rebase_sequence_vs_set(seq_op: &Operation, v2: &Document, ctx: Option<&ConflictlessContext>) -> Result<Operation, Conflict> {
    let Some(c) = ctx else { return Err(Conflict) };
    let self_result = seq_op.apply(&c.document).map_err(|_| Conflict)?;
    tie_break(self_result, v2.clone())
}
