//! The document value type the algebra transforms.
//!
//! A [`Document`] is the in-memory analogue of the JSON-ish values these
//! operations are designed to edit: booleans, numbers, strings, arrays, and
//! (opaque, pass-through) objects. The object family is out of scope for this
//! crate — it is owned by an external object-operation module — so `Document`
//! only needs to carry it around, never interpret it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A numeric document value.
///
/// Kept distinct from a bare `f64` so that `add`/`mult` can preserve integer
/// results the way the spec requires ("operators must preserve the
/// document's primitive type"), while bitwise operators (`and`/`or`/`xor`/
/// `not`) are only ever meaningful on the `Int` variant.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }

    /// The integer value, if this number is exactly representable as one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int(i) => Some(*i),
            Number::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Number::Float(_) => None,
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Number::Int(_))
    }

    pub fn add(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Number::Int(a.wrapping_add(b)),
            (a, b) => Number::Float(a.as_f64() + b.as_f64()),
        }
    }

    pub fn mul(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Number::Int(a.wrapping_mul(b)),
            (a, b) => Number::Float(a.as_f64() * b.as_f64()),
        }
    }

    pub fn neg(self) -> Number {
        match self {
            Number::Int(a) => Number::Int(-a),
            Number::Float(a) => Number::Float(-a),
        }
    }

    /// Multiplicative inverse, used by `Math::inverse` for `mult k`.
    pub fn reciprocal(self) -> Number {
        match self {
            Number::Int(a) => Number::Float(1.0 / a as f64),
            Number::Float(a) => Number::Float(1.0 / a),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_f64() == 0.0
    }

    pub fn is_one(&self) -> bool {
        self.as_f64() == 1.0
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.as_f64().partial_cmp(&other.as_f64())
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) => write!(f, "{x}"),
        }
    }
}

/// A document value.
///
/// Strings and arrays are the two *sequence* containers the sequence algebra
/// operates on; everything else is a scalar the value algebra operates on.
/// `Missing` is the sentinel external object-operation modules use for "key
/// absent" — the algebra threads it through but never branches on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Document {
    Missing,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Document>),
    Object(BTreeMap<String, Document>),
}

impl Document {
    pub fn int(i: i64) -> Document {
        Document::Number(Number::Int(i))
    }

    pub fn float(f: f64) -> Document {
        Document::Number(Number::Float(f))
    }

    pub fn string(s: impl Into<String>) -> Document {
        Document::String(s.into())
    }

    pub fn array(items: impl IntoIterator<Item = Document>) -> Document {
        Document::Array(items.into_iter().collect())
    }

    /// The number of elements in a sequence container (chars for a string,
    /// items for an array). `None` for scalars.
    pub fn sequence_len(&self) -> Option<usize> {
        match self {
            Document::String(s) => Some(s.chars().count()),
            Document::Array(a) => Some(a.len()),
            _ => None,
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Document::String(_) | Document::Array(_))
    }

    /// A short type name, used for `TypeError` messages and the total order.
    pub fn type_name(&self) -> &'static str {
        match self {
            Document::Missing => "missing",
            Document::Bool(_) => "bool",
            Document::Number(_) => "number",
            Document::String(_) => "string",
            Document::Array(_) => "array",
            Document::Object(_) => "object",
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Document::Missing => write!(f, "<missing>"),
            Document::Bool(b) => write!(f, "{b}"),
            Document::Number(n) => write!(f, "{n}"),
            Document::String(s) => write!(f, "{s:?}"),
            Document::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Document::Object(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_equality_crosses_representation() {
        assert_eq!(Number::Int(2), Number::Float(2.0));
        assert_ne!(Number::Int(2), Number::Float(2.5));
    }

    #[test]
    fn sequence_len_counts_chars_not_bytes() {
        let doc = Document::string("héllo");
        assert_eq!(doc.sequence_len(), Some(5));
    }

    #[test]
    fn display_matches_expected_shapes() {
        assert_eq!(Document::int(2).to_string(), "2");
        assert_eq!(Document::Bool(true).to_string(), "true");
    }
}
