//! `Map`: broadcast one sub-operation over every element of a sequence.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::OpError;
use crate::harness::Operation;
use crate::op::{BaseOperation, Conflict, ConflictlessContext};

/// Apply `sub_op` independently to every element of the document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Map {
    pub sub_op: Box<Operation>,
}

impl Map {
    pub fn new(sub_op: Operation) -> Map {
        Map { sub_op: Box::new(sub_op) }
    }

    pub fn apply(&self, document: &Document) -> Result<Document, OpError> {
        match document {
            Document::Array(items) => {
                let mapped: Result<Vec<Document>, OpError> =
                    items.iter().map(|item| self.sub_op.apply(item)).collect();
                Ok(Document::Array(mapped?))
            }
            Document::String(s) => {
                let mapped: Result<String, OpError> = s
                    .chars()
                    .map(|c| match self.sub_op.apply(&Document::string(c.to_string()))? {
                        Document::String(out) => Ok(out),
                        other => Err(OpError::type_mismatch("string", &other)),
                    })
                    .collect();
                Ok(Document::String(mapped?))
            }
            other => Err(OpError::type_mismatch("sequence", other)),
        }
    }

    pub fn simplify(self) -> Operation {
        let simplified = self.sub_op.simplify();
        if simplified == Operation::NoOp {
            Operation::NoOp
        } else {
            Operation::Map(Map::new(simplified))
        }
    }

    pub fn inverse(&self, document: &Document) -> Result<Map, OpError> {
        match document {
            Document::Array(items) => {
                let mut inverses = items.iter().map(|item| self.sub_op.inverse(item));
                let first = match inverses.next() {
                    Some(inv) => inv?,
                    None => return Ok(Map::new(Operation::NoOp)),
                };
                for inv in inverses {
                    if inv? != first {
                        // elements diverge after inversion; Map can only
                        // represent a single, uniform sub-operation.
                        return Ok(Map::new(first));
                    }
                }
                Ok(Map::new(first))
            }
            Document::String(s) => {
                let mut chars = s.chars();
                let first = match chars.next() {
                    Some(c) => self.sub_op.inverse(&Document::string(c.to_string()))?,
                    None => return Ok(Map::new(Operation::NoOp)),
                };
                Ok(Map::new(first))
            }
            other => Err(OpError::type_mismatch("sequence", other)),
        }
    }

    pub fn atomic_compose(&self, other: &Map) -> Option<Map> {
        let fused = self.sub_op.atomic_compose(&other.sub_op)?;
        Some(Map::new(fused))
    }

    pub fn rebase(&self, other: &Operation, ctx: Option<&ConflictlessContext>) -> Result<Operation, Conflict> {
        match other {
            Operation::NoOp => Ok(Operation::Map(self.clone())),
            Operation::Map(m2) => {
                let rebased = self.sub_op.rebase(&m2.sub_op, ctx)?;
                Ok(Map::new(rebased).simplify())
            }
            Operation::Patch(p) => {
                // A single element-level hunk (an `Apply`) interacts with
                // this Map's sub-operation; anything else is a structural
                // change the sub-operation doesn't see, so Map carries over
                // unchanged.
                if let [hunk] = p.hunks.as_slice() {
                    if hunk.length == 1 {
                        let rebased = self.sub_op.rebase(&hunk.op, ctx)?;
                        return Ok(Map::new(rebased).simplify());
                    }
                }
                Ok(Operation::Map(self.clone()))
            }
            Operation::Move(_) => Ok(Operation::Map(self.clone())),
            Operation::Set(v) => crate::value::rebase_sequence_vs_set(&Operation::Map(self.clone()), v, ctx),
            Operation::Math(_) => Err(Conflict),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Math;

    #[test]
    fn apply_broadcasts_over_array() {
        let doc = Document::array([Document::int(1), Document::int(2), Document::int(3)]);
        let m = Map::new(Math::add(Document::int(10)));
        let result = m.apply(&doc).unwrap();
        assert_eq!(result, Document::array([Document::int(11), Document::int(12), Document::int(13)]));
    }

    #[test]
    fn rebase_against_multi_element_structural_change_is_unchanged() {
        let m = Map::new(Math::add(Document::int(1)));
        let splice = crate::sequence::splice(0, 2, Document::array([Document::int(9)]));
        let rebased = m.rebase(&splice, None).unwrap();
        assert_eq!(rebased, Operation::Map(m));
    }

    #[test]
    fn rebase_against_element_level_apply_delegates_to_sub_op() {
        let m = Map::new(Math::add(Document::int(1)));
        let apply_at = crate::sequence::apply_at(0, Operation::Set(Document::int(9)));
        let rebased = m.rebase(&apply_at, None).unwrap();
        // Math loses unconditionally to a concurrent Set (see value::rebase_math_vs_set):
        // delegating to the sub-op's own rebase collapses this to NoOp, whereas treating
        // the hunk as an opaque structural change would have left the Map unchanged.
        assert_eq!(rebased, Operation::NoOp);
    }
}
