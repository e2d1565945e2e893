//! `Move`: relocate a contiguous slice of a sequence without touching its
//! content.
//!
//! Kept as its own type rather than folded into [`Patch`] because its
//! rebase/compose rules are geometric (boundary translation) rather than
//! hunk-overlap arithmetic.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::OpError;
use crate::harness::Operation;
use crate::op::{Conflict, ConflictlessContext};
use crate::sequence::patch::Patch;

/// Remove the `length` elements starting at `from`, then reinsert them
/// before the element that originally sat at index `to`.
///
/// `to` is always expressed in the *pre-move* document's indices, the same
/// convention `from` uses — not in the post-removal document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub from: usize,
    pub length: usize,
    pub to: usize,
}

fn insert_at(from: usize, length: usize, to: usize) -> usize {
    if to <= from {
        to
    } else {
        to - length
    }
}

impl Move {
    fn split(document: &Document, from: usize, length: usize) -> Result<(Document, Document, Document), OpError> {
        match document {
            Document::String(_) | Document::Array(_) => {
                let total = document.sequence_len().unwrap_or(0);
                if from + length > total {
                    return Err(OpError::OutOfBounds { index: from, len: total });
                }
                let before = Patch::document_slice(document, 0, from)?;
                let block = Patch::document_slice(document, from, length)?;
                let after = Patch::document_slice(document, from + length, total - from - length)?;
                Ok((before, block, after))
            }
            other => Err(OpError::type_mismatch("sequence", other)),
        }
    }

    pub fn apply(&self, document: &Document) -> Result<Document, OpError> {
        let (before, block, after) = Self::split(document, self.from, self.length)?;
        let rest = Patch::concat(document, vec![before, after])?;
        let at = insert_at(self.from, self.length, self.to);
        let rest_len = rest.sequence_len().unwrap_or(0);
        if at > rest_len {
            return Err(OpError::OutOfBounds { index: at, len: rest_len });
        }
        let head = Patch::document_slice(&rest, 0, at)?;
        let tail = Patch::document_slice(&rest, at, rest_len - at)?;
        Patch::concat(document, vec![head, block, tail])
    }

    pub fn simplify(self) -> Operation {
        let at = insert_at(self.from, self.length, self.to);
        if self.length == 0 || at == self.from {
            Operation::NoOp
        } else {
            Operation::Move(self)
        }
    }

    pub fn inverse(&self, _document: &Document) -> Result<Move, OpError> {
        let at = insert_at(self.from, self.length, self.to);
        Ok(Move {
            from: at,
            length: self.length,
            to: self.from + self.length,
        })
    }

    pub fn atomic_compose(&self, other: &Move) -> Option<Move> {
        let at1 = insert_at(self.from, self.length, self.to);
        if other.from != at1 || other.length != self.length {
            return None;
        }
        let at2 = insert_at(at1, self.length, other.to);
        let new_to = if at2 <= self.from { at2 } else { at2 + self.length };
        Some(Move {
            from: self.from,
            length: self.length,
            to: new_to,
        })
    }

    pub fn rebase(&self, other: &Operation, ctx: Option<&ConflictlessContext>) -> Result<Operation, Conflict> {
        match other {
            Operation::NoOp => Ok(Operation::Move(self.clone())),
            Operation::Set(v) => crate::value::rebase_sequence_vs_set(&Operation::Move(self.clone()), v, ctx),
            Operation::Move(m2) => Ok(rebase_move_vs_move(self, m2).simplify()),
            Operation::Patch(p2) => Ok(rebase_move_vs_patch(self, p2)?.simplify()),
            Operation::Map(_) => Ok(Operation::Move(self.clone())),
            Operation::Math(_) => Err(Conflict),
        }
    }
}

/// Where a point in the pre-move document ends up after `mv` is applied.
/// Points inside the moved block travel along with it proportionally.
fn translate_point(pos: usize, mv: &Move) -> usize {
    let block_start = mv.from;
    let block_end = mv.from + mv.length;
    let at = insert_at(mv.from, mv.length, mv.to);
    if pos >= block_start && pos <= block_end {
        return at + (pos - block_start);
    }
    let r = if pos < block_start { pos } else { pos - mv.length };
    if r >= at {
        r + mv.length
    } else {
        r
    }
}

fn rebase_move_vs_move(a: &Move, b: &Move) -> Move {
    let new_from = translate_point(a.from, b);
    let new_end = translate_point(a.from + a.length, b);
    let new_to = translate_point(a.to, b);
    Move {
        from: new_from,
        length: new_end.saturating_sub(new_from),
        to: new_to,
    }
}

/// Translate a hunk's `[start, end)` range through a concurrent `Move`.
/// `Err(Conflict)` when the move's reinsertion point would split the range
/// in two, or the range straddles the moved block's own boundary.
fn translate_range(start: usize, end: usize, mv: &Move) -> Result<(usize, usize), Conflict> {
    let block_start = mv.from;
    let block_end = mv.from + mv.length;
    let at = insert_at(mv.from, mv.length, mv.to);
    let fully_inside = start >= block_start && end <= block_end;
    let fully_outside = end <= block_start || start >= block_end;
    if fully_inside {
        let off = at as i64 - block_start as i64;
        return Ok(((start as i64 + off) as usize, (end as i64 + off) as usize));
    }
    if fully_outside {
        let r = |p: usize| if p < block_start { p } else { p - mv.length };
        let shift = |rp: usize| if rp >= at { rp + mv.length } else { rp };
        let (rs, re) = (r(start), r(end));
        if rs < at && re > at {
            return Err(Conflict);
        }
        return Ok((shift(rs), shift(re)));
    }
    Err(Conflict)
}

fn rebase_move_vs_patch(mv: &Move, patch: &Patch) -> Result<Move, Conflict> {
    let abs = patch.absolute();
    let translate = |pos: usize| -> Result<usize, Conflict> {
        let mut cursor_orig = 0usize;
        let mut cursor_new = 0usize;
        for (o, l, op) in &abs {
            if pos < *o {
                return Ok(cursor_new + (pos - cursor_orig));
            }
            if pos == *o {
                return Ok(cursor_new);
            }
            let out_len = crate::sequence::patch::structural_output_len(op, *l);
            if pos == o + l {
                return Ok(cursor_new + (o - cursor_orig) + out_len);
            }
            if pos < o + l {
                return Err(Conflict);
            }
            cursor_new += (o - cursor_orig) + out_len;
            cursor_orig = o + l;
        }
        Ok(cursor_new + (pos - cursor_orig))
    };
    Ok(Move {
        from: translate(mv.from)?,
        length: translate(mv.from + mv.length)?.checked_sub(translate(mv.from)?).unwrap_or(0),
        to: translate(mv.to)?,
    })
}

/// Used by `Patch::rebase` when `self` is the patch and `other` is a `Move`.
pub fn rebase_patch_vs_move(patch: &Patch, mv: &Move, _ctx: Option<&ConflictlessContext>) -> Result<Operation, Conflict> {
    let mut out = Vec::with_capacity(patch.hunks.len());
    for (offset, length, op) in patch.absolute() {
        let (new_offset, new_end) = translate_range(offset, offset + length, mv)?;
        out.push((new_offset, new_end.saturating_sub(new_offset), op.clone()));
    }
    Ok(Patch::from_absolute(out).simplify())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_moves_block_later() {
        let doc = Document::array((1..=5).map(Document::int));
        let mv = Move { from: 1, length: 2, to: 4 };
        let result = mv.apply(&doc).unwrap();
        let expected = Document::array([1, 4, 2, 3, 5].into_iter().map(Document::int));
        assert_eq!(result, expected);
    }

    #[test]
    fn apply_moves_block_earlier() {
        let doc = Document::array((1..=5).map(Document::int));
        let mv = Move { from: 3, length: 1, to: 0 };
        let result = mv.apply(&doc).unwrap();
        let expected = Document::array([4, 1, 2, 3, 5].into_iter().map(Document::int));
        assert_eq!(result, expected);
    }

    #[test]
    fn inverse_undoes_move() {
        let doc = Document::array((1..=5).map(Document::int));
        let mv = Move { from: 1, length: 2, to: 4 };
        let moved = mv.apply(&doc).unwrap();
        let inv = mv.inverse(&doc).unwrap();
        assert_eq!(inv.apply(&moved).unwrap(), doc);
    }

    #[test]
    fn inverse_undoes_move_earlier_case() {
        let doc = Document::array((1..=5).map(Document::int));
        let mv = Move { from: 3, length: 1, to: 0 };
        let moved = mv.apply(&doc).unwrap();
        let inv = mv.inverse(&doc).unwrap();
        assert_eq!(inv.apply(&moved).unwrap(), doc);
    }
}
