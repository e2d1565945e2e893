//! `Patch`: the canonical sequence-operation form.
//!
//! A `Patch` is an ordered list of hunks. Each hunk covers a contiguous,
//! non-overlapping slice of the document and nests a sub-operation that
//! transforms that slice. `Splice` and `Apply` are not separate variants —
//! both normalize down to a `Patch` (see `sequence::splice`/`apply_at`).

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::OpError;
use crate::harness::Operation;
use crate::op::{BaseOperation, Conflict, ConflictlessContext};
use crate::order;

/// One contiguous, non-overlapping slice of a sequence document plus the
/// sub-operation that transforms it.
///
/// `gap` is the distance from the end of the previous hunk (0 for the
/// first hunk) — not an absolute offset. This is what lets two `Patch`es
/// compose and rebase without the unrelated parts of the document shifting
/// every stored offset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hunk {
    pub gap: usize,
    pub length: usize,
    pub op: Box<Operation>,
}

/// The canonical sequence-operation form: an ordered list of [`Hunk`]s.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Patch {
    pub hunks: Vec<Hunk>,
}

/// How much a sub-operation changes the element count of the slice it
/// covers, computed without needing the actual document content.
///
/// This is possible because only `Set` changes length unconditionally (to
/// `len(new_value)`); every other operation kind either provably preserves
/// the slice's element count (`NoOp`, `Math`, `Move`, `Map`) or can have its
/// own length computed recursively (nested `Patch`).
pub(crate) fn structural_output_len(op: &Operation, pre_len: usize) -> usize {
    match op {
        Operation::NoOp => pre_len,
        Operation::Set(v) => v.sequence_len().unwrap_or(1),
        Operation::Math(_) => pre_len,
        Operation::Move(_) => pre_len,
        Operation::Map(_) => pre_len,
        Operation::Patch(p) => p.structural_len(pre_len),
    }
}

impl Patch {
    pub fn single(gap: usize, length: usize, op: Operation) -> Patch {
        Patch {
            hunks: vec![Hunk {
                gap,
                length,
                op: Box::new(op),
            }],
        }
    }

    /// This patch's hunks as `(absolute_offset, length, &Operation)` in the
    /// document it was built to act on.
    pub fn absolute(&self) -> Vec<(usize, usize, &Operation)> {
        let mut pos = 0usize;
        let mut out = Vec::with_capacity(self.hunks.len());
        for hunk in &self.hunks {
            pos += hunk.gap;
            out.push((pos, hunk.length, hunk.op.as_ref()));
            pos += hunk.length;
        }
        out
    }

    pub(crate) fn from_absolute(mut abs: Vec<(usize, usize, Operation)>) -> Patch {
        abs.sort_by_key(|(offset, _, _)| *offset);
        let mut hunks = Vec::with_capacity(abs.len());
        let mut prev_end = 0usize;
        for (offset, length, op) in abs {
            hunks.push(Hunk {
                gap: offset - prev_end,
                length,
                op: Box::new(op),
            });
            prev_end = offset + length;
        }
        Patch { hunks }
    }

    /// The total element count this patch expects/produces, given the
    /// document length it was built against (`pre_len`).
    fn structural_len(&self, pre_len: usize) -> usize {
        let mut orig_cursor = 0usize;
        let mut out_len = 0usize;
        for (offset, length, op) in self.absolute() {
            out_len += offset - orig_cursor; // untouched gap, copied verbatim
            out_len += structural_output_len(op, length);
            orig_cursor = offset + length;
        }
        out_len += pre_len.saturating_sub(orig_cursor);
        out_len
    }

    pub(crate) fn document_slice(document: &Document, offset: usize, length: usize) -> Result<Document, OpError> {
        match document {
            Document::String(s) => {
                let chars: Vec<char> = s.chars().collect();
                let end = (offset + length).min(chars.len());
                if offset > chars.len() || end < offset {
                    return Err(OpError::OutOfBounds { index: offset, len: chars.len() });
                }
                Ok(Document::String(chars[offset..end].iter().collect()))
            }
            Document::Array(items) => {
                let end = (offset + length).min(items.len());
                if offset > items.len() || end < offset {
                    return Err(OpError::OutOfBounds { index: offset, len: items.len() });
                }
                Ok(Document::Array(items[offset..end].to_vec()))
            }
            other => Err(OpError::type_mismatch("sequence", other)),
        }
    }

    pub(crate) fn concat(kind: &Document, parts: Vec<Document>) -> Result<Document, OpError> {
        match kind {
            Document::String(_) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        Document::String(s) => out.push_str(&s),
                        other => return Err(OpError::type_mismatch("string", &other)),
                    }
                }
                Ok(Document::String(out))
            }
            Document::Array(_) => {
                let mut out = Vec::new();
                for part in parts {
                    match part {
                        Document::Array(items) => out.extend(items),
                        other => return Err(OpError::type_mismatch("array", &other)),
                    }
                }
                Ok(Document::Array(out))
            }
            other => Err(OpError::type_mismatch("sequence", other)),
        }
    }

    pub fn apply(&self, document: &Document) -> Result<Document, OpError> {
        if !document.is_sequence() {
            return Err(OpError::type_mismatch("sequence", document));
        }
        let total = document.sequence_len().unwrap_or(0);
        let mut parts = Vec::new();
        let mut cursor = 0usize;
        for (offset, length, op) in self.absolute() {
            if offset < cursor || offset + length > total {
                return Err(OpError::MalformedPatch(format!(
                    "hunk at {offset} (len {length}) out of bounds for document of length {total}"
                )));
            }
            if offset > cursor {
                parts.push(Self::document_slice(document, cursor, offset - cursor)?);
            }
            let slice = Self::document_slice(document, offset, length)?;
            parts.push(op.apply(&slice)?);
            cursor = offset + length;
        }
        if cursor < total {
            parts.push(Self::document_slice(document, cursor, total - cursor)?);
        }
        Self::concat(document, parts)
    }

    pub fn simplify(self) -> Operation {
        let abs = self.absolute();
        let mut kept: Vec<(usize, usize, Operation)> = Vec::with_capacity(abs.len());
        for (offset, length, op) in abs {
            let simplified = op.clone().simplify();
            if simplified != Operation::NoOp {
                kept.push((offset, length, simplified));
            }
        }
        if kept.is_empty() {
            return Operation::NoOp;
        }
        // Merge adjacent Set-hunks that touch with no gap between them —
        // this is what turns "Splice then abutting Splice" into one Splice.
        let mut merged: Vec<(usize, usize, Operation)> = Vec::with_capacity(kept.len());
        for (offset, length, op) in kept {
            if let Some((prev_off, prev_len, prev_op)) = merged.last_mut() {
                if *prev_off + *prev_len == offset {
                    if let (Operation::Set(prev_v), Operation::Set(v)) = (&prev_op, &op) {
                        if let Ok(combined) = Self::concat(prev_v, vec![prev_v.clone(), v.clone()]) {
                            *prev_len += length;
                            *prev_op = Operation::Set(combined);
                            continue;
                        }
                    }
                }
            }
            merged.push((offset, length, op));
        }
        let patch = Patch::from_absolute(merged);
        Operation::Patch(patch)
    }

    pub fn inverse(&self, document: &Document) -> Result<Patch, OpError> {
        let mut out_abs = Vec::with_capacity(self.hunks.len());
        for (offset, length, op) in self.absolute() {
            let slice = Self::document_slice(document, offset, length)?;
            let inv = op.inverse(&slice)?;
            let post_len = structural_output_len(op, length);
            out_abs.push((offset, post_len, inv));
        }
        Ok(Patch::from_absolute(out_abs))
    }

    pub fn atomic_compose(&self, other: &Operation) -> Option<Operation> {
        if self.hunks.is_empty() {
            return Some(other.clone());
        }
        match other {
            Operation::NoOp => Some(Operation::Patch(self.clone())),
            Operation::Set(v) => Some(Operation::Set(v.clone())),
            Operation::Patch(p2) => {
                if p2.hunks.is_empty() {
                    return Some(Operation::Patch(self.clone()));
                }
                let mut self_abs: Vec<(usize, usize, Operation)> = self
                    .absolute()
                    .into_iter()
                    .map(|(o, l, op)| (o, l, op.clone()))
                    .collect();
                for (off, len, op2) in p2.absolute() {
                    self_abs = compose_one(&self_abs, off, len, op2)?;
                }
                Some(Patch::from_absolute(self_abs).simplify())
            }
            _ => None,
        }
    }

    pub fn rebase(&self, other: &Operation, ctx: Option<&ConflictlessContext>) -> Result<Operation, Conflict> {
        match other {
            Operation::NoOp => Ok(Operation::Patch(self.clone())),
            Operation::Set(v) => crate::value::rebase_sequence_vs_set(&Operation::Patch(self.clone()), v, ctx),
            Operation::Patch(p2) => rebase_patch_patch(self, p2, ctx),
            Operation::Move(m) => crate::sequence::move_op::rebase_patch_vs_move(self, m, ctx),
            Operation::Map(m) => rebase_patch_vs_map(self, m, ctx),
            Operation::Math(_) => Err(Conflict),
        }
    }
}

fn compose_one(
    self_abs: &[(usize, usize, Operation)],
    off: usize,
    len: usize,
    op2: Operation,
) -> Option<Vec<(usize, usize, Operation)>> {
    // Locate which segment (hunk or gap) of self's post-image [off, off+len)
    // falls into. Segments are computed fresh each call; self_abs is small.
    let mut orig_cursor = 0usize;
    let mut post_cursor = 0usize;
    for (i, (o, l, op)) in self_abs.iter().enumerate() {
        if *o > orig_cursor {
            let gap_len = *o - orig_cursor;
            let gstart = post_cursor;
            let gend = post_cursor + gap_len;
            if off >= gstart && off + len <= gend {
                let mut out = self_abs.to_vec();
                let orig_off = orig_cursor + (off - gstart);
                out.push((orig_off, len, op2));
                return Some(out);
            }
            post_cursor = gend;
            orig_cursor = *o;
        }
        let out_len = structural_output_len(op, *l);
        let hstart = post_cursor;
        let hend = post_cursor + out_len;
        if off >= hstart && off + len <= hend {
            let local = off - hstart;
            let mut out = self_abs.to_vec();
            match op {
                Operation::Set(v) => {
                    let slice = Patch::document_slice(v, local, len).ok()?;
                    let replaced = op2.apply(&slice).ok()?;
                    let chars_before = Patch::document_slice(v, 0, local).ok()?;
                    let tail_start = local + len;
                    let tail_len = out_len.saturating_sub(tail_start);
                    let tail = Patch::document_slice(v, tail_start, tail_len).ok()?;
                    let new_v = Patch::concat(v, vec![chars_before, replaced, tail]).ok()?;
                    out[i] = (*o, *l, Operation::Set(new_v));
                }
                _ if local == 0 && len == out_len => {
                    let fused = op.atomic_compose(&op2)?;
                    out[i] = (*o, *l, fused);
                }
                _ => return None,
            }
            return Some(out);
        }
        post_cursor = hend;
        orig_cursor = *o + *l;
    }
    // trailing open-ended gap
    let orig_off = orig_cursor + (off - post_cursor);
    let mut out = self_abs.to_vec();
    out.push((orig_off, len, op2));
    Some(out)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Containment {
    Disjoint,
    Identical,
    OtherContainsSelf,
    SelfContainsOther,
    Partial,
}

fn classify(a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> Containment {
    if a_start == b_start && a_end == b_end {
        Containment::Identical
    } else if b_start <= a_start && b_end >= a_end {
        Containment::OtherContainsSelf
    } else if a_start <= b_start && a_end >= b_end {
        Containment::SelfContainsOther
    } else if a_end <= b_start || b_end <= a_start {
        Containment::Disjoint
    } else {
        Containment::Partial
    }
}

fn shift_before(others: &[(usize, usize, &Operation)], pos: usize) -> i64 {
    others
        .iter()
        .filter(|(o, l, _)| o + l <= pos)
        .map(|(_, l, op)| structural_output_len(op, *l) as i64 - *l as i64)
        .sum()
}

fn rebase_patch_patch(
    a: &Patch,
    b: &Patch,
    ctx: Option<&ConflictlessContext>,
) -> Result<Operation, Conflict> {
    let a_abs = a.absolute();
    let b_abs = b.absolute();
    let mut out: Vec<(usize, usize, Operation)> = Vec::with_capacity(a_abs.len());

    for (a_start, a_len, a_op) in &a_abs {
        let a_end = a_start + a_len;
        let overlapping: Vec<&(usize, usize, &Operation)> = b_abs
            .iter()
            .filter(|(b_start, b_len, _)| {
                // A standard half-open-interval overlap test never fires for
                // two zero-length hunks coinciding at the same offset (since
                // `a_end == a_start` when `a_len == 0`): special-case it so a
                // pure insertion detects a concurrent pure insertion at the
                // same point.
                if *a_len == 0 && *b_len == 0 {
                    *b_start == *a_start
                } else {
                    *b_start < a_end && b_start + b_len > *a_start
                }
            })
            .collect();

        if overlapping.is_empty() {
            let shift = shift_before(&b_abs, *a_start);
            let new_offset = (*a_start as i64 + shift).max(0) as usize;
            out.push((new_offset, *a_len, (*a_op).clone()));
            continue;
        }

        if overlapping.len() == 1 {
            let (b_start, b_len, b_op) = overlapping[0];
            let b_end = b_start + b_len;
            match classify(*a_start, a_end, *b_start, b_end) {
                Containment::Identical => {
                    if *a_op == **b_op {
                        continue; // both did the same thing; nothing left to do
                    }
                    match (a_op, b_op) {
                        (Operation::Set(av), Operation::Set(bv)) => {
                            let Some(c) = ctx else { return Err(Conflict) };
                            let _ = c;
                            if order::lower(av, bv) {
                                continue; // self loses, rebases away
                            } else {
                                let new_len = structural_output_len(b_op, *b_len);
                                let shift = shift_before(&b_abs, *a_start);
                                let new_offset = (*a_start as i64 + shift).max(0) as usize;
                                out.push((new_offset, new_len, Operation::Set(av.clone())));
                            }
                        }
                        _ => {
                            let rebased = a_op.rebase(b_op, ctx)?;
                            let new_len = structural_output_len(b_op, *b_len);
                            let shift = shift_before(&b_abs, *a_start);
                            let new_offset = (*a_start as i64 + shift).max(0) as usize;
                            out.push((new_offset, new_len, rebased));
                        }
                    }
                }
                Containment::OtherContainsSelf => {
                    if ctx.is_none() {
                        return Err(Conflict);
                    }
                    // B's replacement subsumes A entirely; A's intent no
                    // longer has a coherent target, so it drops out.
                }
                Containment::SelfContainsOther => {
                    let delta = structural_output_len(b_op, *b_len) as i64 - *b_len as i64;
                    let new_len = (*a_len as i64 + delta).max(0) as usize;
                    let shift = shift_before(&b_abs, *a_start);
                    let new_offset = (*a_start as i64 + shift).max(0) as usize;
                    out.push((new_offset, new_len, (*a_op).clone()));
                }
                Containment::Partial => {
                    if let (Operation::Set(av), true) = (a_op, ctx.is_some()) {
                        let (lo, hi) = (*a_start.max(b_start), a_end.min(b_end));
                        if hi <= lo {
                            return Err(Conflict);
                        }
                        let (keep_start, keep_end) = if *b_start <= *a_start {
                            (hi - a_start, a_len - (hi - a_start).min(*a_len))
                        } else {
                            (0, b_start - a_start)
                        };
                        let Ok(trimmed) = Patch::document_slice(av, keep_start.min(av.sequence_len().unwrap_or(0)), keep_end) else {
                            return Err(Conflict);
                        };
                        let shift = shift_before(&b_abs, *a_start);
                        let new_offset = (*a_start as i64 + shift).max(0) as usize;
                        out.push((new_offset, keep_end, Operation::Set(trimmed)));
                    } else {
                        return Err(Conflict);
                    }
                }
                Containment::Disjoint => unreachable!("filtered as overlapping"),
            }
            continue;
        }

        // Multiple other-hunks touch A's range: only coherent when all of
        // them are fully nested inside A (A contains several B edits).
        let all_nested = overlapping
            .iter()
            .all(|(b_start, b_len, _)| *b_start >= *a_start && b_start + b_len <= a_end);
        if !all_nested {
            return Err(Conflict);
        }
        let delta: i64 = overlapping
            .iter()
            .map(|(_, l, op)| structural_output_len(op, *l) as i64 - *l as i64)
            .sum();
        let new_len = (*a_len as i64 + delta).max(0) as usize;
        let shift = shift_before(&b_abs, *a_start);
        let new_offset = (*a_start as i64 + shift).max(0) as usize;
        out.push((new_offset, new_len, (*a_op).clone()));
    }

    if out.is_empty() {
        Ok(Operation::NoOp)
    } else {
        Ok(Patch::from_absolute(out).simplify())
    }
}

fn rebase_patch_vs_map(
    a: &Patch,
    m: &crate::sequence::map_op::Map,
    ctx: Option<&ConflictlessContext>,
) -> Result<Operation, Conflict> {
    let mut out = Vec::with_capacity(a.hunks.len());
    for (offset, length, op) in a.absolute() {
        let new_op = if length == 1 {
            op.rebase(&m.sub_op, ctx)?
        } else {
            op.clone()
        };
        out.push((offset, length, new_op));
    }
    Ok(Patch::from_absolute(out).simplify())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splice(offset: usize, length: usize, value: &str) -> Operation {
        crate::sequence::splice(offset, length, Document::string(value))
    }

    #[test]
    fn apply_replaces_and_inserts() {
        let doc = Document::string("123");
        assert_eq!(splice(0, 1, "4").apply(&doc).unwrap(), Document::string("423"));
        assert_eq!(splice(3, 0, "44").apply(&doc).unwrap(), Document::string("12344"));
    }

    #[test]
    fn compose_merges_adjacent_splices() {
        let a = splice(0, 4, "1234");
        let b = splice(4, 4, "EFGH");
        let composed = a.atomic_compose(&b).unwrap();
        assert_eq!(composed, splice(0, 8, "1234EFGH"));
    }

    #[test]
    fn compose_refuses_partial_overlap() {
        let a = splice(0, 4, "1234");
        let b = splice(2, 4, "CDEF");
        assert_eq!(a.atomic_compose(&b), None);
    }

    #[test]
    fn compose_patches_interior_of_replacement() {
        let a = splice(0, 4, "1234");
        let b = splice(1, 2, "X");
        let composed = a.atomic_compose(&b).unwrap();
        assert_eq!(composed, splice(0, 4, "1X4"));
    }

    #[test]
    fn rebase_identical_splices_to_noop() {
        let a = splice(0, 3, "456");
        let b = splice(0, 3, "456");
        assert_eq!(a.rebase(&b, None).unwrap(), Operation::NoOp);
    }

    #[test]
    fn rebase_shifts_disjoint_offset() {
        let a = splice(3, 3, "456");
        let b = splice(0, 3, "AC");
        assert_eq!(a.rebase(&b, None).unwrap(), splice(2, 3, "456"));
    }

    #[test]
    fn rebase_pure_insertions_tie_break_by_total_order() {
        let a = splice(0, 0, "123");
        let b = splice(0, 0, "456");
        let ctx = ConflictlessContext::new(Document::string(""));
        assert_eq!(a.rebase(&b, Some(&ctx)).unwrap(), splice(0, 0, "123"));
        assert_eq!(b.rebase(&a, Some(&ctx)).unwrap(), splice(3, 0, "456"));
    }

    #[test]
    fn rebase_without_conflictless_conflicts_on_same_range_set() {
        let a = splice(0, 3, "AAA");
        let b = splice(0, 3, "BBB");
        assert_eq!(a.rebase(&b, None), Err(Conflict));
    }
}
