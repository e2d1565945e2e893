//! The sequence algebra: `Splice`, `Move`, `Patch`, `Apply`, `Map`.
//!
//! `Splice` and `Apply` are not stored as distinct variants — per the spec,
//! both are "internally represented as special cases of `Patch`" — so the
//! public constructors in this module (`splice`, `apply_at`, `apply_many`)
//! build a [`Patch`] directly. `Move` and `Map` remain first-class because
//! their rebase/compose rules don't reduce to hunk geometry.

pub mod map_op;
pub mod move_op;
pub mod patch;

pub use map_op::Map;
pub use move_op::Move;
pub use patch::{Hunk, Patch};

use std::collections::BTreeMap;

use crate::document::Document;
use crate::harness::Operation;

/// `Splice(offset, length, new_value)`: remove `length` elements at
/// `offset`, insert `new_value`. Builds the single-hunk `Patch` the spec
/// describes ("internally, Splice is the Patch of a single hunk
/// `{offset, length, Set(new_value)}`").
pub fn splice(offset: usize, length: usize, new_value: Document) -> Operation {
    Operation::Patch(Patch {
        hunks: vec![Hunk {
            gap: offset,
            length,
            op: Box::new(Operation::Set(new_value)),
        }],
    })
}

/// `Apply(i, sub_op)`: a single element-level edit, normalized to a
/// single-element-hunk `Patch`.
pub fn apply_at(index: usize, sub_op: Operation) -> Operation {
    Operation::Patch(Patch {
        hunks: vec![Hunk {
            gap: index,
            length: 1,
            op: Box::new(sub_op),
        }],
    })
}

/// `Apply({i1: op1, i2: op2, ...})`: several element-level edits at once,
/// normalized to a multi-hunk `Patch` with one length-1 hunk per index.
/// Indices must be distinct; they are sorted into position order.
pub fn apply_many(edits: BTreeMap<usize, Operation>) -> Operation {
    let mut prev_end = 0usize;
    let mut hunks = Vec::with_capacity(edits.len());
    for (index, op) in edits {
        hunks.push(Hunk {
            gap: index - prev_end,
            length: 1,
            op: Box::new(op),
        });
        prev_end = index + 1;
    }
    Operation::Patch(Patch { hunks })
}
