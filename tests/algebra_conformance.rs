//! Conformance tests for the operation algebra: identity, inverse, and the
//! literal scenarios the algebra is defined by.

use weave::document::Document;
use weave::op::{BaseOperation, Conflict, ConflictlessContext};
use weave::sequence;
use weave::value::Math;
use weave::Operation;

// =============================================================================
// Identity and inverse
// =============================================================================

#[test]
fn noop_apply_is_identity_across_document_kinds() {
    for doc in [
        Document::int(5),
        Document::string("abc"),
        Document::array([Document::int(1), Document::int(2)]),
        Document::Bool(true),
    ] {
        assert_eq!(Operation::NoOp.apply(&doc).unwrap(), doc);
    }
}

#[test]
fn apply_then_inverse_then_apply_restores_original() {
    let cases: Vec<(Document, Operation)> = vec![
        (Document::int(10), Math::add(Document::int(7))),
        (Document::int(10), Math::mult(Document::int(3))),
        (Document::string("hello"), sequence::splice(0, 0, Document::string("say: "))),
        (Document::string("hello"), sequence::splice(1, 3, Document::string("i"))),
        (
            Document::array((1..=5).map(Document::int)),
            Operation::Move(weave::sequence::Move { from: 1, length: 2, to: 4 }),
        ),
    ];
    for (doc, op) in cases {
        let after = op.apply(&doc).unwrap();
        let inv = op.inverse(&doc).unwrap();
        assert_eq!(inv.apply(&after).unwrap(), doc, "inverse failed to restore for op {op}");
    }
}

// =============================================================================
// Compose
// =============================================================================

#[test]
fn compose_adjacent_splices_merges_into_one() {
    let a = sequence::splice(0, 4, Document::string("1234"));
    let b = sequence::splice(4, 4, Document::string("EFGH"));
    let composed = a.atomic_compose(&b).unwrap();
    assert_eq!(composed, sequence::splice(0, 8, Document::string("1234EFGH")));
}

#[test]
fn compose_partial_overlap_has_no_fusion() {
    let a = sequence::splice(0, 4, Document::string("1234"));
    let b = sequence::splice(2, 4, Document::string("CDEF"));
    assert_eq!(a.atomic_compose(&b), None);
}

#[test]
fn compose_math_additions_sum() {
    let a = Math::add(Document::int(2));
    let b = Math::add(Document::int(3));
    let composed = a.atomic_compose(&b).unwrap();
    assert_eq!(composed.apply(&Document::int(10)).unwrap(), Document::int(15));
}

#[test]
fn composing_into_set_discards_earlier_operation() {
    let a = Math::add(Document::int(100));
    let b = Operation::Set(Document::int(1));
    assert_eq!(a.atomic_compose(&b), Some(Operation::Set(Document::int(1))));
}

// =============================================================================
// Rebase and convergence
// =============================================================================

#[test]
fn rebase_identical_edits_cancels_to_noop() {
    let a = sequence::splice(2, 2, Document::string("XY"));
    let b = sequence::splice(2, 2, Document::string("XY"));
    assert_eq!(a.rebase(&b, None).unwrap(), Operation::NoOp);
}

#[test]
fn rebase_without_conflictless_surfaces_conflict_on_genuine_disagreement() {
    let a = sequence::splice(0, 3, Document::string("AAA"));
    let b = sequence::splice(0, 3, Document::string("BBB"));
    assert_eq!(a.rebase(&b, None), Err(Conflict));
}

#[test]
fn diamond_property_holds_for_independent_splices() {
    // TP1: applying A then B' (A rebased across B, applied after B) must
    // equal applying B then A'.
    let base = Document::string("0123456789");
    let a = sequence::splice(2, 1, Document::string("a"));
    let b = sequence::splice(7, 1, Document::string("b"));

    let a_after_b = a.rebase(&b, None).unwrap();
    let b_after_a = b.rebase(&a, None).unwrap();

    let via_a_first = a.apply(&base).unwrap();
    let via_a_first = b_after_a.apply(&via_a_first).unwrap();

    let via_b_first = b.apply(&base).unwrap();
    let via_b_first = a_after_b.apply(&via_b_first).unwrap();

    assert_eq!(via_a_first, via_b_first);
}

#[test]
fn conflictless_mode_converges_multiple_sites_on_concurrent_set() {
    let base = Document::int(0);
    let ctx = ConflictlessContext::new(base.clone());
    let a = Operation::Set(Document::int(5));
    let b = Operation::Set(Document::int(3));

    let a_rebased = a.rebase(&b, Some(&ctx)).unwrap();
    let b_rebased = b.rebase(&a, Some(&ctx)).unwrap();

    let site_one = a_rebased.apply(&b.apply(&base).unwrap()).unwrap();
    let site_two = b_rebased.apply(&a.apply(&base).unwrap()).unwrap();
    assert_eq!(site_one, site_two);
}

#[test]
fn conflictless_mode_breaks_ties_deterministically_on_insertion_point() {
    let base = Document::string("");
    let ctx = ConflictlessContext::new(base);
    let a = sequence::splice(0, 0, Document::string("alpha"));
    let b = sequence::splice(0, 0, Document::string("beta"));

    let a_rebased = a.rebase(&b, Some(&ctx)).unwrap();
    let b_rebased = b.rebase(&a, Some(&ctx)).unwrap();

    // Exactly one side keeps its original offset; the other shifts past it.
    assert_ne!(a_rebased, b_rebased);
}

#[test]
fn move_rebases_cleanly_against_disjoint_patch() {
    let doc = Document::array((0..8).map(Document::int));
    let mv = Operation::Move(weave::sequence::Move { from: 0, length: 2, to: 5 });
    let insert = sequence::splice(8, 0, Document::array([Document::int(99)]));

    let mv_after_insert = mv.rebase(&insert, None).unwrap();
    let insert_after_mv = insert.rebase(&mv, None).unwrap();

    let via_mv_first = mv.apply(&doc).unwrap();
    let via_mv_first = insert_after_mv.apply(&via_mv_first).unwrap();

    let via_insert_first = insert.apply(&doc).unwrap();
    let via_insert_first = mv_after_insert.apply(&via_insert_first).unwrap();

    assert_eq!(via_mv_first, via_insert_first);
}
