//! The `BaseOperation` trait and the small set of types every operation
//! kind is built from.

use crate::document::Document;
use crate::error::OpError;

/// Marks a rebase that cannot converge without a tie-breaker.
///
/// This is not an error — without conflictless mode, a conflict is the
/// expected outcome whenever two operations genuinely disagree. Callers
/// choose whether to retry in conflictless mode or escalate to a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict;

/// The pre-state shared by two concurrent operations being rebased.
///
/// Some rebase pairs (`Math` vs a different `Math`, `Set` vs a sequence
/// operation) can only converge by lifting the loser to `Set` of the
/// post-state, which requires knowing the document both operations started
/// from. Callers that want guaranteed convergence must supply it; callers
/// that only want strict-mode conflict detection can omit it; those
/// rebase pairs will then make the `Conflict` decision instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictlessContext {
    pub document: Document,
}

impl ConflictlessContext {
    pub fn new(document: Document) -> Self {
        ConflictlessContext { document }
    }
}

/// The result of composing two operations.
///
/// `Fused` is a single operation equivalent to "self then other". `Listed`
/// is the no-fusion case: the caller is expected to run the two operations
/// in sequence (the external list combinator is what normally owns this,
/// but the core only needs to produce and consume it through this narrow
/// two-element form).
#[derive(Debug, Clone, PartialEq)]
pub enum Composed<T> {
    Fused(T),
    Listed(Vec<T>),
}

impl<T> Composed<T> {
    pub fn into_list(self) -> Vec<T> {
        match self {
            Composed::Fused(op) => vec![op],
            Composed::Listed(ops) => ops,
        }
    }
}

/// The operation algebra every value- and sequence-layer operation kind
/// implements.
///
/// All five methods are pure: none perform I/O, none mutate `self` or their
/// arguments, and `apply`/`inverse`/`rebase`/`atomic_compose` all return
/// fresh values.
pub trait BaseOperation: Sized + Clone + PartialEq + std::fmt::Debug {
    /// Apply this operation to `document`, producing the successor document.
    fn apply(&self, document: &Document) -> Result<Document, OpError>;

    /// Canonicalize into an equivalent but no-larger form. Never fails.
    fn simplify(self) -> Self;

    /// Given the pre-state `document`, produce the operation that undoes
    /// this one: `self.inverse(d).apply(&self.apply(d)?) == d`.
    fn inverse(&self, document: &Document) -> Result<Self, OpError>;

    /// Fuse `self` then `other` into one operation, if a single canonical
    /// operation can express the composite. `None` means no fusion exists,
    /// not failure — the caller falls back to running both in sequence.
    fn atomic_compose(&self, other: &Self) -> Option<Self>;

    /// `atomic_compose`, with the list fallback made explicit.
    fn compose(&self, other: &Self) -> Composed<Self> {
        match self.atomic_compose(other) {
            Some(fused) => Composed::Fused(fused),
            None => Composed::Listed(vec![self.clone(), other.clone()]),
        }
    }

    /// Given that `other` was applied concurrently (to the same pre-state),
    /// produce the variant of `self` that applies after `other` and
    /// preserves `self`'s intent. `ctx` supplies the conflictless tie-break
    /// policy and, where needed, the shared pre-state; without it, pairs
    /// that can only converge via a tie-break report `Conflict` instead.
    fn rebase(&self, other: &Self, ctx: Option<&ConflictlessContext>) -> Result<Self, Conflict>;
}

/// Apply a `Composed` result end to end, as if its list form had been run
/// through an external list-operation combinator one entry at a time.
pub fn apply_composed<T: BaseOperation>(
    composed: &Composed<T>,
    document: &Document,
) -> Result<Document, OpError> {
    match composed {
        Composed::Fused(op) => op.apply(document),
        Composed::Listed(ops) => {
            let mut doc = document.clone();
            for op in ops {
                doc = op.apply(&doc)?;
            }
            Ok(doc)
        }
    }
}
