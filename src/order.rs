//! Total order over documents, used by conflictless tie-breaking.
//!
//! The comparator must be total, deterministic, and stable across sites —
//! two sites comparing the same two documents must always agree on the
//! winner, independent of platform or run. We follow the reference order
//! from the spec: rank by type first (`missing < bool < number < string <
//! array < object`), then compare within the type.

use std::cmp::Ordering;

use crate::document::Document;

fn type_rank(doc: &Document) -> u8 {
    match doc {
        Document::Missing => 0,
        Document::Bool(_) => 1,
        Document::Number(_) => 2,
        Document::String(_) => 3,
        Document::Array(_) => 4,
        Document::Object(_) => 5,
    }
}

/// Compare two documents under the algebra's total order.
///
/// Used wherever conflictless mode needs a deterministic winner: `Set` vs
/// `Set`, `Math` vs `Math` with differing operators, and pure-insertion
/// `Splice` vs `Splice`.
pub fn cmp(a: &Document, b: &Document) -> Ordering {
    let (ra, rb) = (type_rank(a), type_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Document::Missing, Document::Missing) => Ordering::Equal,
        (Document::Bool(x), Document::Bool(y)) => x.cmp(y),
        (Document::Number(x), Document::Number(y)) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (Document::String(x), Document::String(y)) => x.cmp(y),
        (Document::Array(x), Document::Array(y)) => {
            for (xi, yi) in x.iter().zip(y.iter()) {
                let ord = cmp(xi, yi);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Document::Object(x), Document::Object(y)) => {
            // BTreeMap already iterates in key order, so this is a
            // deterministic key-then-value comparison of the canonical form.
            for ((xk, xv), (yk, yv)) in x.iter().zip(y.iter()) {
                let key_ord = xk.cmp(yk);
                if key_ord != Ordering::Equal {
                    return key_ord;
                }
                let val_ord = cmp(xv, yv);
                if val_ord != Ordering::Equal {
                    return val_ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => unreachable!("equal type ranks imply matching variants"),
    }
}

/// `true` if `a` is strictly lower-ranked than `b` under [`cmp`].
pub fn lower(a: &Document, b: &Document) -> bool {
    cmp(a, b) == Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Number;

    #[test]
    fn type_rank_orders_missing_below_everything() {
        assert_eq!(cmp(&Document::Missing, &Document::Bool(false)), Ordering::Less);
        assert_eq!(cmp(&Document::Bool(true), &Document::int(0)), Ordering::Less);
        assert_eq!(cmp(&Document::int(1_000_000), &Document::string("a")), Ordering::Less);
    }

    #[test]
    fn numbers_compare_by_value_across_representations() {
        assert_eq!(cmp(&Document::int(2), &Document::float(2.0)), Ordering::Equal);
        assert_eq!(cmp(&Document::int(1), &Document::float(2.0)), Ordering::Less);
    }

    #[test]
    fn strings_compare_lexicographically() {
        assert_eq!(cmp(&Document::string("y"), &Document::string("z")), Ordering::Less);
    }

    #[test]
    fn arrays_compare_elementwise_then_by_length() {
        let a = Document::array([Document::int(1)]);
        let b = Document::array([Document::int(1), Document::int(2)]);
        assert_eq!(cmp(&a, &b), Ordering::Less);
    }

    #[test]
    fn ordering_is_antisymmetric() {
        let a = Document::Number(Number::Int(3));
        let b = Document::Number(Number::Int(7));
        assert_eq!(cmp(&a, &b), Ordering::Less);
        assert_eq!(cmp(&b, &a), Ordering::Greater);
    }
}
