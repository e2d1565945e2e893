//! The one genuine runtime lookup in the crate: matching a wire-level
//! `(module_tag, op_tag)` pair back to the `Operation` kind it names.
//!
//! Every other dispatch in this crate (`apply`, `rebase`, `atomic_compose`,
//! ...) is a `match` on the closed `Operation` enum, which the compiler
//! checks for exhaustiveness. This table exists for the one case that isn't
//! closed over Rust's own type system: deciding, from two strings read off
//! an external wire format, which `Operation` constructor they name.

use rustc_hash::FxHashMap;

use crate::harness::Operation;

/// The module/op tag pair a serialized `Operation` is described by, mirroring
/// the two-level `module.OP` names used in this crate's `Display` output
/// (`values.SET`, `sequences.PATCH`, ...).
pub const VALUES_MODULE: &str = "values";
pub const SEQUENCES_MODULE: &str = "sequences";

/// Classify an `Operation` into the `(module, op)` tag pair an external
/// wire format would use to name it.
pub fn describe(op: &Operation) -> (&'static str, &'static str) {
    match op {
        Operation::NoOp => (VALUES_MODULE, "NOOP"),
        Operation::Set(_) => (VALUES_MODULE, "SET"),
        Operation::Math(_) => (VALUES_MODULE, "MATH"),
        Operation::Move(_) => (SEQUENCES_MODULE, "MOVE"),
        Operation::Patch(_) => (SEQUENCES_MODULE, "PATCH"),
        Operation::Map(_) => (SEQUENCES_MODULE, "MAP"),
    }
}

/// A registry of the operation kinds a `(module, op)` pair can resolve to,
/// keyed the way a deserializer reading those two fields off the wire
/// would look them up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    NoOp,
    Set,
    Math,
    Move,
    Patch,
    Map,
}

pub struct Registry {
    table: FxHashMap<(String, String), OperationKind>,
}

impl Registry {
    pub fn new() -> Registry {
        let mut table = FxHashMap::default();
        table.insert((VALUES_MODULE.to_string(), "NOOP".to_string()), OperationKind::NoOp);
        table.insert((VALUES_MODULE.to_string(), "SET".to_string()), OperationKind::Set);
        table.insert((VALUES_MODULE.to_string(), "MATH".to_string()), OperationKind::Math);
        table.insert((SEQUENCES_MODULE.to_string(), "MOVE".to_string()), OperationKind::Move);
        table.insert((SEQUENCES_MODULE.to_string(), "PATCH".to_string()), OperationKind::Patch);
        table.insert((SEQUENCES_MODULE.to_string(), "MAP".to_string()), OperationKind::Map);
        Registry { table }
    }

    pub fn lookup(&self, module: &str, op: &str) -> Option<OperationKind> {
        self.table.get(&(module.to_string(), op.to_string())).copied()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}
