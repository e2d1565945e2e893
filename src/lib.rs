//! weave - an operational-transformation algebra for collaborative editing
//! of structured documents.
//!
//! # Quick Start
//!
//! ```
//! use weave::document::Document;
//! use weave::harness::Operation;
//! use weave::op::BaseOperation;
//! use weave::sequence;
//!
//! let doc = Document::string("hello");
//! let op = sequence::splice(5, 0, Document::string(", world"));
//! let doc = op.apply(&doc).unwrap();
//! assert_eq!(doc, Document::string("hello, world"));
//! ```

pub mod document;
pub mod error;
pub mod harness;
pub mod op;
pub mod order;
pub mod registry;
pub mod sequence;
pub mod value;

pub use document::Document;
pub use harness::Operation;
pub use op::{BaseOperation, Conflict, ConflictlessContext};
