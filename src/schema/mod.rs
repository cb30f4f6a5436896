//! Avro schema representation and named-type resolution.
//!
//! Schemas arrive as untrusted JSON. [`SchemaTree`] converts them once into a
//! closed, arena-allocated node set; [`NameRegistry`] indexes every named type
//! in a tree and resolves references against it.

mod names;
mod tree;

pub use names::{NameInfo, NameRegistry, Resolved};
pub use tree::{Field, NameDecl, Node, NodeId, NodeKind, SchemaTree};
