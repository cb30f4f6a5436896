//! Static Avro rules: primitive names, the writer→reader promotion matrix,
//! and the labels used when reporting incompatibilities.

use std::fmt;

use crate::schema::{NodeId, NodeKind, SchemaTree};

/// The eight Avro primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl Primitive {
    /// All primitives, in the order the Avro specification lists them.
    pub const ALL: [Primitive; 8] = [
        Primitive::Null,
        Primitive::Boolean,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
        Primitive::Bytes,
        Primitive::String,
    ];

    /// Look up a primitive by its Avro type name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Primitive::Null),
            "boolean" => Some(Primitive::Boolean),
            "int" => Some(Primitive::Int),
            "long" => Some(Primitive::Long),
            "float" => Some(Primitive::Float),
            "double" => Some(Primitive::Double),
            "bytes" => Some(Primitive::Bytes),
            "string" => Some(Primitive::String),
            _ => None,
        }
    }

    /// The Avro type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::Null => "null",
            Primitive::Boolean => "boolean",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Bytes => "bytes",
            Primitive::String => "string",
        }
    }

    /// Reader types a value written as `self` may be promoted to.
    pub fn promotions(&self) -> &'static [Primitive] {
        match self {
            Primitive::Int => &[Primitive::Long, Primitive::Float, Primitive::Double],
            Primitive::Long => &[Primitive::Float, Primitive::Double],
            Primitive::Float => &[Primitive::Double],
            Primitive::String => &[Primitive::Bytes],
            Primitive::Bytes => &[Primitive::String],
            Primitive::Null | Primitive::Boolean | Primitive::Double => &[],
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether data written as `writer` can be read as `reader`.
///
/// Promotion is one-directional: `int` reads as `long`, never the reverse.
pub fn primitive_compatible(writer: Primitive, reader: Primitive) -> bool {
    writer == reader || writer.promotions().contains(&reader)
}

/// Human-readable label for a node, as shown in the `writerType` and
/// `readerType` columns of an issue.
///
/// Absent nodes and shapes without a usable `type` tag render as `unknown`.
pub fn type_label(tree: &SchemaTree, node: Option<NodeId>) -> String {
    let Some(id) = node else {
        return "unknown".to_string();
    };
    match &tree.node(id).kind {
        NodeKind::Primitive(p) => p.as_str().to_string(),
        NodeKind::Reference(name) => name.clone(),
        NodeKind::Union(_) => "union".to_string(),
        NodeKind::Record { .. } => "record".to_string(),
        NodeKind::Enum { .. } => "enum".to_string(),
        NodeKind::Fixed { .. } => "fixed".to_string(),
        NodeKind::Array { .. } => "array".to_string(),
        NodeKind::Map { .. } => "map".to_string(),
        NodeKind::Unknown { .. } => "unknown".to_string(),
    }
}

/// The `logicalType` tag carried by a node, if any.
pub fn logical_type(tree: &SchemaTree, node: NodeId) -> Option<&str> {
    tree.node(node).logical_type.as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_promotion_matrix() {
        assert!(primitive_compatible(Primitive::Int, Primitive::Long));
        assert!(primitive_compatible(Primitive::Int, Primitive::Double));
        assert!(primitive_compatible(Primitive::Long, Primitive::Float));
        assert!(primitive_compatible(Primitive::Float, Primitive::Double));
        assert!(primitive_compatible(Primitive::String, Primitive::Bytes));
        assert!(primitive_compatible(Primitive::Bytes, Primitive::String));

        assert!(!primitive_compatible(Primitive::Long, Primitive::Int));
        assert!(!primitive_compatible(Primitive::Double, Primitive::Float));
        assert!(!primitive_compatible(Primitive::Boolean, Primitive::Int));
        assert!(!primitive_compatible(Primitive::Null, Primitive::String));
    }

    #[test]
    fn test_every_primitive_reads_itself() {
        for p in Primitive::ALL {
            assert!(primitive_compatible(p, p), "{} should read itself", p);
            assert_eq!(Primitive::from_name(p.as_str()), Some(p));
        }
    }

    #[test]
    fn test_type_labels() {
        let tree = SchemaTree::from_value(&json!({
            "type": "record",
            "name": "User",
            "fields": [
                {"name": "a", "type": "Address"},
                {"name": "b", "type": ["null", "string"]},
                {"name": "c", "type": {"type": "long", "logicalType": "timestamp-millis"}},
                {"name": "d", "type": {"type": {"type": "int"}}}
            ]
        }));
        let root = tree.root();
        assert_eq!(type_label(&tree, root), "record");

        let fields = tree.fields(root.unwrap()).unwrap();
        let labels: Vec<_> = fields.iter().map(|f| type_label(&tree, f.ty)).collect();
        assert_eq!(labels, vec!["Address", "union", "long", "unknown"]);
        assert_eq!(type_label(&tree, None), "unknown");

        let ts = fields[2].ty.unwrap();
        assert_eq!(logical_type(&tree, ts), Some("timestamp-millis"));
        assert_eq!(logical_type(&tree, fields[1].ty.unwrap()), None);
    }
}
