//! Arena-backed Avro schema tree.
//!
//! A parsed JSON schema is converted once into a closed set of node variants
//! stored in a flat arena. Nodes are addressed by [`NodeId`], so metadata
//! derived later (name information, recursion guards) is keyed by node
//! identity rather than by structural value: two identical record
//! definitions at different positions are different nodes.
//!
//! Conversion is total. Shapes that are not legal Avro still become nodes
//! ([`NodeKind::Unknown`]) so that the comparator can report them instead of
//! the parser rejecting them; well-formedness is checked at the input
//! boundary, not here.

use serde_json::{Map, Number, Value};

use crate::rules::Primitive;

/// Stable index of a node inside its [`SchemaTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A single schema node: its shape plus an optional `logicalType` tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub logical_type: Option<String>,
}

/// Name attributes shared by `record`, `enum` and `fixed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameDecl {
    /// Declared name; `None` when absent, empty or not a string.
    pub name: Option<String>,
    /// Declared namespace. `Some("")` explicitly selects the null namespace.
    pub namespace: Option<String>,
    /// Declared aliases, as written (not yet qualified).
    pub aliases: Vec<String>,
}

/// A record field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name; fields without a usable name are ignored by comparison.
    pub name: Option<String>,
    /// Field type; `None` when the `type` attribute is missing or `null`.
    pub ty: Option<NodeId>,
    /// The `default` value when the attribute is present (including `null`).
    pub default: Option<Value>,
}

impl Field {
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Closed set of node shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A primitive, written either bare (`"int"`) or as `{"type": "int"}`.
    Primitive(Primitive),
    /// A reference to a named type by bare or qualified name.
    Reference(String),
    /// A union, written as a JSON array or as `{"type": [...]}`.
    Union(Vec<Option<NodeId>>),
    Record { names: NameDecl, fields: Vec<Field> },
    Enum { names: NameDecl, symbols: Vec<String> },
    Fixed { names: NameDecl, size: Option<Number> },
    Array { items: Option<NodeId> },
    Map { values: Option<NodeId> },
    /// Anything else. `inner` holds a nested type object (`{"type": {...}}`)
    /// so that definitions inside it are still indexed.
    Unknown { inner: Option<NodeId> },
}

/// An immutable schema tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl SchemaTree {
    /// Convert a parsed JSON schema into a tree. A JSON `null` root yields an
    /// empty tree whose root is `None`.
    pub fn from_value(value: &Value) -> Self {
        let mut tree = Self::default();
        tree.root = tree.build(value);
        tree
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// # Panics
    /// If `id` was not produced by this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Union branches when `id` is a union node.
    pub fn union_branches(&self, id: NodeId) -> Option<&[Option<NodeId>]> {
        match &self.node(id).kind {
            NodeKind::Union(branches) => Some(branches),
            _ => None,
        }
    }

    /// Record fields when `id` is a record node.
    pub fn fields(&self, id: NodeId) -> Option<&[Field]> {
        match &self.node(id).kind {
            NodeKind::Record { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Name declaration when `id` is a record, enum or fixed node.
    pub fn name_decl(&self, id: NodeId) -> Option<&NameDecl> {
        match &self.node(id).kind {
            NodeKind::Record { names, .. }
            | NodeKind::Enum { names, .. }
            | NodeKind::Fixed { names, .. } => Some(names),
            _ => None,
        }
    }

    fn push(&mut self, kind: NodeKind, logical_type: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, logical_type });
        id
    }

    fn build(&mut self, value: &Value) -> Option<NodeId> {
        match value {
            Value::Null => None,
            Value::String(name) => {
                let kind = match Primitive::from_name(name) {
                    Some(p) => NodeKind::Primitive(p),
                    None => NodeKind::Reference(name.clone()),
                };
                Some(self.push(kind, None))
            }
            Value::Array(branches) => {
                let kind = NodeKind::Union(branches.iter().map(|b| self.build(b)).collect());
                Some(self.push(kind, None))
            }
            Value::Object(obj) => Some(self.build_object(obj)),
            Value::Bool(_) | Value::Number(_) => Some(self.push(NodeKind::Unknown { inner: None }, None)),
        }
    }

    fn build_object(&mut self, obj: &Map<String, Value>) -> NodeId {
        let logical_type = obj
            .get("logicalType")
            .and_then(Value::as_str)
            .map(str::to_string);

        let kind = match obj.get("type") {
            Some(Value::String(tag)) => match tag.as_str() {
                "record" => NodeKind::Record {
                    names: name_decl(obj),
                    fields: self.build_fields(obj.get("fields")),
                },
                "enum" => NodeKind::Enum {
                    names: name_decl(obj),
                    symbols: string_list(obj.get("symbols")),
                },
                "fixed" => NodeKind::Fixed {
                    names: name_decl(obj),
                    size: match obj.get("size") {
                        Some(Value::Number(size)) => Some(size.clone()),
                        _ => None,
                    },
                },
                "array" => NodeKind::Array {
                    items: obj.get("items").and_then(|v| self.build(v)),
                },
                "map" => NodeKind::Map {
                    values: obj.get("values").and_then(|v| self.build(v)),
                },
                other => match Primitive::from_name(other) {
                    Some(p) => NodeKind::Primitive(p),
                    None => NodeKind::Reference(other.to_string()),
                },
            },
            Some(Value::Array(branches)) => {
                NodeKind::Union(branches.iter().map(|b| self.build(b)).collect())
            }
            Some(nested @ Value::Object(_)) => NodeKind::Unknown {
                inner: self.build(nested),
            },
            _ => NodeKind::Unknown { inner: None },
        };

        self.push(kind, logical_type)
    }

    fn build_fields(&mut self, fields: Option<&Value>) -> Vec<Field> {
        let Some(Value::Array(fields)) = fields else {
            return Vec::new();
        };
        fields
            .iter()
            .filter_map(Value::as_object)
            .map(|field| Field {
                name: field
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                ty: field.get("type").and_then(|t| self.build(t)),
                default: field.get("default").cloned(),
            })
            .collect()
    }
}

fn name_decl(obj: &Map<String, Value>) -> NameDecl {
    NameDecl {
        name: obj
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        namespace: obj
            .get("namespace")
            .and_then(Value::as_str)
            .map(str::to_string),
        aliases: string_list(obj.get("aliases"))
            .into_iter()
            .filter(|a| !a.is_empty())
            .collect(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
