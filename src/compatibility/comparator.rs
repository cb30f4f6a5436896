//! Lock-step structural comparison of a writer and a reader schema.
//!
//! One [`Comparator`] runs one direction. It walks both trees together,
//! resolving references through each side's [`NameRegistry`], and collects
//! every incompatibility instead of stopping at the first. A failure only
//! cuts off the subtree it occurs in; sibling fields and branches are still
//! visited.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, trace};

use super::issue::{CompatibilityIssue, IssueType};
use crate::mode::Direction;
use crate::rules::{logical_type, primitive_compatible, type_label, Primitive};
use crate::schema::{Field, NameRegistry, NodeId, NodeKind, Resolved, SchemaTree};

/// Path used at the root when the writer root is not a named type.
pub const ROOT_PATH: &str = "RootSchema";

/// Classification of a resolved node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Primitive(Primitive),
    Record,
    Array,
    Map,
    Enum,
    Fixed,
    Unknown,
}

impl Kind {
    fn of(tree: &SchemaTree, node: NodeId) -> Self {
        match &tree.node(node).kind {
            NodeKind::Primitive(p) => Kind::Primitive(*p),
            NodeKind::Record { .. } => Kind::Record,
            NodeKind::Array { .. } => Kind::Array,
            NodeKind::Map { .. } => Kind::Map,
            NodeKind::Enum { .. } => Kind::Enum,
            NodeKind::Fixed { .. } => Kind::Fixed,
            NodeKind::Reference(_) | NodeKind::Union(_) | NodeKind::Unknown { .. } => Kind::Unknown,
        }
    }

    fn is_named(&self) -> bool {
        matches!(self, Kind::Record | Kind::Enum | Kind::Fixed)
    }
}

/// Single-direction comparison state.
pub struct Comparator<'a> {
    writer: &'a NameRegistry<'a>,
    reader: &'a NameRegistry<'a>,
    direction: Direction,
    max_depth: usize,
    depth: usize,
    issues: Vec<CompatibilityIssue>,
    /// Record pairs whose comparison is on the current stack, with their
    /// stack position. Re-entering one assumes compatibility; the outer
    /// comparison owns any issues.
    in_progress: HashMap<(NodeId, NodeId), usize>,
    /// Lowest stack position assumed compatible by the pair being compared.
    lowest_assumption: usize,
    /// Outcome of record pairs whose result depends on nothing outside
    /// their own comparison.
    completed: HashMap<(NodeId, NodeId), bool>,
    /// Nesting of `branch_compatible` probes; issues are discarded while > 0.
    probing: usize,
    /// Times the depth limit was hit; results that hit it are not cached.
    depth_hits: usize,
}

impl<'a> Comparator<'a> {
    pub fn new(
        writer: &'a NameRegistry<'a>,
        reader: &'a NameRegistry<'a>,
        direction: Direction,
        max_depth: usize,
    ) -> Self {
        Self {
            writer,
            reader,
            direction,
            max_depth,
            depth: 0,
            issues: Vec::new(),
            in_progress: HashMap::new(),
            lowest_assumption: usize::MAX,
            completed: HashMap::new(),
            probing: 0,
            depth_hits: 0,
        }
    }

    /// Compare the two roots and return every issue found.
    pub fn run(mut self) -> Vec<CompatibilityIssue> {
        let writer_root = self.writer.tree().root();
        let reader_root = self.reader.tree().root();
        let root_path = writer_root
            .and_then(|root| self.writer.short_name_of(root))
            .unwrap_or(ROOT_PATH)
            .to_string();

        self.compare(writer_root, reader_root, &root_path, None, None);
        self.issues
    }

    fn report(
        &mut self,
        path: &str,
        issue_type: IssueType,
        writer_type: impl Into<String>,
        reader_type: impl Into<String>,
        description: impl Into<String>,
    ) {
        let issue = CompatibilityIssue::new(path, issue_type, writer_type, reader_type, description);
        debug!(direction = %self.direction, path = %issue.path, issue_type = %issue.issue_type, "Incompatibility");
        self.issues.push(issue);
    }

    /// Compare a writer node against a reader node at `path`.
    ///
    /// Returns `true` when nothing incompatible was found at or below this
    /// point.
    fn compare(
        &mut self,
        writer: Option<NodeId>,
        reader: Option<NodeId>,
        path: &str,
        writer_ns: Option<&str>,
        reader_ns: Option<&str>,
    ) -> bool {
        if self.depth >= self.max_depth {
            self.depth_hits += 1;
            self.report(
                path,
                IssueType::MaxDepthExceeded,
                type_label(self.writer.tree(), writer),
                type_label(self.reader.tree(), reader),
                format!("Schema nesting exceeds the maximum comparison depth of {}.", self.max_depth),
            );
            return false;
        }
        self.depth += 1;
        let compatible = self.compare_at_depth(writer, reader, path, writer_ns, reader_ns);
        self.depth -= 1;
        compatible
    }

    fn compare_at_depth(
        &mut self,
        writer: Option<NodeId>,
        reader: Option<NodeId>,
        path: &str,
        writer_ns: Option<&str>,
        reader_ns: Option<&str>,
    ) -> bool {
        let w_tree = self.writer.tree();
        let r_tree = self.reader.tree();
        trace!(path, "Comparing");

        let writer_union = writer.and_then(|id| w_tree.union_branches(id));
        let reader_union = reader.and_then(|id| r_tree.union_branches(id));
        if writer_union.is_some() || reader_union.is_some() {
            return self.compare_union(
                writer,
                reader,
                writer_union,
                reader_union,
                path,
                writer_ns,
                reader_ns,
            );
        }

        let Some(w) = self.writer.resolve_node(writer, writer_ns) else {
            self.report(
                path,
                IssueType::UnknownWriterType,
                type_label(w_tree, writer),
                type_label(r_tree, reader),
                "Writer schema references an unknown named type.",
            );
            return false;
        };
        let Some(r) = self.reader.resolve_node(reader, reader_ns) else {
            self.report(
                path,
                IssueType::UnknownReaderType,
                type_label(w_tree, writer),
                type_label(r_tree, reader),
                "Reader schema references an unknown named type.",
            );
            return false;
        };

        let writer_logical = logical_type(w_tree, w.node);
        let reader_logical = logical_type(r_tree, r.node);
        if writer_logical != reader_logical {
            self.report(
                path,
                IssueType::LogicalTypeChanged,
                writer_logical.unwrap_or("none"),
                reader_logical.unwrap_or("none"),
                "Logical type changes are not compatible.",
            );
            return false;
        }

        let writer_kind = Kind::of(w_tree, w.node);
        let reader_kind = Kind::of(r_tree, r.node);

        if writer_kind == Kind::Unknown || reader_kind == Kind::Unknown {
            self.report(
                path,
                IssueType::UnsupportedType,
                type_label(w_tree, Some(w.node)),
                type_label(r_tree, Some(r.node)),
                "Unsupported type encountered during compatibility evaluation.",
            );
            return false;
        }

        if let (Kind::Primitive(wp), Kind::Primitive(rp)) = (writer_kind, reader_kind) {
            if primitive_compatible(wp, rp) {
                return true;
            }
            self.report(
                path,
                IssueType::TypeMismatch,
                wp.as_str(),
                rp.as_str(),
                "Primitive type promotion is not allowed by Avro for this direction.",
            );
            return false;
        }

        if writer_kind != reader_kind {
            self.report(
                path,
                IssueType::TypeMismatch,
                type_label(w_tree, Some(w.node)),
                type_label(r_tree, Some(r.node)),
                "Writer and reader types are incompatible.",
            );
            return false;
        }

        if writer_kind.is_named() && !self.names_match(w.node, r.node) {
            self.report(
                path,
                IssueType::TypeMismatch,
                type_label(w_tree, Some(w.node)),
                type_label(r_tree, Some(r.node)),
                "Named type full names (including namespace) do not match.",
            );
            return false;
        }

        match writer_kind {
            Kind::Record => self.compare_record_guarded(w.node, r.node, path),
            Kind::Array => {
                let (NodeKind::Array { items: wi }, NodeKind::Array { items: ri }) =
                    (&w_tree.node(w.node).kind, &r_tree.node(r.node).kind)
                else {
                    return false;
                };
                self.descend(*wi, *ri, &format!("{}.items", path), &w, &r)
            }
            Kind::Map => {
                let (NodeKind::Map { values: wv }, NodeKind::Map { values: rv }) =
                    (&w_tree.node(w.node).kind, &r_tree.node(r.node).kind)
                else {
                    return false;
                };
                self.descend(*wv, *rv, &format!("{}.values", path), &w, &r)
            }
            Kind::Enum => self.compare_enum(w.node, r.node, path),
            Kind::Fixed => self.compare_fixed(w.node, r.node, path),
            Kind::Primitive(_) | Kind::Unknown => false,
        }
    }

    fn descend(
        &mut self,
        writer: Option<NodeId>,
        reader: Option<NodeId>,
        path: &str,
        w: &Resolved,
        r: &Resolved,
    ) -> bool {
        self.compare(writer, reader, path, w.namespace.as_deref(), r.namespace.as_deref())
    }

    /// Fullnames are equal, or either side lists the other's fullname as an
    /// alias.
    fn names_match(&self, writer: NodeId, reader: NodeId) -> bool {
        let (Some(w), Some(r)) = (self.writer.name_info(writer), self.reader.name_info(reader)) else {
            return false;
        };
        w.fullname == r.fullname || r.aliases.contains(&w.fullname) || w.aliases.contains(&r.fullname)
    }

    /// Compare a record pair once per distinct outcome.
    ///
    /// A pair already on the stack is assumed compatible. A finished pair is
    /// answered from the cache, except that a failed pair is walked again
    /// outside branch probes so its issues appear at every path reaching it.
    fn compare_record_guarded(&mut self, writer: NodeId, reader: NodeId, path: &str) -> bool {
        let pair = (writer, reader);
        if let Some(&position) = self.in_progress.get(&pair) {
            trace!(path, "Recursive record pair already under comparison");
            self.lowest_assumption = self.lowest_assumption.min(position);
            return true;
        }
        match self.completed.get(&pair) {
            Some(true) => return true,
            Some(false) if self.probing > 0 => return false,
            _ => {}
        }

        let position = self.in_progress.len();
        self.in_progress.insert(pair, position);
        let outer_assumption = std::mem::replace(&mut self.lowest_assumption, usize::MAX);
        let depth_hits = self.depth_hits;

        let compatible = self.compare_record(writer, reader, path);

        self.in_progress.remove(&pair);
        if self.lowest_assumption >= position && self.depth_hits == depth_hits {
            self.completed.insert(pair, compatible);
        }
        self.lowest_assumption = self.lowest_assumption.min(outer_assumption);
        compatible
    }

    fn compare_record(&mut self, writer: NodeId, reader: NodeId, path: &str) -> bool {
        let w_tree = self.writer.tree();
        let r_tree = self.reader.tree();
        let writer_fields: HashMap<&str, &Field> =
            named_fields(w_tree.fields(writer).unwrap_or_default()).into_iter().collect();
        let reader_fields = named_fields(r_tree.fields(reader).unwrap_or_default());

        let writer_ns = self.writer.namespace_of(writer);
        let reader_ns = self.reader.namespace_of(reader);
        let mut compatible = true;

        for (name, reader_field) in reader_fields {
            let field_path = format!("{}.{}", path, name);

            let Some(writer_field) = writer_fields.get(name) else {
                if reader_field.has_default() {
                    continue;
                }
                let (issue_type, description) = match self.direction {
                    Direction::Backward => (
                        IssueType::MissingDefault,
                        "New field was added without default value.",
                    ),
                    Direction::Forward => (
                        IssueType::RemovedField,
                        "Field was removed from writer schema and reader expects it without default.",
                    ),
                };
                self.report(
                    &field_path,
                    issue_type,
                    "absent",
                    type_label(r_tree, reader_field.ty),
                    description,
                );
                compatible = false;
                continue;
            };

            if !self.compare(writer_field.ty, reader_field.ty, &field_path, writer_ns, reader_ns) {
                compatible = false;
            }
        }

        compatible
    }

    fn compare_enum(&mut self, writer: NodeId, reader: NodeId, path: &str) -> bool {
        let symbols = |tree: &'a SchemaTree, id: NodeId| -> BTreeSet<&'a str> {
            match &tree.node(id).kind {
                NodeKind::Enum { symbols, .. } => symbols.iter().map(String::as_str).collect(),
                _ => BTreeSet::new(),
            }
        };
        let writer_symbols = symbols(self.writer.tree(), writer);
        let reader_symbols = symbols(self.reader.tree(), reader);

        let missing: Vec<&str> = writer_symbols.difference(&reader_symbols).copied().collect();
        if missing.is_empty() {
            return true;
        }
        self.report(
            path,
            IssueType::EnumSymbolRemoved,
            "enum",
            "enum",
            format!("Reader enum is missing writer symbols: {}", missing.join(", ")),
        );
        false
    }

    fn compare_fixed(&mut self, writer: NodeId, reader: NodeId, path: &str) -> bool {
        let size = |tree: &SchemaTree, id: NodeId| match &tree.node(id).kind {
            NodeKind::Fixed { size, .. } => size.clone(),
            _ => None,
        };
        let writer_size = size(self.writer.tree(), writer);
        let reader_size = size(self.reader.tree(), reader);

        let equal = match (&writer_size, &reader_size) {
            (Some(w), Some(r)) => w.as_f64() == r.as_f64(),
            (None, None) => true,
            _ => false,
        };
        if equal {
            return true;
        }

        let label = |size: &Option<serde_json::Number>| match size {
            Some(n) => format!("fixed({})", n),
            None => "fixed(?)".to_string(),
        };
        self.report(
            path,
            IssueType::TypeMismatch,
            label(&writer_size),
            label(&reader_size),
            "Fixed type sizes do not match.",
        );
        false
    }

    #[allow(clippy::too_many_arguments)]
    fn compare_union(
        &mut self,
        writer: Option<NodeId>,
        reader: Option<NodeId>,
        writer_union: Option<&[Option<NodeId>]>,
        reader_union: Option<&[Option<NodeId>]>,
        path: &str,
        writer_ns: Option<&str>,
        reader_ns: Option<&str>,
    ) -> bool {
        let w_tree = self.writer.tree();
        let r_tree = self.reader.tree();

        match (writer_union, reader_union) {
            (None, Some(reader_branches)) => {
                let matched = reader_branches
                    .iter()
                    .any(|branch| self.branch_compatible(writer, *branch, writer_ns, reader_ns));
                if !matched {
                    self.report(
                        path,
                        IssueType::UnionMismatch,
                        type_label(w_tree, writer),
                        "union",
                        "Writer type does not match any reader union branch.",
                    );
                }
                matched
            }
            (Some(writer_branches), None) => {
                let mut compatible = true;
                for (index, branch) in writer_branches.iter().enumerate() {
                    if self.branch_compatible(*branch, reader, writer_ns, reader_ns) {
                        continue;
                    }
                    self.report(
                        &format!("{}[{}]", path, index),
                        IssueType::UnionMismatch,
                        type_label(w_tree, *branch),
                        type_label(r_tree, reader),
                        "Writer union branch is not compatible with reader type.",
                    );
                    compatible = false;
                }
                compatible
            }
            (Some(writer_branches), Some(reader_branches)) => {
                let mut compatible = true;
                for (index, writer_branch) in writer_branches.iter().enumerate() {
                    let matched = reader_branches.iter().any(|reader_branch| {
                        self.branch_compatible(*writer_branch, *reader_branch, writer_ns, reader_ns)
                    });
                    if matched {
                        continue;
                    }
                    self.report(
                        &format!("{}[{}]", path, index),
                        IssueType::UnionMismatch,
                        type_label(w_tree, *writer_branch),
                        "union",
                        "Writer union branch has no compatible branch in reader union.",
                    );
                    compatible = false;
                }
                compatible
            }
            (None, None) => true,
        }
    }

    /// Whether `writer` can be read as `reader`, without reporting anything.
    ///
    /// Runs the comparison against an empty issue list and restores the
    /// caller's list afterwards, so issues found inside a rejected branch
    /// never reach the report.
    fn branch_compatible(
        &mut self,
        writer: Option<NodeId>,
        reader: Option<NodeId>,
        writer_ns: Option<&str>,
        reader_ns: Option<&str>,
    ) -> bool {
        let outer = std::mem::take(&mut self.issues);
        self.probing += 1;
        let matched = self.compare(writer, reader, "branch", writer_ns, reader_ns);
        self.probing -= 1;
        let compatible = matched && self.issues.is_empty();
        self.issues = outer;
        compatible
    }
}

/// Named fields in declaration order. A repeated name keeps its first
/// position and its last definition.
fn named_fields(fields: &[Field]) -> Vec<(&str, &Field)> {
    let mut named: Vec<(&str, &Field)> = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(name) = field.name.as_deref() else {
            continue;
        };
        match named.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = field,
            None => named.push((name, field)),
        }
    }
    named
}
