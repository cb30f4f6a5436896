//! Named-type registry.
//!
//! Built once per [`SchemaTree`]. A single descent computes the fullname,
//! namespace and qualified aliases of every `record`, `enum` and `fixed`
//! definition, then indexes them by fullname and by alias. References are
//! resolved against the index later; they are never followed during
//! indexing, so only literal definitions are registered.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};

use super::tree::{NodeId, NodeKind, SchemaTree};

/// Derived name information for one named-type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameInfo {
    /// Namespace-qualified name.
    pub fullname: String,
    /// Namespace of `fullname`, `None` for the null namespace.
    pub namespace: Option<String>,
    /// Fully-qualified aliases.
    pub aliases: BTreeSet<String>,
}

impl NameInfo {
    /// The last dotted segment of the fullname.
    pub fn short_name(&self) -> &str {
        self.fullname
            .rsplit_once('.')
            .map_or(self.fullname.as_str(), |(_, name)| name)
    }
}

/// Outcome of chasing a type reference to a concrete definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub node: NodeId,
    /// Namespace in effect at `node`; enclosing definitions inherit it.
    pub namespace: Option<String>,
}

/// Index of the named types defined in one schema tree.
#[derive(Debug)]
pub struct NameRegistry<'t> {
    tree: &'t SchemaTree,
    named_types: HashMap<String, NodeId>,
    alias_to_fullname: HashMap<String, String>,
    infos: HashMap<NodeId, NameInfo>,
    duplicates: Vec<String>,
}

impl<'t> NameRegistry<'t> {
    /// Index every named-type definition reachable from the root of `tree`.
    pub fn build(tree: &'t SchemaTree) -> Self {
        let mut registry = Self {
            tree,
            named_types: HashMap::new(),
            alias_to_fullname: HashMap::new(),
            infos: HashMap::new(),
            duplicates: Vec::new(),
        };
        registry.collect(tree.root(), None);
        debug!(
            named_types = registry.named_types.len(),
            aliases = registry.alias_to_fullname.len(),
            "Indexed schema names"
        );
        registry
    }

    pub fn tree(&self) -> &'t SchemaTree {
        self.tree
    }

    /// Name information for a definition node, keyed by identity.
    pub fn name_info(&self, node: NodeId) -> Option<&NameInfo> {
        self.infos.get(&node)
    }

    pub fn namespace_of(&self, node: NodeId) -> Option<&str> {
        self.infos.get(&node).and_then(|i| i.namespace.as_deref())
    }

    pub fn short_name_of(&self, node: NodeId) -> Option<&str> {
        self.infos.get(&node).map(NameInfo::short_name)
    }

    /// Number of distinct fullnames in the index.
    pub fn len(&self) -> usize {
        self.named_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.named_types.is_empty()
    }

    /// Fullnames that were defined more than once. The last definition wins
    /// in the index.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    /// Whether `name` is registered as an alias of `fullname`.
    pub fn is_alias_of(&self, name: &str, fullname: &str) -> bool {
        self.alias_to_fullname
            .get(name)
            .is_some_and(|target| target == fullname)
    }

    /// Look up a named type by bare or qualified name.
    ///
    /// A qualified name (containing `.`) is looked up as-is. A bare name is
    /// tried in `default_namespace` first, then in the null namespace. Each
    /// candidate may hit the fullname table directly or follow exactly one
    /// alias hop. Returns the definition and its canonical fullname.
    pub fn resolve_reference(
        &self,
        name: &str,
        default_namespace: Option<&str>,
    ) -> Option<(NodeId, &str)> {
        let mut candidates = Vec::with_capacity(2);
        if name.contains('.') {
            candidates.push(name.to_string());
        } else {
            if let Some(ns) = default_namespace.filter(|ns| !ns.is_empty()) {
                candidates.push(format!("{}.{}", ns, name));
            }
            candidates.push(name.to_string());
        }

        for candidate in &candidates {
            if let Some((fullname, node)) = self.named_types.get_key_value(candidate.as_str()) {
                return Some((*node, fullname.as_str()));
            }
            if let Some(target) = self.alias_to_fullname.get(candidate.as_str()) {
                if let Some((fullname, node)) = self.named_types.get_key_value(target.as_str()) {
                    return Some((*node, fullname.as_str()));
                }
            }
        }
        None
    }

    /// Chase references from `node` until a concrete definition is reached.
    ///
    /// The effective namespace follows whichever named type was last entered.
    /// Returns `None` when the node is absent, a reference does not resolve,
    /// or the chase revisits a definition.
    pub fn resolve_node(&self, node: Option<NodeId>, namespace: Option<&str>) -> Option<Resolved> {
        let mut current = node?;
        let mut namespace = namespace.map(str::to_string);
        let mut visited = HashSet::new();

        loop {
            match &self.tree.node(current).kind {
                NodeKind::Reference(name) => {
                    let (target, _) = self.resolve_reference(name, namespace.as_deref())?;
                    if !visited.insert(target) {
                        return None;
                    }
                    namespace = self.namespace_of(target).map(str::to_string);
                    current = target;
                }
                NodeKind::Record { .. } | NodeKind::Enum { .. } | NodeKind::Fixed { .. } => {
                    return Some(Resolved {
                        node: current,
                        namespace: self.namespace_of(current).map(str::to_string),
                    });
                }
                _ => {
                    return Some(Resolved {
                        node: current,
                        namespace,
                    })
                }
            }
        }
    }

    fn collect(&mut self, node: Option<NodeId>, default_namespace: Option<&str>) {
        let Some(id) = node else {
            return;
        };
        let tree = self.tree;

        match &tree.node(id).kind {
            NodeKind::Union(branches) => {
                for branch in branches {
                    self.collect(*branch, default_namespace);
                }
            }
            NodeKind::Record { names, fields } => {
                let namespace = self.register(id, default_namespace);
                let inherited = if names.name.is_some() {
                    namespace.as_deref()
                } else {
                    default_namespace
                };
                for field in fields {
                    self.collect(field.ty, inherited);
                }
            }
            NodeKind::Enum { .. } | NodeKind::Fixed { .. } => {
                self.register(id, default_namespace);
            }
            NodeKind::Array { items } => self.collect(*items, default_namespace),
            NodeKind::Map { values } => self.collect(*values, default_namespace),
            NodeKind::Unknown { inner, .. } => self.collect(*inner, default_namespace),
            NodeKind::Primitive(_) | NodeKind::Reference(_) => {}
        }
    }

    /// Register a named definition; returns its namespace.
    fn register(&mut self, id: NodeId, default_namespace: Option<&str>) -> Option<String> {
        let tree = self.tree;
        let names = tree.name_decl(id)?;
        let name = names.name.as_deref()?;
        let fullname = qualify(
            name,
            names.namespace.as_deref().or(default_namespace),
        );
        let namespace = fullname.rsplit_once('.').map(|(ns, _)| ns.to_string());
        let aliases: BTreeSet<String> = names
            .aliases
            .iter()
            .map(|alias| qualify(alias, namespace.as_deref()))
            .collect();

        if self.named_types.insert(fullname.clone(), id).is_some() {
            warn!(fullname = %fullname, "Named type defined more than once; last definition wins");
            self.duplicates.push(fullname.clone());
        }
        for alias in &aliases {
            self.alias_to_fullname.insert(alias.clone(), fullname.clone());
        }
        self.infos.insert(
            id,
            NameInfo {
                fullname,
                namespace: namespace.clone(),
                aliases,
            },
        );
        namespace
    }
}

/// Qualify `name` with `namespace` unless it is already dotted or the
/// namespace is null/empty.
fn qualify(name: &str, namespace: Option<&str>) -> String {
    match namespace {
        _ if name.contains('.') => name.to_string(),
        Some(ns) if !ns.is_empty() => format!("{}.{}", ns, name),
        _ => name.to_string(),
    }
}
