//! Naming and identity: id allocation, nested scopes, the node construction
//! stack, and finalization of nodes into the [`Graph`].
//!
//! Two resolution modes exist. Lexical resolution walks the stack of scopes
//! that are still open; it is how a declaration refers to a sibling or an
//! ancestor's name. Structural resolution scans the links of a node already
//! moved into the graph; it is how a foreign key reaches an attribute of an
//! entity whose scope has been popped.

use crate::cardinality::Cardinality;
use crate::graph::{Graph, Node, NodeId, NodeKind, START_ID};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("duplicate definition of {kind} '{name}'")]
    Duplicate { kind: NodeKind, name: String },
    #[error("unresolved reference to {kind} '{name}'")]
    Unresolved { kind: NodeKind, name: String },
    #[error("attribute '{name}' not found in {owner}")]
    MissingAttr { owner: String, name: String },
    #[error("internal invariant violated: {0}")]
    Invariant(&'static str),
}

/// Names introduced at one nesting level.
#[derive(Debug, Default)]
pub struct Scope {
    names: HashMap<NodeKind, HashMap<String, NodeId>>,
}

impl Scope {
    pub fn get(&self, kind: NodeKind, name: &str) -> Option<NodeId> {
        self.names.get(&kind)?.get(name).copied()
    }

    fn bind(&mut self, kind: NodeKind, name: &str, id: NodeId) -> bool {
        match self.names.entry(kind).or_default().entry(name.to_owned()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(id);
                true
            }
        }
    }

    fn forget_from(&mut self, first: NodeId) {
        for names in self.names.values_mut() {
            names.retain(|_, id| *id < first);
        }
    }
}

/// Builder state snapshot taken before a top-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    next_id: NodeId,
    root_links: usize,
}

/// Owns every piece of mutable naming state for one parse.
#[derive(Debug)]
pub struct GraphBuilder {
    next_id: NodeId,
    nodes: Vec<Node>,
    scopes: Vec<Scope>,
    graph: Graph,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Start with the implicit start node (id 0) and its root scope.
    pub fn new() -> Self {
        GraphBuilder {
            next_id: START_ID + 1,
            nodes: vec![Node::new(NodeKind::Start, START_ID, "start")],
            scopes: vec![Scope::default()],
            graph: Graph::new(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Number of nodes under construction, the start node included.
    pub fn depth(&self) -> usize {
        self.nodes.len()
    }

    pub fn current(&self) -> Result<&Node, ScopeError> {
        self.nodes
            .last()
            .ok_or(ScopeError::Invariant("construction stack is empty"))
    }

    pub fn current_mut(&mut self) -> Result<&mut Node, ScopeError> {
        self.nodes
            .last_mut()
            .ok_or(ScopeError::Invariant("construction stack is empty"))
    }

    /// Whether the current node already links a child of `kind`.
    pub fn current_has(&self, kind: NodeKind) -> Result<bool, ScopeError> {
        Ok(self
            .current()?
            .links
            .iter()
            .any(|id| self.graph.get(*id).is_some_and(|node| node.kind == kind)))
    }

    fn allocate(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Declare `name` in the innermost scope and start building its node.
    pub fn open(&mut self, kind: NodeKind, name: &str) -> Result<NodeId, ScopeError> {
        let scope = self
            .scopes
            .last_mut()
            .ok_or(ScopeError::Invariant("scope stack is empty"))?;
        let id = self.next_id;
        if !scope.bind(kind, name, id) {
            return Err(ScopeError::Duplicate {
                kind,
                name: name.to_owned(),
            });
        }
        self.allocate();
        self.current_mut()?.links.push(id);
        self.nodes.push(Node::new(kind, id, name));
        self.scopes.push(Scope::default());
        tracing::debug!(%kind, name, id, "open");
        Ok(id)
    }

    /// Finish the innermost node: drop its scope and move it into the graph.
    pub fn close(&mut self) -> Result<NodeId, ScopeError> {
        if self.nodes.len() <= 1 {
            return Err(ScopeError::Invariant("attempted to close the start node"));
        }
        self.scopes.pop();
        let node = self
            .nodes
            .pop()
            .ok_or(ScopeError::Invariant("construction stack is empty"))?;
        let id = node.id;
        tracing::debug!(kind = %node.kind, name = %node.name, id, "close");
        self.graph.insert(node);
        Ok(id)
    }

    /// Add an anonymous, bodyless node (a primary key or an association
    /// branch) under the current node. It goes straight into the graph.
    pub fn leaf(
        &mut self,
        kind: NodeKind,
        links: Vec<NodeId>,
        cardinality: Option<Cardinality>,
    ) -> Result<NodeId, ScopeError> {
        let suffix = match kind {
            NodeKind::PK => "pk",
            NodeKind::Card => "card",
            _ => return Err(ScopeError::Invariant("leaf nodes are PK or Card")),
        };
        let id = self.allocate();
        self.current_mut()?.links.push(id);
        let mut node = Node::new(kind, id, format!("{}_{}", id, suffix));
        node.links = links;
        node.cardinality = cardinality;
        self.graph.insert(node);
        Ok(id)
    }

    /// Look `name` up from the innermost scope outwards.
    pub fn resolve_lexical(&self, name: &str, kind: NodeKind) -> Result<NodeId, ScopeError> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(kind, name))
            .ok_or_else(|| ScopeError::Unresolved {
                kind,
                name: name.to_owned(),
            })
    }

    /// Look `name` up in the innermost scope only.
    pub fn resolve_local(&self, name: &str, kind: NodeKind) -> Result<NodeId, ScopeError> {
        self.scopes
            .last()
            .and_then(|scope| scope.get(kind, name))
            .ok_or_else(|| ScopeError::Unresolved {
                kind,
                name: name.to_owned(),
            })
    }

    /// Find the attribute `name` among the links of the closed node `owner`.
    pub fn resolve_structural(&self, owner: NodeId, name: &str) -> Result<NodeId, ScopeError> {
        let Some(owner_node) = self.graph.get(owner) else {
            return Err(ScopeError::Unresolved {
                kind: NodeKind::Attr,
                name: name.to_owned(),
            });
        };
        self.graph
            .links_of(owner)
            .find(|node| node.kind == NodeKind::Attr && node.name == name)
            .map(|node| node.id)
            .ok_or_else(|| ScopeError::MissingAttr {
                owner: format!("{} '{}'", owner_node.kind, owner_node.name),
                name: name.to_owned(),
            })
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            next_id: self.next_id,
            root_links: self.nodes.first().map_or(0, |root| root.links.len()),
        }
    }

    /// Discard everything created since `checkpoint`: nodes under
    /// construction, their scopes, their bindings in the root scope, their
    /// entries in the graph and their links from the start node.
    pub fn rollback(&mut self, checkpoint: Checkpoint) -> Result<(), ScopeError> {
        if self.nodes.is_empty() || self.scopes.is_empty() {
            return Err(ScopeError::Invariant("rollback below the start node"));
        }
        self.nodes.truncate(1);
        self.scopes.truncate(1);
        self.scopes[0].forget_from(checkpoint.next_id);
        self.nodes[0].links.truncate(checkpoint.root_links);
        self.graph.truncate(checkpoint.next_id);
        self.next_id = checkpoint.next_id;
        tracing::debug!(next_id = checkpoint.next_id, "rolled back declaration");
        Ok(())
    }

    /// Close the start node and hand the graph over.
    pub fn finish(mut self) -> Result<Graph, ScopeError> {
        if self.nodes.len() != 1 {
            return Err(ScopeError::Invariant("declarations still open at end of input"));
        }
        let root = self
            .nodes
            .pop()
            .ok_or(ScopeError::Invariant("construction stack is empty"))?;
        self.graph.insert(root);
        Ok(self.graph)
    }
}
