//! The finished ER graph: every declared construct as a node, keyed by id.

use crate::cardinality::Cardinality;
use crate::gerarchy::GerarchyType;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

pub type NodeId = usize;

/// Id of the implicit start node that owns every top-level declaration.
pub const START_ID: NodeId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NodeKind {
    Start,
    Entity,
    Assoc,
    Gerarchy,
    Attr,
    FK,
    PK,
    Card,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Start => "Start",
            NodeKind::Entity => "Entity",
            NodeKind::Assoc => "Assoc",
            NodeKind::Gerarchy => "Gerarchy",
            NodeKind::Attr => "Attr",
            NodeKind::FK => "FK",
            NodeKind::PK => "PK",
            NodeKind::Card => "Card",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared construct.
///
/// `links` holds children for structural constructs (an entity's attributes
/// and primary key, an association's attributes and cards, a gerarchy's
/// parent and children, a foreign key's referenced nodes) and the referenced
/// entity for a `Card` node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub id: NodeId,
    pub name: String,
    pub links: Vec<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<Cardinality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gerarchy_type: Option<GerarchyType>,
}

impl Node {
    pub fn new(kind: NodeKind, id: NodeId, name: impl Into<String>) -> Self {
        Node {
            kind,
            id,
            name: name.into(),
            links: Vec::new(),
            cardinality: None,
            gerarchy_type: None,
        }
    }
}

/// Finished nodes in ascending id order, which is also declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    nodes: BTreeMap<NodeId, Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The start node, present in every successfully parsed graph.
    pub fn root(&self) -> Option<&Node> {
        self.get(START_ID)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Children of `id` resolved to nodes, in link order. Links to ids not in
    /// the graph are skipped.
    pub fn links_of(&self, id: NodeId) -> impl Iterator<Item = &Node> {
        self.get(id)
            .into_iter()
            .flat_map(|node| node.links.iter())
            .filter_map(|link| self.get(*link))
    }

    pub(crate) fn insert(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    /// Drop every node with an id at or above `first`.
    pub(crate) fn truncate(&mut self, first: NodeId) {
        self.nodes.split_off(&first);
    }
}

impl Serialize for Graph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.nodes.values())
    }
}
