use indexmap::IndexMap;
use serde_json::Value;
use url::Url;

use crate::schema::TypeSet;

/// Stable index of a node in a [`SchemaGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where a node sits inside its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Root,
    Definition(String),
    Property(String),
    Items,
    AdditionalProperties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Additional {
    Allowed(bool),
    Schema(NodeId),
}

/// A named sub-schema under `definitions` or `$defs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub keyword: &'static str,
    pub key: String,
    pub node: NodeId,
}

/// A schema fragment after reference resolution.
///
/// A node that carried a `$ref` has `target` set to the canonical node the
/// reference designates; its own type keywords are not consulted. `target`
/// stays empty only for references caught in a loop of other references.
#[derive(Debug, Clone)]
pub struct Node {
    pub document: usize,
    /// JSON pointer of the node inside its document (empty for the root).
    pub pointer: String,
    pub parent: Option<NodeId>,
    pub slot: Slot,
    pub title: Option<String>,
    pub description: Option<String>,
    pub types: TypeSet,
    pub format: Option<String>,
    pub enumeration: Option<Vec<Value>>,
    pub properties: IndexMap<String, NodeId>,
    pub required: Vec<String>,
    pub items: Option<NodeId>,
    pub additional: Option<Additional>,
    pub definitions: Vec<Definition>,
    pub composition: Option<&'static str>,
    /// The raw `$ref` string, kept for diagnostics.
    pub reference: Option<String>,
    pub target: Option<NodeId>,
}

impl Node {
    /// Child nodes that contribute to this node's type.
    pub fn structural_children(&self) -> impl Iterator<Item = NodeId> + '_ {
        let additional = match self.additional {
            Some(Additional::Schema(id)) => Some(id),
            _ => None,
        };
        self.properties
            .values()
            .copied()
            .chain(self.items)
            .chain(additional)
    }
}

#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub name: String,
    /// Identifier references are resolved against.
    pub base: Url,
    pub root: NodeId,
}

/// Closed graph of every schema node in a batch.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) documents: Vec<DocumentInfo>,
    pub(crate) cyclic: Vec<bool>,
    pub(crate) ref_targets: Vec<bool>,
}

impl SchemaGraph {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn documents(&self) -> &[DocumentInfo] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node a reference resolves to, or `id` itself.
    pub fn canonical(&self, id: NodeId) -> NodeId {
        self.nodes[id.0].target.unwrap_or(id)
    }

    /// The node can reach itself through properties, items or references.
    pub fn is_cyclic(&self, id: NodeId) -> bool {
        self.cyclic[id.0]
    }

    /// Some `$ref` in the batch resolves to this node.
    pub fn is_ref_target(&self, id: NodeId) -> bool {
        self.ref_targets[id.0]
    }

    /// Look a node up by document index and JSON pointer.
    pub fn find(&self, document: usize, pointer: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.document == document && n.pointer == pointer)
            .map(NodeId)
    }
}
