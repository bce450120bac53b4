mod builder;
mod grammar;
mod metrics;
pub mod parse;
pub mod sexp;
mod traversal;

pub use builder::TreeBuilder;
pub use grammar::{Grammar, NodeKind};
pub use metrics::{HashSum, NodeMetrics};
pub use traversal::{Ancestors, BreadthFirst, PostOrder, PreOrder};

use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Index of a node inside the arena of its tree.
///
/// Ids are handed out in pre-order, so the id of a node is also its position
/// in a pre-order walk and its descendants are exactly the following
/// `size - 1` ids.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Byte offsets of a node in the text it was parsed from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize)]
pub struct SourceRange {
    pub start: usize,
    pub end: usize,
}

impl SourceRange {
    pub fn new(start: usize, end: usize) -> Self {
        SourceRange { start, end }
    }
}

impl From<Range<usize>> for SourceRange {
    fn from(range: Range<usize>) -> Self {
        SourceRange::new(range.start, range.end)
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: Option<String>,
    pub range: SourceRange,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub metrics: NodeMetrics,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Read-only syntax tree stored in a single arena.
#[derive(Clone, Debug, Default)]
pub struct SynTree {
    nodes: Vec<Node>,
}

impl SynTree {
    pub fn empty() -> Self {
        SynTree { nodes: Vec::new() }
    }

    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        SynTree { nodes }
    }

    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeId(0))
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.node(id).label.as_deref()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn metrics(&self, id: NodeId) -> &NodeMetrics {
        &self.node(id).metrics
    }

    pub fn position_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&ch| ch == id)
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors::new(self, self.parent(id))
    }

    /// Strict descendants of `id` in pre-order.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        let size = self.metrics(id).size;
        (id.0 + 1..id.0 + size).map(NodeId)
    }

    /// Whether `node` lies strictly below `ancestor`.
    pub fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let size = self.metrics(ancestor).size;
        node.0 > ancestor.0 && node.0 < ancestor.0 + size
    }

    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder::new(self, self.root())
    }

    pub fn pre_order_from(&self, id: NodeId) -> PreOrder<'_> {
        PreOrder::new(self, Some(id))
    }

    pub fn post_order(&self) -> PostOrder<'_> {
        PostOrder::new(self, self.root())
    }

    pub fn breadth_first(&self) -> BreadthFirst<'_> {
        BreadthFirst::new(self, self.root())
    }

    /// Structural equality of two subtrees, labels included.
    pub fn same_subtree(&self, id: NodeId, other: &SynTree, other_id: NodeId) -> bool {
        self.zip_subtrees(id, other, other_id, |left, right| {
            left.kind == right.kind && left.label == right.label
        })
    }

    /// Structural equality of two subtrees ignoring labels.
    pub fn isomorphic(&self, id: NodeId, other: &SynTree, other_id: NodeId) -> bool {
        self.zip_subtrees(id, other, other_id, |left, right| {
            left.metrics.hash == right.metrics.hash && left.kind == right.kind
        })
    }

    /// Walk two subtrees side by side, requiring `same_node` on every pair
    /// and equal child counts.
    fn zip_subtrees(
        &self,
        id: NodeId,
        other: &SynTree,
        other_id: NodeId,
        same_node: impl Fn(&Node, &Node) -> bool,
    ) -> bool {
        let mut stack = vec![(id, other_id)];
        while let Some((id, other_id)) = stack.pop() {
            let (left, right) = (self.node(id), other.node(other_id));
            if !same_node(left, right) || left.children.len() != right.children.len() {
                return false;
            }
            stack.extend(left.children.iter().copied().zip(right.children.iter().copied()));
        }
        true
    }
}
