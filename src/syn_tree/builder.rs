use super::metrics::compute_metrics;
use super::{Node, NodeId, NodeKind, NodeMetrics, SourceRange, SynTree};

/// Stack based tree construction.
///
/// Nodes are opened in pre-order: `open` starts a node under the innermost
/// open node and `close` ends it. This is the only way trees are created, by
/// the tree-sitter adapter and the s-expression reader alike.
pub struct TreeBuilder {
    nodes: Vec<Node>,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    pub fn new(kind: NodeKind, label: Option<String>, range: SourceRange) -> Self {
        let mut builder = TreeBuilder {
            nodes: Vec::new(),
            stack: Vec::new(),
        };
        builder.push_node(kind, label, range, None);
        builder
    }

    fn push_node(
        &mut self,
        kind: NodeKind,
        label: Option<String>,
        range: SourceRange,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            kind,
            label,
            range,
            parent,
            children: Vec::new(),
            metrics: NodeMetrics::default(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        self.stack.push(id);
        id
    }

    /// Open a new node as last child of the innermost open node.
    ///
    /// Once the root has been closed, new nodes are attached to the root.
    pub fn open(&mut self, kind: NodeKind, label: Option<String>, range: SourceRange) -> NodeId {
        let parent = self.stack.last().copied().unwrap_or(NodeId(0));
        self.push_node(kind, label, range, Some(parent))
    }

    pub fn close(&mut self) {
        self.stack.pop();
    }

    pub fn leaf(&mut self, kind: NodeKind, label: Option<String>, range: SourceRange) -> NodeId {
        let id = self.open(kind, label, range);
        self.close();
        id
    }

    /// Fix the range of a node once its end is known.
    pub fn set_range(&mut self, id: NodeId, range: SourceRange) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.range = range;
        }
    }

    /// Innermost open node.
    pub fn current(&self) -> Option<NodeId> {
        self.stack.last().copied()
    }

    pub fn finish(mut self) -> SynTree {
        compute_metrics(&mut self.nodes);
        SynTree::from_nodes(self.nodes)
    }
}
