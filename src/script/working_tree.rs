use super::Action;
use crate::syn_tree::{NodeId, NodeKind, SynTree};

type OpResult<T> = std::result::Result<T, &'static str>;

#[derive(Clone, Debug)]
struct WorkingNode {
    kind: NodeKind,
    label: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    deleted: bool,
}

/// Mutable copy of a source tree that edit actions are replayed on.
///
/// Source nodes keep their ids, inserted nodes receive the next free id.
/// Nodes without parent live in an ordered top-level slot, which is where a
/// new root is inserted when the roots of both trees do not match.
#[derive(Clone, Debug)]
pub struct WorkingTree {
    nodes: Vec<WorkingNode>,
    roots: Vec<NodeId>,
}

impl WorkingTree {
    pub fn from_tree(tree: &SynTree) -> Self {
        WorkingTree {
            nodes: tree
                .nodes()
                .map(|node| WorkingNode {
                    kind: node.kind,
                    label: node.label.clone(),
                    parent: node.parent,
                    children: node.children.clone(),
                    deleted: false,
                })
                .collect(),
            roots: tree.root().into_iter().collect(),
        }
    }

    /// Id the next inserted node will receive.
    pub fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).map_or(false, |node| !node.deleted)
    }

    fn live(&self, id: NodeId) -> OpResult<&WorkingNode> {
        match self.nodes.get(id.0) {
            Some(node) if !node.deleted => Ok(node),
            _ => Err("unknown or deleted node"),
        }
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].kind
    }

    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].label.as_deref()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Children of `parent`, or the top-level slot for `None`.
    pub fn siblings(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            Some(parent) => &self.nodes[parent.0].children,
            None => &self.roots,
        }
    }

    fn siblings_mut(&mut self, parent: Option<NodeId>) -> &mut Vec<NodeId> {
        match parent {
            Some(parent) => &mut self.nodes[parent.0].children,
            None => &mut self.roots,
        }
    }

    pub fn position_in_parent(&self, id: NodeId) -> Option<usize> {
        self.siblings(self.parent(id))
            .iter()
            .position(|&sibling| sibling == id)
    }

    pub(crate) fn insert(
        &mut self,
        kind: NodeKind,
        label: Option<String>,
        parent: Option<NodeId>,
        position: usize,
    ) -> OpResult<NodeId> {
        if let Some(parent) = parent {
            self.live(parent)?;
        }
        if position > self.siblings(parent).len() {
            return Err("insert position out of bounds");
        }
        let id = self.next_id();
        self.nodes.push(WorkingNode {
            kind,
            label,
            parent,
            children: Vec::new(),
            deleted: false,
        });
        self.siblings_mut(parent).insert(position, id);
        Ok(id)
    }

    /// Replace the label of `id`, returning the previous one.
    pub(crate) fn update(&mut self, id: NodeId, label: Option<String>) -> OpResult<Option<String>> {
        self.live(id)?;
        Ok(std::mem::replace(&mut self.nodes[id.0].label, label))
    }

    /// Take `id` out of its parent's children.
    pub(crate) fn detach(&mut self, id: NodeId) -> OpResult<()> {
        let parent = self.live(id)?.parent;
        let position = self
            .position_in_parent(id)
            .ok_or("node is already detached")?;
        self.siblings_mut(parent).remove(position);
        self.nodes[id.0].parent = None;
        Ok(())
    }

    /// Put a detached node back at `position` among the children of `parent`.
    pub(crate) fn attach(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        position: usize,
    ) -> OpResult<()> {
        if position > self.siblings(parent).len() {
            return Err("move position out of bounds");
        }
        self.nodes[id.0].parent = parent;
        self.siblings_mut(parent).insert(position, id);
        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: Option<NodeId>) -> bool {
        while let Some(id) = node {
            if id == ancestor {
                return true;
            }
            node = self.nodes[id.0].parent;
        }
        false
    }

    pub(crate) fn move_node(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        position: usize,
    ) -> OpResult<()> {
        self.live(id)?;
        if let Some(parent) = parent {
            self.live(parent)?;
        }
        if self.is_ancestor_or_self(id, parent) {
            return Err("cannot move a node below itself");
        }
        self.detach(id)?;
        self.attach(id, parent, position)
    }

    /// Remove a node that has no children left.
    pub(crate) fn delete(&mut self, id: NodeId) -> OpResult<()> {
        if !self.live(id)?.children.is_empty() {
            return Err("deleted node still has children");
        }
        self.detach(id)?;
        self.nodes[id.0].deleted = true;
        Ok(())
    }

    pub fn apply(&mut self, action: &Action) -> OpResult<()> {
        match action {
            Action::Insert {
                node,
                kind,
                label,
                parent,
                position,
                ..
            } => {
                if *node != self.next_id() {
                    return Err("inserted node id is not the next free id");
                }
                self.insert(*kind, label.clone(), *parent, *position)
                    .map(|_| ())
            }
            Action::Delete { node } => self.delete(*node),
            Action::Update {
                node, new_label, ..
            } => self.update(*node, new_label.clone()).map(|_| ()),
            Action::Move {
                node,
                parent,
                position,
                ..
            } => self.move_node(*node, *parent, *position),
        }
    }

    /// Whether this working tree has the exact shape, kinds and labels of
    /// `tree`.
    pub fn same_as(&self, tree: &SynTree) -> bool {
        match (self.roots.as_slice(), tree.root()) {
            (&[root], Some(tree_root)) => self.same_subtree(root, tree, tree_root),
            ([], None) => true,
            _ => false,
        }
    }

    fn same_subtree(&self, id: NodeId, tree: &SynTree, tree_id: NodeId) -> bool {
        let mut stack = vec![(id, tree_id)];
        while let Some((id, tree_id)) = stack.pop() {
            let node = &self.nodes[id.0];
            let other = tree.node(tree_id);
            if node.kind != other.kind
                || node.label != other.label
                || node.children.len() != other.children.len()
            {
                return false;
            }
            stack.extend(node.children.iter().copied().zip(other.children.iter().copied()));
        }
        true
    }
}
