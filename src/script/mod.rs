//! Edit scripts turning a source tree into a destination tree.

mod chawathe;
mod working_tree;

pub use chawathe::generate_script;
pub use working_tree::WorkingTree;

use crate::error::{DiffError, Result};
use crate::syn_tree::{NodeId, NodeKind, SynTree};
use serde::Serialize;

/// One structural edit on the working copy of the source tree.
///
/// Node ids are working-tree ids: source nodes keep their id and inserted
/// nodes get fresh ids from [`EditScript::src_len`] upwards. A `parent` of
/// `None` designates the top-level root slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Action {
    Insert {
        node: NodeId,
        /// Destination node this insertion reproduces.
        target: NodeId,
        #[serde(rename = "type")]
        kind: NodeKind,
        label: Option<String>,
        parent: Option<NodeId>,
        position: usize,
    },
    Delete {
        node: NodeId,
    },
    Update {
        node: NodeId,
        old_label: Option<String>,
        new_label: Option<String>,
    },
    Move {
        node: NodeId,
        target: NodeId,
        parent: Option<NodeId>,
        /// Index among the new siblings once the node has left its old place.
        position: usize,
    },
}

impl Action {
    /// Working-tree node the action acts on.
    pub fn node(&self) -> NodeId {
        match self {
            Action::Insert { node, .. }
            | Action::Delete { node }
            | Action::Update { node, .. }
            | Action::Move { node, .. } => *node,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Insert { .. } => "insert",
            Action::Delete { .. } => "delete",
            Action::Update { .. } => "update",
            Action::Move { .. } => "move",
        }
    }

    /// Destination node the action lands on, when it has one.
    pub fn target(&self) -> Option<NodeId> {
        match self {
            Action::Insert { target, .. } | Action::Move { target, .. } => Some(*target),
            Action::Delete { .. } | Action::Update { .. } => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EditScript {
    src_len: usize,
    actions: Vec<Action>,
}

impl EditScript {
    pub fn new(src_len: usize, actions: Vec<Action>) -> Self {
        EditScript { src_len, actions }
    }

    /// Number of nodes of the source tree, which is also the first id given
    /// to an inserted node.
    pub fn src_len(&self) -> usize {
        self.src_len
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    /// Whether `node` was created by an insertion of this script.
    pub fn is_inserted(&self, node: NodeId) -> bool {
        node.0 >= self.src_len
    }
}

impl<'s> IntoIterator for &'s EditScript {
    type Item = &'s Action;
    type IntoIter = std::slice::Iter<'s, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

/// Replay `script` on a fresh working copy of `src`.
pub fn apply_script(src: &SynTree, script: &EditScript) -> Result<WorkingTree> {
    let mut working = WorkingTree::from_tree(src);
    for (index, action) in script.iter().enumerate() {
        working
            .apply(action)
            .map_err(|reason| DiffError::InapplicableAction { index, reason })?;
    }
    Ok(working)
}
