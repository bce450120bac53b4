use super::{NodeId, SynTree};
use std::collections::VecDeque;

pub struct PreOrder<'t> {
    tree: &'t SynTree,
    stack: Vec<NodeId>,
}

impl<'t> PreOrder<'t> {
    pub(super) fn new(tree: &'t SynTree, start: Option<NodeId>) -> Self {
        PreOrder {
            tree,
            stack: start.into_iter().collect(),
        }
    }
}

impl<'t> Iterator for PreOrder<'t> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Children before parents, siblings left to right.
pub struct PostOrder<'t> {
    tree: &'t SynTree,
    // Node and number of its children already pushed
    stack: Vec<(NodeId, usize)>,
}

impl<'t> PostOrder<'t> {
    pub(super) fn new(tree: &'t SynTree, start: Option<NodeId>) -> Self {
        PostOrder {
            tree,
            stack: start.map(|id| (id, 0)).into_iter().collect(),
        }
    }
}

impl<'t> Iterator for PostOrder<'t> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let (id, next_child) = self.stack.last_mut()?;
            let children = self.tree.children(*id);
            if *next_child < children.len() {
                let child = children[*next_child];
                *next_child += 1;
                self.stack.push((child, 0));
            } else {
                let id = *id;
                self.stack.pop();
                return Some(id);
            }
        }
    }
}

pub struct BreadthFirst<'t> {
    tree: &'t SynTree,
    queue: VecDeque<NodeId>,
}

impl<'t> BreadthFirst<'t> {
    pub(super) fn new(tree: &'t SynTree, start: Option<NodeId>) -> Self {
        BreadthFirst {
            tree,
            queue: start.into_iter().collect(),
        }
    }
}

impl<'t> Iterator for BreadthFirst<'t> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.queue.pop_front()?;
        self.queue.extend(self.tree.children(id).iter().copied());
        Some(id)
    }
}

pub struct Ancestors<'t> {
    tree: &'t SynTree,
    next: Option<NodeId>,
}

impl<'t> Ancestors<'t> {
    pub(super) fn new(tree: &'t SynTree, first: Option<NodeId>) -> Self {
        Ancestors { tree, next: first }
    }
}

impl<'t> Iterator for Ancestors<'t> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.parent(id);
        Some(id)
    }
}
