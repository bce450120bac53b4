use super::working_tree::WorkingTree;
use super::{Action, EditScript};
use crate::alignment::longest_common_subseq;
use crate::budget::Budget;
use crate::error::{DiffError, Result, Side};
use crate::matching::Mapping;
use crate::syn_tree::{NodeId, SynTree};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// State of a Chawathe edit script computation.
///
/// The source is copied into a working tree and edited in place while the
/// destination is walked breadth-first, so every emitted action is valid at
/// the point it appears in the script.
struct ScriptGenerator<'t> {
    src: &'t SynTree,
    dst: &'t SynTree,
    working: WorkingTree,
    work_to_dst: Vec<Option<NodeId>>,
    dst_to_work: Vec<Option<NodeId>>,
    // Destination nodes whose counterpart already sits at its final place
    // relative to its in-order siblings
    dst_in_order: Vec<bool>,
    actions: Vec<Action>,
}

fn internal_error(index: usize, reason: &'static str) -> DiffError {
    DiffError::InapplicableAction { index, reason }
}

impl<'t> ScriptGenerator<'t> {
    fn new(src: &'t SynTree, dst: &'t SynTree, mapping: &Mapping) -> Result<Self> {
        let mut work_to_dst = vec![None; src.len()];
        let mut dst_to_work = vec![None; dst.len()];
        for (s, d) in mapping.iter() {
            if !src.contains(s) {
                return Err(DiffError::InconsistentMapping {
                    side: Side::Source,
                    node: s,
                });
            }
            if !dst.contains(d) {
                return Err(DiffError::InconsistentMapping {
                    side: Side::Destination,
                    node: d,
                });
            }
            if src.kind(s) != dst.kind(d) {
                warn!(src = s.0, dst = d.0, "ignoring mapped pair of different kinds");
                continue;
            }
            work_to_dst[s.0] = Some(d);
            dst_to_work[d.0] = Some(s);
        }
        Ok(ScriptGenerator {
            src,
            dst,
            working: WorkingTree::from_tree(src),
            work_to_dst,
            dst_to_work,
            dst_in_order: vec![false; dst.len()],
            actions: Vec::new(),
        })
    }

    fn partner_of_dst(&self, dst_node: NodeId) -> Option<NodeId> {
        self.dst_to_work[dst_node.0]
    }

    fn partner_of_work(&self, work_node: NodeId) -> Option<NodeId> {
        self.work_to_dst.get(work_node.0).copied().flatten()
    }

    /// Position among the children of the parent's counterpart where the
    /// counterpart of `dst_node` belongs: right after the counterpart of its
    /// rightmost in-order left sibling.
    fn find_pos(&self, dst_node: NodeId) -> usize {
        let root_slot = [dst_node];
        let siblings = match self.dst.parent(dst_node) {
            Some(parent) => self.dst.children(parent),
            None => &root_slot[..],
        };

        if let Some(&first_in_order) = siblings.iter().find(|&&s| self.dst_in_order[s.0]) {
            if first_in_order == dst_node {
                return 0;
            }
        }

        let Some(before) = siblings
            .iter()
            .take_while(|&&s| s != dst_node)
            .filter(|&&s| self.dst_in_order[s.0])
            .last()
        else {
            return 0;
        };
        let Some(anchor) = self.partner_of_dst(*before) else {
            return 0;
        };
        let target_parent = self.dst.parent(dst_node).and_then(|p| self.partner_of_dst(p));
        if self.working.parent(anchor) != target_parent {
            return self.working.siblings(target_parent).len();
        }
        self.working
            .position_in_parent(anchor)
            .map_or(0, |pos| pos + 1)
    }

    fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    fn link(&mut self, work_node: NodeId, dst_node: NodeId) {
        if self.work_to_dst.len() <= work_node.0 {
            self.work_to_dst.resize(work_node.0 + 1, None);
        }
        self.work_to_dst[work_node.0] = Some(dst_node);
        self.dst_to_work[dst_node.0] = Some(work_node);
    }

    fn move_to(
        &mut self,
        work_node: NodeId,
        dst_node: NodeId,
        parent: Option<NodeId>,
    ) -> Result<()> {
        let index = self.actions.len();
        self.working
            .detach(work_node)
            .map_err(|reason| internal_error(index, reason))?;
        let position = self.find_pos(dst_node);
        self.working
            .attach(work_node, parent, position)
            .map_err(|reason| internal_error(index, reason))?;
        self.push(Action::Move {
            node: work_node,
            target: dst_node,
            parent,
            position,
        });
        Ok(())
    }

    fn visit(&mut self, dst_node: NodeId) -> Result<()> {
        let index = self.actions.len();
        let parent = match self.dst.parent(dst_node) {
            Some(dst_parent) => Some(self.partner_of_dst(dst_parent).ok_or(
                DiffError::InconsistentMapping {
                    side: Side::Destination,
                    node: dst_parent,
                },
            )?),
            None => None,
        };

        let work_node = match self.partner_of_dst(dst_node) {
            None => {
                let position = self.find_pos(dst_node);
                let kind = self.dst.kind(dst_node);
                let label = self.dst.label(dst_node).map(str::to_owned);
                let work_node = self
                    .working
                    .insert(kind, label.clone(), parent, position)
                    .map_err(|reason| internal_error(index, reason))?;
                self.push(Action::Insert {
                    node: work_node,
                    target: dst_node,
                    kind,
                    label,
                    parent,
                    position,
                });
                self.link(work_node, dst_node);
                work_node
            }
            Some(work_node) => {
                if self.working.parent(work_node) != parent {
                    self.move_to(work_node, dst_node, parent)?;
                }
                let new_label = self.dst.label(dst_node);
                if self.working.label(work_node) != new_label {
                    let new_label = new_label.map(str::to_owned);
                    let old_label = self
                        .working
                        .update(work_node, new_label.clone())
                        .map_err(|reason| internal_error(index, reason))?;
                    self.push(Action::Update {
                        node: work_node,
                        old_label,
                        new_label,
                    });
                }
                work_node
            }
        };

        self.dst_in_order[dst_node.0] = true;
        self.align_children(work_node, dst_node)
    }

    /// Put the mapped children of a pair in the same relative order.
    fn align_children(&mut self, work_node: NodeId, dst_node: NodeId) -> Result<()> {
        for &child in self.dst.children(dst_node) {
            self.dst_in_order[child.0] = false;
        }

        let work_children: Vec<NodeId> = self
            .working
            .children(work_node)
            .iter()
            .copied()
            .filter(|&ch| {
                self.partner_of_work(ch)
                    .map_or(false, |d| self.dst.parent(d) == Some(dst_node))
            })
            .collect();
        let dst_children: Vec<NodeId> = self
            .dst
            .children(dst_node)
            .iter()
            .copied()
            .filter(|&ch| {
                self.partner_of_dst(ch)
                    .map_or(false, |w| self.working.parent(w) == Some(work_node))
            })
            .collect();

        let aligned = longest_common_subseq(&work_children, &dst_children, |&w, &d| {
            self.partner_of_work(w) == Some(d)
        });
        let mut kept = BTreeSet::new();
        for (i, j) in aligned {
            kept.insert(work_children[i]);
            self.dst_in_order[dst_children[j].0] = true;
        }

        for dst_child in dst_children {
            let Some(work_child) = self.partner_of_dst(dst_child) else {
                continue;
            };
            if !kept.contains(&work_child) {
                self.move_to(work_child, dst_child, Some(work_node))?;
                self.dst_in_order[dst_child.0] = true;
            }
        }
        Ok(())
    }

    fn delete_unmapped(&mut self) -> Result<()> {
        for src_node in self.src.post_order() {
            if self.work_to_dst[src_node.0].is_some() {
                continue;
            }
            let index = self.actions.len();
            self.working
                .delete(src_node)
                .map_err(|reason| internal_error(index, reason))?;
            self.push(Action::Delete { node: src_node });
        }
        Ok(())
    }
}

/// Derive the actions turning `src` into `dst` under `mapping`.
///
/// Destination nodes are visited breadth-first: unmapped ones are inserted,
/// mapped ones are moved under their parent's counterpart when needed and
/// relabeled, then the children of each pair are reordered along a longest
/// common subsequence. Unmapped source nodes are deleted last, deepest first.
pub fn generate_script(
    src: &SynTree,
    dst: &SynTree,
    mapping: &Mapping,
    budget: &Budget,
) -> Result<EditScript> {
    let mut generator = ScriptGenerator::new(src, dst, mapping)?;
    for dst_node in dst.breadth_first() {
        budget.check_time()?;
        generator.visit(dst_node)?;
    }
    generator.delete_unmapped()?;

    let script = EditScript::new(src.len(), generator.actions);
    debug!(actions = script.len(), "edit script generated");
    Ok(script)
}
