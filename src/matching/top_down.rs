use super::Mapping;
use crate::budget::Budget;
use crate::error::Result;
use crate::syn_tree::{HashSum, NodeId, SynTree};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Subtrees waiting to be compared, indexed by height.
struct HeightQueue {
    min_height: usize,
    levels: BTreeMap<usize, Vec<NodeId>>,
}

impl HeightQueue {
    fn new(tree: &SynTree, min_height: usize) -> Self {
        let mut queue = HeightQueue {
            min_height,
            levels: BTreeMap::new(),
        };
        if let Some(root) = tree.root() {
            queue.push(tree, root);
        }
        queue
    }

    fn push(&mut self, tree: &SynTree, id: NodeId) {
        let height = tree.metrics(id).height;
        if height >= self.min_height {
            self.levels.entry(height).or_default().push(id);
        }
    }

    fn open(&mut self, tree: &SynTree, id: NodeId) {
        for &child in tree.children(id) {
            self.push(tree, child)
        }
    }

    fn peek_height(&self) -> Option<usize> {
        self.levels.keys().next_back().copied()
    }

    fn pop_level(&mut self) -> Vec<NodeId> {
        let mut level = self
            .levels
            .pop_last()
            .map(|(_, level)| level)
            .unwrap_or_default();
        level.sort_unstable();
        level
    }
}

/// Match `src_node` and `dst_node` along with all their descendants.
///
/// Both subtrees must be isomorphic, descendants are paired by pre-order
/// position.
pub(super) fn match_whole(
    src: &SynTree,
    src_node: NodeId,
    dst: &SynTree,
    dst_node: NodeId,
    mapping: &mut Mapping,
) {
    trace!(src = src_node.0, dst = dst_node.0, "whole subtree match");
    for (s, d) in src.pre_order_from(src_node).zip(dst.pre_order_from(dst_node)) {
        mapping.link(s, d);
    }
}

/// Candidate pair left ambiguous by the hash grouping.
struct Deferred {
    src: NodeId,
    dst: NodeId,
    locality: f64,
    same_labels: bool,
}

impl Deferred {
    fn priority(&self, other: &Deferred) -> Ordering {
        other
            .locality
            .total_cmp(&self.locality)
            .then_with(|| other.same_labels.cmp(&self.same_labels))
            .then_with(|| self.src.cmp(&other.src))
            .then_with(|| self.dst.cmp(&other.dst))
    }
}

/// Overlap of the parents of a candidate pair, the closer the already
/// matched context the higher.
fn parent_locality(
    src: &SynTree,
    src_node: NodeId,
    dst: &SynTree,
    dst_node: NodeId,
    mapping: &Mapping,
    cache: &mut BTreeMap<(NodeId, NodeId), f64>,
) -> f64 {
    match (src.parent(src_node), dst.parent(dst_node)) {
        (Some(src_parent), Some(dst_parent)) => *cache
            .entry((src_parent, dst_parent))
            .or_insert_with(|| mapping.dice(src, src_parent, dst, dst_parent)),
        _ => 0.0,
    }
}

/// Greedy top-down phase: anchor identical subtrees, tallest first.
///
/// Hashes ignore labels, so anchored subtrees may still differ by labels and
/// produce updates later on.
pub fn match_subtrees(
    src: &SynTree,
    dst: &SynTree,
    min_height: usize,
    mapping: &mut Mapping,
    budget: &Budget,
) -> Result<()> {
    let min_height = min_height.max(1);
    let mut src_queue = HeightQueue::new(src, min_height);
    let mut dst_queue = HeightQueue::new(dst, min_height);
    let mut ambiguous = Vec::new();
    let mut nb_unique = 0;

    while let (Some(src_height), Some(dst_height)) =
        (src_queue.peek_height(), dst_queue.peek_height())
    {
        budget.check_time()?;
        if src_height > dst_height {
            for id in src_queue.pop_level() {
                src_queue.open(src, id);
            }
            continue;
        }
        if dst_height > src_height {
            for id in dst_queue.pop_level() {
                dst_queue.open(dst, id);
            }
            continue;
        }

        let mut groups: BTreeMap<HashSum, (Vec<NodeId>, Vec<NodeId>)> = BTreeMap::new();
        for id in src_queue.pop_level() {
            groups.entry(src.metrics(id).hash).or_default().0.push(id);
        }
        for id in dst_queue.pop_level() {
            groups.entry(dst.metrics(id).hash).or_default().1.push(id);
        }

        for (src_group, dst_group) in groups.into_values() {
            match (src_group.as_slice(), dst_group.as_slice()) {
                ([], _) => dst_group.iter().for_each(|&id| dst_queue.open(dst, id)),
                (_, []) => src_group.iter().for_each(|&id| src_queue.open(src, id)),
                (&[s], &[d]) if src.isomorphic(s, dst, d) => {
                    match_whole(src, s, dst, d, mapping);
                    nb_unique += 1;
                }
                (&[s], &[d]) => {
                    // Hash collision between different shapes
                    src_queue.open(src, s);
                    dst_queue.open(dst, d);
                }
                _ => {
                    let mut dst_paired = vec![false; dst_group.len()];
                    for &s in &src_group {
                        let mut paired = false;
                        for (j, &d) in dst_group.iter().enumerate() {
                            if src.isomorphic(s, dst, d) {
                                ambiguous.push((s, d));
                                paired = true;
                                dst_paired[j] = true;
                            }
                        }
                        if !paired {
                            src_queue.open(src, s);
                        }
                    }
                    for (&d, paired) in dst_group.iter().zip(dst_paired) {
                        if !paired {
                            dst_queue.open(dst, d);
                        }
                    }
                }
            }
        }
    }

    let mut locality_cache = BTreeMap::new();
    let mut deferred: Vec<Deferred> = ambiguous
        .into_iter()
        .map(|(s, d)| Deferred {
            src: s,
            dst: d,
            locality: parent_locality(src, s, dst, d, mapping, &mut locality_cache),
            same_labels: src.metrics(s).exact_hash == dst.metrics(d).exact_hash,
        })
        .collect();
    deferred.sort_by(|a, b| a.priority(b));

    let mut nb_resolved = 0;
    for candidate in &deferred {
        budget.check_time()?;
        if mapping.has_src(candidate.src) || mapping.has_dst(candidate.dst) {
            continue;
        }
        match_whole(src, candidate.src, dst, candidate.dst, mapping);
        nb_resolved += 1;
    }

    debug!(
        unique = nb_unique,
        ambiguous = deferred.len(),
        resolved = nb_resolved,
        mapped = mapping.len(),
        "top-down matching done"
    );
    Ok(())
}
