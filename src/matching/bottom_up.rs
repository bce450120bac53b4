use super::Mapping;
use crate::alignment::longest_common_subseq;
use crate::budget::Budget;
use crate::error::Result;
use crate::syn_tree::{NodeId, SynTree};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Unmatched destination nodes of the same kind as `src_node` sitting above
/// the partners of its matched descendants.
fn container_candidates(
    src: &SynTree,
    src_node: NodeId,
    dst: &SynTree,
    mapping: &Mapping,
) -> BTreeSet<NodeId> {
    let kind = src.kind(src_node);
    let mut seen = BTreeSet::new();
    let mut candidates = BTreeSet::new();
    for partner in src.descendants(src_node).filter_map(|id| mapping.dst_of(id)) {
        for ancestor in dst.ancestors(partner) {
            if !seen.insert(ancestor) {
                break;
            }
            if !mapping.has_dst(ancestor) && dst.kind(ancestor) == kind {
                candidates.insert(ancestor);
            }
        }
    }
    candidates
}

/// Pair up still unmatched children of a freshly matched container.
///
/// Children are aligned by kind and label, then the alignment goes on below
/// every new pair.
pub(super) fn recover_children(
    src: &SynTree,
    src_node: NodeId,
    dst: &SynTree,
    dst_node: NodeId,
    mapping: &mut Mapping,
) {
    let mut pending = vec![(src_node, dst_node)];
    while let Some((src_node, dst_node)) = pending.pop() {
        let src_children: Vec<NodeId> = src
            .children(src_node)
            .iter()
            .copied()
            .filter(|&id| !mapping.has_src(id))
            .collect();
        let dst_children: Vec<NodeId> = dst
            .children(dst_node)
            .iter()
            .copied()
            .filter(|&id| !mapping.has_dst(id))
            .collect();

        let aligned = longest_common_subseq(&src_children, &dst_children, |&s, &d| {
            src.kind(s) == dst.kind(d) && src.label(s) == dst.label(d)
        });
        let first_new = pending.len();
        for (i, j) in aligned {
            let (s, d) = (src_children[i], dst_children[j]);
            if mapping.link(s, d) {
                trace!(src = s.0, dst = d.0, "recovered child pair");
                pending.push((s, d));
            }
        }
        // Leftmost pair first
        pending[first_new..].reverse();
    }
}

/// Bottom-up phase: match containers whose descendants are mostly matched
/// together.
pub fn match_containers(
    src: &SynTree,
    dst: &SynTree,
    threshold: f64,
    mapping: &mut Mapping,
    budget: &Budget,
) -> Result<()> {
    let mut nb_containers = 0;
    for src_node in src.post_order() {
        budget.check_time()?;
        if mapping.has_src(src_node) || src.node(src_node).is_leaf() {
            continue;
        }

        let mut best: Option<(NodeId, f64)> = None;
        for candidate in container_candidates(src, src_node, dst, mapping) {
            let similarity = mapping.dice(src, src_node, dst, candidate);
            // Candidates come in increasing order, keep the leftmost on ties
            if best.map_or(true, |(_, best_sim)| similarity > best_sim) {
                best = Some((candidate, similarity));
            }
        }

        if let Some((dst_node, similarity)) = best {
            if similarity > threshold && mapping.link(src_node, dst_node) {
                trace!(
                    src = src_node.0,
                    dst = dst_node.0,
                    similarity,
                    "container match"
                );
                nb_containers += 1;
                recover_children(src, src_node, dst, dst_node, mapping);
            }
        }
    }

    if let (Some(src_root), Some(dst_root)) = (src.root(), dst.root()) {
        if src.kind(src_root) == dst.kind(dst_root) && mapping.link(src_root, dst_root) {
            trace!("paired roots");
            recover_children(src, src_root, dst, dst_root, mapping);
        }
    }

    debug!(
        containers = nb_containers,
        mapped = mapping.len(),
        "bottom-up matching done"
    );
    Ok(())
}
