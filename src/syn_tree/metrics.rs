use super::{Node, NodeKind};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct HashSum(pub u64);

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct NodeMetrics {
    /// Number of nodes in the subtree, the node itself included.
    pub size: usize,
    /// Length of the longest path down to a leaf, a leaf has height 1.
    pub height: usize,
    /// Distance to the root.
    pub depth: usize,
    /// Kinds and shape only, labels are ignored.
    pub hash: HashSum,
    /// Kinds, shape and labels.
    pub exact_hash: HashSum,
}

fn combine(
    kind: NodeKind,
    label: Option<&str>,
    children: impl Iterator<Item = HashSum>,
) -> HashSum {
    let mut hasher = DefaultHasher::new();
    kind.hash(&mut hasher);
    label.hash(&mut hasher);
    for child in children {
        hasher.write_u64(child.0);
    }
    HashSum(hasher.finish())
}

/// Fill the metrics of every node.
///
/// Relies on ids being assigned in pre-order: children always have a larger
/// id than their parent.
pub(super) fn compute_metrics(nodes: &mut [Node]) {
    for i in 0..nodes.len() {
        nodes[i].metrics.depth = match nodes[i].parent {
            Some(parent) => nodes[parent.0].metrics.depth + 1,
            None => 0,
        };
    }
    for i in (0..nodes.len()).rev() {
        let sub_metrics: Vec<NodeMetrics> = nodes[i]
            .children
            .iter()
            .map(|ch| nodes[ch.0].metrics)
            .collect();
        let node = &mut nodes[i];
        node.metrics.size = 1 + sub_metrics.iter().map(|m| m.size).sum::<usize>();
        node.metrics.height = 1 + sub_metrics.iter().map(|m| m.height).max().unwrap_or(0);
        node.metrics.hash = combine(node.kind, None, sub_metrics.iter().map(|m| m.hash));
        node.metrics.exact_hash = combine(
            node.kind,
            node.label.as_deref(),
            sub_metrics.iter().map(|m| m.exact_hash),
        );
    }
}
