use crate::syn_tree::{NodeId, SynTree};
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;

/// Injective correspondence between source and destination nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mapping {
    src_to_dst: BTreeMap<NodeId, NodeId>,
    dst_to_src: BTreeMap<NodeId, NodeId>,
}

impl Mapping {
    pub fn new() -> Self {
        Mapping::default()
    }

    /// Record `(src, dst)` unless either side is already mapped.
    ///
    /// Returns whether the pair was added.
    pub fn link(&mut self, src: NodeId, dst: NodeId) -> bool {
        if self.src_to_dst.contains_key(&src) || self.dst_to_src.contains_key(&dst) {
            return false;
        }
        self.src_to_dst.insert(src, dst);
        self.dst_to_src.insert(dst, src);
        true
    }

    pub fn has_src(&self, src: NodeId) -> bool {
        self.src_to_dst.contains_key(&src)
    }

    pub fn has_dst(&self, dst: NodeId) -> bool {
        self.dst_to_src.contains_key(&dst)
    }

    pub fn dst_of(&self, src: NodeId) -> Option<NodeId> {
        self.src_to_dst.get(&src).copied()
    }

    pub fn src_of(&self, dst: NodeId) -> Option<NodeId> {
        self.dst_to_src.get(&dst).copied()
    }

    pub fn contains(&self, src: NodeId, dst: NodeId) -> bool {
        self.dst_of(src) == Some(dst)
    }

    pub fn len(&self) -> usize {
        self.src_to_dst.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src_to_dst.is_empty()
    }

    /// Pairs ordered by source id.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.src_to_dst.iter().map(|(&src, &dst)| (src, dst))
    }

    /// Source nodes without counterpart, in pre-order. These are deleted.
    pub fn unmapped_src<'t>(&'t self, src: &'t SynTree) -> impl Iterator<Item = NodeId> + 't {
        src.pre_order().filter(move |&id| !self.has_src(id))
    }

    /// Destination nodes without counterpart, in pre-order. These are
    /// inserted.
    pub fn unmapped_dst<'t>(&'t self, dst: &'t SynTree) -> impl Iterator<Item = NodeId> + 't {
        dst.pre_order().filter(move |&id| !self.has_dst(id))
    }

    /// Number of strict descendants of `src_node` mapped to strict
    /// descendants of `dst_node`.
    pub fn common_descendants(
        &self,
        src: &SynTree,
        src_node: NodeId,
        dst: &SynTree,
        dst_node: NodeId,
    ) -> usize {
        src.descendants(src_node)
            .filter_map(|id| self.dst_of(id))
            .filter(|&partner| dst.is_descendant(partner, dst_node))
            .count()
    }

    /// Dice coefficient of the descendants of two nodes under this mapping.
    pub fn dice(&self, src: &SynTree, src_node: NodeId, dst: &SynTree, dst_node: NodeId) -> f64 {
        let src_desc = src.metrics(src_node).size - 1;
        let dst_desc = dst.metrics(dst_node).size - 1;
        if src_desc + dst_desc == 0 {
            return 0.0;
        }
        let common = self.common_descendants(src, src_node, dst, dst_node);
        2.0 * common as f64 / (src_desc + dst_desc) as f64
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for pair in self.iter() {
            seq.serialize_element(&pair)?;
        }
        seq.end()
    }
}
