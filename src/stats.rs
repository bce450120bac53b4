use crate::matching::Mapping;
use crate::script::{Action, EditScript};
use crate::syn_tree::SynTree;
use serde::Serialize;
use std::fmt;

/// Rough size of a change, from the number of edit actions.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    None,
    Minor,
    Moderate,
    Major,
}

impl Complexity {
    pub fn from_action_count(count: usize) -> Self {
        match count {
            0 => Complexity::None,
            1..=9 => Complexity::Minor,
            10..=49 => Complexity::Moderate,
            _ => Complexity::Major,
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Complexity::None => "none",
            Complexity::Minor => "minor",
            Complexity::Moderate => "moderate",
            Complexity::Major => "major",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ActionCounts {
    pub insert: usize,
    pub delete: usize,
    pub update: usize,
    #[serde(rename = "move")]
    pub moves: usize,
}

impl ActionCounts {
    pub fn total(&self) -> usize {
        self.insert + self.delete + self.update + self.moves
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiffStats {
    pub src_nodes: usize,
    pub dst_nodes: usize,
    /// Destination minus source node count.
    pub node_delta: isize,
    pub mapped: usize,
    pub unmapped_src: usize,
    pub unmapped_dst: usize,
    /// Share of the larger tree covered by the mapping.
    pub mapping_ratio: f64,
    pub actions: ActionCounts,
    /// Actions per node of the larger tree.
    pub edit_density: f64,
    pub complexity: Complexity,
}

impl DiffStats {
    pub fn compute(src: &SynTree, dst: &SynTree, mapping: &Mapping, script: &EditScript) -> Self {
        let mut actions = ActionCounts::default();
        for action in script {
            match action {
                Action::Insert { .. } => actions.insert += 1,
                Action::Delete { .. } => actions.delete += 1,
                Action::Update { .. } => actions.update += 1,
                Action::Move { .. } => actions.moves += 1,
            }
        }

        let larger = src.len().max(dst.len());
        let mapping_ratio = if larger == 0 {
            1.0
        } else {
            mapping.len() as f64 / larger as f64
        };
        let edit_density = if larger == 0 {
            0.0
        } else {
            actions.total() as f64 / larger as f64
        };

        DiffStats {
            src_nodes: src.len(),
            dst_nodes: dst.len(),
            node_delta: dst.len() as isize - src.len() as isize,
            mapped: mapping.len(),
            unmapped_src: src.len().saturating_sub(mapping.len()),
            unmapped_dst: dst.len().saturating_sub(mapping.len()),
            mapping_ratio,
            actions,
            edit_density,
            complexity: Complexity::from_action_count(actions.total()),
        }
    }
}
