use crate::budget::Budget;
use crate::grouping::GroupingConfig;
use crate::matching::{MatchOptions, DEFAULT_MIN_HEIGHT, DEFAULT_SIMILARITY_THRESHOLD};
use crate::syn_tree::Grammar;
use serde::Deserialize;
use std::time::Duration;

/// User facing settings of a diff, as read from a JSON configuration file.
///
/// Every field is optional in the file and falls back to its default.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffOptions {
    pub min_height: usize,
    pub similarity_threshold: f64,
    pub max_nodes: Option<usize>,
    pub time_limit_ms: Option<u64>,
    /// Names of the node kinds that delimit logical changes.
    pub boundary_kinds: Vec<String>,
    /// Names of the node kinds holding the name of a boundary node.
    pub name_kinds: Vec<String>,
    /// Names of the node kinds whose subtrees are not searched for a name.
    pub type_kinds: Vec<String>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            min_height: DEFAULT_MIN_HEIGHT,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_nodes: None,
            time_limit_ms: None,
            boundary_kinds: Vec::new(),
            name_kinds: Vec::new(),
            type_kinds: Vec::new(),
        }
    }
}

impl DiffOptions {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            min_height: self.min_height,
            similarity_threshold: self.similarity_threshold,
        }
    }

    /// A fresh budget; its clock starts now.
    pub fn budget(&self) -> Budget {
        Budget::new(
            self.max_nodes,
            self.time_limit_ms.map(Duration::from_millis),
        )
    }

    pub fn grouping_config(&self, grammar: &Grammar) -> GroupingConfig {
        GroupingConfig::from_names(
            grammar,
            &self.boundary_kinds,
            &self.name_kinds,
            &self.type_kinds,
        )
    }
}
