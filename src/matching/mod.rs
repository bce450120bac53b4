mod bottom_up;
mod mapping;
mod top_down;

pub use bottom_up::match_containers;
pub use mapping::Mapping;
pub use top_down::match_subtrees;

use crate::budget::Budget;
use crate::error::{DiffError, Result};
use crate::syn_tree::SynTree;
use tracing::debug_span;

pub const DEFAULT_MIN_HEIGHT: usize = 2;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchOptions {
    /// Subtrees lower than this are never anchored by the top-down phase.
    pub min_height: usize,
    /// Dice similarity a container pair must exceed in the bottom-up phase.
    pub similarity_threshold: f64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            min_height: DEFAULT_MIN_HEIGHT,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// Strategy computing a node correspondence between two trees.
///
/// The edit script generator and the grouper only see the resulting
/// [`Mapping`], so any implementation can be plugged in front of them.
pub trait Matcher {
    fn compute_mapping(&self, src: &SynTree, dst: &SynTree, budget: &Budget) -> Result<Mapping>;
}

fn check_inputs(src: &SynTree, dst: &SynTree, budget: &Budget) -> Result<()> {
    if src.is_empty() {
        return Err(DiffError::InvalidInput("source tree has no root"));
    }
    if dst.is_empty() {
        return Err(DiffError::InvalidInput("destination tree has no root"));
    }
    budget.check_size(src, dst)
}

/// Only anchors identical subtrees.
#[derive(Clone, Copy, Debug)]
pub struct TopDownMatcher {
    pub min_height: usize,
}

impl Default for TopDownMatcher {
    fn default() -> Self {
        TopDownMatcher {
            min_height: DEFAULT_MIN_HEIGHT,
        }
    }
}

impl Matcher for TopDownMatcher {
    fn compute_mapping(&self, src: &SynTree, dst: &SynTree, budget: &Budget) -> Result<Mapping> {
        check_inputs(src, dst, budget)?;
        let _span = debug_span!("top_down_matcher").entered();
        let mut mapping = Mapping::new();
        match_subtrees(src, dst, self.min_height, &mut mapping, budget)?;
        Ok(mapping)
    }
}

/// Top-down anchoring followed by bottom-up container matching.
#[derive(Clone, Copy, Debug, Default)]
pub struct TwoPhaseMatcher {
    pub options: MatchOptions,
}

impl TwoPhaseMatcher {
    pub fn new(options: MatchOptions) -> Self {
        TwoPhaseMatcher { options }
    }
}

impl Matcher for TwoPhaseMatcher {
    fn compute_mapping(&self, src: &SynTree, dst: &SynTree, budget: &Budget) -> Result<Mapping> {
        check_inputs(src, dst, budget)?;
        let _span = debug_span!("two_phase_matcher", src_nodes = src.len(), dst_nodes = dst.len())
            .entered();
        let mut mapping = Mapping::new();
        match_subtrees(src, dst, self.options.min_height, &mut mapping, budget)?;
        match_containers(
            src,
            dst,
            self.options.similarity_threshold,
            &mut mapping,
            budget,
        )?;
        Ok(mapping)
    }
}
