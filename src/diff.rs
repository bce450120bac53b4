use crate::error::Result;
use crate::grouping::{group_actions, ChangeGroup, GroupingConfig};
use crate::matching::{Mapping, Matcher, TwoPhaseMatcher};
use crate::options::DiffOptions;
use crate::script::{generate_script, EditScript};
use crate::stats::DiffStats;
use crate::syn_tree::{Grammar, SynTree};
use serde::Serialize;
use tracing::debug_span;

/// Everything computed while comparing two trees.
#[derive(Clone, Debug, Serialize)]
pub struct DiffReport {
    pub mapping: Mapping,
    pub script: EditScript,
    pub groups: Vec<ChangeGroup>,
    pub stats: DiffStats,
}

/// Matching, script generation and grouping chained together.
pub struct Differ {
    options: DiffOptions,
    grammar: Grammar,
    grouping: GroupingConfig,
    matcher: Box<dyn Matcher + Send + Sync>,
}

impl Differ {
    /// Kind names in `options` are resolved against `grammar`, which must be
    /// the grammar the compared trees were built with.
    pub fn new(options: DiffOptions, grammar: &Grammar) -> Self {
        let grouping = options.grouping_config(grammar);
        let matcher = Box::new(TwoPhaseMatcher::new(options.match_options()));
        Differ {
            options,
            grammar: grammar.clone(),
            grouping,
            matcher,
        }
    }

    /// Replace the default two phase matcher.
    pub fn with_matcher(mut self, matcher: impl Matcher + Send + Sync + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    pub fn grouping(&self) -> &GroupingConfig {
        &self.grouping
    }

    pub fn diff(&self, src: &SynTree, dst: &SynTree) -> Result<DiffReport> {
        let _span = debug_span!("diff", src_nodes = src.len(), dst_nodes = dst.len()).entered();
        let budget = self.options.budget();
        let mapping = self.matcher.compute_mapping(src, dst, &budget)?;
        let script = generate_script(src, dst, &mapping, &budget)?;
        let groups = group_actions(&script, src, dst, &mapping, &self.grammar, &self.grouping);
        let stats = DiffStats::compute(src, dst, &mapping, &script);
        Ok(DiffReport {
            mapping,
            script,
            groups,
            stats,
        })
    }
}

/// Compare `src` and `dst` with a one-off [`Differ`].
pub fn compute_diff(
    src: &SynTree,
    dst: &SynTree,
    grammar: &Grammar,
    options: DiffOptions,
) -> Result<DiffReport> {
    Differ::new(options, grammar).diff(src, dst)
}
