mod alignment;
mod budget;
mod diff;
mod error;
pub mod grouping;
pub mod matching;
mod options;
mod report_formatter;
pub mod script;
mod stats;
pub mod syn_tree;

pub use crate::budget::Budget;
pub use crate::diff::{compute_diff, DiffReport, Differ};
pub use crate::error::{DiffError, Result, Side};
pub use crate::grouping::{group_actions, ChangeGroup, ChangeNature, GroupAnchor, GroupingConfig};
pub use crate::matching::{Mapping, MatchOptions, Matcher, TopDownMatcher, TwoPhaseMatcher};
pub use crate::options::DiffOptions;
pub use crate::report_formatter::{
    AnsiColoredReportFormatter, PlainReportFormatter, ReportFormatter, ReportView,
};
pub use crate::script::{apply_script, generate_script, Action, EditScript, WorkingTree};
pub use crate::stats::{ActionCounts, Complexity, DiffStats};
pub use crate::syn_tree::parse::parse_source;
pub use crate::syn_tree::sexp::{parse_sexp, SexpError};
pub use crate::syn_tree::{Grammar, NodeId, NodeKind, SourceRange, SynTree, TreeBuilder};
