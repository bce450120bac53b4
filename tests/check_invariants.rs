mod common;

use common::{random_grammar, random_options, shape, tree_pair, Shape};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;
use syndelta::{
    apply_script, compute_diff, generate_script, parse_sexp, Action, Budget, DiffError,
    DiffOptions, DiffReport, Differ, EditScript, Grammar, Mapping, Matcher, NodeId, NodeKind,
    Side, SourceRange, SynTree, TopDownMatcher, TreeBuilder, TwoPhaseMatcher, WorkingTree,
};

fn diff_shapes(src: &Shape, dst: &Shape) -> (SynTree, SynTree, DiffReport) {
    let grammar = random_grammar();
    let (src, dst) = (src.build(), dst.build());
    let report = compute_diff(&src, &dst, &grammar, random_options()).unwrap();
    (src, dst, report)
}

/// Replay the node references of a script: every action must refer to nodes
/// existing at that point, and inserted ids must be fresh.
fn check_references(src: &SynTree, script: &EditScript) {
    let mut alive: BTreeSet<NodeId> = src.pre_order().collect();
    for action in script {
        match action {
            Action::Insert { node, parent, .. } => {
                assert!(!alive.contains(node));
                assert!(node.0 >= script.src_len());
                if let Some(parent) = parent {
                    assert!(alive.contains(parent));
                }
                alive.insert(*node);
            }
            Action::Delete { node } => assert!(alive.remove(node)),
            Action::Update { node, .. } => assert!(alive.contains(node)),
            Action::Move { node, parent, .. } => {
                assert!(alive.contains(node));
                if let Some(parent) = parent {
                    assert!(alive.contains(parent));
                }
            }
        }
    }
}

proptest! {
    #[test]
    fn script_rebuilds_destination((src, dst) in tree_pair()) {
        let (src, dst, report) = diff_shapes(&src, &dst);
        let working = apply_script(&src, &report.script).unwrap();
        prop_assert!(working.same_as(&dst));
    }

    #[test]
    fn identical_trees_need_no_action(tree in shape()) {
        let (src, _, report) = diff_shapes(&tree, &tree);
        prop_assert!(report.script.is_empty());
        prop_assert_eq!(report.mapping.len(), src.len());
        prop_assert!(report.groups.is_empty());
    }

    #[test]
    fn mapping_is_injective_and_kind_preserving((src, dst) in tree_pair()) {
        let (src, dst, report) = diff_shapes(&src, &dst);
        let mut seen_dst = BTreeSet::new();
        for (s, d) in report.mapping.iter() {
            prop_assert!(src.contains(s) && dst.contains(d));
            prop_assert_eq!(src.kind(s), dst.kind(d));
            prop_assert!(seen_dst.insert(d));
        }
        prop_assert_eq!(report.stats.unmapped_dst, report.mapping.unmapped_dst(&dst).count());
    }

    #[test]
    fn diff_is_deterministic((src, dst) in tree_pair()) {
        let (_, _, first) = diff_shapes(&src, &dst);
        let (_, _, second) = diff_shapes(&src, &dst);
        prop_assert_eq!(&first.mapping, &second.mapping);
        prop_assert_eq!(&first.script, &second.script);
        prop_assert_eq!(&first.groups, &second.groups);
    }

    #[test]
    fn actions_only_touch_live_nodes((src, dst) in tree_pair()) {
        let (src, _, report) = diff_shapes(&src, &dst);
        check_references(&src, &report.script);
    }

    #[test]
    fn every_action_in_one_group((src, dst) in tree_pair()) {
        let (_, _, report) = diff_shapes(&src, &dst);
        let mut grouped: Vec<usize> = Vec::new();
        for group in &report.groups {
            prop_assert!(!group.actions.is_empty());
            prop_assert!(group.actions.windows(2).all(|w| w[0] < w[1]));
            grouped.extend(&group.actions);
        }
        grouped.sort_unstable();
        prop_assert_eq!(grouped, (0..report.script.len()).collect::<Vec<_>>());
    }

    #[test]
    fn top_down_matcher_alone_still_rebuilds((src, dst) in tree_pair()) {
        let grammar = random_grammar();
        let (src, dst) = (src.build(), dst.build());
        let report = Differ::new(random_options(), &grammar)
            .with_matcher(TopDownMatcher::default())
            .diff(&src, &dst)
            .unwrap();
        prop_assert!(apply_script(&src, &report.script).unwrap().same_as(&dst));
    }
}

#[test]
fn empty_tree_is_invalid_input() {
    let mut grammar = Grammar::default();
    let tree = parse_sexp(&mut grammar, "(Unit (Item \"a\"))").unwrap();
    let matcher = TwoPhaseMatcher::default();
    let budget = Budget::unlimited();

    assert_eq!(
        matcher.compute_mapping(&SynTree::empty(), &tree, &budget),
        Err(DiffError::InvalidInput("source tree has no root"))
    );
    assert_eq!(
        matcher.compute_mapping(&tree, &SynTree::empty(), &budget),
        Err(DiffError::InvalidInput("destination tree has no root"))
    );
}

#[test]
fn mapping_with_unknown_node_is_rejected() {
    let mut grammar = Grammar::default();
    let src = parse_sexp(&mut grammar, "(Unit (Item \"a\"))").unwrap();
    let dst = parse_sexp(&mut grammar, "(Unit (Item \"b\"))").unwrap();

    let mut mapping = Mapping::new();
    mapping.link(NodeId(0), NodeId(0));
    mapping.link(NodeId(7), NodeId(1));
    assert_eq!(
        generate_script(&src, &dst, &mapping, &Budget::unlimited()),
        Err(DiffError::InconsistentMapping {
            side: Side::Source,
            node: NodeId(7),
        })
    );

    let mut mapping = Mapping::new();
    mapping.link(NodeId(1), NodeId(5));
    assert_eq!(
        generate_script(&src, &dst, &mapping, &Budget::unlimited()),
        Err(DiffError::InconsistentMapping {
            side: Side::Destination,
            node: NodeId(5),
        })
    );
}

#[test]
fn exhausted_budgets_abort() {
    let mut grammar = Grammar::default();
    let src = parse_sexp(&mut grammar, "(Unit (Item \"a\") (Item \"b\"))").unwrap();
    let dst = parse_sexp(&mut grammar, "(Unit (Item \"b\") (Item \"c\"))").unwrap();

    let options = DiffOptions {
        max_nodes: Some(5),
        ..DiffOptions::default()
    };
    assert_eq!(
        compute_diff(&src, &dst, &grammar, options).unwrap_err(),
        DiffError::BudgetExceeded {
            what: "node count",
            limit: 5,
        }
    );

    let options = DiffOptions {
        time_limit_ms: Some(0),
        ..DiffOptions::default()
    };
    assert_eq!(
        compute_diff(&src, &dst, &grammar, options).unwrap_err(),
        DiffError::BudgetExceeded {
            what: "time",
            limit: 0,
        }
    );
}

#[test]
fn mapping_of_other_kinds_is_ignored() {
    let mut grammar = Grammar::default();
    let src = parse_sexp(&mut grammar, "(Unit (Item \"a\"))").unwrap();
    let dst = parse_sexp(&mut grammar, "(Unit (Other \"a\"))").unwrap();

    let mut mapping = Mapping::new();
    mapping.link(NodeId(0), NodeId(0));
    mapping.link(NodeId(1), NodeId(1));
    let script = generate_script(&src, &dst, &mapping, &Budget::unlimited()).unwrap();

    assert_eq!(
        script.actions(),
        &[
            Action::Insert {
                node: NodeId(2),
                target: NodeId(1),
                kind: grammar.kind("Other").unwrap(),
                label: Some("a".to_owned()),
                parent: Some(NodeId(0)),
                position: 0,
            },
            Action::Delete { node: NodeId(1) },
        ]
    );
    assert!(apply_script(&src, &script).unwrap().same_as(&dst));
}

#[test]
fn different_roots_are_replaced() {
    let mut grammar = Grammar::default();
    let src = parse_sexp(&mut grammar, "(Old (Item \"a\") (Item \"b\"))").unwrap();
    let dst = parse_sexp(&mut grammar, "(New (Item \"a\") (Item \"b\"))").unwrap();

    let report = compute_diff(&src, &dst, &grammar, DiffOptions::default()).unwrap();
    let working = apply_script(&src, &report.script).unwrap();
    assert!(working.same_as(&dst));
    assert_eq!(working.roots(), &[NodeId(3)]);
    assert!(matches!(
        report.script.actions().last(),
        Some(Action::Delete { node: NodeId(0) })
    ));
}

#[test]
fn broken_script_is_reported() {
    let mut grammar = Grammar::default();
    let src = parse_sexp(&mut grammar, "(Unit (Item \"a\"))").unwrap();
    let script = EditScript::new(src.len(), vec![Action::Delete { node: NodeId(0) }]);

    assert_eq!(
        apply_script(&src, &script).unwrap_err(),
        DiffError::InapplicableAction {
            index: 0,
            reason: "deleted node still has children",
        }
    );
}

/// A chain of `depth` nodes ending with a labeled leaf.
fn chain(depth: usize, leaf: &str) -> SynTree {
    let mut builder = TreeBuilder::new(NodeKind(0), None, SourceRange::default());
    for _ in 2..depth {
        builder.open(NodeKind(1), None, SourceRange::default());
    }
    builder.leaf(NodeKind(2), Some(leaf.to_owned()), SourceRange::default());
    builder.finish()
}

#[test]
fn very_deep_trees_do_not_overflow() {
    let grammar = random_grammar();
    let (src, dst) = (chain(100_000, "a"), chain(100_000, "b"));
    assert_eq!(src.len(), 100_000);

    let report = compute_diff(&src, &dst, &grammar, random_options()).unwrap();
    assert_eq!(report.mapping.len(), src.len());
    assert_eq!(
        report.script.actions(),
        &[Action::Update {
            node: NodeId(99_999),
            old_label: Some("a".to_owned()),
            new_label: Some("b".to_owned()),
        }]
    );
    assert!(apply_script(&src, &report.script).unwrap().same_as(&dst));
    assert!(!src.same_subtree(NodeId(0), &dst, NodeId(0)));
    assert!(src.isomorphic(NodeId(0), &dst, NodeId(0)));
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn shared_types_are_send_and_sync() {
    assert_send_sync::<Budget>();
    assert_send_sync::<Differ>();
    assert_send_sync::<DiffReport>();
    assert_send_sync::<Grammar>();
    assert_send_sync::<Mapping>();
    assert_send_sync::<SynTree>();
    assert_send_sync::<EditScript>();
    assert_send_sync::<WorkingTree>();
}
