mod common;

use common::{find, fixture};
use pretty_assertions::assert_eq;
use syndelta::{
    apply_script, compute_diff, parse_sexp, Action, Budget, ChangeNature, Complexity, DiffOptions,
    Grammar, Mapping, Matcher, NodeId, Side, SynTree, TopDownMatcher,
};

#[test]
fn record_mapping_keeps_existing_members() {
    let (grammar, src, dst, options) = fixture("record");
    let report = compute_diff(&src, &dst, &grammar, options).unwrap();

    assert_eq!(report.mapping.len(), src.len());
    for (kind, label) in [
        ("SimpleName", "getName"),
        ("SimpleName", "getAge"),
        ("SimpleName", "Example"),
        ("SimpleName", "name"),
        ("SimpleName", "age"),
        ("ThisExpression", "this"),
    ] {
        let src_node = find(&src, &grammar, kind, Some(label));
        let dst_node = report.mapping.dst_of(src_node).unwrap();
        assert_eq!(dst.label(dst_node), Some(label));
    }

    let src_field = |name| src.ancestors(find(&src, &grammar, "SimpleName", Some(name))).nth(1);
    let dst_field = |name| dst.ancestors(find(&dst, &grammar, "SimpleName", Some(name))).nth(1);
    assert_eq!(
        src_field("name").and_then(|f| report.mapping.dst_of(f)),
        dst_field("name")
    );
    assert_eq!(
        src_field("age").and_then(|f| report.mapping.dst_of(f)),
        dst_field("age")
    );

    let getter =
        |tree: &SynTree, name| tree.parent(find(tree, &grammar, "SimpleName", Some(name)));
    assert_eq!(
        getter(&src, "getName").and_then(|m| report.mapping.dst_of(m)),
        getter(&dst, "getName")
    );
    assert_eq!(
        getter(&src, "getAge").and_then(|m| report.mapping.dst_of(m)),
        getter(&dst, "getAge")
    );

    let constructor = find(&src, &grammar, "MethodDeclaration", None);
    assert_eq!(report.mapping.dst_of(constructor), Some(NodeId(19)));
}

#[test]
fn record_script_inserts_new_members() {
    let (grammar, src, dst, options) = fixture("record");
    let report = compute_diff(&src, &dst, &grammar, options).unwrap();
    let script = &report.script;

    assert_eq!(script.len(), 21);
    assert!(script.iter().all(|a| matches!(a, Action::Insert { .. })));

    let inserted_kind = |target: usize| {
        script
            .iter()
            .find(|a| a.target() == Some(NodeId(target)))
            .map(|a| match a {
                Action::Insert { kind, .. } => grammar.name(*kind).to_owned(),
                _ => String::new(),
            })
    };
    assert_eq!(inserted_kind(14).as_deref(), Some("FieldDeclaration"));
    assert_eq!(inserted_kind(64).as_deref(), Some("MethodDeclaration"));
    assert_eq!(inserted_kind(28).as_deref(), Some("SingleVariableDeclaration"));
    assert_eq!(inserted_kind(44).as_deref(), Some("ExpressionStatement"));

    let parameter = script
        .iter()
        .find(|a| a.target() == Some(NodeId(28)))
        .unwrap();
    assert_eq!(
        parameter,
        &Action::Insert {
            node: NodeId(55),
            target: NodeId(28),
            kind: grammar.kind("SingleVariableDeclaration").unwrap(),
            label: None,
            parent: Some(NodeId(14)),
            position: 4,
        }
    );

    let working = apply_script(&src, script).unwrap();
    assert!(working.same_as(&dst));
}

#[test]
fn record_groups_by_member() {
    let (grammar, src, dst, options) = fixture("record");
    let report = compute_diff(&src, &dst, &grammar, options).unwrap();

    let summary: Vec<(String, ChangeNature, Vec<usize>)> = report
        .groups
        .iter()
        .map(|g| (g.label.clone(), g.nature, g.actions.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (
                "FieldDeclaration email".to_owned(),
                ChangeNature::Addition,
                vec![0, 2, 3, 4, 10]
            ),
            (
                "MethodDeclaration getEmail".to_owned(),
                ChangeNature::Addition,
                vec![1, 6, 7, 8, 9, 14, 16]
            ),
            (
                "MethodDeclaration Example".to_owned(),
                ChangeNature::Modification,
                vec![5, 11, 12, 13, 15, 17, 18, 19, 20]
            ),
        ]
    );

    let constructor = report.groups[2].anchor.as_ref().unwrap();
    assert_eq!(constructor.side, Side::Destination);
    assert_eq!(constructor.node, NodeId(19));
    assert!(report.groups.iter().all(|g| !g.is_uncategorized()));
}

#[test]
fn record_stats() {
    let (grammar, src, dst, options) = fixture("record");
    let stats = compute_diff(&src, &dst, &grammar, options).unwrap().stats;

    assert_eq!((stats.src_nodes, stats.dst_nodes), (50, 71));
    assert_eq!(stats.node_delta, 21);
    assert_eq!(stats.mapped, 50);
    assert_eq!((stats.unmapped_src, stats.unmapped_dst), (0, 21));
    assert_eq!(stats.actions.insert, 21);
    assert!((stats.edit_density - 21.0 / 71.0).abs() < 1e-9);
    assert_eq!(stats.complexity, Complexity::Moderate);
}

#[test]
fn record_without_boundaries_is_uncategorized() {
    let (grammar, src, dst, mut options) = fixture("record");
    options.boundary_kinds.clear();
    let report = compute_diff(&src, &dst, &grammar, options).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert!(report.groups[0].is_uncategorized());
    assert_eq!(report.groups[0].actions, (0..21).collect::<Vec<_>>());
}

#[test]
fn swapped_functions_move() {
    let (grammar, src, dst, options) = fixture("swap");
    let report = compute_diff(&src, &dst, &grammar, options).unwrap();

    assert_eq!(
        report.script.actions(),
        &[
            Action::Move {
                node: NodeId(6),
                target: NodeId(1),
                parent: Some(NodeId(0)),
                position: 0,
            },
            Action::Update {
                node: NodeId(9),
                old_label: Some("1".to_owned()),
                new_label: Some("2".to_owned()),
            },
            Action::Update {
                node: NodeId(4),
                old_label: Some("print".to_owned()),
                new_label: Some("log".to_owned()),
            },
            Action::Update {
                node: NodeId(5),
                old_label: Some("log".to_owned()),
                new_label: Some("print".to_owned()),
            },
        ]
    );
    assert!(apply_script(&src, &report.script).unwrap().same_as(&dst));
}

#[test]
fn renamed_field_stays_apart_from_new_field() {
    let (grammar, src, dst, options) = fixture("field");
    let report = compute_diff(&src, &dst, &grammar, options).unwrap();

    let summary: Vec<(&str, ChangeNature, Vec<usize>)> = report
        .groups
        .iter()
        .map(|g| (g.label.as_str(), g.nature, g.actions.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (
                "FieldDeclaration email",
                ChangeNature::Addition,
                vec![0, 1, 2, 3, 5, 6]
            ),
            ("FieldDeclaration fullName", ChangeNature::Modification, vec![4]),
        ]
    );
    assert_eq!(
        report.script.actions()[4],
        Action::Update {
            node: NodeId(11),
            old_label: Some("name".to_owned()),
            new_label: Some("fullName".to_owned()),
        }
    );

    // The renamed field is reported where it now lives
    let renamed = report.groups[1].anchor.as_ref().unwrap();
    assert_eq!((renamed.side, renamed.node), (Side::Destination, NodeId(6)));
    let added = report.groups[0].anchor.as_ref().unwrap();
    assert_eq!((added.side, added.node), (Side::Destination, NodeId(12)));
}

#[test]
fn fields_with_same_name_stay_apart() {
    let (grammar, src, dst, mut options) = fixture("field");
    options.type_kinds.clear();
    let report = compute_diff(&src, &dst, &grammar, options).unwrap();

    // Without type kinds the type is the first name found under each field
    assert_eq!(report.groups.len(), 2);
    assert!(report
        .groups
        .iter()
        .all(|g| g.label == "FieldDeclaration String"));
    assert_eq!(report.groups[0].nature, ChangeNature::Addition);
    assert_eq!(report.groups[1].nature, ChangeNature::Modification);
    assert_eq!(report.groups[1].actions, vec![4]);
}

#[test]
fn group_label_is_serialized() {
    let (grammar, src, dst, options) = fixture("field");
    let report = compute_diff(&src, &dst, &grammar, options).unwrap();

    let json = serde_json::to_value(&report.groups).unwrap();
    assert_eq!(json[0]["label"], "FieldDeclaration email");
    assert_eq!(json[1]["label"], "FieldDeclaration fullName");
    assert_eq!(json[1]["nature"], "modification");
}

fn read_pair(src: &str, dst: &str) -> (Grammar, SynTree, SynTree) {
    let mut grammar = Grammar::default();
    let src = parse_sexp(&mut grammar, src).unwrap();
    let dst = parse_sexp(&mut grammar, dst).unwrap();
    (grammar, src, dst)
}

/// Source and destination `Box` nodes share a `Pair` and differ by `extra`
/// leaves each, so their similarity is 6 / (6 + 2 * extra).
fn boxes(extra: usize) -> (Grammar, SynTree, SynTree) {
    let leaves = |kind: &str| {
        (0..extra)
            .map(|i| format!(" ({} \"{}\")", kind, i))
            .collect::<String>()
    };
    read_pair(
        &format!(
            r#"(Root (Box "old" (Pair (Leaf "a") (Leaf "b")){}))"#,
            leaves("Tag")
        ),
        &format!(
            r#"(Root (Box "new" (Pair (Leaf "a") (Leaf "b")){}))"#,
            leaves("Mark")
        ),
    )
}

fn boxes_matched(extra: usize, similarity_threshold: f64) -> bool {
    let (grammar, src, dst) = boxes(extra);
    let options = DiffOptions {
        similarity_threshold,
        ..DiffOptions::default()
    };
    let report = compute_diff(&src, &dst, &grammar, options).unwrap();
    assert!(apply_script(&src, &report.script).unwrap().same_as(&dst));
    report.mapping.contains(NodeId(1), NodeId(1))
}

#[test]
fn high_threshold_blocks_container_match() {
    // Similarity 0.6
    assert!(boxes_matched(2, 0.5));
    assert!(!boxes_matched(2, 0.7));
}

#[test]
fn similarity_equal_to_threshold_is_rejected() {
    // Similarity 0.5
    assert!(!boxes_matched(3, 0.5));
    assert!(boxes_matched(3, 0.4));
}

fn top_down(src: &SynTree, dst: &SynTree) -> Mapping {
    TopDownMatcher::default()
        .compute_mapping(src, dst, &Budget::unlimited())
        .unwrap()
}

#[test]
fn ambiguous_subtree_follows_matched_context() {
    let (_, src, dst) = read_pair(
        r#"(Root
             (Left (Sig (Id "u") (Id "v")) (Call (Arg "1") (Arg "2")) (Note "n")))"#,
        r#"(Root
             (Right (Call (Arg "1") (Arg "2")))
             (Left (Sig (Id "u") (Id "v")) (Call (Arg "1") (Arg "2"))))"#,
    );
    let mapping = top_down(&src, &dst);

    assert!(mapping.contains(NodeId(2), NodeId(6)));
    assert_eq!(mapping.dst_of(NodeId(5)), Some(NodeId(9)));
    assert!(!mapping.has_dst(NodeId(2)));
}

#[test]
fn ambiguous_subtree_prefers_equal_labels() {
    let (_, src, dst) = read_pair(
        r#"(Root (Call (Arg "3") (Arg "4")) (Note "n"))"#,
        r#"(Root (Call (Arg "1") (Arg "2")) (Call (Arg "3") (Arg "4")))"#,
    );
    let mapping = top_down(&src, &dst);

    assert_eq!(mapping.dst_of(NodeId(1)), Some(NodeId(4)));
    assert_eq!(mapping.dst_of(NodeId(2)), Some(NodeId(5)));
}

#[test]
fn ambiguous_subtree_falls_back_to_leftmost() {
    let (_, src, dst) = read_pair(
        r#"(Root (Call (Arg "1") (Arg "2")) (Note "n"))"#,
        r#"(Root (Call (Arg "1") (Arg "2")) (Call (Arg "1") (Arg "2")))"#,
    );
    let mapping = top_down(&src, &dst);

    assert_eq!(mapping.dst_of(NodeId(1)), Some(NodeId(1)));
    assert!(!mapping.has_dst(NodeId(4)));
}
