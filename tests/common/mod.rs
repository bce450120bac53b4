#![allow(dead_code)]

use proptest::prelude::*;
use syndelta::{
    parse_sexp, DiffOptions, Grammar, NodeId, NodeKind, SourceRange, SynTree, TreeBuilder,
};

pub fn read_tree(grammar: &mut Grammar, path: &str) -> SynTree {
    let text = std::fs::read_to_string(path).unwrap();
    parse_sexp(grammar, &text).unwrap()
}

pub fn read_options(path: &str) -> DiffOptions {
    DiffOptions::from_json(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// Source and destination of a fixture under `tests/trees`, with its options.
pub fn fixture(name: &str) -> (Grammar, SynTree, SynTree, DiffOptions) {
    let mut grammar = Grammar::default();
    let src = read_tree(&mut grammar, &format!("tests/trees/{}.src.tree", name));
    let dst = read_tree(&mut grammar, &format!("tests/trees/{}.dst.tree", name));
    let options = read_options(&format!("tests/trees/{}.json", name));
    (grammar, src, dst, options)
}

/// First node in pre-order with the given kind name and label.
pub fn find(tree: &SynTree, grammar: &Grammar, kind: &str, label: Option<&str>) -> NodeId {
    let kind = grammar.kind(kind).unwrap();
    tree.pre_order()
        .find(|&id| tree.kind(id) == kind && tree.label(id) == label)
        .unwrap()
}

pub const KIND_NAMES: [&str; 4] = ["K0", "K1", "K2", "K3"];

pub fn random_grammar() -> Grammar {
    Grammar::new(KIND_NAMES)
}

/// Options used with random trees: `K1` nodes delimit groups, `K2` name them.
pub fn random_options() -> DiffOptions {
    DiffOptions {
        boundary_kinds: vec!["K1".to_owned()],
        name_kinds: vec!["K2".to_owned()],
        ..DiffOptions::default()
    }
}

/// Owned tree description generated by proptest and turned into a
/// [`SynTree`] with [`Shape::build`].
#[derive(Clone, Debug)]
pub struct Shape {
    pub kind: u16,
    pub label: Option<u8>,
    pub children: Vec<Shape>,
}

impl Shape {
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Shape::size).sum::<usize>()
    }

    pub fn build(&self) -> SynTree {
        let mut builder = TreeBuilder::new(
            NodeKind(self.kind),
            self.label_text(),
            SourceRange::default(),
        );
        for child in &self.children {
            child.build_into(&mut builder);
        }
        builder.finish()
    }

    fn label_text(&self) -> Option<String> {
        self.label.map(|label| format!("l{}", label))
    }

    fn build_into(&self, builder: &mut TreeBuilder) {
        builder.open(
            NodeKind(self.kind),
            self.label_text(),
            SourceRange::default(),
        );
        for child in &self.children {
            child.build_into(builder);
        }
        builder.close();
    }

    /// Replace a strict subtree, picked by pre-order position, with `graft`.
    pub fn graft(&self, index: usize, graft: &Shape) -> Shape {
        let size = self.size();
        if size == 1 {
            let mut shape = self.clone();
            shape.children.push(graft.clone());
            return shape;
        }
        let mut target = index % (size - 1);
        let mut shape = self.clone();
        shape.replace_at(&mut target, graft);
        shape
    }

    fn replace_at(&mut self, target: &mut usize, graft: &Shape) -> bool {
        for child in &mut self.children {
            if *target == 0 {
                *child = graft.clone();
                return true;
            }
            *target -= 1;
            let descendants = child.size() - 1;
            if *target < descendants {
                return child.replace_at(target, graft);
            }
            *target -= descendants;
        }
        false
    }

    /// Drop the child at `index % len` of the node at the root level.
    pub fn without_child(&self, index: usize) -> Shape {
        let mut shape = self.clone();
        if !shape.children.is_empty() {
            let len = shape.children.len();
            shape.children.remove(index % len);
        }
        shape
    }
}

pub fn shape() -> impl Strategy<Value = Shape> {
    let leaf = (0..4u16, proptest::option::of(0..3u8)).prop_map(|(kind, label)| Shape {
        kind,
        label,
        children: Vec::new(),
    });
    leaf.prop_recursive(4, 48, 4, |inner| {
        (
            0..4u16,
            proptest::option::of(0..3u8),
            proptest::collection::vec(inner, 1..5),
        )
            .prop_map(|(kind, label, children)| Shape {
                kind,
                label,
                children,
            })
    })
}

/// Pairs of trees, either unrelated or sharing most of their structure.
pub fn tree_pair() -> impl Strategy<Value = (Shape, Shape)> {
    prop_oneof![
        (shape(), shape()),
        (shape(), shape(), any::<usize>())
            .prop_map(|(base, graft, index)| (base.clone(), base.graft(index, &graft))),
        (shape(), any::<usize>())
            .prop_map(|(base, index)| (base.clone(), base.without_child(index))),
    ]
}
