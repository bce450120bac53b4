use super::{Grammar, SourceRange, SynTree, TreeBuilder};
use tree_sitter::{Parser, TreeCursor};

/// Whether a named node has no named child, in which case its text becomes
/// its label.
fn is_named_leaf(node: &tree_sitter::Node) -> bool {
    node.named_child_count() == 0
}

fn node_label(node: &tree_sitter::Node, source: &[u8]) -> Option<String> {
    if !is_named_leaf(node) {
        return None;
    }
    let text = String::from_utf8_lossy(&source[node.byte_range()]);
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}

/// Copy the named descendants of the cursor's node into `builder`, without
/// recursion.
fn build_children(
    cursor: &mut TreeCursor,
    source: &[u8],
    grammar: &mut Grammar,
    builder: &mut TreeBuilder,
) {
    if !cursor.goto_first_child() {
        return;
    }
    // Levels entered below the first children
    let mut depth = 0usize;
    loop {
        let node = cursor.node();
        // Anonymous tokens (punctuation, keywords) carry no structure
        if node.is_named() {
            let kind = grammar.intern(node.kind());
            builder.open(
                kind,
                node_label(&node, source),
                SourceRange::from(node.byte_range()),
            );
            if cursor.goto_first_child() {
                depth += 1;
                continue;
            }
            builder.close();
        }
        while !cursor.goto_next_sibling() {
            cursor.goto_parent();
            if depth == 0 {
                return;
            }
            depth -= 1;
            // Only named nodes are entered, so the parent was opened
            builder.close();
        }
    }
}

/// Convert the tree-sitter parse of `source` into a [`SynTree`].
///
/// Only named nodes are kept. Kind names are interned into `grammar`, so both
/// versions of a file must be converted with the same grammar.
pub fn parse_source(source: &[u8], parser: &mut Parser, grammar: &mut Grammar) -> Option<SynTree> {
    parser.reset();
    let tree = parser.parse(source, None)?;
    let root = tree.root_node();
    let mut builder = TreeBuilder::new(
        grammar.intern(root.kind()),
        node_label(&root, source),
        SourceRange::from(root.byte_range()),
    );
    build_children(&mut tree.walk(), source, grammar, &mut builder);
    Some(builder.finish())
}
