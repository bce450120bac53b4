//! Aggregation of edit actions into logical changes.
//!
//! Each action is attached to the nearest enclosing "boundary" node (a field,
//! a method, ...) and actions sharing the same boundary node end up in one
//! [`ChangeGroup`]. A boundary node kept by the mapping counts as one node on
//! both sides. Actions outside any boundary are collected in the
//! uncategorized group.

use crate::error::Side;
use crate::matching::Mapping;
use crate::script::{Action, EditScript};
use crate::syn_tree::{Grammar, NodeId, NodeKind, SynTree};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, warn};

/// Which node kinds anchor groups and which ones name them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupingConfig {
    pub boundary_kinds: BTreeSet<NodeKind>,
    pub name_kinds: BTreeSet<NodeKind>,
    /// Subtrees never searched for a name, such as the declared type of a
    /// field.
    pub type_kinds: BTreeSet<NodeKind>,
}

impl GroupingConfig {
    pub fn new(
        boundary_kinds: impl IntoIterator<Item = NodeKind>,
        name_kinds: impl IntoIterator<Item = NodeKind>,
    ) -> Self {
        GroupingConfig {
            boundary_kinds: boundary_kinds.into_iter().collect(),
            name_kinds: name_kinds.into_iter().collect(),
            type_kinds: BTreeSet::new(),
        }
    }

    pub fn with_type_kinds(mut self, type_kinds: impl IntoIterator<Item = NodeKind>) -> Self {
        self.type_kinds = type_kinds.into_iter().collect();
        self
    }

    /// Resolve kind names against `grammar`. Names the grammar does not know
    /// cannot occur in its trees and are skipped.
    pub fn from_names<S: AsRef<str>>(
        grammar: &Grammar,
        boundary_kinds: &[S],
        name_kinds: &[S],
        type_kinds: &[S],
    ) -> Self {
        let resolve = |names: &[S]| -> BTreeSet<NodeKind> {
            names
                .iter()
                .filter_map(|name| {
                    let kind = grammar.kind(name.as_ref());
                    if kind.is_none() {
                        warn!(kind = name.as_ref(), "unknown node kind in grouping config");
                    }
                    kind
                })
                .collect()
        };
        GroupingConfig {
            boundary_kinds: resolve(boundary_kinds),
            name_kinds: resolve(name_kinds),
            type_kinds: resolve(type_kinds),
        }
    }

    pub fn is_boundary(&self, kind: NodeKind) -> bool {
        self.boundary_kinds.contains(&kind)
    }
}

/// Boundary node a group is attached to.
///
/// Anchors present in both trees are reported on the destination side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupAnchor {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub name: Option<String>,
    pub side: Side,
    pub node: NodeId,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeNature {
    /// The anchor itself is new.
    Addition,
    /// The anchor itself disappears.
    Removal,
    /// The anchor exists on both sides and its content changes.
    Modification,
}

impl fmt::Display for ChangeNature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChangeNature::Addition => write!(f, "addition"),
            ChangeNature::Removal => write!(f, "removal"),
            ChangeNature::Modification => write!(f, "modification"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChangeGroup {
    /// Human readable title such as `FieldDeclaration email`.
    pub label: String,
    /// `None` for the uncategorized group.
    pub anchor: Option<GroupAnchor>,
    pub nature: ChangeNature,
    /// Indices into the edit script, increasing.
    pub actions: Vec<usize>,
}

impl ChangeGroup {
    pub fn is_uncategorized(&self) -> bool {
        self.anchor.is_none()
    }
}

fn anchor_label(anchor: Option<&GroupAnchor>, grammar: &Grammar) -> String {
    match anchor {
        None => "uncategorized".to_owned(),
        Some(GroupAnchor {
            kind, name: None, ..
        }) => grammar.name(*kind).to_owned(),
        Some(GroupAnchor {
            kind,
            name: Some(name),
            ..
        }) => format!("{} {}", grammar.name(*kind), name),
    }
}

/// Label of the node naming `anchor`.
///
/// Children are searched first, then deeper levels breadth-first, never
/// entering type subtrees. Without configured name kinds, the first labeled
/// child is used instead.
fn qualifying_name(tree: &SynTree, anchor: NodeId, config: &GroupingConfig) -> Option<String> {
    if config.name_kinds.is_empty() {
        return tree
            .children(anchor)
            .iter()
            .find_map(|&child| tree.label(child))
            .map(str::to_owned);
    }
    let searched = |id: &NodeId| !config.type_kinds.contains(&tree.kind(*id));
    let mut level: Vec<NodeId> = tree.children(anchor).iter().copied().filter(searched).collect();
    while !level.is_empty() {
        for &id in &level {
            if config.name_kinds.contains(&tree.kind(id)) {
                if let Some(label) = tree.label(id) {
                    return Some(label.to_owned());
                }
            }
        }
        level = level
            .iter()
            .flat_map(|&id| tree.children(id).iter().copied())
            .filter(searched)
            .collect();
    }
    None
}

/// Nearest boundary node at or above `node`.
fn boundary_of(tree: &SynTree, node: NodeId, config: &GroupingConfig) -> Option<NodeId> {
    if !tree.contains(node) {
        return None;
    }
    std::iter::once(node)
        .chain(tree.ancestors(node))
        .find(|&id| config.is_boundary(tree.kind(id)))
}

/// Inputs shared by every action while grouping.
struct GroupingContext<'a> {
    src: &'a SynTree,
    dst: &'a SynTree,
    mapping: &'a Mapping,
    config: &'a GroupingConfig,
}

struct Located {
    anchor: GroupAnchor,
    // The action creates or removes the anchor node itself
    touches_anchor: bool,
}

impl<'a> GroupingContext<'a> {
    fn tree(&self, side: Side) -> &'a SynTree {
        match side {
            Side::Source => self.src,
            Side::Destination => self.dst,
        }
    }

    fn locate(&self, action: &Action) -> Option<Located> {
        let (side, node) = match action {
            Action::Insert { target, .. } | Action::Move { target, .. } => {
                (Side::Destination, *target)
            }
            Action::Delete { node } | Action::Update { node, .. } => (Side::Source, *node),
        };
        let anchor = boundary_of(self.tree(side), node, self.config)?;
        let touches_anchor =
            anchor == node && matches!(action, Action::Insert { .. } | Action::Delete { .. });

        // A source anchor kept in the destination is the same logical unit
        let (side, anchor) = match side {
            Side::Source => match self.mapping.dst_of(anchor) {
                Some(partner)
                    if self.dst.contains(partner)
                        && self.dst.kind(partner) == self.src.kind(anchor) =>
                {
                    (Side::Destination, partner)
                }
                _ => (Side::Source, anchor),
            },
            Side::Destination => (Side::Destination, anchor),
        };
        let tree = self.tree(side);
        Some(Located {
            anchor: GroupAnchor {
                kind: tree.kind(anchor),
                name: qualifying_name(tree, anchor, self.config),
                side,
                node: anchor,
            },
            touches_anchor,
        })
    }
}

#[derive(Default)]
struct GroupBuilder {
    anchor: Option<GroupAnchor>,
    inserted: bool,
    deleted: bool,
    actions: Vec<usize>,
}

impl GroupBuilder {
    fn finish(self, grammar: &Grammar) -> ChangeGroup {
        let nature = match (self.inserted, self.deleted) {
            (true, false) => ChangeNature::Addition,
            (false, true) => ChangeNature::Removal,
            _ => ChangeNature::Modification,
        };
        ChangeGroup {
            label: anchor_label(self.anchor.as_ref(), grammar),
            anchor: self.anchor,
            nature,
            actions: self.actions,
        }
    }
}

/// Partition the actions of `script` into logical change groups.
///
/// Actions are grouped by the identity of their anchor node, so two members
/// with the same kind and name stay apart. Groups come in the order their
/// first action appears in the script and every action belongs to exactly
/// one group.
pub fn group_actions(
    script: &EditScript,
    src: &SynTree,
    dst: &SynTree,
    mapping: &Mapping,
    grammar: &Grammar,
    config: &GroupingConfig,
) -> Vec<ChangeGroup> {
    let context = GroupingContext {
        src,
        dst,
        mapping,
        config,
    };
    let mut groups: Vec<GroupBuilder> = Vec::new();
    let mut by_anchor: HashMap<Option<(Side, NodeId)>, usize> = HashMap::new();

    for (index, action) in script.iter().enumerate() {
        let located = context.locate(action);
        let key = located
            .as_ref()
            .map(|loc| (loc.anchor.side, loc.anchor.node));
        let group_index = *by_anchor.entry(key).or_insert_with(|| {
            groups.push(GroupBuilder::default());
            groups.len() - 1
        });
        let group = &mut groups[group_index];
        if let Some(located) = located {
            if located.touches_anchor {
                match action {
                    Action::Insert { .. } => group.inserted = true,
                    Action::Delete { .. } => group.deleted = true,
                    _ => (),
                }
            }
            group.anchor.get_or_insert(located.anchor);
        }
        group.actions.push(index);
    }

    debug!(
        groups = groups.len(),
        actions = script.len(),
        "actions grouped"
    );
    groups
        .into_iter()
        .map(|group| group.finish(grammar))
        .collect()
}
