use serde::Serialize;
use std::collections::HashMap;

/// Type tag of a syntax node.
///
/// The set of kinds is closed for a given [`Grammar`]: kinds are only ever
/// created by interning a name into it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct NodeKind(pub u16);

/// Interning table from kind names to [`NodeKind`].
///
/// Both trees of a comparison must be built against the same grammar for
/// their kinds to be comparable.
#[derive(Clone, Debug, Default)]
pub struct Grammar {
    names: Vec<String>,
    kinds: HashMap<String, NodeKind>,
}

impl Grammar {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut grammar = Grammar::default();
        for name in names {
            grammar.intern(name.as_ref());
        }
        grammar
    }

    pub fn intern(&mut self, name: &str) -> NodeKind {
        if let Some(&kind) = self.kinds.get(name) {
            return kind;
        }
        let kind = NodeKind(
            self.names
                .len()
                .try_into()
                .expect("grammar holds more than u16::MAX kinds"),
        );
        self.names.push(name.to_owned());
        self.kinds.insert(name.to_owned(), kind);
        kind
    }

    pub fn kind(&self, name: &str) -> Option<NodeKind> {
        self.kinds.get(name).copied()
    }

    pub fn name(&self, kind: NodeKind) -> &str {
        self.names
            .get(usize::from(kind.0))
            .map(String::as_str)
            .unwrap_or("?")
    }

    /// Kind names, indexed by kind value.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
