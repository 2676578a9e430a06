//! Format-independent document tree.
//!
//! Both decoders lower their native value types into [`DocumentTree`] so that
//! flattening never sees JSON or YAML specifics.

use std::collections::BTreeMap;

/// A decoded localization document: either a scalar leaf rendered as text, or
/// a mapping from string keys to subtrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentTree {
    Leaf(String),
    Node(BTreeMap<String, DocumentTree>),
}

impl DocumentTree {
    pub fn leaf(value: impl Into<String>) -> Self {
        DocumentTree::Leaf(value.into())
    }

    /// Build a node from `(key, subtree)` pairs. Later pairs replace earlier
    /// ones with the same key.
    pub fn node<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, DocumentTree)>,
    {
        DocumentTree::Node(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, DocumentTree::Leaf(_))
    }

    pub fn as_node(&self) -> Option<&BTreeMap<String, DocumentTree>> {
        match self {
            DocumentTree::Node(map) => Some(map),
            DocumentTree::Leaf(_) => None,
        }
    }

    /// Number of leaves reachable from this tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            DocumentTree::Leaf(_) => 1,
            DocumentTree::Node(map) => map.values().map(DocumentTree::leaf_count).sum(),
        }
    }
}
