//! Key derivation and tree flattening.
//!
//! A flattened key is the file's namespace prefix (its path segments with the
//! final extension dropped) followed by the mapping keys from the document
//! root down to a leaf, all joined with [`KEY_DELIMITER`]. Path segments are
//! always joined verbatim, so `v1.2/en.json` yields the prefix `v1.2.en`.
//!
//! When [`FlattenOptions::collapse_stem_wrapper`] is set (the default), a
//! document whose only top-level key equals the file's own base name and
//! wraps a mapping has that wrapper level elided: `mock/valid.json` holding
//! `{"valid": {"test1": "test2"}}` yields `mock.valid.test1`.
//!
//! ## Delimiter policy
//!
//! Document keys may themselves contain the delimiter (`"a.b"`).
//! [`DelimiterPolicy`] decides what happens to them:
//!
//! - `Escape` (default): `\` becomes `\\` and `.` becomes `\.` inside each
//!   document key, so distinct leaf paths within a document produce distinct
//!   keys.
//! - `Preserve`: keys are joined verbatim. Two leaf paths may then map to the
//!   same key; within one document that is reported as a duplicate.
//! - `Reject`: a document key containing the delimiter is an error.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Component, Path};

use crate::config::FlatlocConfig;
use crate::diagnostics::DocumentError;
use crate::parsers::{child_path, display_path};
use crate::tree::DocumentTree;

/// Separator between key segments.
pub const KEY_DELIMITER: char = '.';

const ESCAPE_CHAR: char = '\\';

/// Flattened keys of one document, sorted by key.
pub type FlatMap = BTreeMap<String, String>;

/// How document keys containing [`KEY_DELIMITER`] are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelimiterPolicy {
    #[default]
    Escape,
    Preserve,
    Reject,
}

/// Options controlling how a single document is flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenOptions {
    pub delimiter_policy: DelimiterPolicy,
    /// Elide a top-level wrapper key equal to the file's base name.
    pub collapse_stem_wrapper: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            delimiter_policy: DelimiterPolicy::Escape,
            collapse_stem_wrapper: true,
        }
    }
}

impl From<&FlatlocConfig> for FlattenOptions {
    fn from(config: &FlatlocConfig) -> Self {
        Self {
            delimiter_policy: config.delimiter_policy,
            collapse_stem_wrapper: config.collapse_stem_wrapper,
        }
    }
}

/// Escape `\` and the delimiter inside a single document key.
pub fn escape_segment(segment: &str) -> Cow<'_, str> {
    if !segment.contains(|c: char| c == KEY_DELIMITER || c == ESCAPE_CHAR) {
        return Cow::Borrowed(segment);
    }

    let mut escaped = String::with_capacity(segment.len() + 4);
    for c in segment.chars() {
        if c == KEY_DELIMITER || c == ESCAPE_CHAR {
            escaped.push(ESCAPE_CHAR);
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}

/// Raw namespace segments of a file path.
///
/// Every normal component is kept, in order, with the final extension removed
/// from the last one. Current-dir, parent-dir, root and prefix components are
/// dropped, so `./mock/valid.json` and `mock/valid.json` share a namespace.
pub fn namespace_segments(path: &Path) -> Vec<String> {
    let mut segments: Vec<String> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(last) = segments.last_mut() {
        if let Some(stem) = Path::new(last.as_str()).file_stem() {
            *last = stem.to_string_lossy().into_owned();
        }
    }
    segments
}

/// Namespace prefix for a file path: its segments joined verbatim.
///
/// `mock/dir/sub/valid_json.json` yields `mock.dir.sub.valid_json`.
pub fn namespace_prefix(path: &Path) -> String {
    namespace_segments(path).join(&KEY_DELIMITER.to_string())
}

fn join_key(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        let mut key = String::with_capacity(prefix.len() + 1 + segment.len());
        key.push_str(prefix);
        key.push(KEY_DELIMITER);
        key.push_str(segment);
        key
    }
}

fn encode_document_key<'a>(
    key: &'a str,
    doc_path: &str,
    policy: DelimiterPolicy,
) -> Result<Cow<'a, str>, DocumentError> {
    if key.is_empty() {
        return Err(DocumentError::InvalidKey {
            key: display_path(doc_path),
            reason: "empty keys are not supported".to_string(),
        });
    }

    match policy {
        DelimiterPolicy::Escape => Ok(escape_segment(key)),
        DelimiterPolicy::Preserve => Ok(Cow::Borrowed(key)),
        DelimiterPolicy::Reject if key.contains(KEY_DELIMITER) => Err(DocumentError::InvalidKey {
            key: child_path(doc_path, key),
            reason: format!("key contains the delimiter '{}'", KEY_DELIMITER),
        }),
        DelimiterPolicy::Reject => Ok(Cow::Borrowed(key)),
    }
}

/// Flatten a tree under `prefix`, which is used verbatim.
///
/// Emits exactly one entry per leaf. Fails if two leaves produce the same key,
/// which can only happen under [`DelimiterPolicy::Preserve`].
pub fn flatten_tree(
    prefix: &str,
    tree: DocumentTree,
    policy: DelimiterPolicy,
) -> Result<FlatMap, DocumentError> {
    let mut entries = FlatMap::new();
    walk(prefix, "", tree, policy, &mut entries)?;
    Ok(entries)
}

fn walk(
    key: &str,
    doc_path: &str,
    tree: DocumentTree,
    policy: DelimiterPolicy,
    entries: &mut FlatMap,
) -> Result<(), DocumentError> {
    match tree {
        DocumentTree::Leaf(value) => {
            if entries.insert(key.to_string(), value).is_some() {
                return Err(DocumentError::DuplicateKey {
                    key: key.to_string(),
                });
            }
        }
        DocumentTree::Node(children) => {
            for (name, child) in children {
                let segment = encode_document_key(&name, doc_path, policy)?;
                let child_key = join_key(key, &segment);
                walk(&child_key, &child_path(doc_path, &name), child, policy, entries)?;
            }
        }
    }
    Ok(())
}

/// Drop a single top-level key named after the file when it wraps a mapping.
fn collapse_stem_wrapper(tree: DocumentTree, stem: Option<&str>) -> DocumentTree {
    let Some(stem) = stem else {
        return tree;
    };
    match tree {
        DocumentTree::Node(mut children)
            if children.len() == 1
                && children.get(stem).is_some_and(|inner| !inner.is_leaf()) =>
        {
            children.remove(stem).unwrap_or(DocumentTree::Node(BTreeMap::new()))
        }
        other => other,
    }
}

/// Flatten the document decoded from `path`.
pub fn flatten_document(
    path: &Path,
    tree: DocumentTree,
    options: &FlattenOptions,
) -> Result<FlatMap, DocumentError> {
    let segments = namespace_segments(path);
    let prefix = namespace_prefix(path);
    let tree = if options.collapse_stem_wrapper {
        collapse_stem_wrapper(tree, segments.last().map(String::as_str))
    } else {
        tree
    };
    flatten_tree(&prefix, tree, options.delimiter_policy)
}
