//! YAML decoder for localization documents
//!
//! YAML allows non-string scalar keys (`1:`, `true:`); these are rendered as
//! text. Tags are ignored and the tagged value is used as-is.

use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

use super::{child_path, display_path};
use crate::diagnostics::DocumentError;
use crate::tree::DocumentTree;

/// Decode a YAML document whose top level must be a mapping.
///
/// Multi-document streams are rejected by the decoder.
pub fn parse_yaml_document(content: &str) -> Result<DocumentTree, DocumentError> {
    match untag(serde_yaml::from_str(content)?) {
        Value::Mapping(map) => mapping_to_tree(map, ""),
        other => Err(DocumentError::NotAMapping {
            found: kind_name(&other),
        }),
    }
}

fn untag(value: Value) -> Value {
    match value {
        Value::Tagged(tagged) => untag(tagged.value),
        other => other,
    }
}

fn mapping_to_tree(map: Mapping, path: &str) -> Result<DocumentTree, DocumentError> {
    let mut children = BTreeMap::new();
    for (key, value) in map {
        let key = key_to_string(key, path)?;
        let child = child_path(path, &key);
        let subtree = value_to_tree(value, &child)?;
        if children.insert(key, subtree).is_some() {
            return Err(DocumentError::DuplicateKey { key: child });
        }
    }
    Ok(DocumentTree::Node(children))
}

fn value_to_tree(value: Value, path: &str) -> Result<DocumentTree, DocumentError> {
    match untag(value) {
        Value::String(s) => Ok(DocumentTree::Leaf(s)),
        Value::Number(n) => Ok(DocumentTree::Leaf(n.to_string())),
        Value::Bool(b) => Ok(DocumentTree::Leaf(b.to_string())),
        Value::Mapping(map) => mapping_to_tree(map, path),
        other => Err(DocumentError::UnsupportedValue {
            key: display_path(path),
            kind: kind_name(&other),
        }),
    }
}

fn key_to_string(key: Value, parent: &str) -> Result<String, DocumentError> {
    match untag(key) {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(DocumentError::InvalidKey {
            key: display_path(parent),
            reason: format!("{} keys are not supported", kind_name(&other)),
        }),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}
