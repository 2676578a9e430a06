//! JSON decoder for localization documents
//!
//! Decoding is handled by serde_json, which rejects malformed input with a
//! positioned error instead of panicking and bounds nesting depth. Objects are
//! read through a visitor that keeps every member, so a key repeated within
//! one object is reported instead of silently keeping the last value.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};

use super::{child_path, display_path};
use crate::diagnostics::DocumentError;
use crate::tree::DocumentTree;

/// Decoded JSON value with object members kept in source order, duplicates
/// included.
#[derive(Debug)]
enum RawJson {
    Null,
    Bool(bool),
    Number(String),
    String(String),
    Array,
    Object(Vec<(String, RawJson)>),
}

impl RawJson {
    fn kind_name(&self) -> &'static str {
        match self {
            RawJson::Null => "null",
            RawJson::Bool(_) => "boolean",
            RawJson::Number(_) => "number",
            RawJson::String(_) => "string",
            RawJson::Array => "sequence",
            RawJson::Object(_) => "mapping",
        }
    }
}

impl<'de> Deserialize<'de> for RawJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawJsonVisitor)
    }
}

struct RawJsonVisitor;

impl<'de> Visitor<'de> for RawJsonVisitor {
    type Value = RawJson;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<RawJson, E> {
        Ok(RawJson::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawJson, E> {
        Ok(RawJson::Number(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawJson, E> {
        Ok(RawJson::Number(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<RawJson, E> {
        // Same rendering as serde_json::Number
        let text = serde_json::Number::from_f64(v)
            .map(|n| n.to_string())
            .unwrap_or_else(|| v.to_string());
        Ok(RawJson::Number(text))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RawJson, E> {
        Ok(RawJson::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<RawJson, E> {
        Ok(RawJson::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawJson, E> {
        Ok(RawJson::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<RawJson, E> {
        Ok(RawJson::Null)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawJson, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(RawJson::Array)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawJson, A::Error> {
        let mut members = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, RawJson>()? {
            members.push((key, value));
        }
        Ok(RawJson::Object(members))
    }
}

/// Decode a JSON document whose top level must be an object.
pub fn parse_json_document(content: &str) -> Result<DocumentTree, DocumentError> {
    match serde_json::from_str(content)? {
        RawJson::Object(members) => object_to_tree(members, ""),
        other => Err(DocumentError::NotAMapping {
            found: other.kind_name(),
        }),
    }
}

fn object_to_tree(
    members: Vec<(String, RawJson)>,
    path: &str,
) -> Result<DocumentTree, DocumentError> {
    let mut children = BTreeMap::new();
    for (key, value) in members {
        let child = child_path(path, &key);
        match children.entry(key) {
            Entry::Occupied(_) => return Err(DocumentError::DuplicateKey { key: child }),
            Entry::Vacant(slot) => {
                slot.insert(value_to_tree(value, &child)?);
            }
        }
    }
    Ok(DocumentTree::Node(children))
}

fn value_to_tree(value: RawJson, path: &str) -> Result<DocumentTree, DocumentError> {
    match value {
        RawJson::String(s) | RawJson::Number(s) => Ok(DocumentTree::Leaf(s)),
        RawJson::Bool(b) => Ok(DocumentTree::Leaf(b.to_string())),
        RawJson::Object(members) => object_to_tree(members, path),
        other @ (RawJson::Null | RawJson::Array) => Err(DocumentError::UnsupportedValue {
            key: display_path(path),
            kind: other.kind_name(),
        }),
    }
}
