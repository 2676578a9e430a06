//! Decoders from raw file content to [`DocumentTree`].
//!
//! Each format module lowers its native value type into the shared tree and
//! rejects shapes the flattener cannot represent (sequences, nulls, composite
//! keys) as well as keys repeated within one mapping. Error key paths are the
//! raw document keys joined with `.`.

pub mod json;
pub mod yaml;

use crate::diagnostics::DocumentError;
use crate::formats::SourceFormat;
use crate::tree::DocumentTree;

pub use json::parse_json_document;
pub use yaml::parse_yaml_document;

const UTF8_BOM: char = '\u{feff}';

/// Decode raw bytes in the given format.
///
/// Empty and whitespace-only content is rejected before reaching the decoder,
/// as is content whose top level is anything other than a mapping.
pub fn parse_document(bytes: &[u8], format: SourceFormat) -> Result<DocumentTree, DocumentError> {
    let content = std::str::from_utf8(bytes)?;
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    if content.trim().is_empty() {
        return Err(DocumentError::Empty);
    }

    match format {
        SourceFormat::Json => parse_json_document(content),
        SourceFormat::Yaml => parse_yaml_document(content),
    }
}

/// Location of a child key, used only for error messages.
pub(crate) fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Location shown for errors raised at the document root.
pub(crate) fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_rejected_for_both_formats() {
        for format in [SourceFormat::Json, SourceFormat::Yaml] {
            assert!(matches!(
                parse_document(b"", format),
                Err(DocumentError::Empty)
            ));
            assert!(matches!(
                parse_document(b"  \n\t\r\n", format),
                Err(DocumentError::Empty)
            ));
        }
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let result = parse_document(&[b'{', 0xff, 0xfe, b'}'], SourceFormat::Json);
        assert!(matches!(result, Err(DocumentError::Utf8(_))));
    }

    #[test]
    fn test_bom_is_skipped() {
        let content = "\u{feff}{\"greeting\": \"hello\"}";
        let tree = parse_document(content.as_bytes(), SourceFormat::Json).unwrap();
        assert_eq!(
            tree,
            DocumentTree::node([("greeting", DocumentTree::leaf("hello"))])
        );
    }

    #[test]
    fn test_equivalent_documents_decode_identically() {
        let json = br#"{"menu": {"open": "Open", "count": 3, "beta": true}}"#;
        let yaml = b"menu:\n  open: Open\n  count: 3\n  beta: true\n";

        let from_json = parse_document(json, SourceFormat::Json).unwrap();
        let from_yaml = parse_document(yaml, SourceFormat::Yaml).unwrap();
        assert_eq!(from_json, from_yaml);
    }

    #[test]
    fn test_duplicate_keys_rejected_by_both_formats() {
        let json = br#"{"a": "1", "a": "2"}"#;
        let yaml = b"a: '1'\na: '2'\n";

        match parse_document(json, SourceFormat::Json) {
            Err(DocumentError::DuplicateKey { key }) => assert_eq!(key, "a"),
            other => panic!("expected DuplicateKey for JSON, got {other:?}"),
        }
        match parse_document(yaml, SourceFormat::Yaml) {
            Err(DocumentError::Yaml(err)) => assert!(err.to_string().contains("duplicate")),
            other => panic!("expected a YAML duplicate error, got {other:?}"),
        }
    }

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("", "a"), "a");
        assert_eq!(child_path("a", "b"), "a.b");
        assert_eq!(display_path(""), "<root>");
        assert_eq!(display_path("a.b"), "a.b");
    }
}
