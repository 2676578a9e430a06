//! Source format detection based on file extensions.
//!
//! Detection is path-based only (no I/O) and is used both by discovery to
//! decide which files to collect and by the engine to pick a decoder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Structured-data formats accepted as localization sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// `.json`
    Json,
    /// `.yaml` and `.yml`
    Yaml,
}

/// Extensions (lowercase, without the dot) mapped to their format.
pub const SUPPORTED_EXTENSIONS: &[(&str, SourceFormat)] = &[
    ("json", SourceFormat::Json),
    ("yaml", SourceFormat::Yaml),
    ("yml", SourceFormat::Yaml),
];

impl SourceFormat {
    /// Format for a file extension, compared case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        SUPPORTED_EXTENSIONS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(ext))
            .map(|(_, format)| *format)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceFormat::Json => "json",
            SourceFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the source format of a path from its final extension.
///
/// Returns `None` for unsupported extensions and for names without an
/// extension. A bare dotfile such as `.json` has no extension and is not a
/// source file.
pub fn detect_format(path: &Path) -> Option<SourceFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(SourceFormat::from_extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_json() {
        assert_eq!(
            detect_format(Path::new("locales/en.json")),
            Some(SourceFormat::Json)
        );
    }

    #[test]
    fn test_detect_yaml_both_extensions() {
        assert_eq!(
            detect_format(Path::new("en.yaml")),
            Some(SourceFormat::Yaml)
        );
        assert_eq!(detect_format(Path::new("en.yml")), Some(SourceFormat::Yaml));
    }

    #[test]
    fn test_detect_is_case_insensitive() {
        assert_eq!(detect_format(Path::new("EN.JSON")), Some(SourceFormat::Json));
        assert_eq!(detect_format(Path::new("en.Yml")), Some(SourceFormat::Yaml));
        assert_eq!(detect_format(Path::new("en.YAML")), Some(SourceFormat::Yaml));
    }

    #[test]
    fn test_detect_unsupported() {
        assert_eq!(detect_format(Path::new("README.md")), None);
        assert_eq!(detect_format(Path::new("config.toml")), None);
        assert_eq!(detect_format(Path::new("Makefile")), None);
        assert_eq!(detect_format(Path::new(".json")), None);
    }

    #[test]
    fn test_only_final_extension_counts() {
        assert_eq!(
            detect_format(Path::new("messages.json.bak")),
            None
        );
        assert_eq!(
            detect_format(Path::new("messages.bak.json")),
            Some(SourceFormat::Json)
        );
    }

    #[test]
    fn test_format_display() {
        assert_eq!(SourceFormat::Json.to_string(), "json");
        assert_eq!(SourceFormat::Yaml.to_string(), "yaml");
    }
}
