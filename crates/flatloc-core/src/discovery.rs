//! Source file discovery.
//!
//! Walks an input root and collects every regular file with a supported
//! extension, sorted by path so the merge order never depends on the order
//! the filesystem yields entries in.

use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::FlatlocConfig;
use crate::diagnostics::{CoreError, CoreResult};
use crate::formats::{SourceFormat, detect_format};

/// A discovered localization source.
///
/// `path` is the input root as given joined with the file's root-relative
/// path, so `mock/dir` yields `mock/dir/sub/valid_json.json`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceFile {
    pub path: PathBuf,
    pub format: SourceFormat,
}

impl SourceFile {
    /// Build a source from a path with a supported extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let format = detect_format(&path)?;
        Some(Self { path, format })
    }
}

struct ExcludePattern {
    pattern: glob::Pattern,
    dir_only_prefix: Option<String>,
    allow_probe: bool,
}

fn normalize_rel_path(entry_path: &Path, root: &Path) -> String {
    let rel_path = entry_path.strip_prefix(root).unwrap_or(entry_path);
    let path_str = rel_path.to_string_lossy().replace('\\', "/");
    match path_str.strip_prefix("./") {
        Some(stripped) => stripped.to_string(),
        None => path_str,
    }
}

fn compile_exclude_patterns(excludes: &[String]) -> CoreResult<Vec<ExcludePattern>> {
    excludes
        .iter()
        .map(|pattern| {
            let normalized = pattern.replace('\\', "/");
            let (glob_str, dir_only_prefix) = match normalized.strip_suffix('/') {
                Some(prefix) => (format!("{}/**", prefix), Some(prefix.to_string())),
                None => (normalized.clone(), None),
            };
            let allow_probe = dir_only_prefix.is_some() || glob_str.contains("**");
            let compiled = glob::Pattern::new(&glob_str).map_err(|e| {
                CoreError::InvalidExcludePattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                }
            })?;
            Ok(ExcludePattern {
                pattern: compiled,
                dir_only_prefix,
                allow_probe,
            })
        })
        .collect()
}

fn should_prune_dir(rel_dir: &str, exclude_patterns: &[ExcludePattern]) -> bool {
    if rel_dir.is_empty() {
        return false;
    }
    // Probe path detects recursive patterns that would match every file inside
    let probe = format!("{}/__flatloc_probe__", rel_dir.trim_end_matches('/'));
    exclude_patterns
        .iter()
        .any(|p| p.pattern.matches(rel_dir) || (p.allow_probe && p.pattern.matches(&probe)))
}

fn is_excluded_file(path_str: &str, exclude_patterns: &[ExcludePattern]) -> bool {
    exclude_patterns
        .iter()
        .any(|p| p.pattern.matches(path_str) && p.dir_only_prefix.as_deref() != Some(path_str))
}

/// List every supported source file under `root`.
pub fn enumerate(root: &Path) -> CoreResult<Vec<SourceFile>> {
    enumerate_with_config(root, &FlatlocConfig::default())
}

/// List supported source files under `root`, applying the config's exclude
/// patterns and file-count limit.
///
/// Fails with [`CoreError::NotFound`] when `root` is missing or not a
/// directory. Symbolic links are not followed and are never collected.
pub fn enumerate_with_config(root: &Path, config: &FlatlocConfig) -> CoreResult<Vec<SourceFile>> {
    if !root.is_dir() {
        return Err(CoreError::NotFound {
            path: root.to_path_buf(),
        });
    }

    let exclude_patterns = compile_exclude_patterns(&config.exclude)?;
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let rel_dir = normalize_rel_path(entry.path(), root);
            !should_prune_dir(&rel_dir, &exclude_patterns)
        });

    for entry in walker {
        let entry = entry.map_err(|source| CoreError::Walk {
            path: source
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            source,
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        let Some(format) = detect_format(entry.path()) else {
            continue;
        };

        let rel_path = normalize_rel_path(entry.path(), root);
        if is_excluded_file(&rel_path, &exclude_patterns) {
            debug!(path = %rel_path, "excluded by pattern");
            continue;
        }

        if let Some(limit) = config.max_files
            && files.len() >= limit
        {
            return Err(CoreError::TooManyFiles {
                count: files.len() + 1,
                limit,
            });
        }

        debug!(path = %entry.path().display(), %format, "discovered source file");
        files.push(SourceFile {
            path: entry.into_path(),
            format,
        });
    }

    files.sort();
    Ok(files)
}
