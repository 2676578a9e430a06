//! Flatten-and-merge pipeline: per-file decoding and the global table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{CollisionPolicy, FlatlocConfig};
use crate::diagnostics::{Collision, CoreError, CoreResult, DocumentError};
use crate::discovery::SourceFile;
use crate::flatten::{FlatMap, FlattenOptions, flatten_document};
use crate::fs::{FileSystem, RealFileSystem};
use crate::parsers::parse_document;

/// Flattened entries of a single source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedFile {
    pub path: PathBuf,
    pub entries: FlatMap,
}

impl FlattenedFile {
    pub fn new(path: impl Into<PathBuf>, entries: FlatMap) -> Self {
        Self {
            path: path.into(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The merged key/value table of every source file.
///
/// Entries are kept sorted by key. The table also remembers which file each
/// key came from, the order files were merged in, and every overwrite that
/// happened along the way.
#[derive(Debug, Clone, Default)]
pub struct LocalizationTable {
    entries: BTreeMap<String, String>,
    /// Key -> index into `sources` of the file that supplied the current value
    origins: BTreeMap<String, usize>,
    sources: Vec<PathBuf>,
    collisions: Vec<Collision>,
}

impl LocalizationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Files merged into the table, in merge order.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    /// File that supplied the current value of `key`.
    pub fn origin(&self, key: &str) -> Option<&Path> {
        let index = *self.origins.get(key)?;
        self.sources.get(index).map(PathBuf::as_path)
    }

    pub fn into_entries(self) -> BTreeMap<String, String> {
        self.entries
    }

    /// Fold one file's entries into the table.
    ///
    /// A key already supplied by an earlier file is overwritten and the
    /// overwrite is recorded, unless `policy` is [`CollisionPolicy::Error`],
    /// in which case the first such key fails the merge.
    pub fn merge(mut self, file: FlattenedFile, policy: CollisionPolicy) -> CoreResult<Self> {
        let index = self.sources.len();
        self.sources.push(file.path.clone());

        for (key, value) in file.entries {
            if let Some(previous_value) = self.entries.get(&key) {
                let previous_file = self
                    .origins
                    .get(&key)
                    .and_then(|i| self.sources.get(*i))
                    .cloned()
                    .unwrap_or_default();
                let collision = Collision {
                    key: key.clone(),
                    previous_file,
                    previous_value: previous_value.clone(),
                    file: file.path.clone(),
                    value: value.clone(),
                };

                if policy == CollisionPolicy::Error {
                    return Err(CoreError::KeyCollision(Box::new(collision)));
                }
                if collision.is_same_value() {
                    debug!(%collision, "duplicate key with identical value");
                } else {
                    warn!(%collision, "key overwritten");
                }
                self.collisions.push(collision);
            }

            self.origins.insert(key.clone(), index);
            self.entries.insert(key, value);
        }

        Ok(self)
    }
}

/// Merge `file` into `acc`. See [`LocalizationTable::merge`].
pub fn merge(
    acc: LocalizationTable,
    file: FlattenedFile,
    policy: CollisionPolicy,
) -> CoreResult<LocalizationTable> {
    acc.merge(file, policy)
}

/// Read, decode and flatten one source file from disk.
pub fn parse_and_flatten_one(
    source: &SourceFile,
    options: &FlattenOptions,
) -> CoreResult<FlattenedFile> {
    parse_and_flatten_one_with_fs(source, options, &RealFileSystem::default())
}

/// Read, decode and flatten one source file through `fs`.
pub fn parse_and_flatten_one_with_fs(
    source: &SourceFile,
    options: &FlattenOptions,
    fs: &dyn FileSystem,
) -> CoreResult<FlattenedFile> {
    let bytes = fs.read_file(&source.path)?;

    let parse_error = |err: DocumentError| CoreError::Parse {
        path: source.path.clone(),
        format: source.format,
        source: err,
    };
    let tree = parse_document(&bytes, source.format).map_err(parse_error)?;
    let entries = flatten_document(&source.path, tree, options).map_err(parse_error)?;

    debug!(
        path = %source.path.display(),
        format = %source.format,
        keys = entries.len(),
        "flattened source file"
    );
    Ok(FlattenedFile::new(source.path.clone(), entries))
}

/// Flatten every file and merge the results in the order given.
///
/// The first file that fails (in that order) aborts the build.
pub fn build(files: &[SourceFile], config: &FlatlocConfig) -> CoreResult<LocalizationTable> {
    let fs = RealFileSystem::with_max_file_size(config.max_file_size);
    build_with_fs(files, config, &fs)
}

/// [`build`] reading sources through a custom [`FileSystem`].
pub fn build_with_fs(
    files: &[SourceFile],
    config: &FlatlocConfig,
    fs: &dyn FileSystem,
) -> CoreResult<LocalizationTable> {
    let options = FlattenOptions::from(config);
    let mut table = LocalizationTable::new();

    for flattened in flatten_all(files, &options, fs) {
        table = table.merge(flattened?, config.on_collision)?;
    }

    info!(
        files = table.sources().len(),
        keys = table.len(),
        collisions = table.collisions().len(),
        "built localization table"
    );
    Ok(table)
}

// Results stay in input order so merging is identical to the sequential path.
#[cfg(feature = "parallel")]
fn flatten_all<'a>(
    files: &'a [SourceFile],
    options: &'a FlattenOptions,
    fs: &'a dyn FileSystem,
) -> impl Iterator<Item = CoreResult<FlattenedFile>> + 'a {
    let results: Vec<_> = files
        .par_iter()
        .map(|source| parse_and_flatten_one_with_fs(source, options, fs))
        .collect();
    results.into_iter()
}

#[cfg(not(feature = "parallel"))]
fn flatten_all<'a>(
    files: &'a [SourceFile],
    options: &'a FlattenOptions,
    fs: &'a dyn FileSystem,
) -> impl Iterator<Item = CoreResult<FlattenedFile>> + 'a {
    files
        .iter()
        .map(move |source| parse_and_flatten_one_with_fs(source, options, fs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorKind;
    use crate::flatten::DelimiterPolicy;
    use crate::fs::MockFileSystem;

    fn source(path: &str) -> SourceFile {
        SourceFile::from_path(path).unwrap()
    }

    fn flat(path: &str, pairs: &[(&str, &str)]) -> FlattenedFile {
        FlattenedFile::new(
            path,
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn mock_dir() -> MockFileSystem {
        let mut fs = MockFileSystem::new();
        fs.add_file("mock/dir/sub/valid_json.json", r#"{"test": "test"}"#);
        fs.add_file("mock/dir/valid_json.json", r#"{"test": "test"}"#);
        fs.add_file("mock/dir/valid_yaml.yaml", "test: test\n");
        fs
    }

    #[test]
    fn test_build_mock_dir() {
        let fs = mock_dir();
        let files = vec![
            source("mock/dir/sub/valid_json.json"),
            source("mock/dir/valid_json.json"),
            source("mock/dir/valid_yaml.yaml"),
        ];

        let table = build_with_fs(&files, &FlatlocConfig::default(), &fs).unwrap();
        let expected: BTreeMap<String, String> = [
            ("mock.dir.sub.valid_json.test", "test"),
            ("mock.dir.valid_json.test", "test"),
            ("mock.dir.valid_yaml.test", "test"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(table.entries(), &expected);
        assert_eq!(table.sources().len(), 3);
        assert!(table.collisions().is_empty());
    }

    #[test]
    fn test_parse_and_flatten_stem_wrapper() {
        let mut fs = MockFileSystem::new();
        fs.add_file("mock/valid.json", r#"{"valid": {"test1": "test2"}}"#);

        let file =
            parse_and_flatten_one_with_fs(&source("mock/valid.json"), &FlattenOptions::default(), &fs)
                .unwrap();
        assert_eq!(file.path, PathBuf::from("mock/valid.json"));
        assert_eq!(file.len(), 1);
        assert_eq!(file.entries["mock.valid.test1"], "test2");
    }

    #[test]
    fn test_parse_and_flatten_without_collapse() {
        let mut fs = MockFileSystem::new();
        fs.add_file("mock/valid.json", r#"{"valid": {"test1": "test2"}}"#);
        let options = FlattenOptions {
            delimiter_policy: DelimiterPolicy::Escape,
            collapse_stem_wrapper: false,
        };

        let file = parse_and_flatten_one_with_fs(&source("mock/valid.json"), &options, &fs).unwrap();
        assert_eq!(file.entries["mock.valid.valid.test1"], "test2");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let fs = MockFileSystem::new();
        let err = parse_and_flatten_one_with_fs(
            &source("mock/non_exist.json"),
            &FlattenOptions::default(),
            &fs,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.path(), Some(Path::new("mock/non_exist.json")));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let mut fs = MockFileSystem::new();
        fs.add_file("mock/invalid.json", r#"{"test": "#);

        let err = parse_and_flatten_one_with_fs(
            &source("mock/invalid.json"),
            &FlattenOptions::default(),
            &fs,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        match err {
            CoreError::Parse { path, source, .. } => {
                assert_eq!(path, PathBuf::from("mock/invalid.json"));
                assert!(matches!(source, DocumentError::Json(_)));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_sequence_is_parse_error() {
        let mut fs = MockFileSystem::new();
        fs.add_file("mock/list.yaml", "items:\n  - a\n  - b\n");

        let err =
            parse_and_flatten_one_with_fs(&source("mock/list.yaml"), &FlattenOptions::default(), &fs)
                .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Parse {
                source: DocumentError::UnsupportedValue { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_build_fails_on_first_bad_file() {
        let mut fs = mock_dir();
        fs.add_file("mock/dir/a_broken.json", "[");
        fs.add_file("mock/dir/z_broken.yaml", "a: [");
        let files = vec![
            source("mock/dir/a_broken.json"),
            source("mock/dir/valid_json.json"),
            source("mock/dir/z_broken.yaml"),
        ];

        let err = build_with_fs(&files, &FlatlocConfig::default(), &fs).unwrap_err();
        assert_eq!(err.path(), Some(Path::new("mock/dir/a_broken.json")));
    }

    #[test]
    fn test_build_empty_file_list() {
        let fs = MockFileSystem::new();
        let table = build_with_fs(&[], &FlatlocConfig::default(), &fs).unwrap();
        assert!(table.is_empty());
        assert!(table.sources().is_empty());
    }

    #[test]
    fn test_merge_last_writer_wins() {
        let table = LocalizationTable::new()
            .merge(flat("a.json", &[("k", "first"), ("only_a", "x")]), CollisionPolicy::Overwrite)
            .unwrap()
            .merge(flat("b.yaml", &[("k", "second")]), CollisionPolicy::Overwrite)
            .unwrap();

        assert_eq!(table.get("k"), Some("second"));
        assert_eq!(table.get("only_a"), Some("x"));
        assert_eq!(table.origin("k"), Some(Path::new("b.yaml")));
        assert_eq!(table.origin("only_a"), Some(Path::new("a.json")));

        let collisions = table.collisions();
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].key, "k");
        assert_eq!(collisions[0].previous_file, PathBuf::from("a.json"));
        assert_eq!(collisions[0].previous_value, "first");
        assert_eq!(collisions[0].file, PathBuf::from("b.yaml"));
        assert_eq!(collisions[0].value, "second");
    }

    #[test]
    fn test_merge_order_decides_winner() {
        let a = flat("a.json", &[("k", "A")]);
        let b = flat("b.json", &[("k", "B")]);

        let ab = merge(
            merge(LocalizationTable::new(), a.clone(), CollisionPolicy::Overwrite).unwrap(),
            b.clone(),
            CollisionPolicy::Overwrite,
        )
        .unwrap();
        let ba = merge(
            merge(LocalizationTable::new(), b, CollisionPolicy::Overwrite).unwrap(),
            a,
            CollisionPolicy::Overwrite,
        )
        .unwrap();

        assert_eq!(ab.get("k"), Some("B"));
        assert_eq!(ba.get("k"), Some("A"));
    }

    #[test]
    fn test_merge_same_value_still_recorded() {
        let table = LocalizationTable::new()
            .merge(flat("a.json", &[("k", "v")]), CollisionPolicy::Overwrite)
            .unwrap()
            .merge(flat("b.json", &[("k", "v")]), CollisionPolicy::Overwrite)
            .unwrap();
        assert_eq!(table.collisions().len(), 1);
        assert!(table.collisions()[0].is_same_value());
    }

    #[test]
    fn test_merge_collision_error_policy() {
        let err = LocalizationTable::new()
            .merge(flat("a.json", &[("k", "first")]), CollisionPolicy::Error)
            .unwrap()
            .merge(flat("b.json", &[("k", "second")]), CollisionPolicy::Error)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Collision);
        match err {
            CoreError::KeyCollision(collision) => {
                assert_eq!(collision.key, "k");
                assert_eq!(collision.previous_file, PathBuf::from("a.json"));
            }
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn test_build_strict_collision() {
        let mut fs = MockFileSystem::new();
        // Both files flatten to "mock.a.b"
        fs.add_file("mock/a.json", r#"{"b": "json"}"#);
        fs.add_file("mock/a.yaml", "b: yaml\n");
        let files = vec![source("mock/a.json"), source("mock/a.yaml")];

        let table = build_with_fs(&files, &FlatlocConfig::default(), &fs).unwrap();
        assert_eq!(table.get("mock.a.b"), Some("yaml"));
        assert_eq!(table.collisions().len(), 1);

        let strict = FlatlocConfig {
            on_collision: CollisionPolicy::Error,
            ..FlatlocConfig::default()
        };
        let err = build_with_fs(&files, &strict, &fs).unwrap_err();
        assert!(matches!(err, CoreError::KeyCollision(_)));
    }

    #[test]
    fn test_format_agnostic() {
        let mut fs = MockFileSystem::new();
        fs.add_file(
            "loc/en.json",
            r#"{"menu": {"open": "Open", "count": 3, "enabled": true}}"#,
        );
        fs.add_file(
            "loc/en.yaml",
            "menu:\n  open: Open\n  count: 3\n  enabled: true\n",
        );

        let options = FlattenOptions::default();
        let json = parse_and_flatten_one_with_fs(&source("loc/en.json"), &options, &fs).unwrap();
        let yaml = parse_and_flatten_one_with_fs(&source("loc/en.yaml"), &options, &fs).unwrap();
        assert_eq!(json.entries, yaml.entries);
        assert_eq!(json.entries["loc.en.menu.count"], "3");
        assert_eq!(json.entries["loc.en.menu.enabled"], "true");
    }

    #[test]
    fn test_into_entries_and_iter() {
        let table = LocalizationTable::new()
            .merge(flat("a.json", &[("b", "2"), ("a", "1")]), CollisionPolicy::Overwrite)
            .unwrap();
        let keys: Vec<&str> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(table.clone().into_entries().len(), 2);
        assert!(table.origin("missing").is_none());
    }
}
