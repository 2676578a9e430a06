//! # flatloc-core
//!
//! Flattens nested localization documents into a single key/value table.
//!
//! Every `.json`, `.yaml` and `.yml` file under an input directory is decoded
//! into a [`DocumentTree`], flattened into dot-joined keys prefixed by the
//! file's own path, and merged into one [`LocalizationTable`] in path order.
//! A key supplied by more than one file takes the value of the last one.
//!
//! ```ignore
//! use flatloc_core::{FlatlocConfig, OutputOptions, generate, write_table};
//!
//! let config = FlatlocConfig::default();
//! let table = generate(Path::new("locales"), &config)?;
//! write_table(&table, &config.output_dir(), &OutputOptions::from(&config))?;
//! ```

pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod file_utils;
pub mod flatten;
pub mod formats;
pub mod fs;
pub mod output;
pub mod parsers;
pub mod pipeline;
pub mod tree;

use std::path::Path;

pub use config::{CollisionPolicy, ConfigError, FlatlocConfig, FlatlocConfigBuilder};
pub use diagnostics::{Collision, CoreError, CoreResult, DocumentError, ErrorKind};
pub use discovery::{SourceFile, enumerate, enumerate_with_config};
pub use flatten::{DelimiterPolicy, FlatMap, FlattenOptions, KEY_DELIMITER, flatten_document};
pub use formats::{SourceFormat, detect_format};
pub use fs::{FileSystem, MockFileSystem, RealFileSystem};
pub use output::{OutputFormat, OutputOptions, render_table, write_table};
pub use pipeline::{
    FlattenedFile, LocalizationTable, build, build_with_fs, merge, parse_and_flatten_one,
};
pub use tree::DocumentTree;

/// Enumerate `root` and build the merged table in one step.
pub fn generate(root: &Path, config: &FlatlocConfig) -> CoreResult<LocalizationTable> {
    let files = enumerate_with_config(root, config)?;
    tracing::debug!(root = %root.display(), files = files.len(), "enumerated sources");
    build(&files, config)
}
