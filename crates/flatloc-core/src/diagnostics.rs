//! Error types and collision reporting

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::formats::SourceFormat;

pub type CoreResult<T> = Result<T, CoreError>;

/// A key that was written by more than one source file.
///
/// Recorded by the merge step every time a later file overwrites a key
/// contributed by an earlier file in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    pub key: String,
    /// File that contributed the overwritten value
    pub previous_file: PathBuf,
    pub previous_value: String,
    /// File whose value was kept
    pub file: PathBuf,
    pub value: String,
}

impl Collision {
    /// True when both files agree on the value, so the overwrite is harmless.
    pub fn is_same_value(&self) -> bool {
        self.previous_value == self.value
    }
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "key '{}' from {} overwritten by {}",
            self.key,
            self.previous_file.display(),
            self.file.display()
        )
    }
}

/// Coarse classification of [`CoreError`] for callers that only care about
/// the failure category (exit codes, retries, reporting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input root missing or not a directory
    NotFound,
    /// Unreadable or unwritable file, traversal failure
    Io,
    /// Malformed or structurally unsupported document
    Parse,
    /// Invalid configuration or limits exceeded
    Config,
    /// Key written twice while collisions are configured as errors
    Collision,
}

/// Errors raised while decoding a single document into a
/// [`DocumentTree`](crate::tree::DocumentTree) or flattening it.
///
/// Key paths in these errors are relative to the document root and joined
/// with the delimiter, without the file's namespace prefix.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("content is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("document is empty")]
    Empty,

    #[error("top-level value must be a mapping, found {found}")]
    NotAMapping { found: &'static str },

    #[error("unsupported {kind} value at '{key}'")]
    UnsupportedValue { key: String, kind: &'static str },

    #[error("invalid key at '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("duplicate key '{key}'")]
    DuplicateKey { key: String },
}

/// Core errors
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Input directory not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File too large: {path} ({size} bytes, limit {limit} bytes)")]
    FileTooBig {
        path: PathBuf,
        size: u64,
        limit: u64,
    },

    #[error("Not a regular file: {path}")]
    FileNotRegular { path: PathBuf },

    #[error("Failed to walk directory: {path}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to parse {format} file: {path}")]
    Parse {
        path: PathBuf,
        format: SourceFormat,
        #[source]
        source: DocumentError,
    },

    #[error("Key collision: {0}")]
    KeyCollision(Box<Collision>),

    #[error("Invalid exclude pattern: {pattern} ({message})")]
    InvalidExcludePattern { pattern: String, message: String },

    #[error("Too many source files: more than {limit} found (counted {count})")]
    TooManyFiles { count: usize, limit: usize },

    #[error("Failed to render output: {message}")]
    Render { message: String },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::FileRead { .. }
            | CoreError::FileWrite { .. }
            | CoreError::FileTooBig { .. }
            | CoreError::FileNotRegular { .. }
            | CoreError::Walk { .. } => ErrorKind::Io,
            CoreError::Parse { .. } | CoreError::Render { .. } => ErrorKind::Parse,
            CoreError::KeyCollision(_) => ErrorKind::Collision,
            CoreError::InvalidExcludePattern { .. } | CoreError::TooManyFiles { .. } => {
                ErrorKind::Config
            }
        }
    }

    /// Path of the file or directory the error is about, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            CoreError::NotFound { path }
            | CoreError::FileRead { path, .. }
            | CoreError::FileWrite { path, .. }
            | CoreError::FileTooBig { path, .. }
            | CoreError::FileNotRegular { path }
            | CoreError::Walk { path, .. }
            | CoreError::Parse { path, .. } => Some(path),
            CoreError::KeyCollision(collision) => Some(&collision.file),
            _ => None,
        }
    }
}
