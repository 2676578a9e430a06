//! Filesystem abstraction for the flatten-and-merge engine.
//!
//! The engine reads source files through the [`FileSystem`] trait so that
//! parsing and merge behavior can be tested without touching the disk.
//!
//! ## Usage
//!
//! Production code uses [`RealFileSystem`], which delegates to
//! [`safe_read_file`](crate::file_utils::safe_read_file):
//!
//! ```ignore
//! let fs = RealFileSystem::default();
//! let bytes = fs.read_file(Path::new("locales/en.json"))?;
//! ```
//!
//! Tests can use [`MockFileSystem`] to simulate a source tree:
//!
//! ```ignore
//! let mut mock = MockFileSystem::new();
//! mock.add_file("mock/valid.json", r#"{"test1": "test2"}"#);
//! let bytes = mock.read_file(Path::new("mock/valid.json"))?;
//! ```

use crate::diagnostics::CoreResult;
use crate::file_utils::{DEFAULT_MAX_FILE_SIZE, safe_read_file};
use std::path::Path;

pub use mock::MockFileSystem;

/// Read access to source files.
///
/// Implementations must be shareable across threads, since the engine may
/// decode files in parallel.
pub trait FileSystem: Send + Sync + std::fmt::Debug {
    /// Read the full contents of a file.
    fn read_file(&self, path: &Path) -> CoreResult<Vec<u8>>;
}

/// Real filesystem implementation with a per-file size limit.
#[derive(Debug, Clone, Copy)]
pub struct RealFileSystem {
    max_file_size: u64,
}

impl RealFileSystem {
    pub fn with_max_file_size(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::with_max_file_size(DEFAULT_MAX_FILE_SIZE)
    }
}

impl FileSystem for RealFileSystem {
    fn read_file(&self, path: &Path) -> CoreResult<Vec<u8>> {
        safe_read_file(path, self.max_file_size)
    }
}

pub mod mock {
    //! In-memory filesystem for tests.

    use super::*;
    use crate::diagnostics::CoreError;
    use std::collections::HashMap;
    use std::io;
    use std::path::PathBuf;

    /// Mock filesystem for unit testing.
    ///
    /// Files are keyed by their normalized path. Any proper ancestor of a
    /// registered file reads as a directory.
    #[derive(Debug, Default)]
    pub struct MockFileSystem {
        files: HashMap<PathBuf, Vec<u8>>,
    }

    impl MockFileSystem {
        /// Create a new empty mock filesystem.
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a file with the given content.
        pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) {
            self.files
                .insert(normalize_path(path.as_ref()), content.as_ref().to_vec());
        }

        fn is_dir(&self, path: &Path) -> bool {
            !path.as_os_str().is_empty()
                && self
                    .files
                    .keys()
                    .any(|file| file != path && file.starts_with(path))
        }
    }

    impl FileSystem for MockFileSystem {
        fn read_file(&self, path: &Path) -> CoreResult<Vec<u8>> {
            let normalized = normalize_path(path);
            if self.is_dir(&normalized) {
                return Err(CoreError::FileNotRegular {
                    path: path.to_path_buf(),
                });
            }
            self.files
                .get(&normalized)
                .cloned()
                .ok_or_else(|| CoreError::FileRead {
                    path: path.to_path_buf(),
                    source: io::Error::new(io::ErrorKind::NotFound, "file not found in mock"),
                })
        }
    }

    /// Drop `.` components and resolve `..` lexically.
    fn normalize_path(path: &Path) -> PathBuf {
        use std::path::Component;

        let mut result = PathBuf::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    result.pop();
                }
                Component::Normal(s) => result.push(s),
                Component::RootDir => result.push(component.as_os_str()),
                Component::Prefix(p) => result.push(p.as_os_str()),
            }
        }
        result
    }

}
