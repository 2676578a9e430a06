//! Guarded file reading.

use std::fs;
use std::path::Path;

use crate::diagnostics::{CoreError, CoreResult};

/// Default per-file size limit (16 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Read a regular file, enforcing a size limit.
///
/// Directories, sockets and other non-regular files are rejected with
/// [`CoreError::FileNotRegular`]. Symlinks are followed; discovery never
/// yields them, but explicitly listed files may be links.
pub fn safe_read_file(path: &Path, max_size: u64) -> CoreResult<Vec<u8>> {
    let metadata = fs::metadata(path).map_err(|source| CoreError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    if !metadata.is_file() {
        return Err(CoreError::FileNotRegular {
            path: path.to_path_buf(),
        });
    }

    if metadata.len() > max_size {
        return Err(CoreError::FileTooBig {
            path: path.to_path_buf(),
            size: metadata.len(),
            limit: max_size,
        });
    }

    fs::read(path).map_err(|source| CoreError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}
