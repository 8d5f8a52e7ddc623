//! Filesystem trait definitions

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// Async filesystem trait.
///
/// The interpreter only ever reads whole script files; writes belong to the
/// host shell's own file layer.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Read a file's contents.
    ///
    /// A missing file must surface as an `std::io::ErrorKind::NotFound` I/O
    /// error so it can be reported as a missing script.
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>>;

    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> Result<bool>;
}
