//! In-memory filesystem implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::{Error as IoError, ErrorKind};
use std::path::{Component, Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use super::traits::FileSystem;
use crate::error::Result;

/// In-memory filesystem.
///
/// Stores script files keyed by normalised absolute path.
#[derive(Debug, Default)]
pub struct InMemoryFs {
    files: RwLock<HashMap<PathBuf, Vec<u8>>>,
}

impl InMemoryFs {
    /// Create an empty in-memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `content` at `path`, replacing any previous file.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = Self::normalize_path(path.as_ref());
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, content.into());
    }

    fn normalize_path(path: &Path) -> PathBuf {
        let mut result = PathBuf::from("/");

        for component in path.components() {
            match component {
                Component::Normal(name) => result.push(name),
                Component::ParentDir => {
                    result.pop();
                }
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            }
        }

        result
    }
}

#[async_trait]
impl FileSystem for InMemoryFs {
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        let path = Self::normalize_path(path);
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);

        match files.get(&path) {
            Some(content) => Ok(content.clone()),
            None => Err(IoError::new(ErrorKind::NotFound, "file not found").into()),
        }
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = Self::normalize_path(path);
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        Ok(files.contains_key(&path))
    }
}
