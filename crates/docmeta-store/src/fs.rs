//! Object store rooted in a local directory

use crate::{validate_path, StoreError};
use docmeta_domain::ObjectStore;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Object store mapping object paths to files under a root directory
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store at `root`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        validate_path(path)?;
        Ok(path.split('/').fold(self.root.clone(), |acc, segment| acc.join(segment)))
    }

    fn collect(&self, dir: &Path, relative: &str, out: &mut Vec<String>) -> Result<(), StoreError> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = if relative.is_empty() {
                name
            } else {
                format!("{}/{}", relative, name)
            };
            if entry.file_type()?.is_dir() {
                self.collect(&entry.path(), &path, out)?;
            } else {
                out.push(path);
            }
        }
        Ok(())
    }
}

impl ObjectStore for FsStore {
    type Error = StoreError;

    fn list(&self, prefix: &str) -> Result<Vec<String>, Self::Error> {
        let mut paths = Vec::new();
        self.collect(&self.root, "", &mut paths)?;
        paths.retain(|path| path.starts_with(prefix));
        paths.sort();
        Ok(paths)
    }

    fn get(&self, path: &str) -> Result<Vec<u8>, Self::Error> {
        let file = self.resolve(path)?;
        fs::read(&file).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound(path.to_string()),
            _ => StoreError::Io(e),
        })
    }

    fn put(&mut self, path: &str, data: &[u8]) -> Result<(), Self::Error> {
        let file = self.resolve(path)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file, data)?;
        debug!("Wrote {} bytes to {}", data.len(), file.display());
        Ok(())
    }
}
