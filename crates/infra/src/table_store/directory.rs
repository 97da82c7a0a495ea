use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use super::r#trait::{StoreError, TableStore};

/// One JSON file per collection inside a directory.
///
/// Saves write a temporary sibling and rename it over the target, so a
/// collection file is either the old or the new contents, never a mix.
#[derive(Debug, Clone)]
pub struct DirectoryTableStore {
    root: PathBuf,
}

impl DirectoryTableStore {
    /// Open (creating if needed) the directory at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            collection: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    fn path_for(&self, collection: &str) -> Result<PathBuf, StoreError> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidCollection(collection.to_string()));
        }
        Ok(self.root.join(format!("{collection}.json")))
    }
}

impl TableStore for DirectoryTableStore {
    fn load(&self, collection: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(collection)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                collection: collection.to_string(),
                source,
            }),
        }
    }

    fn save(&self, collection: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(collection)?;
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| StoreError::Io {
            collection: collection.to_string(),
            source,
        };

        let mut file = fs::File::create(&tmp).map_err(io_err)?;
        file.write_all(value.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);
        fs::rename(&tmp, &path).map_err(io_err)?;
        tracing::debug!(collection, bytes = value.len(), "collection saved");
        Ok(())
    }

    fn remove(&self, collection: &str) -> Result<(), StoreError> {
        let path = self.path_for(collection)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                collection: collection.to_string(),
                source,
            }),
        }
    }
}
