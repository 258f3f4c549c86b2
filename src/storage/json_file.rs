use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;

use super::ChainStore;
use crate::blockchain::Block;
use crate::error::StorageError;

/// Chain persisted as a pretty-printed JSON array of blocks.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write leaves the previous chain in place.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "chain.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ChainStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<Block>>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let blocks: Vec<Block> =
            serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        debug!("STORE - loaded {} blocks from {}", blocks.len(), self.path.display());
        Ok(Some(blocks))
    }

    fn save(&self, blocks: &[Block]) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(blocks).map_err(StorageError::Serialize)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        debug!("STORE - wrote {} blocks to {}", blocks.len(), self.path.display());
        Ok(())
    }
}
