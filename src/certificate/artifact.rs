use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Certificate;
use crate::error::{LedgerError, StorageError};
use crate::merkle::{MerkleProof, verify};

/// Self-contained inclusion proof handed to a third-party verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateProof {
    pub block_index: u64,
    /// Leaf index within the block.
    pub tx_index: usize,
    pub transaction: Certificate,
    /// Root the proof claims to reach.
    pub merkle_root: String,
    pub proof: MerkleProof,
}

impl CertificateProof {
    /// Recompute the root from the leaf and sibling path.
    pub fn verify(&self) -> bool {
        verify(&self.transaction, &self.proof, &self.merkle_root)
    }

    /// Conventional export file name, e.g. `merkle_proof_b1_t0.json`.
    pub fn file_name(&self) -> String {
        format!("merkle_proof_b{}_t{}.json", self.block_index, self.tx_index)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), LedgerError> {
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, LedgerError> {
        let bytes = fs::read(path).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| {
            StorageError::Corrupt {
                path: path.to_path_buf(),
                source,
            }
            .into()
        })
    }
}
