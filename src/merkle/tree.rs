//! Layered Merkle tree over serializable records.
//!
//! Layer 0 holds one leaf digest per record (or the digest of the empty byte
//! string when there are no records). Each layer above pairs adjacent digests;
//! an odd-length layer is padded by repeating its last digest first.

use serde::Serialize;

use super::proof::{MerkleProof, ProofStep, Side};
use crate::error::LedgerError;
use crate::hashing::{hash_pair, sha256_hex, to_canonical_bytes};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    layers: Vec<Vec<String>>,
    record_count: usize,
}

impl MerkleTree {
    /// Hash `records` in order and build every layer up to the root.
    pub fn from_records<T: Serialize>(records: &[T]) -> Result<Self, LedgerError> {
        let mut leaves = records
            .iter()
            .map(|r| to_canonical_bytes(r).map(|bytes| sha256_hex(&bytes)))
            .collect::<Result<Vec<_>, _>>()?;
        if leaves.is_empty() {
            leaves.push(sha256_hex(b""));
        }
        Ok(Self::from_leaves(leaves, records.len()))
    }

    fn from_leaves(leaves: Vec<String>, record_count: usize) -> Self {
        let mut layers = vec![leaves];
        while let Some(current) = layers.last().filter(|layer| layer.len() > 1) {
            let next = padded(current)
                .chunks(2)
                .map(|pair| hash_pair(&pair[0], &pair[1]))
                .collect();
            layers.push(next);
        }
        Self {
            layers,
            record_count,
        }
    }

    pub fn root(&self) -> &str {
        // from_leaves never produces an empty layer set or top layer
        &self.layers[self.layers.len() - 1][0]
    }

    pub fn layers(&self) -> &[Vec<String>] {
        &self.layers
    }

    /// Number of real records; excludes the synthetic empty leaf.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Inclusion proof for the record at `leaf_index`.
    pub fn proof(&self, leaf_index: usize) -> Result<MerkleProof, LedgerError> {
        if leaf_index >= self.record_count {
            return Err(LedgerError::InvalidProofIndex {
                index: leaf_index,
                len: self.record_count,
            });
        }

        let mut steps = Vec::with_capacity(self.layers.len().saturating_sub(1));
        let mut idx = leaf_index;
        for layer in &self.layers[..self.layers.len() - 1] {
            let layer = padded(layer);
            let sibling = idx ^ 1;
            let side = if sibling < idx { Side::Left } else { Side::Right };
            steps.push(ProofStep::new(layer[sibling].clone(), side));
            idx /= 2;
        }
        Ok(MerkleProof::new(steps))
    }
}

fn padded(layer: &[String]) -> Vec<String> {
    let mut layer = layer.to_vec();
    if layer.len() % 2 == 1 {
        if let Some(last) = layer.last().cloned() {
            layer.push(last);
        }
    }
    layer
}

/// Root digest of `records`.
pub fn merkle_root<T: Serialize>(records: &[T]) -> Result<String, LedgerError> {
    Ok(MerkleTree::from_records(records)?.root().to_string())
}

/// Inclusion proof for `records[leaf_index]`.
pub fn merkle_proof<T: Serialize>(records: &[T], leaf_index: usize) -> Result<MerkleProof, LedgerError> {
    MerkleTree::from_records(records)?.proof(leaf_index)
}
