use serde::{Deserialize, Serialize};

use crate::hashing::{hash_pair, sha256_hex, to_canonical_bytes};

/// Which side of the running hash a sibling digest is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
}

/// One level of an inclusion proof.
/// Serialized as a `[sibling_hex, "L" | "R"]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, Side)", into = "(String, Side)")]
pub struct ProofStep {
    pub sibling: String,
    pub side: Side,
}

impl ProofStep {
    pub fn new(sibling: String, side: Side) -> Self {
        Self { sibling, side }
    }
}

impl From<(String, Side)> for ProofStep {
    fn from((sibling, side): (String, Side)) -> Self {
        Self { sibling, side }
    }
}

impl From<ProofStep> for (String, Side) {
    fn from(step: ProofStep) -> Self {
        (step.sibling, step.side)
    }
}

/// Sibling path from a leaf up to the root, leaf level first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerkleProof {
    steps: Vec<ProofStep>,
}

impl MerkleProof {
    pub fn new(steps: Vec<ProofStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    #[cfg(test)]
    pub(crate) fn steps_mut(&mut self) -> &mut [ProofStep] {
        &mut self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Fold the path over an already-hashed leaf.
    pub fn compute_root(&self, leaf_hash: &str) -> String {
        self.steps
            .iter()
            .fold(leaf_hash.to_string(), |h, step| match step.side {
                Side::Left => hash_pair(&step.sibling, &h),
                Side::Right => hash_pair(&h, &step.sibling),
            })
    }
}

/// Check that `leaf` is included under `expected_root`.
///
/// Needs nothing beyond its three arguments, so any party holding an
/// exported proof can run it. A leaf that cannot be encoded never verifies.
pub fn verify<T: Serialize + ?Sized>(leaf: &T, proof: &MerkleProof, expected_root: &str) -> bool {
    match to_canonical_bytes(leaf) {
        Ok(bytes) => proof.compute_root(&sha256_hex(&bytes)) == expected_root,
        Err(_) => false,
    }
}
