use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{GENESIS_PREVIOUS_HASH, target_prefix};
use crate::certificate::Certificate;
use crate::error::LedgerError;
use crate::hashing::{encode_value, sha256_hex};
use crate::merkle::merkle_root;

/// A sealed container of certificates linked to its predecessor.
///
/// Field order matches the persisted layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    transactions: Vec<Certificate>,
    timestamp: f64, // Unix seconds (UTC), sub-second precision
    previous_hash: String,
    #[serde(default)]
    nonce: u64, // Proof-of-Work nonce
    merkle_root: String,
    hash: String, // Cached hash of the block
}

impl Block {
    /// Create the genesis block (first block in the chain).
    pub fn genesis(timestamp: f64) -> Result<Self, LedgerError> {
        Self::new(0, Vec::new(), timestamp, GENESIS_PREVIOUS_HASH.to_string())
    }

    /// Create a candidate block with `nonce = 0` (not mined yet).
    /// The Merkle root is computed here once and never again.
    pub fn new(
        index: u64,
        transactions: Vec<Certificate>,
        timestamp: f64,
        previous_hash: String,
    ) -> Result<Self, LedgerError> {
        let merkle_root = merkle_root(&transactions)?;
        let mut block = Self {
            index,
            transactions,
            timestamp,
            previous_hash,
            nonce: 0,
            merkle_root,
            hash: String::new(),
        };
        block.recompute_hash();
        Ok(block)
    }

    /// SHA-256 over the canonical encoding of every field except `hash`.
    pub fn compute_hash(&self) -> String {
        let content = json!({
            "index": self.index,
            "transactions": self.transactions,
            "timestamp": self.timestamp,
            "previous_hash": self.previous_hash,
            "nonce": self.nonce,
            "merkle_root": self.merkle_root,
        });
        sha256_hex(&encode_value(&content))
    }

    /// Refresh the cached hash after the nonce changed.
    pub fn recompute_hash(&mut self) {
        self.hash = self.compute_hash();
    }

    pub(crate) fn advance_nonce(&mut self) {
        self.nonce = self.nonce.wrapping_add(1);
        self.recompute_hash();
    }

    /// Merkle root derived from the stored transactions, ignoring the cached one.
    pub fn compute_merkle_root(&self) -> Result<String, LedgerError> {
        merkle_root(&self.transactions)
    }

    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.hash.starts_with(&target_prefix(difficulty))
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn transactions(&self) -> &[Certificate] {
        &self.transactions
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn merkle_root(&self) -> &str {
        &self.merkle_root
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Position of the first certificate for (`student_id`, `course`).
    pub fn position_of(&self, student_id: &str, course: &str) -> Option<usize> {
        self.transactions
            .iter()
            .position(|c| c.matches(student_id, course))
    }
}

#[cfg(test)]
mod tests {
    use super::Block;
    use crate::certificate::Certificate;
    use crate::hashing::{hash_pair, sha256_hex};

    fn sample_txs() -> Vec<Certificate> {
        vec![
            Certificate::new("S1", "Alice", "Math", "A", 1_700_000_000),
            Certificate::new("S2", "Bob", "Math", "B", 1_700_000_001),
        ]
    }

    #[test]
    fn genesis_has_valid_hash() {
        let b = Block::genesis(1_700_000_000.5).unwrap();
        assert_eq!(b.index(), 0);
        assert_eq!(b.previous_hash(), "0");
        assert_eq!(b.nonce(), 0);
        assert_eq!(b.hash(), b.compute_hash());
        assert_eq!(b.merkle_root(), sha256_hex(b""));
    }

    #[test]
    fn hash_preimage_is_canonical_json() {
        let b = Block::genesis(1_700_000_000.0).unwrap();
        let preimage = format!(
            r#"{{"index":0,"merkle_root":"{}","nonce":0,"previous_hash":"0","timestamp":1700000000.0,"transactions":[]}}"#,
            sha256_hex(b"")
        );
        assert_eq!(b.hash(), sha256_hex(preimage.as_bytes()));
    }

    #[test]
    fn merkle_root_is_fixed_at_creation() {
        let txs = sample_txs();
        let b = Block::new(1, txs.clone(), 1_700_000_100.0, "prev".into()).unwrap();
        let expected = hash_pair(&txs[0].leaf_hash().unwrap(), &txs[1].leaf_hash().unwrap());
        assert_eq!(b.merkle_root(), expected);
        assert_eq!(b.compute_merkle_root().unwrap(), expected);
    }

    #[test]
    fn advancing_nonce_changes_hash_only() {
        let mut b = Block::new(1, sample_txs(), 1_700_000_100.0, "prev".into()).unwrap();
        let root = b.merkle_root().to_string();
        let old_hash = b.hash().to_string();
        b.advance_nonce();
        assert_eq!(b.nonce(), 1);
        assert_ne!(b.hash(), old_hash);
        assert_eq!(b.hash(), b.compute_hash());
        assert_eq!(b.merkle_root(), root);
    }

    #[test]
    fn invalid_when_mutated() {
        let mut b = Block::new(2, sample_txs(), 1_700_000_100.0, "prev".into()).unwrap();
        let old_hash = b.hash().to_string();

        // Mutate: add a new tx (tampering)
        b.transactions
            .push(Certificate::new("S9", "Mallory", "Math", "A", 1_700_000_002));

        assert_ne!(old_hash, b.compute_hash());
        assert_ne!(b.merkle_root(), b.compute_merkle_root().unwrap());
    }

    #[test]
    fn persisted_form_round_trips_verbatim() {
        let b = Block::new(3, sample_txs(), 1_700_000_123.456789, "prev".into()).unwrap();
        let json = serde_json::to_string(&b).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
        assert_eq!(back.compute_hash(), b.hash());
    }

    #[test]
    fn persisted_field_order_is_stable() {
        let b = Block::genesis(1.5).unwrap();
        let json = serde_json::to_string(&b).unwrap();
        let keys = [
            "\"index\"",
            "\"transactions\"",
            "\"timestamp\"",
            "\"previous_hash\"",
            "\"nonce\"",
            "\"merkle_root\"",
            "\"hash\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn difficulty_check_counts_leading_zeros() {
        let mut b = Block::genesis(1.0).unwrap();
        b.hash = "000abc".into();
        assert!(b.meets_difficulty(3));
        assert!(!b.meets_difficulty(4));
        assert!(b.meets_difficulty(0));
    }
}
