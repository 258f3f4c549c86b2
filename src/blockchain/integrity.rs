//! Full re-derivation of a chain from its raw transactions.
//!
//! Stored `merkle_root` and `hash` values are never trusted here: both are
//! recomputed for every block and compared, and linkage is checked pairwise.

use super::{Block, GENESIS_PREVIOUS_HASH};
use crate::error::{IntegrityError, LedgerError};

/// Verify `blocks` as a whole chain mined at `difficulty`.
/// Returns the first violation found, in index order.
pub fn verify_blocks(blocks: &[Block], difficulty: u32) -> Result<(), LedgerError> {
    let genesis = blocks.first().ok_or(IntegrityError::EmptyChain)?;
    if genesis.index() != 0 || genesis.previous_hash() != GENESIS_PREVIOUS_HASH {
        return Err(IntegrityError::BadGenesis.into());
    }

    for (position, block) in blocks.iter().enumerate() {
        if block.index() != position as u64 {
            return Err(IntegrityError::IndexMismatch {
                position,
                found: block.index(),
            }
            .into());
        }

        let computed_root = block.compute_merkle_root()?;
        if block.merkle_root() != computed_root {
            return Err(IntegrityError::MerkleRootMismatch {
                index: block.index(),
                stored: block.merkle_root().to_string(),
                computed: computed_root,
            }
            .into());
        }

        let computed_hash = block.compute_hash();
        if block.hash() != computed_hash {
            return Err(IntegrityError::HashMismatch {
                index: block.index(),
                stored: block.hash().to_string(),
                computed: computed_hash,
            }
            .into());
        }

        // Genesis is never mined.
        if position == 0 {
            continue;
        }

        let prev = &blocks[position - 1];
        if block.previous_hash() != prev.hash() {
            return Err(IntegrityError::BrokenLink {
                index: block.index(),
                expected: prev.hash().to_string(),
                found: block.previous_hash().to_string(),
            }
            .into());
        }

        if !block.meets_difficulty(difficulty) {
            return Err(IntegrityError::InsufficientWork {
                index: block.index(),
                difficulty,
            }
            .into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{MiningSignal, ProofOfWork};
    use crate::certificate::Certificate;

    const DIFFICULTY: u32 = 1;

    fn mined(prev: &Block, txs: Vec<Certificate>) -> Block {
        let candidate =
            Block::new(prev.index() + 1, txs, prev.timestamp() + 1.0, prev.hash().into()).unwrap();
        let mut pow = ProofOfWork::new(candidate, DIFFICULTY);
        pow.search(&MiningSignal::new());
        pow.into_block()
    }

    fn chain() -> Vec<Block> {
        let genesis = Block::genesis(1_700_000_000.0).unwrap();
        let b1 = mined(
            &genesis,
            vec![Certificate::new("S1", "Alice", "Math", "A", 1_700_000_000)],
        );
        let b2 = mined(
            &b1,
            vec![Certificate::new("S2", "Bob", "Math", "B", 1_700_000_001)],
        );
        vec![genesis, b1, b2]
    }

    fn integrity_err(blocks: &[Block]) -> IntegrityError {
        match verify_blocks(blocks, DIFFICULTY) {
            Err(LedgerError::Integrity(e)) => e,
            other => panic!("expected integrity error, got {other:?}"),
        }
    }

    /// Round-trip through JSON so stored fields can be edited like a file on disk.
    fn edit(block: &Block, f: impl FnOnce(&mut serde_json::Value)) -> Block {
        let mut value = serde_json::to_value(block).unwrap();
        f(&mut value);
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn mined_chain_is_valid() {
        assert!(verify_blocks(&chain(), DIFFICULTY).is_ok());
    }

    #[test]
    fn empty_chain_is_rejected() {
        assert_eq!(integrity_err(&[]), IntegrityError::EmptyChain);
    }

    #[test]
    fn tampered_transaction_is_detected_by_merkle_root() {
        let mut blocks = chain();
        blocks[1] = edit(&blocks[1], |v| v["transactions"][0]["grade"] = "F".into());
        assert!(matches!(
            integrity_err(&blocks),
            IntegrityError::MerkleRootMismatch { index: 1, .. }
        ));
    }

    #[test]
    fn tampered_nonce_is_detected_by_hash() {
        let mut blocks = chain();
        blocks[2] = edit(&blocks[2], |v| {
            let nonce = v["nonce"].as_u64().unwrap();
            v["nonce"] = (nonce + 1).into();
        });
        assert!(matches!(
            integrity_err(&blocks),
            IntegrityError::HashMismatch { index: 2, .. }
        ));
    }

    #[test]
    fn broken_link_is_detected() {
        let mut blocks = chain();
        let genesis = Block::genesis(1_600_000_000.0).unwrap();
        blocks[0] = genesis;
        assert!(matches!(
            integrity_err(&blocks),
            IntegrityError::BrokenLink { index: 1, .. }
        ));
    }

    #[test]
    fn index_gap_is_detected() {
        let mut blocks = chain();
        blocks.remove(1);
        assert_eq!(
            integrity_err(&blocks),
            IntegrityError::IndexMismatch {
                position: 1,
                found: 2
            }
        );
    }

    #[test]
    fn unmined_block_lacks_work() {
        let mut blocks = chain();
        let prev = &blocks[2];
        let mut unmined = Block::new(3, Vec::new(), 1.0, prev.hash().into()).unwrap();
        while unmined.hash().starts_with('0') {
            unmined.advance_nonce();
        }
        blocks.push(unmined);
        assert_eq!(
            integrity_err(&blocks),
            IntegrityError::InsufficientWork {
                index: 3,
                difficulty: DIFFICULTY
            }
        );
    }

    #[test]
    fn bad_genesis_is_rejected() {
        let blocks = vec![Block::new(0, Vec::new(), 1.0, "abc".into()).unwrap()];
        assert_eq!(integrity_err(&blocks), IntegrityError::BadGenesis);
    }
}
