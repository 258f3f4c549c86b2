//! Proof-of-Work nonce search.
//!
//! The search owns its candidate block and attempt counter, and polls a
//! shared [`MiningSignal`] before every attempt. An interrupted search keeps
//! its nonce, so calling [`ProofOfWork::search`] again resumes where it left off.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use super::{Block, target_prefix};

/// Cancellation flag shared between a search and whoever wants to stop it.
#[derive(Debug, Clone, Default)]
pub struct MiningSignal {
    cancelled: Arc<AtomicBool>,
}

impl MiningSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningStatus {
    Sealed,
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct ProofOfWork {
    block: Block,
    prefix: String,
    attempts: u64,
}

impl ProofOfWork {
    pub fn new(block: Block, difficulty: u32) -> Self {
        Self {
            block,
            prefix: target_prefix(difficulty),
            attempts: 0,
        }
    }

    /// Advance the nonce until the hash starts with the target prefix or
    /// `signal` is cancelled. No cap on attempts.
    pub fn search(&mut self, signal: &MiningSignal) -> MiningStatus {
        loop {
            if signal.is_cancelled() {
                debug!(
                    "POW - interrupted block #{} at nonce {} after {} attempts",
                    self.block.index(),
                    self.block.nonce(),
                    self.attempts
                );
                return MiningStatus::Interrupted;
            }
            if self.block.hash().starts_with(&self.prefix) {
                return MiningStatus::Sealed;
            }
            self.block.advance_nonce();
            self.attempts += 1;
        }
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn difficulty(&self) -> u32 {
        self.prefix.len() as u32
    }

    pub fn into_block(self) -> Block {
        self.block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::Certificate;

    fn candidate() -> Block {
        Block::new(
            1,
            vec![Certificate::new("S1", "Alice", "Math", "A", 1_700_000_000)],
            1_700_000_050.25,
            "prev".into(),
        )
        .unwrap()
    }

    #[test]
    fn mining_produces_leading_zeros() {
        let mut pow = ProofOfWork::new(candidate(), 2);
        assert_eq!(pow.search(&MiningSignal::new()), MiningStatus::Sealed);
        let block = pow.into_block();
        assert!(block.hash().starts_with("00"));
        assert_eq!(block.hash(), block.compute_hash());
    }

    #[test]
    fn attempts_track_nonce() {
        let mut pow = ProofOfWork::new(candidate(), 2);
        pow.search(&MiningSignal::new());
        assert_eq!(pow.attempts(), pow.block().nonce());
    }

    #[test]
    fn cancelled_signal_stops_before_any_attempt() {
        let signal = MiningSignal::new();
        signal.cancel();
        let mut pow = ProofOfWork::new(candidate(), 6);
        assert_eq!(pow.search(&signal), MiningStatus::Interrupted);
        assert_eq!(pow.attempts(), 0);
        assert_eq!(pow.block().nonce(), 0);
    }

    #[test]
    fn interrupted_search_resumes_to_same_result() {
        let mut straight = ProofOfWork::new(candidate(), 2);
        straight.search(&MiningSignal::new());

        let stopped = MiningSignal::new();
        stopped.cancel();
        let mut resumed = ProofOfWork::new(candidate(), 2);
        assert_eq!(resumed.search(&stopped), MiningStatus::Interrupted);
        assert_eq!(resumed.search(&MiningSignal::new()), MiningStatus::Sealed);

        assert_eq!(resumed.block(), straight.block());
        assert_eq!(resumed.difficulty(), 2);
    }

    #[test]
    fn signal_clones_share_state() {
        let signal = MiningSignal::new();
        let watchdog = signal.clone();
        assert!(!signal.is_cancelled());
        watchdog.cancel();
        assert!(signal.is_cancelled());
    }
}
