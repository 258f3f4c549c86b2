use std::fmt;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::{Block, MiningSignal, MiningStatus, ProofOfWork, unix_now, verify_blocks};
use crate::certificate::{Certificate, CertificateProof};
use crate::config::{DedupScope, LedgerConfig, LoadMode};
use crate::error::LedgerError;
use crate::merkle::MerkleTree;
use crate::storage::{ChainStore, JsonFileStore};

/// Where a certificate sits in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateLocation {
    pub block_index: u64,
    pub tx_index: usize,
}

/// Append-only certificate chain with a pending pool and Proof-of-Work.
///
/// The chain always holds at least the genesis block. Every successful
/// `mine` appends exactly one block and persists the whole chain.
pub struct Blockchain {
    chain: Vec<Block>,
    pending: Vec<Certificate>,
    config: LedgerConfig,
    store: Box<dyn ChainStore + Send>,
    /// Interrupted search kept for the next `mine` call.
    paused: Option<ProofOfWork>,
}

impl fmt::Debug for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blockchain")
            .field("height", &self.chain.len())
            .field("pending", &self.pending.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Blockchain {
    /// Load the chain from `store`, or start a new one with a genesis block
    /// when nothing has been persisted yet.
    pub fn open(store: Box<dyn ChainStore + Send>, config: LedgerConfig) -> Result<Self, LedgerError> {
        let mut bc = Self {
            chain: Vec::new(),
            pending: Vec::new(),
            config,
            store,
            paused: None,
        };

        match bc.store.load()? {
            Some(blocks) if !blocks.is_empty() => {
                if bc.config.load_mode == LoadMode::Verified {
                    verify_blocks(&blocks, bc.config.difficulty)?;
                }
                info!(
                    "LEDGER - loaded {} blocks ({:?} load)",
                    blocks.len(),
                    bc.config.load_mode
                );
                bc.chain = blocks;
            }
            _ => {
                bc.chain.push(Block::genesis(unix_now())?);
                bc.save()?;
                info!("LEDGER - no stored chain, created genesis block");
            }
        }
        Ok(bc)
    }

    /// Queue a certificate stamped with the current time.
    pub fn submit(
        &mut self,
        student_id: &str,
        name: &str,
        course: &str,
        grade: &str,
    ) -> Result<&Certificate, LedgerError> {
        self.submit_record(Certificate::issue(student_id, name, course, grade))
    }

    /// Queue an already-built certificate.
    /// Rejected without mutation if its (student, course) pair is a duplicate.
    pub fn submit_record(&mut self, cert: Certificate) -> Result<&Certificate, LedgerError> {
        if self
            .pending
            .iter()
            .any(|c| c.matches(&cert.student_id, &cert.course))
        {
            debug!(
                "LEDGER - rejected duplicate pending {}/{}",
                cert.student_id, cert.course
            );
            return Err(LedgerError::DuplicatePending {
                student_id: cert.student_id,
                course: cert.course,
            });
        }

        if self.config.dedup_scope == DedupScope::Chain {
            if let Some(loc) = self.locate(&cert.student_id, &cert.course) {
                debug!(
                    "LEDGER - rejected {}/{} already in block #{}",
                    cert.student_id, cert.course, loc.block_index
                );
                return Err(LedgerError::DuplicateRecorded {
                    student_id: cert.student_id,
                    course: cert.course,
                    block_index: loc.block_index,
                });
            }
        }

        self.pending.push(cert);
        let idx = self.pending.len() - 1;
        debug!(
            "LEDGER - queued {}/{} ({} pending)",
            self.pending[idx].student_id,
            self.pending[idx].course,
            self.pending.len()
        );
        Ok(&self.pending[idx])
    }

    /// Seal the whole pending pool into a new block. Blocks until a nonce is found.
    pub fn mine(&mut self) -> Result<&Block, LedgerError> {
        self.mine_with(&MiningSignal::new())
    }

    /// Like [`Blockchain::mine`], but gives up when `signal` is cancelled.
    ///
    /// An interrupted search leaves chain and pending pool untouched and is
    /// resumed by the next call if neither has changed in the meantime.
    pub fn mine_with(&mut self, signal: &MiningSignal) -> Result<&Block, LedgerError> {
        let mut pow = self.start_mining()?;
        let status = pow.search(signal);
        self.finish_mining(pow, status)
    }

    /// Candidate for the next block: the paused search when it still applies,
    /// otherwise a fresh block over the whole pending pool.
    ///
    /// The returned search is owned by the caller and can run without any
    /// borrow of the ledger. Hand it back through [`Blockchain::finish_mining`].
    pub fn start_mining(&mut self) -> Result<ProofOfWork, LedgerError> {
        if self.pending.is_empty() {
            return Err(LedgerError::NoPendingRecords);
        }

        match self.paused.take() {
            Some(pow) if self.can_resume(&pow) => {
                debug!(
                    "MINER - resuming block #{} at nonce {}",
                    pow.block().index(),
                    pow.block().nonce()
                );
                Ok(pow)
            }
            _ => {
                let last = self.last_block();
                let candidate = Block::new(
                    last.index() + 1,
                    self.pending.clone(),
                    unix_now(),
                    last.hash().to_string(),
                )?;
                Ok(ProofOfWork::new(candidate, self.config.difficulty))
            }
        }
    }

    /// Append a sealed search, or park an interrupted one for later.
    ///
    /// Records submitted while the search ran stay pending. A candidate whose
    /// tip or records are no longer current is discarded.
    pub fn finish_mining(
        &mut self,
        pow: ProofOfWork,
        status: MiningStatus,
    ) -> Result<&Block, LedgerError> {
        if status == MiningStatus::Interrupted {
            let attempts = pow.attempts();
            warn!(
                "MINER - block #{} interrupted after {} attempts",
                pow.block().index(),
                attempts
            );
            self.paused = Some(pow);
            return Err(LedgerError::MiningInterrupted { attempts });
        }

        if !self.is_current(&pow) {
            let index = pow.block().index();
            warn!("MINER - discarded stale candidate for block #{index}");
            return Err(LedgerError::StaleCandidate { index });
        }

        let sealed = pow.block().transactions().len();
        let taken: Vec<Certificate> = self.pending.drain(..sealed).collect();
        self.chain.push(pow.into_block());
        if let Err(err) = self.save() {
            // Keep memory consistent with what is on disk.
            self.chain.pop();
            self.pending.splice(0..0, taken);
            warn!("MINER - rolled back sealed block: {err}");
            return Err(err);
        }

        let block = self.last_block();
        info!(
            "MINER - sealed block #{} (hash={}, nonce={}, txs={})",
            block.index(),
            block.hash(),
            block.nonce(),
            block.transactions().len()
        );
        Ok(block)
    }

    fn extends_tip(&self, pow: &ProofOfWork) -> bool {
        let last = self.last_block();
        let candidate = pow.block();
        pow.difficulty() == self.config.difficulty
            && candidate.index() == last.index() + 1
            && candidate.previous_hash() == last.hash()
    }

    fn can_resume(&self, pow: &ProofOfWork) -> bool {
        self.extends_tip(pow) && pow.block().transactions() == self.pending.as_slice()
    }

    fn is_current(&self, pow: &ProofOfWork) -> bool {
        self.extends_tip(pow) && self.pending.starts_with(pow.block().transactions())
    }

    /// First (block, leaf) holding the pair, scanning blocks then records in order.
    pub fn locate(&self, student_id: &str, course: &str) -> Option<CertificateLocation> {
        self.chain.iter().find_map(|b| {
            b.position_of(student_id, course)
                .map(|tx_index| CertificateLocation {
                    block_index: b.index(),
                    tx_index,
                })
        })
    }

    pub fn block_at(&self, index: u64) -> Option<&Block> {
        self.chain.iter().find(|b| b.index() == index)
    }

    /// Inclusion proof for the record at `tx_index` of block `block_index`.
    /// The artifact carries the block's stored Merkle root.
    pub fn proof_for(&self, block_index: u64, tx_index: usize) -> Result<CertificateProof, LedgerError> {
        let block = self
            .block_at(block_index)
            .ok_or(LedgerError::BlockNotFound(block_index))?;
        let proof = MerkleTree::from_records(block.transactions())?.proof(tx_index)?;
        Ok(CertificateProof {
            block_index: block.index(),
            tx_index,
            transaction: block.transactions()[tx_index].clone(),
            merkle_root: block.merkle_root().to_string(),
            proof,
        })
    }

    /// Inclusion proof for the first mined certificate matching the pair.
    pub fn prove(&self, student_id: &str, course: &str) -> Result<CertificateProof, LedgerError> {
        let loc = self
            .locate(student_id, course)
            .ok_or_else(|| LedgerError::CertificateNotFound {
                student_id: student_id.to_string(),
                course: course.to_string(),
            })?;
        self.proof_for(loc.block_index, loc.tx_index)
    }

    /// Re-derive every hash and Merkle root and check linkage.
    pub fn verify_chain_integrity(&self) -> Result<(), LedgerError> {
        verify_blocks(&self.chain, self.config.difficulty)
    }

    pub fn is_valid_chain(&self) -> bool {
        self.verify_chain_integrity().is_ok()
    }

    /// Persist the full chain through the store.
    pub fn save(&self) -> Result<(), LedgerError> {
        self.store.save(&self.chain)?;
        Ok(())
    }

    /// Write the chain in the persisted format to `destination`.
    pub fn export_to(&self, destination: &Path) -> Result<(), LedgerError> {
        JsonFileStore::new(destination).save(&self.chain)?;
        info!(
            "LEDGER - exported {} blocks to {}",
            self.chain.len(),
            destination.display()
        );
        Ok(())
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Certificate] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.config.difficulty
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}
