use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("certificate for student {student_id} in course {course} is already pending")]
    DuplicatePending { student_id: String, course: String },

    /// Only raised when dedup scope covers mined blocks.
    #[error(
        "certificate for student {student_id} in course {course} is already recorded in block {block_index}"
    )]
    DuplicateRecorded {
        student_id: String,
        course: String,
        block_index: u64,
    },

    #[error("no pending certificates to mine")]
    NoPendingRecords,

    #[error("no certificate for student {student_id} in course {course} exists in the chain")]
    CertificateNotFound { student_id: String, course: String },

    #[error("leaf index {index} is out of range for a block with {len} records")]
    InvalidProofIndex { index: usize, len: usize },

    #[error("block {0} not found")]
    BlockNotFound(u64),

    /// The nonce search was stopped by its signal before a valid hash was found.
    #[error("mining interrupted after {attempts} attempts")]
    MiningInterrupted { attempts: u64 },

    /// The chain tip or pending pool moved while the search ran detached.
    #[error("candidate for block {index} is stale")]
    StaleCandidate { index: u64 },

    #[error(transparent)]
    Persistence(#[from] StorageError),

    #[error("chain integrity violated: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("failed to encode record: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Failures of the persistence gateway.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("chain store {} is unavailable: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store exists but does not hold a readable chain.
    #[error("chain store {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize chain: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("chain store rejected the write: {0}")]
    Rejected(String),
}

/// First violation found while re-deriving a chain from its raw transactions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("chain has no blocks")]
    EmptyChain,

    #[error("genesis block must have index 0 and previous hash \"0\"")]
    BadGenesis,

    #[error("block at position {position} carries index {found}")]
    IndexMismatch { position: usize, found: u64 },

    #[error("block {index}: stored merkle root {stored} does not match recomputed {computed}")]
    MerkleRootMismatch {
        index: u64,
        stored: String,
        computed: String,
    },

    #[error("block {index}: stored hash {stored} does not match recomputed {computed}")]
    HashMismatch {
        index: u64,
        stored: String,
        computed: String,
    },

    #[error("block {index}: previous hash {found} does not link to {expected}")]
    BrokenLink {
        index: u64,
        expected: String,
        found: String,
    },

    #[error("block {index}: hash does not meet difficulty {difficulty}")]
    InsufficientWork { index: u64, difficulty: u32 },
}
