//! Append-only ledger of academic certificates.
//!
//! Certificates are queued in a pending pool, sealed into blocks by
//! Proof-of-Work and indexed by a Merkle tree, so a single certificate's
//! inclusion can be proven to a third party with just the record, its
//! sibling path and the block's Merkle root.

pub mod blockchain;
pub mod certificate;
pub mod config;
pub mod error;
pub mod hashing;
pub mod merkle;
pub mod storage;

pub use blockchain::{
    Block, Blockchain, CertificateLocation, MiningSignal, MiningStatus, ProofOfWork,
};
pub use certificate::{Certificate, CertificateProof};
pub use config::{DedupScope, LedgerConfig, LoadMode, ServerConfig};
pub use error::{IntegrityError, LedgerError, StorageError};
pub use merkle::{MerkleProof, MerkleTree};
pub use storage::{ChainStore, JsonFileStore, MemoryStore};
