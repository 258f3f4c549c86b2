//! Persistence gateway for the chain.
//!
//! The ledger only needs to load and save the whole block sequence. Two
//! backends are provided:
//!
//! - a JSON file store ([`json_file::JsonFileStore`]) for real deployments,
//! - an in-memory store ([`mem::MemoryStore`]) suitable for tests.

pub mod json_file;
pub mod mem;

pub use json_file::JsonFileStore;
pub use mem::MemoryStore;

use crate::blockchain::Block;
use crate::error::StorageError;

/// Load-all / save-all access to a persisted chain.
pub trait ChainStore {
    /// Returns `None` when nothing has been persisted yet.
    /// A store that exists but cannot be read is an error, not `None`.
    fn load(&self) -> Result<Option<Vec<Block>>, StorageError>;

    /// Replaces the persisted chain with `blocks`.
    fn save(&self, blocks: &[Block]) -> Result<(), StorageError>;
}
