pub mod block;
pub mod integrity;
pub mod miner;
pub mod model;

use chrono::Utc;

pub use block::Block;
pub use integrity::verify_blocks;
pub use miner::{MiningSignal, MiningStatus, ProofOfWork};
pub use model::{Blockchain, CertificateLocation};

/// Default Proof-of-Work difficulty (number of leading zeros).
pub const DEFAULT_DIFFICULTY: u32 = 3;

/// Difficulty bounds (keep low to avoid long waits)
pub const DIFF_MIN: u32 = 1;
pub const DIFF_MAX: u32 = 6;

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Hex prefix a mined block hash must start with.
pub fn target_prefix(difficulty: u32) -> String {
    "0".repeat(difficulty as usize)
}

/// Current Unix time in seconds, microsecond resolution.
pub(crate) fn unix_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
