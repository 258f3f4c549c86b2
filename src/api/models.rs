use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use cert_ledger::{Block, Blockchain, Certificate};
use serde::{Deserialize, Serialize};

/// Shared application state: the ledger behind a lock plus shell settings.
///
/// The ledger lock is only held to prepare or commit a block. The nonce
/// search itself runs under `mining`, which admits one search at a time.
pub struct AppState {
    pub ledger: Mutex<Blockchain>,
    pub mining: Mutex<()>,
    /// Cancel mining after this long; `None` waits for a nonce.
    pub mining_timeout: Option<Duration>,
    /// Chain exports are confined to this directory.
    pub export_dir: PathBuf,
}

impl AppState {
    pub fn new(ledger: Blockchain, mining_timeout: Option<Duration>, export_dir: PathBuf) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            mining: Mutex::new(()),
            mining_timeout,
            export_dir,
        }
    }
}

/* ---------- Certificate API Models ---------- */

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub student_id: String,
    pub name: String,
    pub course: String,
    pub grade: String,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub certificate: Certificate,
    pub pending: usize,
}

#[derive(Serialize)]
pub struct PendingResponse<'a> {
    pub size: usize,
    pub certificates: &'a [Certificate],
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub length: usize,
    pub difficulty: u32,
    pub chain: &'a [Block],
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub mined_index: u64,
    pub hash: String,
    pub nonce: u64,
    pub difficulty: u32,
    pub merkle_root: String,
    pub transactions: usize,
}

impl MineResponse {
    pub fn from_block(block: &Block, difficulty: u32) -> Self {
        Self {
            mined_index: block.index(),
            hash: block.hash().to_string(),
            nonce: block.nonce(),
            difficulty,
            merkle_root: block.merkle_root().to_string(),
            transactions: block.transactions().len(),
        }
    }
}

#[derive(Deserialize)]
pub struct ExportRequest {
    pub destination: String,
}

#[derive(Serialize)]
pub struct ExportResponse {
    pub destination: String,
    pub blocks: usize,
}

/* ---------- Proof API Models ---------- */

#[derive(Deserialize)]
pub struct ProofQuery {
    pub student_id: String,
    pub course: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub block_index: u64,
    pub tx_index: usize,
}

/// Answer to an artifact that does not parse as a certificate proof.
#[derive(Serialize)]
pub struct RejectedProofResponse {
    pub valid: bool,
    pub error: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
