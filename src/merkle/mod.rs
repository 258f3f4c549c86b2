pub mod proof;
pub mod tree;

pub use proof::{MerkleProof, ProofStep, Side, verify};
pub use tree::{MerkleTree, merkle_proof, merkle_root};
