pub mod canonical;
pub mod digest;

pub use canonical::{encode_value, to_canonical_bytes};
pub use digest::{hash_pair, sha256_hex};
