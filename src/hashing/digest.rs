use sha2::{Digest, Sha256};

/// SHA-256 of `bytes` as a lowercase hex string (64 chars).
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Hash of an interior Merkle node.
/// Children are concatenated as hex text, not as raw digest bytes.
pub fn hash_pair(left: &str, right: &str) -> String {
    let mut preimage = String::with_capacity(left.len() + right.len());
    preimage.push_str(left);
    preimage.push_str(right);
    sha256_hex(preimage.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_known_vector() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn digest_is_lowercase_hex_of_fixed_length() {
        let h = sha256_hex(b"abc");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(
            h,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn pair_hash_is_over_hex_text() {
        let a = sha256_hex(b"a");
        let b = sha256_hex(b"b");
        assert_eq!(hash_pair(&a, &b), sha256_hex(format!("{a}{b}").as_bytes()));
        assert_ne!(hash_pair(&a, &b), hash_pair(&b, &a));
    }
}
