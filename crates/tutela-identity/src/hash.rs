use sha2::{Digest, Sha256};

/// One-way hash of a sensitive identifier for transmission.
///
/// Registry lookups never carry the raw CPF over the wire; they carry its
/// SHA-256 digest, hex-encoded. Fixed algorithm so both ends agree.
pub fn hash_identifier(identifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identifier.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_identifier("52998224725"), hash_identifier("52998224725"));
        assert_ne!(hash_identifier("52998224725"), hash_identifier("11144477735"));
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let digest = hash_identifier("52998224725");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
