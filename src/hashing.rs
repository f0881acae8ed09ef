use sha2::{Digest, Sha256};

/// Stable 64-bit hash of a string.
///
/// Derived from SHA-256 so the value is identical across runs, processes and
/// toolchains. Used wherever a deterministic "random" choice is needed
/// (placeholder colors, synthetic ratings and years).
pub fn stable_hash(input: &str) -> u64 {
    let digest = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Maps a string onto `0..bound` via [`stable_hash`]
pub fn stable_index(input: &str, bound: usize) -> usize {
    if bound == 0 {
        return 0;
    }
    (stable_hash(input) % bound as u64) as usize
}

/// Hex-encoded SHA-256 digest
pub fn sha256_hex(input: &str) -> String {
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_hash_is_deterministic() {
        assert_eq!(stable_hash("the hobbit"), stable_hash("the hobbit"));
        assert_ne!(stable_hash("the hobbit"), stable_hash("the silmarillion"));
    }

    #[test]
    fn test_stable_hash_known_value() {
        // First eight bytes of SHA-256("abc") = ba7816bf8f01cfea
        assert_eq!(stable_hash("abc"), 0xba7816bf8f01cfea);
    }

    #[test]
    fn test_stable_index_bounds() {
        for title in ["a", "b", "Dune", "Gitanjali", ""] {
            assert!(stable_index(title, 12) < 12);
        }
        assert_eq!(stable_index("anything", 0), 0);
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
