use sha3::{Digest, Keccak256};

/// Keccak256 of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Decodes hex with an optional `0x` prefix.
pub fn decode_hex(value: &str) -> Option<Vec<u8>> {
    let trimmed = value.trim();
    let raw = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak256_matches_empty_string_vector() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn keccak256_matches_abc_vector() {
        assert_eq!(
            hex::encode(keccak256(b"abc")),
            "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn decode_hex_accepts_optional_prefix() {
        assert_eq!(decode_hex("0x0a0b"), Some(vec![0x0a, 0x0b]));
        assert_eq!(decode_hex("0a0b"), Some(vec![0x0a, 0x0b]));
        assert_eq!(decode_hex("0xzz"), None);
        assert_eq!(decode_hex("0x123"), None);
    }
}
