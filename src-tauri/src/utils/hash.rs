use sha2::{Digest, Sha256};

/// Dedup key for clipboard text. Byte-exact: whitespace and order matter.
pub fn fingerprint(content: &str) -> String {
    sha256_hex(content.as_bytes())
}

pub fn sha256_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    format!("{:x}", hasher.finalize())
}
