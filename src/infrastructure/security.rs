use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the UTF-8 password bytes.
///
/// The stored procedures compare this value for equality against the stored
/// credential, so the digest must stay unsalted and deterministic.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}
