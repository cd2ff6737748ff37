//! Password hashing.
//!
//! Hashes are unsalted lowercase hex SHA-256 digests, which is what existing
//! admin documents contain. Comparison is plain equality.

use sha2::{Digest, Sha256};

/// Hash of the password `admin`, used until an admin document sets one.
pub const DEFAULT_PASSWORD_HASH: &str =
    "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918";

/// Minimum length accepted for a new password.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn verify_password(candidate: &str, stored_hash: &str) -> bool {
    hash_password(candidate) == stored_hash
}
