//! Salted password digests for administrator and branch accounts
//!
//! Stored form is `<salt>$<hex sha256(salt || password)>`. Rows written by
//! older releases hold the password itself; those still verify and are
//! flagged by [`needs_rehash`] so callers can upgrade them.

use sha2::{Digest, Sha256};
use uuid::Uuid;

const SEPARATOR: char = '$';

/// Hashes a password with a fresh random salt
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}{}{}", salt, SEPARATOR, digest(&salt, password))
}

/// Checks a password against a stored value
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once(SEPARATOR) {
        Some((salt, expected)) => {
            constant_time_eq(digest(salt, password).as_bytes(), expected.as_bytes())
        }
        None => constant_time_eq(password.as_bytes(), stored.as_bytes()),
    }
}

/// True when the stored value is a legacy plain-text password
pub fn needs_rehash(stored: &str) -> bool {
    !stored.contains(SEPARATOR)
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("correct horse");
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
        assert!(!needs_rehash(&stored));
    }

    #[test]
    fn test_digest_is_lowercase_hex_sha256() {
        // sha256("saltpassword")
        assert_eq!(
            digest("salt", "password"),
            "13601bda4ea78e55a07b98866d2be6be0744e3866f13c00c811cab608a28f322"
        );
        let stored = hash_password("pw");
        let (_, hex_part) = stored.split_once('$').unwrap();
        assert_eq!(hex_part.len(), 64);
        assert!(hex::decode(hex_part).is_ok());
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn test_legacy_plain_text() {
        assert!(verify_password("oldpassword", "oldpassword"));
        assert!(!verify_password("oldpassword1", "oldpassword"));
        assert!(needs_rehash("oldpassword"));
    }
}
