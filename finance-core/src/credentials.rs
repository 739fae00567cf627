//! Salted, stretched hashing for passwords and security answers.
//!
//! Stored form: `<salt-hex>$<digest-hex>`, where the digest is SHA-256 over
//! `salt || secret`, re-hashed [`STRETCH_ROUNDS`] times.

use rand::RngCore;
use sha2::{Digest, Sha256};

pub const SALT_LEN: usize = 16;
pub const STRETCH_ROUNDS: u32 = 10_000;

const SEPARATOR: char = '$';

/// Hashes `secret` with a fresh random salt.
pub fn hash_secret(secret: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    hash_with_salt(secret, &salt)
}

/// Checks `secret` against a value produced by [`hash_secret`].
/// Malformed stored values never verify.
pub fn verify_secret(
    secret: &str,
    stored: &str,
) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once(SEPARATOR) else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
        return false;
    };
    if salt.is_empty() {
        return false;
    }
    constant_time_eq(&stretch(secret, &salt), &expected)
}

fn hash_with_salt(
    secret: &str,
    salt: &[u8],
) -> String {
    format!(
        "{}{SEPARATOR}{}",
        hex::encode(salt),
        hex::encode(stretch(secret, salt))
    )
}

fn stretch(
    secret: &str,
    salt: &[u8],
) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(secret.as_bytes());
    let mut digest = hasher.finalize();

    for _ in 1..STRETCH_ROUNDS {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(digest);
        digest = hasher.finalize();
    }

    digest.to_vec()
}

fn constant_time_eq(
    a: &[u8],
    b: &[u8],
) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
