//! Refresh token secrets
//!
//! A refresh secret is an opaque printable string handed to the
//! client exactly once. The server stores only its SHA-256 digest,
//! which doubles as the lookup key. A fast hash is correct here,
//! unlike password hashing: the input is 48 CSPRNG bytes, so there is
//! no guessable preimage to stretch against.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Raw secret length in bytes before encoding.
const SECRET_BYTES: usize = 48;

/// Generate a fresh refresh secret: 48 bytes from the OS CSPRNG,
/// base64url-encoded (64 printable characters).
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// One-way digest of a raw secret, used as the store lookup key.
/// Deterministic: same input, same output.
pub fn digest(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
