//! Opaque bearer tokens.
//!
//! A token is 32 bytes from the operating system's RNG, hex-encoded. Only the SHA-256
//! digest of a token is persisted; the plain value exists solely in the response that
//! issued it and in the client's subsequent `Authorization` headers.

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// Generates a new random token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest of `token` as stored in `access_tokens.token_hash`.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
