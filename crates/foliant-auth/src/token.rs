//! Token generation, hashing, and constant-time verification.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Random bytes per token (256 bits of entropy).
const SECURE_TOKEN_BYTES: usize = 32;

/// A freshly minted token: the plaintext to hand out once, and the hash to
/// persist.
#[derive(Debug, Clone)]
pub struct MintedToken {
    /// Plaintext token. Returned to the caller exactly once; never stored.
    pub token: String,
    /// SHA-256 hex hash for database storage.
    pub token_hash: String,
}

impl MintedToken {
    /// Mint a new random token.
    #[must_use]
    pub fn mint() -> Self {
        let token = generate_secure_token();
        let token_hash = hash_token(&token);
        Self { token, token_hash }
    }
}

/// Generate a cryptographically secure token.
///
/// Returns a URL-safe base64 string of 32 random bytes (43 characters).
///
/// SECURITY: Uses `OsRng` directly from the operating system's CSPRNG.
#[must_use]
pub fn generate_secure_token() -> String {
    use rand::rngs::OsRng;
    let mut bytes = [0u8; SECURE_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hash of a token, hex-encoded.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a presented token against a stored hash in constant time.
///
/// Hashing the presented value first means both compared strings have fixed
/// length, so the comparison leaks nothing about where a mismatch occurs.
#[must_use]
pub fn verify_token_hash(presented_token: &str, stored_hash: &str) -> bool {
    let computed = hash_token(presented_token);
    constant_time_eq(computed.as_bytes(), stored_hash.as_bytes())
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_length_and_charset() {
        let token = generate_secure_token();
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(generate_secure_token(), generate_secure_token());
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = hash_token("abc");
        assert_eq!(hash.len(), 64);
        // Known SHA-256 of "abc"
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify_accepts_matching_token() {
        let minted = MintedToken::mint();
        assert!(verify_token_hash(&minted.token, &minted.token_hash));
    }

    #[test]
    fn test_verify_rejects_wrong_token() {
        let minted = MintedToken::mint();
        assert!(!verify_token_hash("not-the-token", &minted.token_hash));
    }

    #[test]
    fn test_constant_time_eq_length_mismatch() {
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
