//! Access token generation and normalization.
//!
//! Tokens look like `KITCH-AB23CD`: a fixed prefix followed by six
//! characters from an alphabet without the easily confused `I`, `O`, `0`
//! and `1`. A token doubles as username and password, so it is never
//! logged verbatim; use [`fingerprint`] instead.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Prefix shared by every access token.
pub const TOKEN_PREFIX: &str = "KITCH";

/// Number of random characters after the prefix.
pub const CODE_LENGTH: usize = 6;

/// 32 characters: uppercase letters and digits minus I, O, 0, 1.
pub const TOKEN_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generates a new token from the thread-local RNG.
pub fn generate_token() -> String {
    generate_token_with(&mut rand::rng())
}

/// Generates a new token from the given random source.
pub fn generate_token_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let code: String = (0..CODE_LENGTH)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", TOKEN_PREFIX, code)
}

/// Canonical form of a user-supplied token: trimmed and uppercased.
pub fn normalize_token(token: &str) -> String {
    token.trim().to_ascii_uppercase()
}

/// Returns true if a normalized token has the `KITCH-XXXXXX` shape.
pub fn is_well_formed(token: &str) -> bool {
    let Some(code) = token
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };

    code.len() == CODE_LENGTH && code.bytes().all(|b| TOKEN_ALPHABET.contains(&b))
}

/// Short, stable, non-reversible identifier for a token, safe for logs.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
}
