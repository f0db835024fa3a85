//! Password hashing and token-based request authentication.
//!
//! Passwords are stored as `salt$digest` where both halves are lowercase
//! hex and the digest is SHA-256 over salt bytes followed by the password.
//! API tokens are opaque 32-byte random strings; the `Authorization: Token
//! <key>` scheme matches what existing clients already send.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::db::User;
use crate::http::{ApiError, AppState};

const SALT_LEN: usize = 16;

// ─── Passwords ────────────────────────────────────────────────────────────────

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    format!("{}${}", hex(&salt), digest(&salt, password))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, expected)) = stored.split_once('$') else {
        return false;
    };
    let Some(salt) = unhex(salt_hex) else {
        return false;
    };
    digest(&salt, password) == expected
}

fn digest(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex(&hasher.finalize())
}

// ─── Tokens ───────────────────────────────────────────────────────────────────

pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex(&bytes)
}

/// Authenticated caller, resolved from the `Authorization: Token <key>`
/// header. Keeps the raw token around so logout can revoke exactly the
/// credential that was presented.
pub struct AuthUser {
    pub user:  User,
    pub token: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header = parts.headers.get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Auth)?;
        let token = header.strip_prefix("Token ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Auth)?;

        let user = state.db.user_by_token(token).await
            .map_err(ApiError::Internal)?
            .ok_or(ApiError::Auth)?;

        Ok(AuthUser { user, token: token.to_owned() })
    }
}

// ─── Hex helpers ─────────────────────────────────────────────────────────────

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn unhex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len()).step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let stored = hash_password("correct horse");
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-stored-hash"));
        assert!(!verify_password("anything", "zzzz$deadbeef"));
    }

    #[test]
    fn tokens_are_64_hex_chars() {
        let t = generate_token();
        assert_eq!(t.len(), 64);
        assert!(t.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
