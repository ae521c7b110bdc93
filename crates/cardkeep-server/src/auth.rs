// SPDX-License-Identifier: Apache-2.0

//! Session tokens and password digests. A session token is
//! `base64(payload).base64(hmac)` over a JSON claims payload, carried in an
//! HttpOnly cookie. Passwords are HMAC-SHA-256 digests keyed by a per-user
//! random salt.

use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use cardkeep_model::UserId;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter, Write as _};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    Missing,
    Malformed,
    BadSignature,
    Expired,
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("no session token"),
            Self::Malformed => f.write_str("malformed session token"),
            Self::BadSignature => f.write_str("session token signature mismatch"),
            Self::Expired => f.write_str("session token expired"),
        }
    }
}

impl std::error::Error for AuthError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthClaims {
    pub user_id: UserId,
    pub username: String,
    pub exp: u64,
}

pub fn sign_session(claims: &AuthClaims, secret: &[u8]) -> Result<String, AuthError> {
    let payload_bytes = serde_json::to_vec(claims).map_err(|_| AuthError::Malformed)?;
    let payload_part = URL_SAFE_NO_PAD.encode(payload_bytes);
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| AuthError::Malformed)?;
    mac.update(payload_part.as_bytes());
    let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{payload_part}.{sig_part}"))
}

pub fn verify_session(token: &str, secret: &[u8], now: u64) -> Result<AuthClaims, AuthError> {
    let (payload_part, sig_part) = token.split_once('.').ok_or(AuthError::Malformed)?;

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| AuthError::Malformed)?;
    mac.update(payload_part.as_bytes());
    let expected = URL_SAFE_NO_PAD
        .decode(sig_part)
        .map_err(|_| AuthError::Malformed)?;
    mac.verify_slice(&expected)
        .map_err(|_| AuthError::BadSignature)?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_part)
        .map_err(|_| AuthError::Malformed)?;
    let claims: AuthClaims =
        serde_json::from_slice(&payload_bytes).map_err(|_| AuthError::Malformed)?;

    if claims.exp <= now {
        return Err(AuthError::Expired);
    }
    Ok(claims)
}

/// Extracts a named cookie from the request headers. Multiple `Cookie`
/// headers and `; `-joined pairs are both handled.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all("cookie") {
        let raw = header.to_str().ok()?;
        for pair in raw.split(';') {
            let pair = pair.trim();
            if let Some((k, v)) = pair.split_once('=') {
                if k == name {
                    return Some(v.to_string());
                }
            }
        }
    }
    None
}

#[must_use]
pub fn session_cookie(name: &str, token: &str, max_age_secs: u64) -> String {
    format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

#[must_use]
pub fn clear_session_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Salted password digest. The salt doubles as the HMAC key, so equal
/// passwords under different salts never share a digest.
#[must_use]
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(salt.as_bytes()) {
        Ok(mac) => mac,
        // HMAC accepts any key length; unreachable in practice.
        Err(_) => return String::new(),
    };
    mac.update(password.as_bytes());
    hex_encode(&mac.finalize().into_bytes())
}

#[must_use]
pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    // Both sides are fixed-length hex of a MAC; direct comparison does not
    // leak anything useful about the password.
    hash_password(password, salt) == expected_hash
}

/// Fresh salt (or reset token) material: hex of a SHA-256 over wall clock
/// nanos and a process-wide counter.
#[must_use]
pub fn random_token() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut hasher = Sha256::new();
    hasher.update(nanos.to_le_bytes());
    hasher.update(seq.to_le_bytes());
    hex_encode(&hasher.finalize())
}
