// SPDX-License-Identifier: Apache-2.0

//! Password reset tokens. Only a SHA-256 digest of the token is stored;
//! the cleartext travels once, in the reset email link.

use crate::{Store, StoreError};
use cardkeep_model::UserId;
use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Digest used both when storing and when looking up a token.
#[must_use]
pub fn hash_reset_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

impl Store {
    /// Records a reset token for a user. Issuing a new token replaces
    /// nothing; multiple outstanding tokens are allowed and each expires
    /// independently.
    pub fn create_reset_token(
        &self,
        user_id: &UserId,
        token_hash: &str,
        expires_at: u64,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO reset_tokens (token_hash, user_id, expires_at) \
             VALUES (?1, ?2, ?3)",
            params![token_hash, user_id.as_str(), expires_at as i64],
        )?;
        Ok(())
    }

    /// Checks a token without consuming it. Used by the reset form page.
    pub fn peek_reset_token(
        &self,
        token_hash: &str,
        now: u64,
    ) -> Result<Option<UserId>, StoreError> {
        let conn = self.conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT user_id FROM reset_tokens WHERE token_hash = ?1 AND expires_at > ?2",
                params![token_hash, now as i64],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(id) => Ok(Some(
                UserId::parse(&id).map_err(|e| StoreError::Invalid(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    /// Consumes a live token, returning its user. The row is deleted on a
    /// hit; a second call with the same token misses. Check and delete run
    /// under one connection guard so concurrent consumers cannot both see
    /// the row live. Expired rows are purged opportunistically on every
    /// call.
    pub fn consume_reset_token(
        &self,
        token_hash: &str,
        now: u64,
    ) -> Result<Option<UserId>, StoreError> {
        let conn = self.conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT user_id FROM reset_tokens WHERE token_hash = ?1 AND expires_at > ?2",
                params![token_hash, now as i64],
                |row| row.get(0),
            )
            .optional()?;
        let user = match raw {
            Some(id) => {
                conn.execute(
                    "DELETE FROM reset_tokens WHERE token_hash = ?1",
                    params![token_hash],
                )?;
                Some(UserId::parse(&id).map_err(|e| StoreError::Invalid(e.to_string()))?)
            }
            None => None,
        };
        let purged = conn.execute(
            "DELETE FROM reset_tokens WHERE expires_at <= ?1",
            params![now as i64],
        )?;
        if purged > 0 {
            tracing::debug!(purged, "dropped expired reset tokens");
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::parse("u-test").expect("user id")
    }

    #[test]
    fn token_digest_is_stable_hex() {
        let a = hash_reset_token("secret");
        assert_eq!(a.len(), 64);
        assert_eq!(a, hash_reset_token("secret"));
        assert_ne!(a, hash_reset_token("Secret"));
    }

    #[test]
    fn consume_is_single_use() {
        let store = Store::open_in_memory().expect("open");
        let hash = hash_reset_token("tok");
        store.create_reset_token(&user(), &hash, 100).expect("create");
        assert_eq!(
            store.consume_reset_token(&hash, 50).expect("consume"),
            Some(user())
        );
        assert_eq!(store.consume_reset_token(&hash, 50).expect("again"), None);
    }

    #[test]
    fn concurrent_consumers_get_exactly_one_hit() {
        let store = Store::open_in_memory().expect("open");
        let hash = hash_reset_token("tok");
        store.create_reset_token(&user(), &hash, 100).expect("create");
        let hits: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        store
                            .consume_reset_token(&hash, 50)
                            .expect("consume")
                            .is_some()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("join consumer"))
                .collect()
        });
        assert_eq!(hits.iter().filter(|hit| **hit).count(), 1);
    }

    #[test]
    fn expired_tokens_never_match_and_get_purged() {
        let store = Store::open_in_memory().expect("open");
        let hash = hash_reset_token("tok");
        store.create_reset_token(&user(), &hash, 100).expect("create");
        assert_eq!(store.peek_reset_token(&hash, 100).expect("peek"), None);
        assert_eq!(store.consume_reset_token(&hash, 100).expect("consume"), None);
        // The expired row is gone even for an earlier clock.
        assert_eq!(store.peek_reset_token(&hash, 50).expect("peek"), None);
    }

    #[test]
    fn multiple_outstanding_tokens_expire_independently() {
        let store = Store::open_in_memory().expect("open");
        let first = hash_reset_token("first");
        let second = hash_reset_token("second");
        store.create_reset_token(&user(), &first, 100).expect("create");
        store.create_reset_token(&user(), &second, 200).expect("create");
        assert_eq!(
            store.consume_reset_token(&second, 150).expect("consume"),
            Some(user())
        );
        // `first` expired at 100 and was purged by the call above.
        assert_eq!(store.peek_reset_token(&first, 50).expect("peek"), None);
    }
}
