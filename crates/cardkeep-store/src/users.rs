// SPDX-License-Identifier: Apache-2.0

use crate::{new_entity_id, unix_seconds, Store, StoreError};
use cardkeep_model::{User, UserId};
use rusqlite::{params, OptionalExtension};

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_raw: String = row.get(0)?;
    Ok(User {
        id: UserId::parse(&id_raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        password_salt: row.get(4)?,
    })
}

const USER_COLUMNS: &str = "id, username, email, password_hash, password_salt";

impl Store {
    /// Creates an account. Username and email are unique; a collision on
    /// either surfaces as [`StoreError::Duplicate`].
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        password_salt: &str,
    ) -> Result<User, StoreError> {
        if username.trim().is_empty() || email.trim().is_empty() {
            return Err(StoreError::Invalid(
                "username and email must not be empty".to_string(),
            ));
        }
        let id = UserId::parse(&new_entity_id("u"))
            .map_err(|e| StoreError::Invalid(e.to_string()))?;
        let conn = self.conn()?;
        let result = conn.execute(
            "INSERT INTO users (id, username, email, password_hash, password_salt, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.as_str(),
                username,
                email,
                password_hash,
                password_salt,
                unix_seconds() as i64
            ],
        );
        match result {
            Ok(_) => Ok(User {
                id,
                username: username.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                password_salt: password_salt.to_string(),
            }),
            Err(rusqlite::Error::SqliteFailure(e, msg))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                tracing::debug!(error = ?msg, "user insert hit unique constraint");
                Err(StoreError::Duplicate("username or email"))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        Ok(conn
            .query_row(&sql, params![id.as_str()], user_from_row)
            .optional()?)
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
        Ok(conn
            .query_row(&sql, params![username], user_from_row)
            .optional()?)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        Ok(conn
            .query_row(&sql, params![email], user_from_row)
            .optional()?)
    }

    pub fn update_password(
        &self,
        id: &UserId,
        password_hash: &str,
        password_salt: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE users SET password_hash = ?1, password_salt = ?2 WHERE id = ?3",
            params![password_hash, password_salt, id.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("user"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_look_up_by_username_and_email() {
        let store = Store::open_in_memory().expect("open");
        let user = store
            .create_user("kami", "kami@lookout.example", "hash", "salt")
            .expect("create");
        let by_name = store
            .find_user_by_username("kami")
            .expect("query")
            .expect("found");
        assert_eq!(by_name, user);
        let by_email = store
            .find_user_by_email("kami@lookout.example")
            .expect("query")
            .expect("found");
        assert_eq!(by_email.id, user.id);
        assert!(store
            .find_user_by_username("piccolo")
            .expect("query")
            .is_none());
    }

    #[test]
    fn duplicate_username_or_email_is_rejected() {
        let store = Store::open_in_memory().expect("open");
        store
            .create_user("kami", "kami@lookout.example", "h", "s")
            .expect("create");
        assert!(matches!(
            store.create_user("kami", "other@lookout.example", "h", "s"),
            Err(StoreError::Duplicate(_))
        ));
        assert!(matches!(
            store.create_user("other", "kami@lookout.example", "h", "s"),
            Err(StoreError::Duplicate(_))
        ));
    }

    #[test]
    fn update_password_replaces_hash_and_salt() {
        let store = Store::open_in_memory().expect("open");
        let user = store
            .create_user("kami", "kami@lookout.example", "old-hash", "old-salt")
            .expect("create");
        store
            .update_password(&user.id, "new-hash", "new-salt")
            .expect("update");
        let reloaded = store.get_user(&user.id).expect("query").expect("found");
        assert_eq!(reloaded.password_hash, "new-hash");
        assert_eq!(reloaded.password_salt, "new-salt");

        let ghost = UserId::parse("u-missing").expect("id");
        assert!(matches!(
            store.update_password(&ghost, "h", "s"),
            Err(StoreError::NotFound("user"))
        ));
    }
}
