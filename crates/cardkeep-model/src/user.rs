// SPDX-License-Identifier: Apache-2.0

use crate::ids::UserId;
use serde::{Deserialize, Serialize};

/// A registered account. The password is stored as a salted HMAC-SHA-256
/// digest; the cleartext never leaves the login/register handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
}
