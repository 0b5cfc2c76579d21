use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::dto::PublicUser;

/// User document stored under `users/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(skip)]
    pub id: String,                   // document id, not part of the body
    pub email: String,
    pub username: String,
    pub password_hash: String,        // Argon2 hash, never sent to clients
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
        }
    }
}
