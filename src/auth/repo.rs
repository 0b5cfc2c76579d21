use crate::auth::repo_types::User;
use crate::store::{Document, DocumentStore, Filter};
use serde_json::json;
use time::OffsetDateTime;

pub const USERS: &str = "users";

fn from_document(doc: Document) -> anyhow::Result<User> {
    let mut user: User = doc.decode()?;
    user.id = doc.id;
    Ok(user)
}

impl User {
    async fn find_one(
        store: &dyn DocumentStore,
        field: &str,
        value: &str,
    ) -> anyhow::Result<Option<User>> {
        let docs = store
            .query(USERS, &[Filter::eq(field, value)], Some(1))
            .await?;
        docs.into_iter().next().map(from_document).transpose()
    }

    /// Find a user by email.
    pub async fn find_by_email(store: &dyn DocumentStore, email: &str) -> anyhow::Result<Option<User>> {
        Self::find_one(store, "email", email).await
    }

    pub async fn find_by_username(
        store: &dyn DocumentStore,
        username: &str,
    ) -> anyhow::Result<Option<User>> {
        Self::find_one(store, "username", username).await
    }

    pub async fn find_by_id(store: &dyn DocumentStore, id: &str) -> anyhow::Result<Option<User>> {
        store.get(USERS, id).await?.map(from_document).transpose()
    }

    /// Create a new user with hashed password.
    pub async fn create(
        store: &dyn DocumentStore,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let mut user = User {
            id: String::new(),
            email: email.to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        user.id = store.add(USERS, serde_json::to_value(&user)?).await?;
        Ok(user)
    }

    /// Merge-writes the username, leaving the rest of the profile untouched.
    pub async fn update_username(
        store: &dyn DocumentStore,
        id: &str,
        username: &str,
    ) -> anyhow::Result<()> {
        store.merge(USERS, id, json!({ "username": username })).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn create_then_lookup_by_each_key() {
        let store = MemoryStore::new();
        let created = User::create(&store, "ana@fit.io", "ana123", "hash").await.unwrap();
        assert!(!created.id.is_empty());

        let by_email = User::find_by_email(&store, "ana@fit.io").await.unwrap().unwrap();
        let by_name = User::find_by_username(&store, "ana123").await.unwrap().unwrap();
        let by_id = User::find_by_id(&store, &created.id).await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_name.id, created.id);
        assert_eq!(by_id.email, "ana@fit.io");
        assert!(User::find_by_email(&store, "nobody@fit.io").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_username_keeps_password_hash() {
        let store = MemoryStore::new();
        let created = User::create(&store, "ben@fit.io", "ben123", "hash").await.unwrap();
        User::update_username(&store, &created.id, "benji").await.unwrap();
        let user = User::find_by_id(&store, &created.id).await.unwrap().unwrap();
        assert_eq!(user.username, "benji");
        assert_eq!(user.password_hash, "hash");
    }
}
