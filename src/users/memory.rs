use std::sync::Mutex;

use async_trait::async_trait;

use super::{StoreError, User, UserStore};

/// In-process store for tests; ids count up from 1 like a serial column.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn remove(&self, id: i64) {
        self.users.lock().unwrap().retain(|u| u.id != id);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(
        &self,
        email: &str,
        full_name: Option<&str>,
        hashed_password: &str,
    ) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let user = User {
            id,
            email: email.to_string(),
            full_name: full_name.map(String::from),
            hashed_password: hashed_password.to_string(),
            is_active: true,
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_find() {
        let store = MemoryUserStore::new();
        let user = store
            .create("a@x.com", Some("Alice"), "hash")
            .await
            .expect("create");
        assert_eq!(user.id, 1);
        assert!(user.is_active);

        let by_email = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        let by_id = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.full_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let store = MemoryUserStore::new();
        store.create("a@x.com", None, "hash").await.unwrap();
        assert!(store.find_by_email("A@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_leaves_no_second_record() {
        let store = MemoryUserStore::new();
        store.create("a@x.com", None, "hash").await.unwrap();
        let err = store.create("a@x.com", None, "other").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
        assert_eq!(store.count(), 1);
    }
}
