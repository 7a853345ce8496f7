//! In-process user store backed by `DashMap`.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use authgate_core::{AppError, AppResult};

use crate::identity::{AuthSource, Identity};

use super::store::UserStore;

/// Thread-safe user store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: DashMap<String, Identity>,
}

impl MemoryUserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Identity>> {
        Ok(self.users.get(username).map(|entry| entry.value().clone()))
    }

    async fn add_user(&self, identity: &Identity) -> AppResult<()> {
        match self.users.entry(identity.username().to_string()) {
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "User '{}' already exists",
                identity.username()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(identity.clone());
                Ok(())
            }
        }
    }

    async fn delete_user(&self, username: &str) -> AppResult<bool> {
        Ok(self.users.remove(username).is_some())
    }

    async fn list_by_source(&self, source: AuthSource) -> AppResult<Vec<Identity>> {
        Ok(self
            .users
            .iter()
            .filter(|entry| entry.auth_source() == source)
            .map(|entry| entry.value().clone())
            .collect())
    }
}
