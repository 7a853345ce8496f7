//! Persisted user-record store contract.

use async_trait::async_trait;

use authgate_core::AppResult;

use crate::identity::{AuthSource, Identity};

/// Storage for user records, consulted to resolve login candidates.
///
/// Implementations must tolerate concurrent calls from independent requests.
/// A missing record is `Ok(None)`; every `Err` is a backend failure.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug + 'static {
    /// Looks up a user by login name.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Identity>>;

    /// Registers a new user. Fails with a conflict error if the name is taken.
    async fn add_user(&self, identity: &Identity) -> AppResult<()>;

    /// Removes a user. Returns `true` if a record was deleted.
    async fn delete_user(&self, username: &str) -> AppResult<bool>;

    /// Lists users that were registered by the given authenticator.
    async fn list_by_source(&self, source: AuthSource) -> AppResult<Vec<Identity>>;
}
