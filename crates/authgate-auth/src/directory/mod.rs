//! Directory service (LDAP-style) collaborator.
//!
//! The protocol client itself lives outside this crate; authenticators only
//! see the [`DirectoryClient`] contract.

pub mod sync;

use async_trait::async_trait;

use authgate_core::AppResult;

pub use sync::DirectorySync;

/// A user entry as returned by the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl DirectoryEntry {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: None,
            email: None,
        }
    }
}

/// Directory lookups and credential binds.
#[async_trait]
pub trait DirectoryClient: Send + Sync + std::fmt::Debug + 'static {
    /// Looks up a user by login name.
    async fn lookup(&self, username: &str) -> AppResult<Option<DirectoryEntry>>;

    /// Binds as the user. `Ok(false)` means the credentials were rejected.
    async fn bind(&self, username: &str, password: &str) -> AppResult<bool>;

    /// Lists every user below the configured base.
    async fn list_users(&self) -> AppResult<Vec<DirectoryEntry>>;
}
