//! Login by binding against a directory service.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use authgate_core::AppResult;
use authgate_core::config::LdapConfig;
use authgate_core::error::ErrorKind;

use crate::directory::{DirectoryClient, DirectoryEntry};
use crate::error::AuthError;
use crate::exchange::Exchange;
use crate::identity::{AuthMode, AuthSource, Identity};
use crate::user::UserStore;

use super::{Authenticator, InitContext, Initialize, PASSWORD_FIELD, USERNAME_FIELD};

const INVALID_CREDENTIALS: &str = "invalid username or password";

/// Outcome of one [`DirectoryAuthenticator::sync_users`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub removed: usize,
}

/// Authenticates directory users and mirrors them into the user store.
#[derive(Debug, Clone)]
pub struct DirectoryAuthenticator {
    client: Arc<dyn DirectoryClient>,
    users: Arc<dyn UserStore>,
    config: LdapConfig,
}

impl DirectoryAuthenticator {
    pub fn new(
        client: Arc<dyn DirectoryClient>,
        users: Arc<dyn UserStore>,
        config: LdapConfig,
    ) -> Self {
        Self {
            client,
            users,
            config,
        }
    }

    pub fn config(&self) -> &LdapConfig {
        &self.config
    }

    fn identity_for(&self, entry: &DirectoryEntry) -> Identity {
        Identity::builder(&entry.username, AuthMode::Session, AuthSource::Directory)
            .display_name(entry.display_name.clone())
            .email(entry.email.clone())
            .roles(self.config.default_roles.clone())
            .build()
    }

    /// Adds directory users missing from the store and, when configured,
    /// removes directory-sourced users that left the directory.
    pub async fn sync_users(&self) -> AppResult<SyncReport> {
        let entries = self.client.list_users().await?;
        let mut report = SyncReport::default();

        for entry in &entries {
            if self.users.find_by_username(&entry.username).await?.is_some() {
                continue;
            }
            match self.users.add_user(&self.identity_for(entry)).await {
                Ok(()) => report.added += 1,
                Err(e) if e.kind == ErrorKind::Conflict => {
                    debug!(username = %entry.username, "User appeared concurrently during sync");
                }
                Err(e) => return Err(e),
            }
        }

        if self.config.sync_delete_stale_users {
            let present: HashSet<&str> = entries.iter().map(|e| e.username.as_str()).collect();
            for user in self.users.list_by_source(AuthSource::Directory).await? {
                if !present.contains(user.username()) && self.users.delete_user(user.username()).await? {
                    info!(username = %user.username(), "Removed user no longer in directory");
                    report.removed += 1;
                }
            }
        }

        Ok(report)
    }
}

impl Initialize for DirectoryAuthenticator {
    type Config = LdapConfig;

    fn initialize(ctx: &InitContext, config: &LdapConfig) -> Result<Self, AuthError> {
        if config.url.is_empty() {
            error!("Directory authenticator needs 'url'");
            return Err(AuthError::init_failed("ldap"));
        }
        let Some(client) = ctx.directory.clone() else {
            error!(url = %config.url, "No directory client available for 'ldap'");
            return Err(AuthError::init_failed("ldap"));
        };
        Ok(Self::new(client, Arc::clone(&ctx.users), config.clone()))
    }
}

#[async_trait]
impl Authenticator for DirectoryAuthenticator {
    fn name(&self) -> &'static str {
        "ldap"
    }

    async fn can_handle(&self, candidate: Option<&Identity>, exchange: &Exchange) -> bool {
        if let Some(candidate) = candidate {
            return candidate.auth_source() == AuthSource::Directory;
        }
        if !self.config.sync_user_on_login {
            return false;
        }
        let Some(username) = exchange.form_value(USERNAME_FIELD) else {
            return false;
        };

        match self.client.lookup(username).await {
            Ok(entry) => entry.is_some(),
            Err(e) => {
                warn!(username = %username, error = %e, "Directory lookup failed");
                false
            }
        }
    }

    async fn attempt_login(
        &self,
        candidate: Option<&Identity>,
        exchange: &mut Exchange,
    ) -> Result<Identity, AuthError> {
        let username = candidate
            .map(Identity::username)
            .or_else(|| exchange.form_value(USERNAME_FIELD))
            .ok_or_else(|| AuthError::login_failed(INVALID_CREDENTIALS))?;
        let password = exchange
            .form_value(PASSWORD_FIELD)
            .ok_or_else(|| AuthError::login_failed(INVALID_CREDENTIALS))?;

        match self.client.bind(username, password).await {
            Ok(true) => {}
            Ok(false) => return Err(AuthError::login_failed(INVALID_CREDENTIALS)),
            Err(e) => {
                error!(username = %username, error = %e, "Directory bind failed");
                return Err(AuthError::login_failed("directory unavailable"));
            }
        }

        if let Some(candidate) = candidate {
            return Ok(candidate.reissue(AuthMode::Session, AuthSource::Directory));
        }

        let entry = self.client.lookup(username).await.map_err(|e| {
            error!(username = %username, error = %e, "Directory lookup failed");
            AuthError::login_failed("directory unavailable")
        })?;
        let entry = entry.ok_or_else(|| AuthError::login_failed(INVALID_CREDENTIALS))?;
        Ok(self.identity_for(&entry))
    }
}
