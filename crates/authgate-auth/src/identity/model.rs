//! Authenticated identity model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::Role;

/// How a request obtained its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Stateless token presented with the request.
    Token,
    /// Signed session cookie.
    Session,
}

/// Which authenticator produced an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthSource {
    /// Password checked against the local credential.
    LocalPassword,
    /// Credentials checked against the directory.
    Directory,
    /// Signed token.
    Token,
    /// Rebuilt from a session cookie without re-deriving provenance.
    Unknown,
}

impl fmt::Display for AuthSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthSource::LocalPassword => write!(f, "local_password"),
            AuthSource::Directory => write!(f, "directory"),
            AuthSource::Token => write!(f, "token"),
            AuthSource::Unknown => write!(f, "unknown"),
        }
    }
}

/// An authenticated principal.
///
/// Identities are immutable: roles and projects are fixed at construction and
/// a re-authentication produces a new value. `auth_mode` and `auth_source` are
/// set by whichever component builds the identity and never change afterwards.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    username: String,
    #[serde(skip_serializing, default)]
    credential_ref: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    projects: Vec<String>,
    auth_mode: AuthMode,
    auth_source: AuthSource,
    #[serde(default)]
    expiration: Option<DateTime<Utc>>,
}

impl Identity {
    /// Starts building an identity for `username`.
    pub fn builder(
        username: impl Into<String>,
        auth_mode: AuthMode,
        auth_source: AuthSource,
    ) -> IdentityBuilder {
        IdentityBuilder {
            identity: Identity {
                username: username.into(),
                credential_ref: None,
                display_name: None,
                email: None,
                roles: Vec::new(),
                projects: Vec::new(),
                auth_mode,
                auth_source,
                expiration: None,
            },
        }
    }

    /// Unique login name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Stored credential material. Never leaves the process.
    pub fn credential_ref(&self) -> Option<&str> {
        self.credential_ref.as_deref()
    }

    /// Human-readable name.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Email address.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Role names, in the order they were granted.
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Project memberships.
    pub fn projects(&self) -> &[String] {
        &self.projects
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    pub fn auth_source(&self) -> AuthSource {
        self.auth_source
    }

    /// Hard cutoff after which the identity must not be accepted.
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    /// Whether the identity carries an expiration that has passed.
    pub fn is_expired(&self) -> bool {
        self.expiration.is_some_and(|exp| exp <= Utc::now())
    }

    /// Whether the identity is a member of `project`.
    pub fn has_project(&self, project: &str) -> bool {
        self.projects.iter().any(|p| p == project)
    }

    /// Whether the identity holds `role`.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r.parse::<Role>().is_ok_and(|parsed| parsed == role))
    }

    /// Whether the identity holds at least one of `roles`.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }

    /// Rebuilds this identity with a different provenance, keeping everything else.
    ///
    /// Used when a stored record becomes the result of a new authentication.
    pub fn reissue(&self, auth_mode: AuthMode, auth_source: AuthSource) -> Identity {
        Identity {
            auth_mode,
            auth_source,
            ..self.clone()
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field(
                "credential_ref",
                &self.credential_ref.as_ref().map(|_| "<redacted>"),
            )
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("roles", &self.roles)
            .field("projects", &self.projects)
            .field("auth_mode", &self.auth_mode)
            .field("auth_source", &self.auth_source)
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Builder for [`Identity`]. Consumed by [`IdentityBuilder::build`].
#[derive(Debug, Clone)]
pub struct IdentityBuilder {
    identity: Identity,
}

impl IdentityBuilder {
    pub fn credential_ref(mut self, credential: impl Into<String>) -> Self {
        self.identity.credential_ref = Some(credential.into());
        self
    }

    pub fn display_name(mut self, name: Option<String>) -> Self {
        self.identity.display_name = name;
        self
    }

    pub fn email(mut self, email: Option<String>) -> Self {
        self.identity.email = email;
        self
    }

    pub fn roles(mut self, roles: Vec<String>) -> Self {
        self.identity.roles = roles;
        self
    }

    pub fn projects(mut self, projects: Vec<String>) -> Self {
        self.identity.projects = projects;
        self
    }

    pub fn expiration(mut self, expiration: Option<DateTime<Utc>>) -> Self {
        self.identity.expiration = expiration;
        self
    }

    pub fn build(self) -> Identity {
        self.identity
    }
}
