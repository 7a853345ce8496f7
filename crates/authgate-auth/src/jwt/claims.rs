//! Claims carried by tokens accepted and issued by the service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{AuthMode, AuthSource, Identity};

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — the username.
    pub sub: String,
    /// Role names.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Project memberships.
    #[serde(default)]
    pub projects: Vec<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Issued-at timestamp (seconds since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiration timestamp (seconds since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Returns the expiration as a `DateTime<Utc>`, if the token has one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Builds a token-sourced identity from the claims alone.
    pub fn to_identity(&self, auth_mode: AuthMode) -> Identity {
        Identity::builder(&self.sub, auth_mode, AuthSource::Token)
            .display_name(self.name.clone())
            .email(self.email.clone())
            .roles(self.roles.clone())
            .projects(self.projects.clone())
            .expiration(self.expires_at())
            .build()
    }

    /// Builds a token-sourced identity that takes its memberships from a stored record.
    pub fn to_identity_from_record(&self, record: &Identity, auth_mode: AuthMode) -> Identity {
        Identity::builder(&self.sub, auth_mode, AuthSource::Token)
            .display_name(record.display_name().map(String::from))
            .email(record.email().map(String::from))
            .roles(record.roles().to_vec())
            .projects(record.projects().to_vec())
            .expiration(self.expires_at())
            .build()
    }
}
