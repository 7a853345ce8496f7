//! Session cookie configuration.

use serde::{Deserialize, Serialize};

/// Session cookie and signing-key configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Base64-encoded signing key. When absent, the `SESSION_KEY` environment
    /// variable is consulted, then an ephemeral random key is generated.
    #[serde(default)]
    pub key: Option<String>,
    /// Max-age applied to sessions created at login, in seconds.
    /// `0` keeps the store default.
    #[serde(default)]
    pub max_age_seconds: u64,
    /// Max-age the cookie store assigns to new sessions, in seconds.
    #[serde(default = "default_store_max_age")]
    pub default_max_age_seconds: u64,
    /// Cookie `Path` attribute.
    #[serde(default = "default_path")]
    pub path: String,
    /// Whether the cookie carries the `Secure` attribute.
    #[serde(default)]
    pub secure: bool,
    /// Whether the cookie carries the `HttpOnly` attribute.
    #[serde(default = "default_true")]
    pub http_only: bool,
    /// `SameSite` attribute.
    #[serde(default)]
    pub same_site: SameSite,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key: None,
            max_age_seconds: 0,
            default_max_age_seconds: default_store_max_age(),
            path: default_path(),
            secure: false,
            http_only: true,
            same_site: SameSite::default(),
        }
    }
}

/// Cookie `SameSite` policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameSite {
    /// `SameSite=Strict`.
    Strict,
    /// `SameSite=Lax`.
    #[default]
    Lax,
    /// `SameSite=None` (requires `Secure`).
    None,
}

impl std::fmt::Display for SameSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

fn default_store_max_age() -> u64 {
    // 30 days
    86400 * 30
}

fn default_path() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}
