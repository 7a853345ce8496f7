//! Authenticator configuration blocks.
//!
//! Every optional block disables its authenticator when absent instead of
//! failing startup.

use serde::{Deserialize, Serialize};

/// Authentication configuration, keyed by authenticator name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Token (`"jwt"`) authenticators.
    #[serde(default)]
    pub jwt: Option<JwtConfig>,
    /// Directory (`"ldap"`) authenticator.
    #[serde(default)]
    pub ldap: Option<LdapConfig>,
    /// Local users inserted into the user store at startup.
    #[serde(default)]
    pub users: Vec<UserSeedConfig>,
}

/// Signature algorithm used by a token key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenAlgorithm {
    /// HMAC-SHA256 with a shared secret.
    #[default]
    #[serde(rename = "HS256")]
    Hs256,
    /// Ed25519 signatures.
    #[serde(rename = "EdDSA")]
    EdDsa,
}

impl std::fmt::Display for TokenAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenAlgorithm::Hs256 => write!(f, "HS256"),
            TokenAlgorithm::EdDsa => write!(f, "EdDSA"),
        }
    }
}

/// Key material for verifying (and optionally issuing) tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenKeyConfig {
    /// Signature algorithm.
    #[serde(default)]
    pub algorithm: TokenAlgorithm,
    /// HS256: the shared secret. EdDSA: base64 of the raw 32-byte public key.
    pub key: String,
    /// EdDSA only: base64 of the PKCS#8 DER private key, needed to issue tokens.
    #[serde(default)]
    pub private_key: Option<String>,
}

/// Configuration for the token authenticators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Key for bearer tokens presented on every request.
    pub key: TokenKeyConfig,
    /// Lifetime of tokens issued by this service, in seconds.
    #[serde(default = "default_token_max_age")]
    pub max_age_seconds: u64,
    /// Take roles and projects of known users from the user store instead of
    /// the token claims.
    #[serde(default)]
    pub validate_user: bool,
    /// Tokens exchanged for a session at login.
    #[serde(default)]
    pub login_token: Option<LoginTokenConfig>,
    /// Tokens delivered in a dedicated cookie by a trusted issuer.
    #[serde(default)]
    pub cookie: Option<CookieTokenConfig>,
}

/// Login-token authenticator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginTokenConfig {
    /// Verification key.
    pub key: TokenKeyConfig,
    /// Accept token subjects unknown to the user store and register them.
    #[serde(default)]
    pub sync_user_on_login: bool,
}

/// Cookie-token authenticator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieTokenConfig {
    /// Name of the cookie that carries the token.
    #[serde(default)]
    pub cookie_name: String,
    /// Required `iss` claim.
    #[serde(default)]
    pub trusted_issuer: String,
    /// Verification key.
    pub key: TokenKeyConfig,
    /// Accept token subjects unknown to the user store and register them.
    #[serde(default)]
    pub sync_user_on_login: bool,
}

/// Directory authenticator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    /// Directory server URL.
    pub url: String,
    /// Base DN under which user entries live.
    pub user_base: String,
    /// Handle logins of users unknown to the store when the directory has them.
    #[serde(default)]
    pub sync_user_on_login: bool,
    /// Interval between directory synchronisation runs; `0` disables them.
    #[serde(default)]
    pub sync_interval_seconds: u64,
    /// Remove directory-sourced users that disappeared from the directory.
    #[serde(default)]
    pub sync_delete_stale_users: bool,
    /// Roles given to users first seen through the directory.
    #[serde(default = "default_directory_roles")]
    pub default_roles: Vec<String>,
}

/// A local password user created at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSeedConfig {
    /// Login name.
    pub username: String,
    /// Plaintext password, hashed before it reaches the store.
    pub password: String,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Assigned roles.
    #[serde(default = "default_directory_roles")]
    pub roles: Vec<String>,
    /// Project memberships.
    #[serde(default)]
    pub projects: Vec<String>,
}

fn default_token_max_age() -> u64 {
    // 1 day
    86400
}

fn default_directory_roles() -> Vec<String> {
    vec!["user".to_string()]
}
