//! Session signing key resolution.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use tracing::warn;

use authgate_core::error::AppError;

/// Environment variable consulted when the configuration holds no key.
pub const SESSION_KEY_ENV: &str = "SESSION_KEY";

const EPHEMERAL_KEY_LEN: usize = 32;

/// Secret used to sign session cookies.
#[derive(Clone)]
pub struct SessionKey(Vec<u8>);

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionKey").field(&"<redacted>").finish()
    }
}

impl SessionKey {
    /// Uses the given bytes as the key.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, AppError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(AppError::configuration("Session key must not be empty"));
        }
        Ok(Self(bytes))
    }

    /// Decodes a base64 key.
    pub fn from_base64(encoded: &str) -> Result<Self, AppError> {
        let bytes = STANDARD.decode(encoded.trim()).map_err(|e| {
            AppError::configuration(format!("Session key is not valid base64: {e}"))
        })?;
        Self::from_bytes(bytes)
    }

    /// Generates a random key that lives only as long as the process.
    pub fn ephemeral() -> Self {
        let mut bytes = vec![0u8; EPHEMERAL_KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Resolves the key once at startup: configured value, then the
    /// `SESSION_KEY` environment variable, then an ephemeral key.
    ///
    /// With an ephemeral key every session becomes invalid on restart.
    pub fn resolve(configured: Option<&str>) -> Result<Self, AppError> {
        if let Some(encoded) = configured.filter(|k| !k.is_empty()) {
            return Self::from_base64(encoded);
        }

        match std::env::var(SESSION_KEY_ENV) {
            Ok(encoded) if !encoded.is_empty() => Self::from_base64(&encoded),
            _ => {
                warn!(
                    "Session key not configured and '{}' not set (using non-persistent random key)",
                    SESSION_KEY_ENV
                );
                Ok(Self::ephemeral())
            }
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
