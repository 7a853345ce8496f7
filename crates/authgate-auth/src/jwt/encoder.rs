//! Token issuance for authenticated identities.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

use authgate_core::config::{TokenAlgorithm, TokenKeyConfig};
use authgate_core::error::AppError;

use crate::identity::Identity;

use super::claims::TokenClaims;

/// Signs bearer tokens for identities that already authenticated.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    header: Header,
    max_age: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &self.header.alg)
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl TokenIssuer {
    /// Creates an issuer from key configuration. Lifetime `0` issues
    /// tokens without an `exp` claim.
    pub fn from_config(config: &TokenKeyConfig, max_age_seconds: u64) -> Result<Self, AppError> {
        let (encoding_key, algorithm) = match config.algorithm {
            TokenAlgorithm::Hs256 => {
                if config.key.is_empty() {
                    return Err(AppError::configuration("Token secret must not be empty"));
                }
                (
                    EncodingKey::from_secret(config.key.as_bytes()),
                    Algorithm::HS256,
                )
            }
            TokenAlgorithm::EdDsa => {
                let private_key = config.private_key.as_deref().ok_or_else(|| {
                    AppError::configuration("EdDSA token issuance needs a private key")
                })?;
                let der = STANDARD.decode(private_key.trim()).map_err(|e| {
                    AppError::configuration(format!("Ed25519 private key is not base64: {e}"))
                })?;
                (EncodingKey::from_ed_der(&der), Algorithm::EdDSA)
            }
        };

        let max_age = i64::try_from(max_age_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| AppError::configuration("Token max age is out of range"))?;

        Ok(Self {
            encoding_key,
            header: Header::new(algorithm),
            max_age,
        })
    }

    /// Signs a token carrying the identity's username, roles and projects.
    ///
    /// Returns the token and its expiration, if any.
    pub fn issue(&self, identity: &Identity) -> Result<(String, Option<DateTime<Utc>>), AppError> {
        let now = Utc::now();
        let expires_at = (!self.max_age.is_zero()).then(|| now + self.max_age);

        let claims = TokenClaims {
            sub: identity.username().to_string(),
            roles: identity.roles().to_vec(),
            projects: identity.projects().to_vec(),
            name: identity.display_name().map(String::from),
            email: identity.email().map(String::from),
            iss: None,
            iat: Some(now.timestamp()),
            exp: expires_at.map(|exp| exp.timestamp()),
        };

        let token = encode(&self.header, &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))?;

        Ok((token, expires_at))
    }
}
