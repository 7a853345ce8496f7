//! JWT signature and claim validation.

use std::collections::HashSet;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use authgate_core::config::{TokenAlgorithm, TokenKeyConfig};
use authgate_core::error::AppError;

use crate::error::AuthError;

use super::claims::TokenClaims;

/// Verifies tokens signed with one configured key.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("issuer", &self.validation.iss)
            .finish()
    }
}

impl TokenVerifier {
    /// Builds a verifier from key configuration.
    pub fn from_config(config: &TokenKeyConfig) -> Result<Self, AppError> {
        if config.key.is_empty() {
            return Err(AppError::configuration("Token key must not be empty"));
        }

        let (decoding_key, algorithm) = match config.algorithm {
            TokenAlgorithm::Hs256 => (
                DecodingKey::from_secret(config.key.as_bytes()),
                Algorithm::HS256,
            ),
            TokenAlgorithm::EdDsa => {
                let raw = STANDARD.decode(config.key.trim()).map_err(|e| {
                    AppError::configuration(format!("Ed25519 public key is not base64: {e}"))
                })?;
                if raw.len() != 32 {
                    return Err(AppError::configuration(format!(
                        "Ed25519 public key must be 32 bytes, got {}",
                        raw.len()
                    )));
                }
                let key = DecodingKey::from_ed_components(&URL_SAFE_NO_PAD.encode(raw))
                    .map_err(|e| {
                        AppError::configuration(format!("Invalid Ed25519 public key: {e}"))
                    })?;
                (key, Algorithm::EdDSA)
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = 5; // 5 seconds leeway for clock skew
        validation.required_spec_claims = HashSet::from(["sub".to_string()]);

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Additionally requires the `iss` claim to equal `issuer`.
    pub fn require_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self.validation.required_spec_claims.insert("iss".to_string());
        self
    }

    /// Checks signature, expiration and (if configured) issuer.
    ///
    /// Failures are reported without echoing the token.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AuthError::login_failed("token has expired"),
                JwtErrorKind::InvalidSignature => {
                    AuthError::login_failed("invalid token signature")
                }
                JwtErrorKind::InvalidIssuer => AuthError::login_failed("untrusted token issuer"),
                JwtErrorKind::MissingRequiredClaim(claim) => {
                    AuthError::login_failed(format!("token lacks required claim '{claim}'"))
                }
                _ => AuthError::login_failed("invalid token"),
            },
        )?;

        if data.claims.sub.is_empty() {
            return Err(AuthError::login_failed("token subject is empty"));
        }

        Ok(data.claims)
    }
}
