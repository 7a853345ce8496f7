//! JWT claims, verification and issuance.

pub mod claims;
pub mod decoder;
pub mod encoder;

pub use claims::TokenClaims;
pub use decoder::TokenVerifier;
pub use encoder::TokenIssuer;
