//! # authgate-auth
//!
//! Authentication orchestration for the AuthGate service.
//!
//! ## Modules
//!
//! - `identity` — The authenticated-user value object and role names
//! - `exchange` — Transport-neutral request/response view used by the core
//! - `authenticator` — Local, directory and token authenticators and their registry
//! - `session` — Signed cookie sessions and their lifecycle
//! - `jwt` — Token verification and issuance
//! - `password` — Argon2id password hashing
//! - `user` — User record store contract, in-memory store and seeding
//! - `directory` — Directory client contract and periodic synchronisation
//! - `orchestrator` — Login, Authenticate and Logout

pub mod authenticator;
pub mod cookies;
pub mod directory;
pub mod error;
pub mod exchange;
pub mod identity;
pub mod jwt;
pub mod orchestrator;
pub mod password;
pub mod session;
pub mod user;

pub use authenticator::{
    Authenticator, AuthenticatorDispatch, AuthenticatorRegistry, InitContext, Initialize,
};
pub use directory::{DirectoryClient, DirectoryEntry, DirectorySync};
pub use error::AuthError;
pub use exchange::Exchange;
pub use identity::{AuthMode, AuthSource, Identity, Role};
pub use jwt::{TokenClaims, TokenIssuer, TokenVerifier};
pub use orchestrator::AuthOrchestrator;
pub use password::PasswordHasher;
pub use session::{SessionManager, SessionStore};
pub use user::{MemoryUserStore, UserStore};
