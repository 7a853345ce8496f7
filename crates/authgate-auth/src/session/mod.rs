//! Cookie sessions: store contract, signed-cookie store and lifecycle manager.

pub mod cookie_store;
pub mod key;
pub mod manager;
pub mod store;

pub use cookie_store::CookieSessionStore;
pub use key::SessionKey;
pub use manager::{SESSION_COOKIE, SessionData, SessionManager};
pub use store::{EXPIRE_IMMEDIATELY, Session, SessionOptions, SessionStore};
