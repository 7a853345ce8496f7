//! Authenticated identity and role names.

pub mod model;
pub mod role;

pub use model::{AuthMode, AuthSource, Identity, IdentityBuilder};
pub use role::Role;
