//! User-record store contract, in-memory implementation and startup seeding.

pub mod memory;
pub mod seed;
pub mod store;

pub use memory::MemoryUserStore;
pub use seed::seed_users;
pub use store::UserStore;
