//! Startup insertion of configured local users.

use tracing::{info, warn};

use authgate_core::AppResult;
use authgate_core::config::UserSeedConfig;

use crate::identity::{AuthMode, AuthSource, Identity};
use crate::password::PasswordHasher;

use super::store::UserStore;

/// Hashes and inserts every configured user that is not already present.
///
/// Returns the number of users added.
pub async fn seed_users(
    store: &dyn UserStore,
    hasher: &PasswordHasher,
    seeds: &[UserSeedConfig],
) -> AppResult<usize> {
    let mut added = 0;

    for seed in seeds {
        if store.find_by_username(&seed.username).await?.is_some() {
            warn!(username = %seed.username, "Seed user already exists, skipping");
            continue;
        }

        let credential = hasher.hash_password(&seed.password)?;
        let identity =
            Identity::builder(&seed.username, AuthMode::Session, AuthSource::LocalPassword)
                .credential_ref(credential)
                .display_name(seed.display_name.clone())
                .email(seed.email.clone())
                .roles(seed.roles.clone())
                .projects(seed.projects.clone())
                .build();

        store.add_user(&identity).await?;
        added += 1;
    }

    if added > 0 {
        info!(count = added, "Seeded local users");
    }
    Ok(added)
}
