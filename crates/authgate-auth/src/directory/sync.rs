//! Periodic directory-to-user-store synchronisation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing;

use crate::authenticator::DirectoryAuthenticator;

/// Runs [`DirectoryAuthenticator::sync_users`] on a fixed interval.
#[derive(Debug)]
pub struct DirectorySync {
    authenticator: Arc<DirectoryAuthenticator>,
    interval: Duration,
}

impl DirectorySync {
    pub fn new(authenticator: Arc<DirectoryAuthenticator>, interval: Duration) -> Self {
        Self {
            authenticator,
            interval,
        }
    }

    /// Runs until the cancel signal is received or its sender is dropped.
    /// The first pass happens immediately.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            "Directory sync started with interval={}s",
            self.interval.as_secs()
        );

        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() {
                        tracing::info!("Directory sync shutdown channel closed");
                        break;
                    }
                    if *cancel.borrow() {
                        tracing::info!("Directory sync received shutdown signal");
                        break;
                    }
                }
                _ = interval.tick() => {
                    match self.authenticator.sync_users().await {
                        Ok(report) => tracing::info!(
                            added = report.added,
                            removed = report.removed,
                            "Directory sync pass complete"
                        ),
                        Err(e) => tracing::error!(error = %e, "Directory sync pass failed"),
                    }
                }
            }
        }
    }
}
