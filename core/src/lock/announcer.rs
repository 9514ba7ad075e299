//! Outbound reset notifications
//!
//! The client protocol layer is an external collaborator; the registry
//! reports through this trait and does not care who listens.

use chrono::Duration;
use wardstone_types::{InstanceId, MapDifficultyKey};

/// Sink for reset-sequence notifications.
pub trait ResetAnnouncer: Send + Sync {
    /// A warn stage fired: `remaining` until the global reset.
    fn warn_time_left(&self, key: MapDifficultyKey, remaining: Duration);

    /// A concrete instance copy expired and its id may be reused.
    fn instance_expired(&self, key: MapDifficultyKey, instance: InstanceId);

    /// The global reset for this (map, difficulty) was performed.
    fn global_reset(&self, key: MapDifficultyKey);
}

/// Default announcer: structured log lines only.
#[derive(Debug, Default)]
pub struct LogAnnouncer;

impl ResetAnnouncer for LogAnnouncer {
    fn warn_time_left(&self, key: MapDifficultyKey, remaining: Duration) {
        tracing::info!(%key, remaining_secs = remaining.num_seconds(), "raid reset approaching");
    }

    fn instance_expired(&self, key: MapDifficultyKey, instance: InstanceId) {
        tracing::info!(%key, instance = instance.0, "instance expired");
    }

    fn global_reset(&self, key: MapDifficultyKey) {
        tracing::info!(%key, "global reset performed");
    }
}
