//! Reset schedule configuration
//!
//! Persisted with confy under the platform config directory
//! (`~/.config/wardstone/reset.toml` on Linux).

use serde::{Deserialize, Serialize};

/// Knobs for the reset schedule computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetConfig {
    /// Hour of day (UTC) daily and weekly resets fire at.
    pub daily_hour: u8,

    /// Day of week (0 = Sunday) weekly resets fire on.
    pub weekly_day: u8,

    /// Global multiplier applied to periodic raw reset durations.
    pub rate_multiplier: f32,

    /// Hour of day periodic instance resets are pinned to.
    pub instance_hour_offset: u8,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            daily_hour: 9,
            weekly_day: 2,
            rate_multiplier: 1.0,
            instance_hour_offset: 0,
        }
    }
}

/// Default directory encounter script files are loaded from
/// (`~/.config/wardstone/scripts` on Linux).
pub fn default_script_dir() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|p| p.join("wardstone").join("scripts"))
}

/// Extension trait for ResetConfig persistence.
pub trait ResetConfigExt {
    fn load() -> Self;
    fn save(self);
}

impl ResetConfigExt for ResetConfig {
    fn load() -> Self {
        confy::load("wardstone", "reset").unwrap_or_default()
    }

    fn save(self) {
        if let Err(err) = confy::store("wardstone", "reset", self) {
            tracing::warn!(%err, "failed to save reset configuration");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResetConfig::default();
        assert_eq!(config.daily_hour, 9);
        assert_eq!(config.weekly_day, 2);
        assert_eq!(config.rate_multiplier, 1.0);
    }
}
