//! Engine configuration
//!
//! Durations are quoted in minutes, matching how operators talk about
//! mutes and deadlines. Defaults are the product constants; a deployment
//! overrides them with a small TOML document.

use serde::Deserialize;
use warden_core::DurationMs;
use warden_session::ModerationPolicy;

/// Tunable engine behavior.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// How often the pinned reminder is re-issued while a phase is open
    pub reminder_interval_mins: u64,
    /// Length of the checking phase
    pub checking_window_mins: u64,
    /// Mute for duplicate/colliding/banned-handle submissions
    pub violation_mute_mins: u64,
    /// Mute for link-shaped text no handle can be extracted from
    pub invalid_link_mute_mins: u64,
    /// Mute applied by the deadline sweep; at or past 2880 the swept
    /// handles are banned for the fixed 48-hour window
    pub sweep_mute_mins: u64,
    /// Reminder text while the submission window is open
    pub open_reminder_text: String,
    /// Reminder text during the checking phase
    pub checking_reminder_text: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reminder_interval_mins: 5,
            checking_window_mins: 90,
            violation_mute_mins: 30,
            invalid_link_mute_mins: 5,
            sweep_mute_mins: 2880,
            open_reminder_text: "Keep dropping your post links!".to_string(),
            checking_reminder_text: "Keep dropping your proof! Media only.".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML configuration document, filling gaps with defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// The moderation policy these settings describe.
    pub fn policy(&self) -> ModerationPolicy {
        ModerationPolicy {
            violation_mute: DurationMs::from_mins(self.violation_mute_mins),
            invalid_link_mute: DurationMs::from_mins(self.invalid_link_mute_mins),
            sweep_mute: DurationMs::from_mins(self.sweep_mute_mins),
            checking_window: DurationMs::from_mins(self.checking_window_mins),
        }
    }

    /// Reminder cadence as a duration.
    pub fn reminder_interval(&self) -> DurationMs {
        DurationMs::from_mins(self.reminder_interval_mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_product_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.reminder_interval_mins, 5);
        assert_eq!(config.checking_window_mins, 90);
        assert_eq!(config.violation_mute_mins, 30);
        assert_eq!(config.sweep_mute_mins, 2880);
        assert_eq!(config.policy().checking_window, DurationMs::from_mins(90));
    }

    #[test]
    fn test_toml_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            checking_window_mins = 60
            open_reminder_text = "drop links"
            "#,
        )
        .unwrap();
        assert_eq!(config.checking_window_mins, 60);
        assert_eq!(config.open_reminder_text, "drop links");
        // Unset fields keep their defaults
        assert_eq!(config.violation_mute_mins, 30);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(EngineConfig::from_toml_str("not_a_setting = 1").is_err());
    }
}
