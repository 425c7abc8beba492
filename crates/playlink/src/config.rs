//! Service configuration: logical keys to provider IDs.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::PlaylinkError;

/// Maps the game's own names for leaderboards and achievements to the
/// IDs registered with the provider.
///
/// Keys with no mapping are passed through verbatim, so raw provider IDs
/// work without any configuration. An empty mapping counts as missing.
///
/// Serialized field names match the JSON apps already ship:
///
/// ```json
/// {
///   "leaderboards": { "high_scores": "com.example.game.high_scores" },
///   "achievements": { "first_win": "com.example.game.first_win" },
///   "enableLogging": true
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameServiceConfig {
    /// Logical leaderboard key → provider leaderboard ID.
    pub leaderboards: HashMap<String, String>,

    /// Logical achievement key → provider achievement ID.
    pub achievements: HashMap<String, String>,

    /// Emit service-level log lines (target `playlink::service`).
    pub enable_logging: bool,
}

impl GameServiceConfig {
    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, PlaylinkError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlaylinkError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn with_leaderboard(mut self, key: impl Into<String>, id: impl Into<String>) -> Self {
        self.leaderboards.insert(key.into(), id.into());
        self
    }

    pub fn with_achievement(mut self, key: impl Into<String>, id: impl Into<String>) -> Self {
        self.achievements.insert(key.into(), id.into());
        self
    }

    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Provider ID for a leaderboard key (the key itself if unmapped).
    pub fn leaderboard_id<'a>(&'a self, key: &'a str) -> &'a str {
        resolve(&self.leaderboards, key)
    }

    /// Provider ID for an achievement key (the key itself if unmapped).
    pub fn achievement_id<'a>(&'a self, key: &'a str) -> &'a str {
        resolve(&self.achievements, key)
    }
}

fn resolve<'a>(map: &'a HashMap<String, String>, key: &'a str) -> &'a str {
    map.get(key)
        .map(String::as_str)
        .filter(|id| !id.is_empty())
        .unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaderboard_id_mapped_key_resolves() {
        let config = GameServiceConfig::default().with_leaderboard("high_scores", "lb.high");
        assert_eq!(config.leaderboard_id("high_scores"), "lb.high");
    }

    #[test]
    fn test_leaderboard_id_unknown_key_passes_through() {
        let config = GameServiceConfig::default();
        assert_eq!(config.leaderboard_id("com.raw.id"), "com.raw.id");
    }

    #[test]
    fn test_achievement_id_empty_mapping_falls_back_to_key() {
        let config = GameServiceConfig::default().with_achievement("first_win", "");
        assert_eq!(config.achievement_id("first_win"), "first_win");
    }

    #[test]
    fn test_from_json_reads_camel_case_fields() {
        let config = GameServiceConfig::from_json(
            r#"{
                "leaderboards": { "high_scores": "lb.high" },
                "achievements": { "first_win": "ach.first" },
                "enableLogging": true
            }"#,
        )
        .expect("valid config");

        assert_eq!(config.leaderboard_id("high_scores"), "lb.high");
        assert_eq!(config.achievement_id("first_win"), "ach.first");
        assert!(config.enable_logging);
    }

    #[test]
    fn test_from_json_missing_fields_default() {
        let config = GameServiceConfig::from_json("{}").expect("empty object is valid");
        assert_eq!(config, GameServiceConfig::default());
    }

    #[test]
    fn test_from_json_rejects_malformed_input() {
        let result = GameServiceConfig::from_json(r#"{"leaderboards": 3}"#);
        assert!(matches!(result, Err(PlaylinkError::Config(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = GameServiceConfig::load("/definitely/not/here/playlink.json");
        assert!(matches!(result, Err(PlaylinkError::Io(_))));
    }
}
