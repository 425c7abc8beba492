//! The signed-in local player.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Profile of the local player, as reported by the provider.
///
/// Field names on the wire follow the platform bridge
/// (`playerID`, `displayName`, `alias`), so a bridge that hands us JSON
/// can be deserialized straight into this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Stable, provider-assigned identifier.
    #[serde(rename = "playerID")]
    pub player_id: String,

    /// Name shown to the player themselves.
    pub display_name: String,

    /// Public nickname shown to other players.
    pub alias: String,
}

impl Player {
    pub fn new(
        player_id: impl Into<String>,
        display_name: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            display_name: display_name.into(),
            alias: alias.into(),
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.alias, self.player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_deserializes_bridge_field_names() {
        let json = r#"{"playerID":"p1","displayName":"Ann","alias":"AnnA"}"#;

        let player: Player = serde_json::from_str(json).expect("valid player json");

        assert_eq!(player, Player::new("p1", "Ann", "AnnA"));
    }

    #[test]
    fn test_player_serializes_bridge_field_names() {
        let json = serde_json::to_value(Player::new("p1", "Ann", "AnnA")).unwrap();

        assert_eq!(json["playerID"], "p1");
        assert_eq!(json["displayName"], "Ann");
        assert_eq!(json["alias"], "AnnA");
    }

    #[test]
    fn test_player_display() {
        assert_eq!(Player::new("p1", "Ann", "AnnA").to_string(), "AnnA (p1)");
    }
}
