//! Wire records for the upstream API.
//!
//! Each endpoint has a defined record shape; unknown fields are preserved
//! verbatim through `#[serde(flatten)]` passthrough maps but never relied
//! upon.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tier::{Division, Tier};

/// Expected participant count in a complete match.
pub const EXPECTED_PARTICIPANTS: usize = 8;

// ---------------------------------------------------------------------------
// League endpoints
// ---------------------------------------------------------------------------

/// Flat league body returned by the apex endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(default)]
    pub entries: Vec<LeagueEntry>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One ranked player as the league endpoints report them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntry {
    #[serde(default)]
    pub puuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summoner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<Division>,
    #[serde(default)]
    pub league_points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wins: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub losses: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Match endpoints
// ---------------------------------------------------------------------------

/// Full match body from the match-detail endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchDetail {
    #[serde(default)]
    pub metadata: MatchMetadata,
    pub info: MatchInfo,
}

/// Match metadata envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchMetadata {
    #[serde(default)]
    pub match_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Game-level match information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    /// Milliseconds since epoch.
    #[serde(default)]
    pub game_datetime: i64,
    #[serde(default)]
    pub game_length: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tft_set_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tft_game_type: Option<String>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One player's result within a match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default)]
    pub puuid: String,
    /// Final placement, 1 through 8.
    #[serde(default)]
    pub placement: u8,
    /// Final little-legend level, 1 through 10.
    #[serde(default)]
    pub level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold_left: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_round: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_eliminated: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_damage_to_players: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players_eliminated: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<TraitDto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<UnitDto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub augments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companion: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// An active trait on a participant's board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraitDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub num_units: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<i64>,
    /// Active tier of the trait.
    #[serde(default)]
    pub tier_current: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_total: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A unit on a participant's final board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitDto {
    #[serde(default)]
    pub character_id: String,
    #[serde(default, rename = "itemNames", skip_serializing_if = "Vec::is_empty")]
    pub item_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<i64>,
    /// Star level, 1 through 3.
    #[serde(default)]
    pub tier: i64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn league_entry_decodes_camel_case_and_keeps_unknowns() {
        let json = r#"{
            "puuid": "p-1",
            "summonerId": "s-1",
            "leaguePoints": 812,
            "rank": "I",
            "tier": "CHALLENGER",
            "veteran": true
        }"#;
        let entry: LeagueEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.puuid, "p-1");
        assert_eq!(entry.league_points, 812);
        assert_eq!(entry.tier, Some(Tier::Challenger));
        assert_eq!(entry.extra["veteran"], serde_json::json!(true));
    }

    #[test]
    fn match_detail_decodes_participants() {
        let json = r#"{
            "metadata": {"match_id": "LA2_42", "data_version": "6", "participants": ["p-1"]},
            "info": {
                "game_datetime": 1730462400000,
                "game_length": 1987.4,
                "game_version": "Version 14.21",
                "queue_id": 1100,
                "tft_set_number": 12,
                "participants": [{
                    "puuid": "p-1",
                    "placement": 3,
                    "level": 8,
                    "gold_left": 2,
                    "traits": [{"name": "Honeymancy", "num_units": 3, "tier_current": 1}],
                    "units": [{"character_id": "TFT12_Ziggs", "itemNames": ["RabadonsDeathcap"], "tier": 2}],
                    "augments": ["TFT12_Augment_Eagle"]
                }]
            }
        }"#;
        let detail: MatchDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.metadata.match_id, "LA2_42");
        assert_eq!(detail.info.participants.len(), 1);
        let p = &detail.info.participants[0];
        assert_eq!(p.placement, 3);
        assert_eq!(p.units[0].item_names, vec!["RabadonsDeathcap"]);
        assert_eq!(p.traits[0].tier_current, 1);
    }

    #[test]
    fn unknown_info_fields_roundtrip_verbatim() {
        let json = r#"{"info": {"game_datetime": 5, "mapId": 22, "participants": []}}"#;
        let detail: MatchDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.info.extra["mapId"], serde_json::json!(22));
        let back = serde_json::to_value(&detail).unwrap();
        assert_eq!(back["info"]["mapId"], serde_json::json!(22));
    }
}
