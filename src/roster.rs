use serde_json::{Map, Value};

use crate::record::{lenient_int, lookup, value_to_text};

pub const PLAYERS_FIELD: &str = "players";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Player {
    pub name: String,
    pub position: String,
    pub number: String,
    pub age: String,
    pub goals: u32,
    pub assists: u32,
    pub matches_played: u32,
}

impl Player {
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let text = |keys: &[&str]| lookup(fields, keys).map(value_to_text).unwrap_or_default();
        let count = |keys: &[&str]| {
            lookup(fields, keys)
                .map(lenient_int)
                .unwrap_or(0)
                .clamp(0, u32::MAX as i64) as u32
        };
        Self {
            name: text(&["name", "Name", "Player Name"]),
            position: text(&["position", "Position"]),
            number: text(&["number", "Jersey Number"]),
            age: text(&["age", "Age"]),
            goals: count(&["Goals", "goals"]),
            assists: count(&["Assists", "assists"]),
            matches_played: count(&["Matches Played", "matchesPlayed"]),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut fields = Map::new();
        fields.insert("Player Name".to_string(), Value::from(self.name.clone()));
        fields.insert("Position".to_string(), Value::from(self.position.clone()));
        fields.insert("Jersey Number".to_string(), Value::from(self.number.clone()));
        fields.insert("Age".to_string(), Value::from(self.age.clone()));
        fields.insert("Goals".to_string(), Value::from(self.goals));
        fields.insert("Assists".to_string(), Value::from(self.assists));
        fields.insert("Matches Played".to_string(), Value::from(self.matches_played));
        Value::Object(fields)
    }
}

/// Reads a team document's `players` field. The bulk upload stores it as a
/// JSON string, the editor as a real array; both are accepted.
pub fn parse_roster(fields: &Map<String, Value>) -> Vec<Player> {
    let parsed;
    let items = match fields.get(PLAYERS_FIELD) {
        Some(Value::Array(items)) => items,
        Some(Value::String(blob)) => {
            parsed = match serde_json::from_str::<Value>(blob) {
                Ok(Value::Array(items)) => items,
                _ => return Vec::new(),
            };
            &parsed
        }
        _ => return Vec::new(),
    };
    items
        .iter()
        .filter_map(|item| item.as_object())
        .map(Player::from_fields)
        .collect()
}

pub fn roster_fields(players: &[Player]) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(
        PLAYERS_FIELD.to_string(),
        Value::Array(players.iter().map(Player::to_value).collect()),
    );
    fields
}

/// Team names travel through ids with underscores.
pub fn team_doc_id(team_name: &str) -> String {
    team_name.replace('_', " ")
}
