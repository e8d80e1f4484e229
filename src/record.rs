use serde_json::{Map, Value};

use crate::store::Document;

// (canonical key, camel-case alias)
const TEAM_KEYS: [&str; 2] = ["Team", "teamName"];
const RANK_KEYS: [&str; 2] = ["Rank", "rank"];
const PLAYED_KEYS: [&str; 2] = ["Matches Played", "matchesPlayed"];
const WON_KEYS: [&str; 2] = ["Wins", "wins"];
const DRAW_KEYS: [&str; 2] = ["Draws", "draws"];
const LOST_KEYS: [&str; 2] = ["Losses", "losses"];
const POINTS_KEYS: [&str; 2] = ["Points", "points"];
const LEAGUE_KEYS: [&str; 2] = ["League", "league"];

/// One team's line in one division table.
///
/// Counts are passed through as stored: `won + draw + lost` may exceed
/// `played` when the upstream data is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TeamRecord {
    pub team_name: String,
    pub rank: Option<u32>,
    pub played: u32,
    pub won: u32,
    pub draw: u32,
    pub lost: u32,
    pub points: i64,
    pub league: Option<String>,
    /// Id of the stored document this came from; `None` for bare mappings.
    pub doc_id: Option<String>,
}

impl TeamRecord {
    pub fn new(team_name: impl Into<String>, points: i64, won: u32) -> Self {
        Self {
            team_name: team_name.into(),
            points,
            won,
            ..Self::default()
        }
    }

    /// Stored field layout, the inverse direction used by admin writes.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(TEAM_KEYS[0].to_string(), Value::from(self.team_name.clone()));
        if let Some(rank) = self.rank {
            fields.insert(RANK_KEYS[0].to_string(), Value::from(rank));
        }
        fields.insert(PLAYED_KEYS[0].to_string(), Value::from(self.played));
        fields.insert(WON_KEYS[0].to_string(), Value::from(self.won));
        fields.insert(DRAW_KEYS[0].to_string(), Value::from(self.draw));
        fields.insert(LOST_KEYS[0].to_string(), Value::from(self.lost));
        fields.insert(POINTS_KEYS[0].to_string(), Value::from(self.points));
        if let Some(league) = &self.league {
            fields.insert(LEAGUE_KEYS[0].to_string(), Value::from(league.clone()));
        }
        fields
    }
}

/// Builds a [`TeamRecord`] from a raw field mapping. Never fails: missing or
/// malformed values degrade to zero (or empty / `None`).
pub fn normalize_fields(fields: &Map<String, Value>) -> TeamRecord {
    let team_name = lookup(fields, &TEAM_KEYS)
        .map(value_to_text)
        .unwrap_or_default();
    let rank = lookup(fields, &RANK_KEYS)
        .map(lenient_int)
        .filter(|rank| *rank > 0)
        .map(clamp_count);
    let league = lookup(fields, &LEAGUE_KEYS)
        .map(value_to_text)
        .filter(|league| !league.trim().is_empty());

    TeamRecord {
        team_name,
        rank,
        played: count_field(fields, &PLAYED_KEYS),
        won: count_field(fields, &WON_KEYS),
        draw: count_field(fields, &DRAW_KEYS),
        lost: count_field(fields, &LOST_KEYS),
        points: lookup(fields, &POINTS_KEYS).map(lenient_int).unwrap_or(0),
        league,
        doc_id: None,
    }
}

/// Same as [`normalize_fields`], but a stored document may fall back to its id
/// ("Golden_Lions" -> "Golden Lions") when the team name is missing.
pub fn normalize_document(doc: &Document) -> TeamRecord {
    let mut record = normalize_fields(&doc.fields);
    record.doc_id = Some(doc.id.clone());
    if record.team_name.trim().is_empty() {
        record.team_name = doc.id.replace('_', " ");
    }
    record
}

pub fn normalize_documents(docs: &[Document]) -> Vec<TeamRecord> {
    docs.iter().map(normalize_document).collect()
}

/// First key present with a non-null value wins.
pub(crate) fn lookup<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| !value.is_null())
}

fn count_field(fields: &Map<String, Value>, keys: &[&str]) -> u32 {
    lookup(fields, keys).map(lenient_int).map(clamp_count).unwrap_or(0)
}

fn clamp_count(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Lenient integer coercion: leading digits of a string, truncated floats,
/// zero for anything else.
pub fn lenient_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return i;
            }
            match n.as_f64() {
                Some(f) if f.is_finite() => f.trunc().clamp(i64::MIN as f64, i64::MAX as f64) as i64,
                _ => 0,
            }
        }
        Value::String(s) => parse_int_prefix(s),
        _ => 0,
    }
}

fn parse_int_prefix(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return 0;
    }
    let mut out: i64 = 0;
    for b in digits[..end].bytes() {
        out = out.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if negative { -out } else { out }
}
