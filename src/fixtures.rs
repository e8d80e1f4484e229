use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::record::{lenient_int, lookup, value_to_text};
use crate::store::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureStatus {
    Upcoming,
    Completed,
}

impl FixtureStatus {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("completed") {
            FixtureStatus::Completed
        } else {
            FixtureStatus::Upcoming
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FixtureStatus::Upcoming => "upcoming",
            FixtureStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    /// As stored; see [`parse_fixture_date`].
    pub date: String,
    pub venue: String,
    pub state: String,
    pub division: String,
    pub status: FixtureStatus,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
}

impl Fixture {
    pub fn from_document(doc: &Document) -> Self {
        let f = &doc.fields;
        let text = |keys: &[&str]| lookup(f, keys).map(value_to_text).unwrap_or_default();
        Self {
            id: doc.id.clone(),
            home_team: text(&["homeTeam", "Home Team"]),
            away_team: text(&["awayTeam", "Away Team"]),
            date: text(&["date", "Date"]),
            venue: text(&["venue", "Venue"]),
            state: text(&["state", "State"]),
            division: text(&["division", "Division"]),
            status: FixtureStatus::parse(&text(&["status", "Status"])),
            home_score: lookup(f, &["homeScore", "Home Score"]).map(lenient_int),
            away_score: lookup(f, &["awayScore", "Away Score"]).map(lenient_int),
        }
    }

    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("homeTeam".to_string(), Value::from(self.home_team.clone()));
        fields.insert("awayTeam".to_string(), Value::from(self.away_team.clone()));
        fields.insert("date".to_string(), Value::from(self.date.clone()));
        fields.insert("venue".to_string(), Value::from(self.venue.clone()));
        fields.insert("state".to_string(), Value::from(self.state.clone()));
        fields.insert("division".to_string(), Value::from(self.division.clone()));
        fields.insert("status".to_string(), Value::from(self.status.as_str()));
        if let Some(score) = self.home_score {
            fields.insert("homeScore".to_string(), Value::from(score));
        }
        if let Some(score) = self.away_score {
            fields.insert("awayScore".to_string(), Value::from(score));
        }
        fields
    }

    pub fn score_label(&self) -> String {
        match (self.home_score, self.away_score) {
            (Some(h), Some(a)) => format!("{h}-{a}"),
            _ => "vs".to_string(),
        }
    }
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (form inputs) and bare dates.
pub fn parse_fixture_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureBoard {
    /// Most recent first.
    pub completed: Vec<Fixture>,
    /// Soonest first.
    pub upcoming: Vec<Fixture>,
}

pub fn split_fixtures(fixtures: Vec<Fixture>) -> FixtureBoard {
    let (mut completed, mut upcoming): (Vec<_>, Vec<_>) = fixtures
        .into_iter()
        .partition(|f| f.status == FixtureStatus::Completed);
    completed.sort_by(|a, b| by_date(a, b, true));
    upcoming.sort_by(|a, b| by_date(a, b, false));
    FixtureBoard {
        completed,
        upcoming,
    }
}

// Undated fixtures go last either way.
fn by_date(a: &Fixture, b: &Fixture, newest_first: bool) -> Ordering {
    match (parse_fixture_date(&a.date), parse_fixture_date(&b.date)) {
        (Some(x), Some(y)) => {
            if newest_first {
                y.cmp(&x)
            } else {
                x.cmp(&y)
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
