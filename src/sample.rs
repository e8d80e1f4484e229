use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use serde_json::{Map, Value, json};

use crate::feed::LEAGUE_RANKINGS_COLLECTION;
use crate::news::NEWS_COLLECTION;
use crate::record::{TeamRecord, normalize_document};
use crate::store::{CollectionPath, DivisionCollection, Document, DocumentStore, MemoryStore, WatchHandle};

pub const SAMPLE_APP_ID: &str = "sample-app";
pub const SAMPLE_ADMIN_EMAIL: &str = "admin@ksfa.local";
pub const SAMPLE_ADMIN_PASSWORD: &str = "ksfa-admin";

/// (state, division) pairs that get seeded tables.
pub const SEEDED_DIVISIONS: [(&str, &str); 3] = [
    ("Karnataka", "A_Division"),
    ("Karnataka", "U17"),
    ("Kerala", "A_Division"),
];

const LEAGUE_RANKINGS: [(&str, &str, u32, u32, u32, i64); 5] = [
    ("Premier League", "Golden Lions", 10, 2, 1, 32),
    ("Premier League", "Silver Strikers", 8, 3, 2, 27),
    ("Premier League", "Bronze Bombers", 7, 4, 2, 25),
    ("Division One", "Rapid Raptors", 9, 1, 3, 28),
    ("Division One", "Stealth Serpents", 6, 5, 2, 23),
];

const DIVISION_TEAMS: [&str; 9] = [
    "Shadow Foxes",
    "Bronze Bears",
    "Crimson Bulls",
    "Silver Sharks",
    "Golden Lions",
    "White Eagles",
    "Black Panthers",
    "Green Wolves",
    "Blue Tigers",
];

pub fn sample_accounts() -> Vec<(String, String)> {
    vec![(SAMPLE_ADMIN_EMAIL.to_string(), SAMPLE_ADMIN_PASSWORD.to_string())]
}

/// Seeds every layout the app reads.
pub fn seed_store(store: &MemoryStore, app_id: &str) {
    let league_docs = LEAGUE_RANKINGS
        .iter()
        .map(|(league, team, won, draw, lost, points)| {
            let record = TeamRecord {
                team_name: team.to_string(),
                played: won + draw + lost,
                won: *won,
                draw: *draw,
                lost: *lost,
                points: *points,
                league: Some(league.to_string()),
                ..TeamRecord::default()
            };
            Document::new(*team, record.to_fields())
        })
        .collect();
    store.publish(&CollectionPath::app_data(app_id, LEAGUE_RANKINGS_COLLECTION), league_docs);

    for (offset, (state, division)) in SEEDED_DIVISIONS.iter().enumerate() {
        let docs = DIVISION_TEAMS
            .iter()
            .enumerate()
            .skip(offset)
            .take(6)
            .map(|(idx, team)| {
                // Stored ranks are deliberately stale.
                let won = ((idx * 7 + offset * 3) % 9) as u32;
                let draw = ((idx * 5 + offset) % 4) as u32;
                let lost = ((idx * 3 + offset * 2) % 5) as u32;
                let mut fields = Map::new();
                fields.insert("Team".to_string(), json!(team));
                fields.insert("Rank".to_string(), json!(idx + 1));
                // Mixed shapes on purpose: string numbers and camel-case keys.
                if idx % 2 == 0 {
                    fields.insert("Matches Played".to_string(), json!((won + draw + lost).to_string()));
                } else {
                    fields.insert("matchesPlayed".to_string(), json!(won + draw + lost));
                }
                fields.insert("Wins".to_string(), json!(won));
                fields.insert("Draws".to_string(), json!(draw));
                fields.insert("Losses".to_string(), json!(lost));
                fields.insert("Points".to_string(), json!(won * 3 + draw));
                Document::new(*team, fields)
            })
            .collect::<Vec<_>>();

        let rosters = docs
            .iter()
            .map(|doc| {
                let team = doc.id.clone();
                let players = sample_players(&team);
                let mut fields = Map::new();
                // Bulk-upload shape: a JSON string blob.
                fields.insert("players".to_string(), Value::from(players.to_string()));
                Document::new(team, fields)
            })
            .collect();

        let now = Utc::now();
        let fixtures = docs
            .chunks(2)
            .enumerate()
            .filter(|(_, pair)| pair.len() == 2)
            .map(|(idx, pair)| {
                let completed = idx % 2 == 0;
                let day = if completed {
                    now - ChronoDuration::days(idx as i64 + 1)
                } else {
                    now + ChronoDuration::days(idx as i64 + 1)
                };
                let mut fields = Map::new();
                fields.insert("homeTeam".to_string(), json!(pair[0].id));
                fields.insert("awayTeam".to_string(), json!(pair[1].id));
                fields.insert("date".to_string(), json!(day.format("%Y-%m-%dT%H:%M").to_string()));
                fields.insert("venue".to_string(), json!(format!("{state} Stadium {}", idx + 1)));
                fields.insert("state".to_string(), json!(state));
                fields.insert("division".to_string(), json!(division));
                fields.insert(
                    "status".to_string(),
                    json!(if completed { "completed" } else { "upcoming" }),
                );
                if completed {
                    fields.insert("homeScore".to_string(), json!((idx % 3) as i64 + 1));
                    fields.insert("awayScore".to_string(), json!((idx % 2) as i64));
                }
                Document::new(format!("fx-{state}-{division}-{idx}"), fields)
            })
            .collect();

        store.publish(
            &CollectionPath::division(app_id, state, division, DivisionCollection::Rankings),
            docs,
        );
        store.publish(
            &CollectionPath::division(app_id, state, division, DivisionCollection::Teams),
            rosters,
        );
        store.publish(
            &CollectionPath::division(app_id, state, division, DivisionCollection::Fixtures),
            fixtures,
        );
    }

    let now = Utc::now();
    let news = [
        ("KSFA League Kicks Off with Thrilling Matches!", "Karnataka", "A_Division", 0),
        ("Youth Talent Shines in U17 Opener", "Karnataka", "U17", 1),
        ("Kerala Derby Ends in Stalemate", "Kerala", "A_Division", 2),
        ("New Referee Panel Announced", "Delhi", "B_Division", 3),
    ]
    .iter()
    .enumerate()
    .map(|(idx, (title, state, division, days_ago))| {
        let mut fields = Map::new();
        fields.insert("title".to_string(), json!(title));
        fields.insert("content".to_string(), json!(format!("{title} Full report inside.")));
        fields.insert(
            "date".to_string(),
            json!((now - ChronoDuration::days(*days_ago)).to_rfc3339()),
        );
        fields.insert("author".to_string(), json!("Admin"));
        fields.insert("state".to_string(), json!(state));
        fields.insert("division".to_string(), json!(division));
        fields.insert("imageUrl".to_string(), json!(""));
        Document::new(format!("news-{idx}"), fields)
    })
    .collect();
    store.publish(&CollectionPath::app_data(app_id, NEWS_COLLECTION), news);

    store.publish(
        &CollectionPath::admins(),
        vec![Document::new(SAMPLE_ADMIN_EMAIL, Map::new())],
    );
}

fn sample_players(team: &str) -> Value {
    let positions = ["Goalkeeper", "Defender", "Midfielder", "Forward"];
    let players: Vec<Value> = (0..4)
        .map(|i| {
            json!({
                "Player Name": format!("{} Player {}", team.split(' ').next().unwrap_or(team), i + 1),
                "Position": positions[i % positions.len()],
                "Jersey Number": (i + 1).to_string(),
                "Age": 18 + i * 3,
                "Goals": (team.len() + i) % 7,
                "Assists": (team.len() * 2 + i) % 5,
                "Matches Played": 10 + i,
            })
        })
        .collect();
    Value::Array(players)
}

/// Awards a random result to a random team of a seeded division every
/// `tick`, so live views have something to react to. Stops once `cancel` is
/// cancelled.
pub fn spawn_demo_feed(store: Arc<MemoryStore>, app_id: String, tick: Duration, cancel: WatchHandle) {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();
        while !cancel.is_cancelled() {
            thread::sleep(tick);
            if cancel.is_cancelled() {
                break;
            }
            let (state, division) = SEEDED_DIVISIONS[rng.gen_range(0..SEEDED_DIVISIONS.len())];
            let path = CollectionPath::division(&app_id, state, division, DivisionCollection::Rankings);
            let Ok(docs) = store.list(&path) else {
                continue;
            };
            if docs.is_empty() {
                continue;
            }
            let doc = &docs[rng.gen_range(0..docs.len())];
            let mut record = normalize_document(doc);
            record.played += 1;
            match rng.gen_range(0..3) {
                0 => {
                    record.won += 1;
                    record.points += 3;
                }
                1 => {
                    record.draw += 1;
                    record.points += 1;
                }
                _ => record.lost += 1,
            }
            tracing::debug!(team = %record.team_name, state, division, "demo result");
            let _ = store.merge(&path, &doc.id, record.to_fields());
        }
    });
}
