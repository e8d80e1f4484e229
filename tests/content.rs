use ksfa_terminal::fixtures::{Fixture, FixtureStatus, parse_fixture_date, split_fixtures};
use ksfa_terminal::news::{DEFAULT_NEWS_LIMIT, NewsFilter, NewsItem, filter_news};
use ksfa_terminal::roster::{Player, parse_roster, roster_fields};
use ksfa_terminal::store::Document;
use serde_json::{Map, Value, json};

fn doc(id: &str, value: Value) -> Document {
    Document::new(id, value.as_object().cloned().unwrap())
}

fn fixture(id: &str, status: &str, date: &str) -> Fixture {
    Fixture::from_document(&doc(
        id,
        json!({
            "homeTeam": format!("{id} home"),
            "awayTeam": format!("{id} away"),
            "date": date,
            "status": status,
        }),
    ))
}

fn ids(fixtures: &[Fixture]) -> Vec<&str> {
    fixtures.iter().map(|f| f.id.as_str()).collect()
}

#[test]
fn fixture_reads_scores_and_status() {
    let f = Fixture::from_document(&doc(
        "fx1",
        json!({
            "homeTeam": "Lions",
            "awayTeam": "Eagles",
            "date": "2026-09-01T15:30",
            "venue": "Main Stadium",
            "state": "Karnataka",
            "division": "A_Division",
            "status": "Completed",
            "homeScore": "2",
            "awayScore": 1,
        }),
    ));
    assert_eq!(f.status, FixtureStatus::Completed);
    assert_eq!(f.score_label(), "2-1");
    assert_eq!(f.venue, "Main Stadium");
}

#[test]
fn anything_not_completed_is_upcoming() {
    assert_eq!(fixture("a", "postponed", "").status, FixtureStatus::Upcoming);
    assert_eq!(fixture("b", "", "").status, FixtureStatus::Upcoming);
    assert_eq!(fixture("c", "upcoming", "").score_label(), "vs");
}

#[test]
fn split_orders_results_and_upcoming() {
    let board = split_fixtures(vec![
        fixture("old", "completed", "2026-08-01T10:00"),
        fixture("soon", "upcoming", "2026-10-20T10:00"),
        fixture("undated", "upcoming", "tbd"),
        fixture("recent", "completed", "2026-09-15"),
        fixture("later", "upcoming", "2026-12-01T18:00:00+05:30"),
    ]);
    assert_eq!(ids(&board.completed), vec!["recent", "old"]);
    assert_eq!(ids(&board.upcoming), vec!["soon", "later", "undated"]);
}

#[test]
fn fixture_dates_accept_form_and_rfc3339() {
    assert!(parse_fixture_date("2026-10-14T09:00").is_some());
    assert!(parse_fixture_date("2026-10-14 09:00:00").is_some());
    assert!(parse_fixture_date("2026-10-14").is_some());
    assert!(parse_fixture_date("2026-10-14T09:00:00Z").is_some());
    assert!(parse_fixture_date("next week").is_none());
}

fn news(id: &str, state: &str, division: &str, date: &str) -> NewsItem {
    NewsItem {
        id: id.to_string(),
        title: format!("title {id}"),
        state: state.to_string(),
        division: division.to_string(),
        date: date.to_string(),
        ..NewsItem::default()
    }
}

#[test]
fn news_filters_by_state_and_division() {
    let items = vec![
        news("1", "Karnataka", "A_Division", "2026-10-01T10:00:00Z"),
        news("2", "Kerala", "A_Division", "2026-10-02T10:00:00Z"),
        news("3", "Karnataka", "U17", "2026-10-03T10:00:00Z"),
    ];
    let all = filter_news(&items, &NewsFilter::default(), DEFAULT_NEWS_LIMIT);
    assert_eq!(
        all.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
        vec!["3", "2", "1"]
    );

    let karnataka = NewsFilter {
        state: Some("Karnataka".to_string()),
        division: None,
    };
    let picked = filter_news(&items, &karnataka, DEFAULT_NEWS_LIMIT);
    assert_eq!(
        picked.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
        vec!["3", "1"]
    );

    let both = NewsFilter {
        state: Some("Karnataka".to_string()),
        division: Some("A_Division".to_string()),
    };
    assert_eq!(filter_news(&items, &both, DEFAULT_NEWS_LIMIT).len(), 1);
}

#[test]
fn news_is_capped_at_the_limit() {
    let items: Vec<NewsItem> = (1..=9)
        .map(|day| {
            news(
                &day.to_string(),
                "Delhi",
                "U15",
                &format!("2026-10-{day:02}T08:00:00Z"),
            )
        })
        .collect();
    let top = filter_news(&items, &NewsFilter::default(), DEFAULT_NEWS_LIMIT);
    assert_eq!(top.len(), 6);
    assert_eq!(top[0].id, "9");
    assert_eq!(top[5].id, "4");
}

#[test]
fn news_document_maps_image_url() {
    let item = NewsItem::from_document(&doc(
        "n1",
        json!({ "title": "Hello", "imageUrl": "https://img.example/1.png" }),
    ));
    assert_eq!(item.id, "n1");
    assert_eq!(item.image_url, "https://img.example/1.png");
    assert_eq!(item.content, "");
}

#[test]
fn roster_accepts_array_and_string_blob() {
    let array = doc(
        "Lions",
        json!({
            "players": [
                { "name": "Ravi", "position": "Defender", "number": 4, "age": 22, "goals": "1" },
                "not an object",
            ]
        }),
    );
    let players = parse_roster(&array.fields);
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].name, "Ravi");
    assert_eq!(players[0].number, "4");
    assert_eq!(players[0].goals, 1);

    let blob = doc(
        "Eagles",
        json!({
            "players": "[{\"Player Name\": \"Meera\", \"Position\": \"Goalkeeper\", \"Jersey Number\": \"1\", \"Matches Played\": 12}]"
        }),
    );
    let players = parse_roster(&blob.fields);
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].name, "Meera");
    assert_eq!(players[0].matches_played, 12);
}

#[test]
fn roster_garbage_is_empty() {
    assert!(parse_roster(&Map::new()).is_empty());
    assert!(parse_roster(&doc("x", json!({ "players": "{oops" })).fields).is_empty());
    assert!(parse_roster(&doc("y", json!({ "players": 42 })).fields).is_empty());
}

#[test]
fn roster_fields_read_back() {
    let players = vec![
        Player {
            name: "Kiran".to_string(),
            position: "Midfielder".to_string(),
            number: "8".to_string(),
            age: "24".to_string(),
            goals: 3,
            assists: 5,
            matches_played: 11,
        },
        Player {
            name: "Dev".to_string(),
            ..Player::default()
        },
    ];
    assert_eq!(parse_roster(&roster_fields(&players)), players);
}
