use ksfa_terminal::record::TeamRecord;
use ksfa_terminal::standings::{
    StandingsView, UNTAGGED_LEAGUE, aggregate, build_table, map_rows, sort_teams,
};
use ksfa_terminal::store::Document;
use serde_json::json;

fn division() -> StandingsView {
    StandingsView::SingleDivision {
        label: "A Division".to_string(),
    }
}

fn names(teams: &[TeamRecord]) -> Vec<&str> {
    teams.iter().map(|t| t.team_name.as_str()).collect()
}

fn tagged(name: &str, league: Option<&str>, points: i64, won: u32) -> TeamRecord {
    TeamRecord {
        league: league.map(str::to_string),
        ..TeamRecord::new(name, points, won)
    }
}

#[test]
fn points_then_wins_orders_b_c_a() {
    let records = vec![
        TeamRecord::new("A", 10, 3),
        TeamRecord::new("B", 12, 1),
        TeamRecord::new("C", 10, 5),
    ];
    let groups = aggregate(records, &division());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].league_name, "A Division");
    assert_eq!(names(&groups[0].teams), vec!["B", "C", "A"]);
}

#[test]
fn sorting_is_idempotent() {
    let mut teams = vec![
        TeamRecord::new("D", 4, 1),
        TeamRecord::new("E", 9, 3),
        TeamRecord::new("F", 9, 2),
        TeamRecord::new("G", 4, 1),
    ];
    sort_teams(&mut teams);
    let once = teams.clone();
    sort_teams(&mut teams);
    assert_eq!(teams, once);
}

#[test]
fn full_ties_keep_input_order() {
    let records = vec![
        TeamRecord::new("Second", 6, 2),
        TeamRecord::new("First", 6, 2),
        TeamRecord::new("Third", 6, 2),
    ];
    let groups = aggregate(records, &division());
    assert_eq!(names(&groups[0].teams), vec!["Second", "First", "Third"]);
}

#[test]
fn empty_input_gives_no_groups_and_no_rows() {
    let groups = aggregate(Vec::new(), &division());
    assert!(groups.is_empty());
    let table = map_rows(&groups);
    assert!(table.is_empty());
    assert_eq!(table.row_count(), 0);

    let by_league = aggregate(Vec::new(), &StandingsView::ByLeague);
    assert!(by_league.is_empty());
}

#[test]
fn duplicate_team_names_stay_as_separate_rows() {
    let records = vec![TeamRecord::new("Twin", 3, 1), TeamRecord::new("Twin", 5, 1)];
    let table = map_rows(&aggregate(records, &division()));
    let rows: Vec<_> = table.rows().map(|(_, r)| (r.team.clone(), r.points)).collect();
    assert_eq!(rows, vec![("Twin".to_string(), 5), ("Twin".to_string(), 3)]);
}

#[test]
fn by_league_groups_in_first_seen_order() {
    let records = vec![
        tagged("Raptors", Some("Division One"), 28, 9),
        tagged("Lions", Some("Premier League"), 32, 10),
        tagged("Loners", None, 1, 0),
        tagged("Serpents", Some("Division One"), 23, 6),
        tagged("Strikers", Some("Premier League"), 27, 8),
    ];
    let groups = aggregate(records, &StandingsView::ByLeague);
    let leagues: Vec<&str> = groups.iter().map(|g| g.league_name.as_str()).collect();
    assert_eq!(leagues, vec!["Division One", "Premier League", UNTAGGED_LEAGUE]);
    assert_eq!(names(&groups[0].teams), vec!["Raptors", "Serpents"]);
    assert_eq!(names(&groups[1].teams), vec!["Lions", "Strikers"]);
    assert_eq!(names(&groups[2].teams), vec!["Loners"]);
}

#[test]
fn positions_restart_per_league_group() {
    let records = vec![
        tagged("X", Some("One"), 3, 1),
        tagged("Y", Some("Two"), 9, 3),
        tagged("Z", Some("One"), 6, 2),
    ];
    let table = map_rows(&aggregate(records, &StandingsView::ByLeague));
    let positions: Vec<(&str, usize, String)> = table
        .rows()
        .map(|(league, row)| (league, row.position, row.team.clone()))
        .collect();
    assert_eq!(
        positions,
        vec![
            ("One", 1, "Z".to_string()),
            ("One", 2, "X".to_string()),
            ("Two", 1, "Y".to_string()),
        ]
    );
}

#[test]
fn stored_rank_never_decides_position() {
    let docs = vec![
        Document::new(
            "a",
            json!({ "Team": "Stale Leader", "Rank": 1, "Points": 4, "Wins": 1 })
                .as_object()
                .cloned()
                .unwrap(),
        ),
        Document::new(
            "b",
            json!({ "Team": "Real Leader", "Rank": 2, "Points": "10", "Wins": "3" })
                .as_object()
                .cloned()
                .unwrap(),
        ),
    ];
    let table = build_table(&docs, &division());
    let rows: Vec<_> = table.rows().map(|(_, r)| (r.position, r.team.clone())).collect();
    assert_eq!(
        rows,
        vec![(1, "Real Leader".to_string()), (2, "Stale Leader".to_string())]
    );
}

#[test]
fn row_cells_follow_header_order() {
    let mut record = TeamRecord::new("Cells FC", 7, 2);
    record.played = 4;
    record.draw = 1;
    record.lost = 1;
    let table = map_rows(&aggregate(vec![record], &division()));
    let (_, row) = table.rows().next().expect("one row");
    assert_eq!(
        row.cells(),
        ["1", "Cells FC", "4", "2", "1", "1", "7"].map(String::from)
    );
}
