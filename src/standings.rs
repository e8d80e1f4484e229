use std::cmp::Ordering;
use std::collections::HashMap;

use crate::record::{TeamRecord, normalize_documents};
use crate::store::Document;

/// Label used for records without a league tag in the by-league view.
pub const UNTAGGED_LEAGUE: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueGroup {
    pub league_name: String,
    /// Rank order, not insertion order.
    pub teams: Vec<TeamRecord>,
}

/// How a batch of records becomes groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StandingsView {
    /// One division: no grouping, the whole input is one table.
    SingleDivision { label: String },
    /// Group by the record's `league` tag, in first-seen order.
    ByLeague,
}

/// Points descending, then wins descending. Anything else keeps input order,
/// which relies on `sort_by` being stable.
pub fn compare_standing(a: &TeamRecord, b: &TeamRecord) -> Ordering {
    b.points.cmp(&a.points).then_with(|| b.won.cmp(&a.won))
}

pub fn sort_teams(teams: &mut [TeamRecord]) {
    teams.sort_by(compare_standing);
}

pub fn aggregate(records: Vec<TeamRecord>, view: &StandingsView) -> Vec<LeagueGroup> {
    if records.is_empty() {
        return Vec::new();
    }
    match view {
        StandingsView::SingleDivision { label } => {
            let mut teams = records;
            sort_teams(&mut teams);
            vec![LeagueGroup {
                league_name: label.clone(),
                teams,
            }]
        }
        StandingsView::ByLeague => group_by_league(records),
    }
}

pub fn group_by_league(records: Vec<TeamRecord>) -> Vec<LeagueGroup> {
    let mut groups: Vec<LeagueGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in records {
        let key = record
            .league
            .clone()
            .unwrap_or_else(|| UNTAGGED_LEAGUE.to_string());
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(LeagueGroup {
                league_name: key,
                teams: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].teams.push(record);
    }
    for group in &mut groups {
        sort_teams(&mut group.teams);
    }
    groups
}

/// Display row. `position` is recomputed from the sort, never taken from the
/// stored rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingRow {
    pub position: usize,
    pub team: String,
    pub played: u32,
    pub won: u32,
    pub draw: u32,
    pub lost: u32,
    pub points: i64,
    /// Stored document behind the row, used to address admin writes.
    pub doc_id: Option<String>,
}

impl StandingRow {
    pub const HEADERS: [&'static str; 7] = ["Pos", "Team", "P", "W", "D", "L", "Pts"];

    pub fn cells(&self) -> [String; 7] {
        [
            self.position.to_string(),
            self.team.clone(),
            self.played.to_string(),
            self.won.to_string(),
            self.draw.to_string(),
            self.lost.to_string(),
            self.points.to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableGroup {
    pub league_name: String,
    pub rows: Vec<StandingRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StandingsTable {
    pub groups: Vec<TableGroup>,
}

impl StandingsTable {
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.rows.is_empty())
    }

    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }

    /// Flattened (league, row) pairs in display order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &StandingRow)> {
        self.groups
            .iter()
            .flat_map(|g| g.rows.iter().map(move |r| (g.league_name.as_str(), r)))
    }
}

pub fn map_rows(groups: &[LeagueGroup]) -> StandingsTable {
    let groups = groups
        .iter()
        .map(|group| TableGroup {
            league_name: group.league_name.clone(),
            rows: group
                .teams
                .iter()
                .enumerate()
                .map(|(idx, team)| StandingRow {
                    position: idx + 1,
                    team: team.team_name.clone(),
                    played: team.played,
                    won: team.won,
                    draw: team.draw,
                    lost: team.lost,
                    points: team.points,
                    doc_id: team.doc_id.clone(),
                })
                .collect(),
        })
        .collect();
    StandingsTable { groups }
}

/// Full pass for one snapshot: normalize, aggregate, map.
pub fn build_table(docs: &[Document], view: &StandingsView) -> StandingsTable {
    let records = normalize_documents(docs);
    let groups = aggregate(records, view);
    map_rows(&groups)
}
