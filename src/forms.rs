//! Parsers for the one-line admin prompt. Fields are separated by `|`.

use crate::fixtures::{Fixture, FixtureStatus};
use crate::news::NewsItem;
use crate::record::TeamRecord;
use crate::roster::Player;

fn split_fields(input: &str) -> Vec<String> {
    input.split('|').map(|p| p.trim().to_string()).collect()
}

fn parse_count(raw: Option<&String>, what: &str) -> Result<u32, String> {
    match raw.map(|s| s.as_str()).filter(|s| !s.is_empty()) {
        None => Ok(0),
        Some(s) => s.parse::<u32>().map_err(|_| format!("{what} must be a number")),
    }
}

pub fn parse_sign_in(input: &str) -> Result<(String, String), String> {
    let mut parts = input.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(email), Some(password)) if email.contains('@') => {
            Ok((email.to_string(), password.to_string()))
        }
        _ => Err("expected: email password".to_string()),
    }
}

/// `title | content [| image url]`
pub fn parse_news(input: &str, state: &str, division: &str) -> Result<NewsItem, String> {
    let parts = split_fields(input);
    let title = parts.first().cloned().unwrap_or_default();
    if title.is_empty() {
        return Err("title is required".to_string());
    }
    Ok(NewsItem {
        id: String::new(),
        title,
        content: parts.get(1).cloned().unwrap_or_default(),
        date: String::new(),
        author: String::new(),
        state: state.to_string(),
        division: division.to_string(),
        image_url: parts.get(2).cloned().unwrap_or_default(),
    })
}

/// `home | away | date | venue [| completed h-a]`
pub fn parse_fixture(input: &str, state: &str, division: &str) -> Result<Fixture, String> {
    let parts = split_fields(input);
    if parts.len() < 3 || parts[0].is_empty() || parts[1].is_empty() {
        return Err("expected: home | away | date | venue".to_string());
    }
    let status = parts
        .get(4)
        .map(|s| FixtureStatus::parse(s.split_whitespace().next().unwrap_or("")))
        .unwrap_or(FixtureStatus::Upcoming);
    let (home_score, away_score) = match parts
        .get(4)
        .and_then(|s| s.split_whitespace().nth(1))
        .and_then(|score| score.split_once('-'))
    {
        Some((h, a)) => (h.trim().parse().ok(), a.trim().parse().ok()),
        None => (None, None),
    };
    Ok(Fixture {
        id: String::new(),
        home_team: parts[0].clone(),
        away_team: parts[1].clone(),
        date: parts[2].clone(),
        venue: parts.get(3).cloned().unwrap_or_default(),
        state: state.to_string(),
        division: division.to_string(),
        status,
        home_score,
        away_score,
    })
}

/// `team | played | won | draw | lost | points`
pub fn parse_team(input: &str) -> Result<TeamRecord, String> {
    let parts = split_fields(input);
    let team_name = parts.first().cloned().unwrap_or_default();
    if team_name.is_empty() {
        return Err("team name is required".to_string());
    }
    let points = match parts.get(5).map(|s| s.as_str()).filter(|s| !s.is_empty()) {
        None => 0,
        Some(s) => s.parse::<i64>().map_err(|_| "points must be a number".to_string())?,
    };
    Ok(TeamRecord {
        team_name,
        rank: None,
        played: parse_count(parts.get(1), "played")?,
        won: parse_count(parts.get(2), "won")?,
        draw: parse_count(parts.get(3), "draw")?,
        lost: parse_count(parts.get(4), "lost")?,
        points,
        league: None,
        doc_id: None,
    })
}

/// `name | position | number | age`
pub fn parse_player(input: &str) -> Result<Player, String> {
    let parts = split_fields(input);
    let name = parts.first().cloned().unwrap_or_default();
    if name.is_empty() {
        return Err("player name is required".to_string());
    }
    Ok(Player {
        name,
        position: parts.get(1).cloned().unwrap_or_default(),
        number: parts.get(2).cloned().unwrap_or_default(),
        age: parts.get(3).cloned().unwrap_or_default(),
        ..Player::default()
    })
}

/// Prompt text for editing `player`, in the order [`parse_player_edit`] reads.
pub fn player_edit_line(player: &Player) -> String {
    format!(
        "{} | {} | {} | {} | {} | {} | {}",
        player.name,
        player.position,
        player.number,
        player.age,
        player.goals,
        player.assists,
        player.matches_played
    )
}

/// `name | position | number | age | goals | assists | played`. Blank or
/// missing fields keep the current value.
pub fn parse_player_edit(input: &str, current: &Player) -> Result<Player, String> {
    let parts = split_fields(input);
    let text = |idx: usize, old: &str| match parts.get(idx).filter(|s| !s.is_empty()) {
        Some(new) => new.clone(),
        None => old.to_string(),
    };
    let count = |idx: usize, old: u32, what: &str| match parts.get(idx).filter(|s| !s.is_empty()) {
        Some(new) => new.parse::<u32>().map_err(|_| format!("{what} must be a number")),
        None => Ok(old),
    };
    Ok(Player {
        name: text(0, &current.name),
        position: text(1, &current.position),
        number: text(2, &current.number),
        age: text(3, &current.age),
        goals: count(4, current.goals, "goals")?,
        assists: count(5, current.assists, "assists")?,
        matches_played: count(6, current.matches_played, "played")?,
    })
}
