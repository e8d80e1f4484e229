use ksfa_terminal::fixtures::FixtureStatus;
use ksfa_terminal::forms::{
    parse_fixture, parse_news, parse_player, parse_player_edit, parse_sign_in, parse_team,
    player_edit_line,
};
use ksfa_terminal::roster::Player;

#[test]
fn sign_in_needs_email_and_password() {
    assert_eq!(
        parse_sign_in("  admin@ksfa.local  hunter2 "),
        Ok(("admin@ksfa.local".to_string(), "hunter2".to_string()))
    );
    assert!(parse_sign_in("admin@ksfa.local").is_err());
    assert!(parse_sign_in("not-an-email pw").is_err());
}

#[test]
fn news_takes_title_and_content() {
    let item = parse_news("Cup final | Tickets on sale now", "Kerala", "U17").unwrap();
    assert_eq!(item.title, "Cup final");
    assert_eq!(item.content, "Tickets on sale now");
    assert_eq!(item.state, "Kerala");
    assert_eq!(item.division, "U17");
    assert!(parse_news(" | body only", "Kerala", "U17").is_err());
}

#[test]
fn fixture_with_optional_result() {
    let upcoming = parse_fixture("Lions | Eagles | 2026-11-01T16:00 | Main Ground", "Delhi", "U15")
        .unwrap();
    assert_eq!(upcoming.home_team, "Lions");
    assert_eq!(upcoming.away_team, "Eagles");
    assert_eq!(upcoming.venue, "Main Ground");
    assert_eq!(upcoming.status, FixtureStatus::Upcoming);
    assert_eq!(upcoming.home_score, None);

    let done = parse_fixture(
        "Lions | Eagles | 2026-10-01T16:00 | Main Ground | completed 3-1",
        "Delhi",
        "U15",
    )
    .unwrap();
    assert_eq!(done.status, FixtureStatus::Completed);
    assert_eq!((done.home_score, done.away_score), (Some(3), Some(1)));

    assert!(parse_fixture("Lions | | 2026-10-01", "Delhi", "U15").is_err());
    assert!(parse_fixture("Lions", "Delhi", "U15").is_err());
}

#[test]
fn team_counts_must_be_numbers() {
    let team = parse_team("River Hawks | 5 | 3 | 1 | 1 | 10").unwrap();
    assert_eq!(team.team_name, "River Hawks");
    assert_eq!((team.played, team.won, team.draw, team.lost), (5, 3, 1, 1));
    assert_eq!(team.points, 10);

    let bare = parse_team("New Club").unwrap();
    assert_eq!(bare.points, 0);
    assert_eq!(bare.played, 0);

    assert!(parse_team("Club | five").is_err());
    assert!(parse_team(" | 1 | 1").is_err());
}

#[test]
fn player_fields_are_positional() {
    let player = parse_player("Asha Nair | Forward | 9 | 19").unwrap();
    assert_eq!(player.name, "Asha Nair");
    assert_eq!(player.position, "Forward");
    assert_eq!(player.number, "9");
    assert_eq!(player.age, "19");
    assert_eq!(player.goals, 0);
    assert!(parse_player("").is_err());
}

#[test]
fn news_image_url_is_optional_third_field() {
    let item = parse_news("Trials | U17 trials open | https://img.ksfa/t.png", "Delhi", "U17").unwrap();
    assert_eq!(item.image_url, "https://img.ksfa/t.png");
    assert_eq!(parse_news("Trials", "Delhi", "U17").unwrap().image_url, "");
}

#[test]
fn player_edit_keeps_blank_fields_and_updates_stats() {
    let current = Player {
        name: "Asha Nair".to_string(),
        position: "Forward".to_string(),
        number: "9".to_string(),
        age: "19".to_string(),
        goals: 2,
        assists: 1,
        matches_played: 4,
    };
    let line = player_edit_line(&current);
    assert_eq!(line, "Asha Nair | Forward | 9 | 19 | 2 | 1 | 4");
    assert_eq!(parse_player_edit(&line, &current), Ok(current.clone()));

    let edited = parse_player_edit(" | Midfield | | | 3 | | 5", &current).unwrap();
    assert_eq!(edited.name, "Asha Nair");
    assert_eq!(edited.position, "Midfield");
    assert_eq!(edited.number, "9");
    assert_eq!((edited.goals, edited.assists, edited.matches_played), (3, 1, 5));

    assert!(parse_player_edit("Asha | Forward | 9 | 19 | many", &current).is_err());
}
