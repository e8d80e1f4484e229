pub const STATES: [&str; 5] = ["Karnataka", "Delhi", "Maharashtra", "Tamil Nadu", "Kerala"];

/// (id, display name)
pub const DIVISIONS: [(&str, &str); 7] = [
    ("U15", "Under 15"),
    ("U17", "Under 17"),
    ("U21", "Under 21"),
    ("C_Division", "C Division"),
    ("B_Division", "B Division"),
    ("A_Division", "A Division"),
    ("Super_Division", "Super Division"),
];

pub const DEFAULT_DIVISION: &str = "A_Division";

/// Display name for a division id; unknown ids get underscores turned into
/// spaces.
pub fn division_label(id: &str) -> String {
    DIVISIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(id))
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| id.replace('_', " "))
}

pub fn division_index(id: &str) -> Option<usize> {
    DIVISIONS
        .iter()
        .position(|(known, _)| known.eq_ignore_ascii_case(id))
}

pub fn state_index(name: &str) -> Option<usize> {
    STATES.iter().position(|s| s.eq_ignore_ascii_case(name))
}
