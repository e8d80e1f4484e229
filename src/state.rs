use std::collections::VecDeque;
use std::path::PathBuf;

use crate::catalog;
use crate::feed::StandingsQuery;
use crate::fixtures::{Fixture, FixtureBoard, split_fixtures};
use crate::news::{DEFAULT_NEWS_LIMIT, NewsFilter, NewsItem, filter_news};
use crate::record::TeamRecord;
use crate::roster::Player;
use crate::standings::{StandingRow, StandingsTable};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Standings,
    Fixtures,
    News,
    Roster,
}

/// Per-panel load lifecycle: `Idle -> Loading -> Ready | Failed`, back to
/// `Loading` only when the UI asks again.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl LoadState {
    pub fn label(&self) -> &str {
        match self {
            LoadState::Idle => "idle",
            LoadState::Loading => "loading",
            LoadState::Ready => "ready",
            LoadState::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandingsMode {
    Division,
    AllLeagues,
}

/// What the one-line prompt is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    SignIn,
    AddNews,
    AddFixture,
    AddTeam,
    AddPlayer,
    EditPlayer,
}

impl PromptKind {
    pub fn hint(self) -> &'static str {
        match self {
            PromptKind::SignIn => "email password",
            PromptKind::AddNews => "title | content [| image url]",
            PromptKind::AddFixture => "home | away | YYYY-MM-DDTHH:MM | venue [| completed h-a]",
            PromptKind::AddTeam => "team | played | won | draw | lost | points",
            PromptKind::AddPlayer => "name | position | number | age",
            PromptKind::EditPlayer => "name | position | number | age | goals | assists | played",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

/// Division a roster was opened from. Writes go back there even after the
/// selector has moved on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterTarget {
    pub state: String,
    pub division: String,
    pub team: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub email: Option<String>,
    pub anonymous: bool,
    pub admin: bool,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub app_id: String,
    pub screen: Screen,
    pub state_idx: usize,
    pub division_idx: usize,
    pub standings_mode: StandingsMode,
    /// Id of the live subscription whose deltas are accepted.
    pub standings_sub: u64,
    pub standings_load: LoadState,
    pub standings: StandingsTable,
    pub standings_seq: u64,
    pub selected: usize,
    pub fixtures_load: LoadState,
    pub fixtures: FixtureBoard,
    pub fixtures_scroll: u16,
    pub news_load: LoadState,
    pub news_all: Vec<NewsItem>,
    pub news_filter: NewsFilter,
    pub news_selected: usize,
    pub roster_load: LoadState,
    pub roster_target: Option<RosterTarget>,
    pub roster: Vec<Player>,
    pub roster_selected: usize,
    pub session: Option<SessionInfo>,
    pub prompt: Option<Prompt>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

#[derive(Debug, Clone)]
pub enum Delta {
    Standings {
        sub: u64,
        seq: u64,
        table: StandingsTable,
    },
    StandingsFailed {
        sub: u64,
        message: String,
    },
    SetFixtures(Vec<Fixture>),
    FixturesFailed(String),
    SetNews(Vec<NewsItem>),
    NewsFailed(String),
    SetRoster {
        target: RosterTarget,
        players: Vec<Player>,
    },
    RosterFailed(String),
    SetSession(SessionInfo),
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchFixtures {
        state: String,
        division: String,
    },
    FetchNews,
    FetchRoster {
        target: RosterTarget,
    },
    SignInAnonymously,
    SignIn {
        email: String,
        password: String,
    },
    AddNews {
        item: NewsItem,
    },
    DeleteNews {
        id: String,
    },
    AddFixture {
        fixture: Fixture,
    },
    AddTeam {
        state: String,
        division: String,
        team: TeamRecord,
    },
    DeleteTeam {
        state: String,
        division: String,
        doc_id: String,
        team: String,
    },
    /// Writes the whole player list.
    SaveRoster {
        target: RosterTarget,
        players: Vec<Player>,
    },
    ExportStandings {
        path: PathBuf,
        table: StandingsTable,
    },
}

impl AppState {
    pub fn new(app_id: &str, state_name: &str, division_id: &str) -> Self {
        Self {
            app_id: app_id.to_string(),
            screen: Screen::Standings,
            state_idx: catalog::state_index(state_name).unwrap_or(0),
            division_idx: catalog::division_index(division_id)
                .or_else(|| catalog::division_index(catalog::DEFAULT_DIVISION))
                .unwrap_or(0),
            standings_mode: StandingsMode::Division,
            standings_sub: 0,
            standings_load: LoadState::Idle,
            standings: StandingsTable::default(),
            standings_seq: 0,
            selected: 0,
            fixtures_load: LoadState::Idle,
            fixtures: FixtureBoard::default(),
            fixtures_scroll: 0,
            news_load: LoadState::Idle,
            news_all: Vec::new(),
            news_filter: NewsFilter::default(),
            news_selected: 0,
            roster_load: LoadState::Idle,
            roster_target: None,
            roster: Vec::new(),
            roster_selected: 0,
            session: None,
            prompt: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
        }
    }

    pub fn state_name(&self) -> &'static str {
        catalog::STATES[self.state_idx % catalog::STATES.len()]
    }

    pub fn division_id(&self) -> &'static str {
        catalog::DIVISIONS[self.division_idx % catalog::DIVISIONS.len()].0
    }

    pub fn standings_query(&self) -> StandingsQuery {
        match self.standings_mode {
            StandingsMode::Division => {
                StandingsQuery::division(&self.app_id, self.state_name(), self.division_id())
            }
            StandingsMode::AllLeagues => StandingsQuery::all_leagues(&self.app_id),
        }
    }

    /// Starts a new standings subscription id and enters `Loading`. Deltas
    /// tagged with older ids are ignored from here on.
    pub fn begin_standings(&mut self) -> u64 {
        self.standings_sub += 1;
        self.standings_load = LoadState::Loading;
        self.standings = StandingsTable::default();
        self.standings_seq = 0;
        self.selected = 0;
        self.standings_sub
    }

    pub fn begin_fixtures(&mut self) {
        self.fixtures_load = LoadState::Loading;
        self.fixtures_scroll = 0;
    }

    pub fn begin_news(&mut self) {
        self.news_load = LoadState::Loading;
    }

    /// Opens `team` in the currently selected division.
    pub fn begin_roster(&mut self, team: &str) -> RosterTarget {
        let target = RosterTarget {
            state: self.state_name().to_string(),
            division: self.division_id().to_string(),
            team: team.to_string(),
        };
        self.roster_load = LoadState::Loading;
        self.roster_target = Some(target.clone());
        self.roster.clear();
        self.roster_selected = 0;
        target
    }

    /// Reloads the open roster without touching its target.
    pub fn restart_roster(&mut self) -> Option<RosterTarget> {
        let target = self.roster_target.clone()?;
        self.roster_load = LoadState::Loading;
        Some(target)
    }

    pub fn selected_player(&self) -> Option<&Player> {
        self.roster.get(self.roster_selected)
    }

    fn save_roster(&self, players: Vec<Player>) -> Option<ProviderCommand> {
        let target = self.roster_target.clone()?;
        Some(ProviderCommand::SaveRoster { target, players })
    }

    pub fn add_player(&self, player: Player) -> Option<ProviderCommand> {
        let mut players = self.roster.clone();
        players.push(player);
        self.save_roster(players)
    }

    pub fn replace_selected_player(&self, player: Player) -> Option<ProviderCommand> {
        self.selected_player()?;
        let mut players = self.roster.clone();
        players[self.roster_selected] = player;
        self.save_roster(players)
    }

    pub fn remove_selected_player(&self) -> Option<ProviderCommand> {
        self.selected_player()?;
        let mut players = self.roster.clone();
        players.remove(self.roster_selected);
        self.save_roster(players)
    }

    /// Delete command for the highlighted division row, addressed by its
    /// stored document id.
    pub fn delete_selected_team(&self) -> Option<ProviderCommand> {
        if self.standings_mode != StandingsMode::Division {
            return None;
        }
        let row = self.selected_row()?;
        Some(ProviderCommand::DeleteTeam {
            state: self.state_name().to_string(),
            division: self.division_id().to_string(),
            doc_id: row.doc_id.clone().unwrap_or_else(|| row.team.clone()),
            team: row.team.clone(),
        })
    }

    pub fn cycle_state(&mut self) {
        self.state_idx = (self.state_idx + 1) % catalog::STATES.len();
    }

    pub fn cycle_division(&mut self) {
        self.division_idx = (self.division_idx + 1) % catalog::DIVISIONS.len();
    }

    pub fn toggle_standings_mode(&mut self) {
        self.standings_mode = match self.standings_mode {
            StandingsMode::Division => StandingsMode::AllLeagues,
            StandingsMode::AllLeagues => StandingsMode::Division,
        };
    }

    pub fn selected_row(&self) -> Option<&StandingRow> {
        self.standings.rows().nth(self.selected).map(|(_, row)| row)
    }

    pub fn select_next(&mut self) {
        match self.screen {
            Screen::Standings => {
                let total = self.standings.row_count();
                if total > 0 {
                    self.selected = (self.selected + 1).min(total - 1);
                }
            }
            Screen::News => {
                let total = self.visible_news().len();
                if total > 0 {
                    self.news_selected = (self.news_selected + 1).min(total - 1);
                }
            }
            Screen::Fixtures => self.fixtures_scroll = self.fixtures_scroll.saturating_add(1),
            Screen::Roster => {
                let total = self.roster.len();
                if total > 0 {
                    self.roster_selected = (self.roster_selected + 1).min(total - 1);
                }
            }
        }
    }

    pub fn select_prev(&mut self) {
        match self.screen {
            Screen::Standings => self.selected = self.selected.saturating_sub(1),
            Screen::News => self.news_selected = self.news_selected.saturating_sub(1),
            Screen::Fixtures => self.fixtures_scroll = self.fixtures_scroll.saturating_sub(1),
            Screen::Roster => self.roster_selected = self.roster_selected.saturating_sub(1),
        }
    }

    pub fn visible_news(&self) -> Vec<NewsItem> {
        filter_news(&self.news_all, &self.news_filter, DEFAULT_NEWS_LIMIT)
    }

    pub fn selected_news(&self) -> Option<NewsItem> {
        self.visible_news().into_iter().nth(self.news_selected)
    }

    /// All -> each state -> All.
    pub fn cycle_news_state(&mut self) {
        self.news_filter.state = cycle_option(self.news_filter.state.as_deref(), &catalog::STATES);
        self.news_selected = 0;
    }

    pub fn cycle_news_division(&mut self) {
        let ids: Vec<&str> = catalog::DIVISIONS.iter().map(|(id, _)| *id).collect();
        self.news_filter.division = cycle_option(self.news_filter.division.as_deref(), &ids);
        self.news_selected = 0;
    }

    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.admin)
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

fn cycle_option(current: Option<&str>, choices: &[&str]) -> Option<String> {
    match current {
        None => choices.first().map(|c| c.to_string()),
        Some(cur) => {
            let idx = choices.iter().position(|c| *c == cur)?;
            choices.get(idx + 1).map(|c| c.to_string())
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Standings { sub, seq, table } => {
            if sub != state.standings_sub {
                return;
            }
            // Whole-table replacement: the newest pass wins.
            state.standings = table;
            state.standings_seq = seq;
            state.standings_load = LoadState::Ready;
            let total = state.standings.row_count();
            if total == 0 {
                state.selected = 0;
            } else if state.selected >= total {
                state.selected = total - 1;
            }
        }
        Delta::StandingsFailed { sub, message } => {
            if sub != state.standings_sub {
                return;
            }
            state.push_log(format!("[WARN] Standings: {message}"));
            state.standings_load = LoadState::Failed(message);
        }
        Delta::SetFixtures(fixtures) => {
            state.fixtures = split_fixtures(fixtures);
            state.fixtures_load = LoadState::Ready;
        }
        Delta::FixturesFailed(message) => {
            state.push_log(format!("[WARN] Fixtures: {message}"));
            state.fixtures_load = LoadState::Failed(message);
        }
        Delta::SetNews(items) => {
            state.news_all = items;
            state.news_load = LoadState::Ready;
            let total = state.visible_news().len();
            if state.news_selected >= total {
                state.news_selected = total.saturating_sub(1);
            }
        }
        Delta::NewsFailed(message) => {
            state.push_log(format!("[WARN] News: {message}"));
            state.news_load = LoadState::Failed(message);
        }
        Delta::SetRoster { target, players } => {
            if state.roster_target.as_ref() != Some(&target) {
                return;
            }
            state.roster = players;
            state.roster_load = LoadState::Ready;
            if state.roster_selected >= state.roster.len() {
                state.roster_selected = state.roster.len().saturating_sub(1);
            }
        }
        Delta::RosterFailed(message) => {
            state.push_log(format!("[WARN] Roster: {message}"));
            state.roster_load = LoadState::Failed(message);
        }
        Delta::SetSession(info) => {
            let who = info
                .email
                .clone()
                .unwrap_or_else(|| "anonymous".to_string());
            let role = if info.admin { "admin" } else { "viewer" };
            state.push_log(format!("[INFO] Signed in as {who} ({role})"));
            state.session = Some(info);
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

pub fn screen_label(screen: Screen) -> &'static str {
    match screen {
        Screen::Standings => "Standings",
        Screen::Fixtures => "Fixtures",
        Screen::News => "News",
        Screen::Roster => "Roster",
    }
}
