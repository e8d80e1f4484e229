use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, mpsc};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use ksfa_terminal::auth::{Authenticator, FirebaseAuth, SampleAuth};
use ksfa_terminal::catalog;
use ksfa_terminal::config::{self, Config, DataSourceKind};
use ksfa_terminal::feed::{StandingsEvent, StandingsSubscription, subscribe_standings};
use ksfa_terminal::firestore::FirestoreStore;
use ksfa_terminal::forms;
use ksfa_terminal::http_client::build_http_client;
use ksfa_terminal::provider::{ProviderContext, spawn_provider};
use ksfa_terminal::sample::{sample_accounts, seed_store, spawn_demo_feed};
use ksfa_terminal::standings::StandingRow;
use ksfa_terminal::state::{
    AppState, Delta, LoadState, Prompt, PromptKind, ProviderCommand, Screen, StandingsMode,
    apply_delta, screen_label,
};
use ksfa_terminal::store::{DocumentStore, MemoryStore, WatchHandle};

struct DataSource {
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn Authenticator>,
    label: &'static str,
    demo: Option<WatchHandle>,
}

struct App {
    state: AppState,
    should_quit: bool,
    store: Arc<dyn DocumentStore>,
    cmd_tx: mpsc::Sender<ProviderCommand>,
    delta_tx: mpsc::Sender<Delta>,
    standings_sub: Option<StandingsSubscription>,
    source_label: &'static str,
    export_dir: PathBuf,
}

impl App {
    fn new(
        config: &Config,
        source: &DataSource,
        cmd_tx: mpsc::Sender<ProviderCommand>,
        delta_tx: mpsc::Sender<Delta>,
    ) -> Self {
        Self {
            state: AppState::new(&config.app_id, &config.initial_state, &config.initial_division),
            should_quit: false,
            store: source.store.clone(),
            cmd_tx,
            delta_tx,
            standings_sub: None,
            source_label: source.label,
            export_dir: config::app_cache_dir()
                .map(|dir| dir.join("exports"))
                .unwrap_or_else(|| PathBuf::from("exports")),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.prompt.is_some() {
            self.on_prompt_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.screen = Screen::Standings,
            KeyCode::Char('2') => {
                self.state.screen = Screen::Fixtures;
                self.request_fixtures();
            }
            KeyCode::Char('3') => {
                self.state.screen = Screen::News;
                self.request_news();
            }
            KeyCode::Char('4') => self.state.screen = Screen::Roster,
            KeyCode::Char('s') => {
                self.state.cycle_state();
                self.on_selector_changed();
            }
            KeyCode::Char('v') => {
                self.state.cycle_division();
                self.on_selector_changed();
            }
            KeyCode::Char('g') => {
                self.state.toggle_standings_mode();
                self.resubscribe();
            }
            KeyCode::Char('r') => self.retry(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Enter => self.open_roster(),
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('f') => self.state.cycle_news_state(),
            KeyCode::Char('F') => self.state.cycle_news_division(),
            KeyCode::Char('L') => self.open_prompt(PromptKind::SignIn),
            KeyCode::Char('a') if self.state.is_admin() => self.start_add(),
            KeyCode::Char('x') if self.state.is_admin() => self.delete_selected(),
            KeyCode::Char('u') if self.state.is_admin() => self.start_edit_player(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn on_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.state.prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.state.prompt = None,
            KeyCode::Backspace => {
                prompt.input.pop();
            }
            KeyCode::Char(c) => prompt.input.push(c),
            KeyCode::Enter => {
                if let Some(prompt) = self.state.prompt.take() {
                    self.submit_prompt(prompt);
                }
            }
            _ => {}
        }
    }

    fn open_prompt(&mut self, kind: PromptKind) {
        self.open_prompt_with(kind, String::new());
    }

    fn open_prompt_with(&mut self, kind: PromptKind, input: String) {
        self.state.prompt = Some(Prompt { kind, input });
    }

    fn start_edit_player(&mut self) {
        if self.state.screen != Screen::Roster {
            return;
        }
        match self.state.selected_player().map(forms::player_edit_line) {
            Some(line) => self.open_prompt_with(PromptKind::EditPlayer, line),
            None => self.state.push_log("[INFO] Select a player first"),
        }
    }

    fn start_add(&mut self) {
        let kind = match self.state.screen {
            Screen::Standings if self.state.standings_mode == StandingsMode::Division => {
                PromptKind::AddTeam
            }
            Screen::Standings => {
                self.state
                    .push_log("[INFO] Switch to a division view to add teams");
                return;
            }
            Screen::Fixtures => PromptKind::AddFixture,
            Screen::News => PromptKind::AddNews,
            Screen::Roster if self.state.roster_target.is_some() => PromptKind::AddPlayer,
            Screen::Roster => {
                self.state.push_log("[INFO] Open a team roster first");
                return;
            }
        };
        self.open_prompt(kind);
    }

    fn submit_prompt(&mut self, prompt: Prompt) {
        let state_name = self.state.state_name().to_string();
        let division = self.state.division_id().to_string();
        let cmd = match prompt.kind {
            PromptKind::SignIn => forms::parse_sign_in(&prompt.input)
                .map(|(email, password)| ProviderCommand::SignIn { email, password }),
            PromptKind::AddNews => forms::parse_news(&prompt.input, &state_name, &division)
                .map(|item| ProviderCommand::AddNews { item }),
            PromptKind::AddFixture => forms::parse_fixture(&prompt.input, &state_name, &division)
                .map(|fixture| ProviderCommand::AddFixture { fixture }),
            PromptKind::AddTeam => forms::parse_team(&prompt.input).map(|team| {
                ProviderCommand::AddTeam {
                    state: state_name.clone(),
                    division: division.clone(),
                    team,
                }
            }),
            PromptKind::AddPlayer => forms::parse_player(&prompt.input).and_then(|player| {
                self.state
                    .add_player(player)
                    .ok_or_else(|| "no roster open".to_string())
            }),
            PromptKind::EditPlayer => match self.state.selected_player() {
                Some(current) => forms::parse_player_edit(&prompt.input, current).and_then(|player| {
                    self.state
                        .replace_selected_player(player)
                        .ok_or_else(|| "no player selected".to_string())
                }),
                None => Err("no player selected".to_string()),
            },
        };
        match cmd {
            Ok(cmd) => self.send(cmd),
            Err(err) => self.state.push_log(format!("[WARN] {err}")),
        }
    }

    fn delete_selected(&mut self) {
        match self.state.screen {
            Screen::Standings => {
                if let Some(cmd) = self.state.delete_selected_team() {
                    self.send(cmd);
                }
            }
            Screen::Roster => {
                if let Some(cmd) = self.state.remove_selected_player() {
                    self.send(cmd);
                }
            }
            Screen::News => {
                if let Some(item) = self.state.selected_news() {
                    self.send(ProviderCommand::DeleteNews { id: item.id });
                }
            }
            _ => {}
        }
    }

    fn send(&mut self, cmd: ProviderCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Provider unavailable");
        }
    }

    fn on_selector_changed(&mut self) {
        if self.state.standings_mode == StandingsMode::Division {
            self.resubscribe();
        }
        if self.state.screen == Screen::Fixtures {
            self.request_fixtures();
        }
    }

    /// Replaces the live standings subscription with one for the current
    /// selector.
    fn resubscribe(&mut self) {
        if let Some(old) = self.standings_sub.take() {
            old.cancel();
        }
        let sub = self.state.begin_standings();
        let query = self.state.standings_query();
        let tx = self.delta_tx.clone();
        let result = subscribe_standings(self.store.clone(), &query, move |event| {
            let delta = match event {
                StandingsEvent::Ready(update) => Delta::Standings {
                    sub,
                    seq: update.seq,
                    table: update.table,
                },
                StandingsEvent::Failed(err) => Delta::StandingsFailed {
                    sub,
                    message: err.to_string(),
                },
            };
            let _ = tx.send(delta);
        });
        match result {
            Ok(handle) => self.standings_sub = Some(handle),
            Err(err) => apply_delta(
                &mut self.state,
                Delta::StandingsFailed {
                    sub,
                    message: err.to_string(),
                },
            ),
        }
    }

    fn retry(&mut self) {
        match self.state.screen {
            Screen::Standings => self.resubscribe(),
            Screen::Fixtures => self.request_fixtures(),
            Screen::News => self.request_news(),
            Screen::Roster => {
                if let Some(target) = self.state.restart_roster() {
                    self.send(ProviderCommand::FetchRoster { target });
                }
            }
        }
    }

    fn request_fixtures(&mut self) {
        self.state.begin_fixtures();
        let cmd = ProviderCommand::FetchFixtures {
            state: self.state.state_name().to_string(),
            division: self.state.division_id().to_string(),
        };
        self.send(cmd);
    }

    fn request_news(&mut self) {
        self.state.begin_news();
        self.send(ProviderCommand::FetchNews);
    }

    fn request_roster(&mut self, team: &str) {
        let target = self.state.begin_roster(team);
        self.send(ProviderCommand::FetchRoster { target });
    }

    fn open_roster(&mut self) {
        if self.state.screen != Screen::Standings {
            return;
        }
        if self.state.standings_mode != StandingsMode::Division {
            self.state
                .push_log("[INFO] Rosters are kept per division");
            return;
        }
        let Some(team) = self.state.selected_row().map(|row| row.team.clone()) else {
            return;
        };
        self.state.screen = Screen::Roster;
        self.request_roster(&team);
    }

    fn export(&mut self) {
        if self.state.standings.is_empty() {
            self.state.push_log("[INFO] Nothing to export");
            return;
        }
        let name = match self.state.standings_mode {
            StandingsMode::Division => format!(
                "standings-{}-{}.xlsx",
                self.state.state_name().to_lowercase().replace(' ', "-"),
                self.state.division_id()
            ),
            StandingsMode::AllLeagues => "standings-leagues.xlsx".to_string(),
        };
        let cmd = ProviderCommand::ExportStandings {
            path: self.export_dir.join(name),
            table: self.state.standings.clone(),
        };
        self.send(cmd);
    }
}

fn install_tracing(config: &Config) {
    if !config.log_to_file {
        return;
    }
    let Some(path) = config::log_file_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

fn build_source(config: &Config) -> Result<DataSource> {
    match config.source {
        DataSourceKind::Sample => {
            let store = Arc::new(MemoryStore::new());
            seed_store(&store, &config.app_id);
            let demo = WatchHandle::new();
            spawn_demo_feed(store.clone(), config.app_id.clone(), config.demo_tick, demo.clone());
            Ok(DataSource {
                store,
                auth: Arc::new(SampleAuth::new(sample_accounts())),
                label: "sample",
                demo: Some(demo),
            })
        }
        DataSourceKind::Firestore => {
            let client = build_http_client(config)?;
            let store = FirestoreStore::new(config, client.clone()).context("configure firestore")?;
            Ok(DataSource {
                store: Arc::new(store),
                auth: Arc::new(FirebaseAuth::new(client, config.api_key.clone())),
                label: "firestore",
                demo: None,
            })
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = Config::from_env();
    install_tracing(&config);
    tracing::info!(source = ?config.source, app_id = %config.app_id, "starting");

    let source = build_source(&config)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(
        tx.clone(),
        cmd_rx,
        ProviderContext {
            store: source.store.clone(),
            auth: source.auth.clone(),
            app_id: config.app_id.clone(),
        },
    );

    let mut app = App::new(&config, &source, cmd_tx, tx);
    app.send(ProviderCommand::SignInAnonymously);
    app.resubscribe();

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Some(sub) = app.standings_sub.take() {
        sub.cancel();
    }
    if let Some(demo) = &source.demo {
        demo.cancel();
    }

    if let Err(err) = res {
        tracing::warn!("terminal loop failed: {err}");
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Standings => render_standings(frame, chunks[1], &app.state),
        Screen::Fixtures => render_fixtures(frame, chunks[1], &app.state),
        Screen::News => render_news(frame, chunks[1], &app.state),
        Screen::Roster => render_roster(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        let area = frame.size();
        render_help_overlay(frame, area, app.state.is_admin());
    }
}

fn header_text(app: &App) -> String {
    let state = &app.state;
    let selector = match state.standings_mode {
        StandingsMode::Division => format!(
            "{} | {}",
            state.state_name(),
            catalog::division_label(state.division_id())
        ),
        StandingsMode::AllLeagues => "All leagues".to_string(),
    };
    let who = match &state.session {
        Some(s) if s.admin => format!("{} (admin)", s.email.as_deref().unwrap_or("?")),
        Some(s) => s.email.clone().unwrap_or_else(|| "guest".to_string()),
        None => "signing in".to_string(),
    };
    let line1 = format!(
        "  KSFA TERMINAL | {} | {selector}",
        screen_label(state.screen)
    );
    let line2 = format!("  source: {} | app: {} | {who}", app.source_label, state.app_id);
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    if let Some(prompt) = &state.prompt {
        return format!("{} > {}_   (Enter submit, Esc cancel)", prompt.kind.hint(), prompt.input);
    }
    let admin = if state.is_admin() { " | a Add | x Delete" } else { "" };
    match state.screen {
        Screen::Standings => format!(
            "1-4 Screens | s State | v Division | g Leagues | j/k Move | Enter Roster | e Export | r Retry{admin} | L Sign in | ? Help | q Quit"
        ),
        Screen::Fixtures => format!(
            "1-4 Screens | s State | v Division | j/k Scroll | r Refresh{admin} | ? Help | q Quit"
        ),
        Screen::News => format!(
            "1-4 Screens | f State filter | F Division filter | j/k Move | r Refresh{admin} | ? Help | q Quit"
        ),
        Screen::Roster => {
            let edit = if state.is_admin() { " | u Edit" } else { "" };
            format!("1-4 Screens | j/k Move | r Refresh{admin}{edit} | ? Help | q Quit")
        }
    }
}

fn load_banner(what: &str, load: &LoadState) -> Option<String> {
    match load {
        LoadState::Idle => Some(format!("No {what} requested yet")),
        LoadState::Loading => Some(format!("Loading {what}...")),
        LoadState::Failed(message) => Some(format!("Could not load {what}: {message}\nPress r to retry")),
        LoadState::Ready => None,
    }
}

fn standing_line(row: &StandingRow) -> String {
    format!(
        "{:>3}  {:<26} {:>3} {:>3} {:>3} {:>3} {:>4}",
        row.position, row.team, row.played, row.won, row.draw, row.lost, row.points
    )
}

fn render_standings(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Standings").borders(Borders::ALL);
    if let Some(banner) = load_banner("standings", &state.standings_load) {
        frame.render_widget(Paragraph::new(banner).block(block), area);
        return;
    }
    if state.standings.is_empty() {
        frame.render_widget(Paragraph::new("No teams in this table yet").block(block), area);
        return;
    }

    let heading = Style::default().add_modifier(Modifier::BOLD);
    let mut lines: Vec<Line> = Vec::new();
    let mut selected_line = 0usize;
    let mut idx = 0usize;
    for group in &state.standings.groups {
        lines.push(Line::from(Span::styled(group.league_name.clone(), heading.fg(Color::Yellow))));
        lines.push(Line::from(Span::styled(
            format!(
                "{:>3}  {:<26} {:>3} {:>3} {:>3} {:>3} {:>4}",
                "Pos", "Team", "P", "W", "D", "L", "Pts"
            ),
            heading,
        )));
        for row in &group.rows {
            let style = if idx == state.selected {
                selected_line = lines.len();
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(standing_line(row), style)));
            idx += 1;
        }
        lines.push(Line::from(""));
    }

    let visible = area.height.saturating_sub(2) as usize;
    let offset = selected_line.saturating_sub(visible.saturating_sub(1));
    let title = format!("Standings (update {})", state.standings_seq);
    let table = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .scroll((offset as u16, 0));
    frame.render_widget(table, area);
}

fn render_fixtures(frame: &mut Frame, area: Rect, state: &AppState) {
    if let Some(banner) = load_banner("fixtures", &state.fixtures_load) {
        let block = Block::default().title("Fixtures").borders(Borders::ALL);
        frame.render_widget(Paragraph::new(banner).block(block), area);
        return;
    }
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let completed = if state.fixtures.completed.is_empty() {
        "No results yet".to_string()
    } else {
        state
            .fixtures
            .completed
            .iter()
            .map(|f| {
                format!(
                    "{} {} {}\n  {} @ {}",
                    f.home_team,
                    f.score_label(),
                    f.away_team,
                    f.date,
                    f.venue
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    let upcoming = if state.fixtures.upcoming.is_empty() {
        "No upcoming fixtures".to_string()
    } else {
        state
            .fixtures
            .upcoming
            .iter()
            .map(|f| format!("{} vs {}\n  {} @ {}", f.home_team, f.away_team, f.date, f.venue))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let left = Paragraph::new(completed)
        .block(Block::default().title("Results").borders(Borders::ALL))
        .scroll((state.fixtures_scroll, 0));
    frame.render_widget(left, columns[0]);
    let right = Paragraph::new(upcoming)
        .block(Block::default().title("Upcoming").borders(Borders::ALL))
        .scroll((state.fixtures_scroll, 0));
    frame.render_widget(right, columns[1]);
}

fn render_news(frame: &mut Frame, area: Rect, state: &AppState) {
    let filter = format!(
        "News [{} / {}]",
        state.news_filter.state.as_deref().unwrap_or("All states"),
        state
            .news_filter
            .division
            .as_deref()
            .map(catalog::division_label)
            .unwrap_or_else(|| "All divisions".to_string())
    );
    if let Some(banner) = load_banner("news", &state.news_load) {
        let block = Block::default().title(filter).borders(Borders::ALL);
        frame.render_widget(Paragraph::new(banner).block(block), area);
        return;
    }
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(44), Constraint::Min(20)])
        .split(area);

    let items = state.visible_news();
    let lines: Vec<Line> = if items.is_empty() {
        vec![Line::from("No news for this filter")]
    } else {
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let style = if idx == state.news_selected {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(item.title.clone(), style))
            })
            .collect()
    };
    let list = Paragraph::new(lines).block(Block::default().title(filter).borders(Borders::ALL));
    frame.render_widget(list, columns[0]);

    let detail = match state.selected_news() {
        Some(item) => format!(
            "{}\n{} | {}\n{} / {}\n\n{}",
            item.title,
            item.author,
            item.date,
            item.state,
            catalog::division_label(&item.division),
            item.content
        ),
        None => String::new(),
    };
    let body = Paragraph::new(detail)
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Article").borders(Borders::ALL));
    frame.render_widget(body, columns[1]);
}

fn render_roster(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = match &state.roster_target {
        Some(target) => format!(
            "Roster - {} ({} / {})",
            target.team,
            target.state,
            catalog::division_label(&target.division)
        ),
        None => "Roster".to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    if state.roster_target.is_none() {
        let hint = "Select a team on the Standings screen and press Enter";
        frame.render_widget(Paragraph::new(hint).block(block), area);
        return;
    }
    if let Some(banner) = load_banner("roster", &state.roster_load) {
        frame.render_widget(Paragraph::new(banner).block(block), area);
        return;
    }
    if state.roster.is_empty() {
        frame.render_widget(Paragraph::new("No players registered").block(block), area);
        return;
    }
    let mut lines = vec![Line::from(Span::styled(
        format!(
            "{:>3}  {:<24} {:<12} {:>4} {:>4} {:>4} {:>4}",
            "#", "Player", "Position", "Age", "MP", "G", "A"
        ),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    lines.extend(state.roster.iter().enumerate().map(|(idx, p)| {
        let text = format!(
            "{:>3}  {:<24} {:<12} {:>4} {:>4} {:>4} {:>4}",
            p.number, p.name, p.position, p.age, p.matches_played, p.goals, p.assists
        );
        if idx == state.roster_selected {
            Line::from(Span::styled(
                text,
                Style::default().fg(Color::Black).bg(Color::Cyan),
            ))
        } else {
            Line::from(text)
        }
    }));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect, admin: bool) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let mut text = vec![
        "KSFA Terminal - Help",
        "",
        "Global:",
        "  1 / 2 / 3 / 4  Standings / Fixtures / News / Roster",
        "  s              Next state",
        "  v              Next division",
        "  r              Retry / refresh current screen",
        "  L              Sign in with email and password",
        "  ?              Toggle help",
        "  q              Quit",
        "",
        "Standings:",
        "  g              Division / all leagues",
        "  j/k or Up/Down Move selection",
        "  Enter          Open team roster",
        "  e              Export table to xlsx",
        "",
        "News:",
        "  f / F          Cycle state / division filter",
    ];
    if admin {
        text.extend([
            "",
            "Admin:",
            "  a              Add team / fixture / news / player",
            "  x              Delete selected team, article or player",
            "  u              Edit selected player (stats included)",
        ]);
    }

    let help = Paragraph::new(text.join("\n"))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
