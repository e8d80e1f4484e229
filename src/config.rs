use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::catalog;
use crate::feed::PLACEHOLDER_APP_ID;

const APP_DIR: &str = "ksfa_terminal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    Firestore,
    Sample,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub source: DataSourceKind,
    pub project_id: Option<String>,
    pub api_key: Option<String>,
    pub app_id: String,
    pub poll_interval: Duration,
    /// `None` means requests may wait indefinitely.
    pub http_timeout: Option<Duration>,
    pub initial_state: String,
    pub initial_division: String,
    pub demo_tick: Duration,
    pub log_to_file: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|val| val.trim().to_string())
                .filter(|val| !val.is_empty())
        };

        let project_id = get("KSFA_PROJECT_ID");
        let source = match get("KSFA_DATA_SOURCE").map(|v| v.to_lowercase()).as_deref() {
            Some("firestore") => DataSourceKind::Firestore,
            Some("sample") => DataSourceKind::Sample,
            _ if project_id.is_some() => DataSourceKind::Firestore,
            _ => DataSourceKind::Sample,
        };

        let poll_interval = Duration::from_secs(
            get("KSFA_POLL_SECS")
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(15)
                .clamp(2, 300),
        );
        let http_timeout = get("KSFA_HTTP_TIMEOUT_SECS")
            .and_then(|val| val.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let demo_tick = Duration::from_secs(
            get("KSFA_DEMO_TICK_SECS")
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(6)
                .clamp(1, 120),
        );

        let initial_state = get("KSFA_STATE")
            .and_then(|name| catalog::state_index(&name))
            .map(|idx| catalog::STATES[idx].to_string())
            .unwrap_or_else(|| catalog::STATES[0].to_string());
        let initial_division = get("KSFA_DIVISION")
            .and_then(|id| catalog::division_index(&id))
            .map(|idx| catalog::DIVISIONS[idx].0.to_string())
            .unwrap_or_else(|| catalog::DEFAULT_DIVISION.to_string());

        let app_id = get("KSFA_APP_ID").unwrap_or_else(|| match source {
            DataSourceKind::Sample => crate::sample::SAMPLE_APP_ID.to_string(),
            DataSourceKind::Firestore => PLACEHOLDER_APP_ID.to_string(),
        });

        Self {
            source,
            project_id,
            api_key: get("KSFA_API_KEY"),
            app_id,
            poll_interval,
            http_timeout,
            initial_state,
            initial_division,
            demo_tick,
            log_to_file: !matches!(get("KSFA_LOG").as_deref(), Some("off")),
        }
    }
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

pub fn log_file_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("ksfa.log"))
}
