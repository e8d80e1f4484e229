use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use std::time::Duration;

use thiserror::Error;

use crate::catalog;
use crate::standings::{StandingsTable, StandingsView, build_table};
use crate::store::{CollectionPath, DivisionCollection, DocumentStore, StoreError, WatchEvent};

/// App id the bootstrap hands out before a real one is configured.
pub const PLACEHOLDER_APP_ID: &str = "default-app-id";
pub const LEAGUE_RANKINGS_COLLECTION: &str = "leagueRankings";

const CANCEL_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("missing {0}")]
    MissingSelector(&'static str),
    #[error("load failed: {0}")]
    Store(#[from] StoreError),
}

/// What a standings panel is looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StandingsQuery {
    Division {
        app_id: String,
        state: String,
        division: String,
    },
    AllLeagues {
        app_id: String,
    },
}

impl StandingsQuery {
    pub fn division(app_id: &str, state: &str, division: &str) -> Self {
        StandingsQuery::Division {
            app_id: app_id.to_string(),
            state: state.to_string(),
            division: division.to_string(),
        }
    }

    pub fn all_leagues(app_id: &str) -> Self {
        StandingsQuery::AllLeagues {
            app_id: app_id.to_string(),
        }
    }

    /// Checks the selector and resolves the collection it reads.
    pub fn path(&self) -> Result<CollectionPath, FeedError> {
        match self {
            StandingsQuery::Division {
                app_id,
                state,
                division,
            } => {
                let app_id = require_app_id(app_id)?;
                let state = require(state, "state")?;
                let division = require(division, "division")?;
                Ok(CollectionPath::division(
                    app_id,
                    state,
                    division,
                    DivisionCollection::Rankings,
                ))
            }
            StandingsQuery::AllLeagues { app_id } => {
                let app_id = require_app_id(app_id)?;
                Ok(CollectionPath::app_data(app_id, LEAGUE_RANKINGS_COLLECTION))
            }
        }
    }

    pub fn view(&self) -> StandingsView {
        match self {
            StandingsQuery::Division { division, .. } => StandingsView::SingleDivision {
                label: catalog::division_label(division),
            },
            StandingsQuery::AllLeagues { .. } => StandingsView::ByLeague,
        }
    }
}

fn require<'a>(value: &'a str, what: &'static str) -> Result<&'a str, FeedError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FeedError::MissingSelector(what));
    }
    Ok(trimmed)
}

fn require_app_id(app_id: &str) -> Result<&str, FeedError> {
    let app_id = require(app_id, "app id")?;
    if app_id == PLACEHOLDER_APP_ID {
        return Err(FeedError::MissingSelector("app id"));
    }
    Ok(app_id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingsUpdate {
    /// 1-based count of passes delivered by this subscription.
    pub seq: u64,
    pub table: StandingsTable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StandingsEvent {
    Ready(StandingsUpdate),
    Failed(FeedError),
}

/// Point-in-time variant: one fetch, one pass.
pub fn load_standings_once(
    store: &dyn DocumentStore,
    query: &StandingsQuery,
) -> Result<StandingsTable, FeedError> {
    let path = query.path()?;
    let docs = store.list(&path)?;
    tracing::debug!(path = %path, docs = docs.len(), "standings fetched");
    Ok(build_table(&docs, &query.view()))
}

/// Serializes delivery against cancellation: once `close` returns, no
/// delivery is in progress and none will start.
struct Gate {
    cancelled: AtomicBool,
    delivering: Mutex<()>,
}

impl Gate {
    fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            delivering: Mutex::new(()),
        }
    }

    fn deliver(&self, f: impl FnOnce()) -> bool {
        let _guard = self.delivering.lock().expect("delivery gate lock poisoned");
        if self.cancelled.load(Ordering::SeqCst) {
            return false;
        }
        f();
        true
    }

    fn close(&self, from_worker: bool) {
        self.cancelled.store(true, Ordering::SeqCst);
        if !from_worker {
            // Wait out a delivery that is already running.
            let _guard = self.delivering.lock().expect("delivery gate lock poisoned");
        }
    }

    fn is_closed(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Live standings for one query. Cancel (or drop) to detach.
pub struct StandingsSubscription {
    gate: Arc<Gate>,
    watch: crate::store::WatchHandle,
    worker: ThreadId,
}

impl StandingsSubscription {
    /// After this returns the consumer callback is never invoked again. Safe
    /// to call from inside the callback.
    pub fn cancel(&self) {
        if self.gate.is_closed() {
            return;
        }
        let from_worker = thread::current().id() == self.worker;
        self.gate.close(from_worker);
        self.watch.cancel();
        tracing::debug!("standings subscription cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        self.gate.is_closed()
    }
}

impl Drop for StandingsSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Subscribes to a standings collection. Each inbound snapshot triggers one
/// normalize + aggregate + map pass; snapshots that pile up while a pass is
/// running are coalesced so only the newest is processed.
///
/// Selector problems fail here, before the store is touched. A store failure
/// (at setup or later) is reported exactly once and ends the subscription;
/// there is no automatic retry.
pub fn subscribe_standings<F>(
    store: Arc<dyn DocumentStore>,
    query: &StandingsQuery,
    mut on_event: F,
) -> Result<StandingsSubscription, FeedError>
where
    F: FnMut(StandingsEvent) + Send + 'static,
{
    let path = query.path()?;
    let view = query.view();
    let (tx, rx) = mpsc::channel::<WatchEvent>();
    let watch = store.watch(&path, tx)?;
    let gate = Arc::new(Gate::new());
    let worker_gate = gate.clone();
    let worker_watch = watch.clone();

    let worker = thread::spawn(move || {
        let mut seq = 0u64;
        loop {
            let first = match rx.recv_timeout(CANCEL_POLL) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => {
                    if worker_gate.is_closed() {
                        break;
                    }
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            };
            let latest = coalesce(first, &rx);
            match latest {
                WatchEvent::Snapshot(docs) => {
                    seq += 1;
                    let table = build_table(&docs, &view);
                    tracing::debug!(path = %path, docs = docs.len(), seq, "standings pass");
                    let update = StandingsUpdate { seq, table };
                    if !worker_gate.deliver(|| on_event(StandingsEvent::Ready(update))) {
                        break;
                    }
                }
                WatchEvent::Failed(err) => {
                    tracing::warn!(path = %path, error = %err, "standings watch failed");
                    worker_gate.deliver(|| on_event(StandingsEvent::Failed(FeedError::Store(err))));
                    break;
                }
            }
        }
        worker_watch.cancel();
    });

    Ok(StandingsSubscription {
        gate,
        watch,
        worker: worker.thread().id(),
    })
}

/// Drains whatever is queued and keeps the newest event. A failure is
/// terminal, so nothing queued behind it matters.
fn coalesce(first: WatchEvent, rx: &mpsc::Receiver<WatchEvent>) -> WatchEvent {
    let mut latest = first;
    while !matches!(latest, WatchEvent::Failed(_)) {
        match rx.try_recv() {
            Ok(next) => latest = next,
            Err(_) => break,
        }
    }
    latest
}
