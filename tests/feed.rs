use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use ksfa_terminal::feed::{
    FeedError, PLACEHOLDER_APP_ID, StandingsEvent, StandingsQuery, StandingsSubscription,
    load_standings_once, subscribe_standings,
};
use ksfa_terminal::standings::StandingsTable;
use ksfa_terminal::store::{
    CollectionPath, DivisionCollection, Document, DocumentStore, MemoryStore, StoreError,
};
use serde_json::json;

const APP: &str = "test-app";

fn rankings() -> CollectionPath {
    CollectionPath::division(APP, "Karnataka", "A_Division", DivisionCollection::Rankings)
}

fn query() -> StandingsQuery {
    StandingsQuery::division(APP, "Karnataka", "A_Division")
}

fn team(name: &str, points: i64, won: i64) -> Document {
    let fields = json!({ "Team": name, "Points": points, "Wins": won });
    Document::new(name, fields.as_object().cloned().unwrap())
}

fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    cond()
}

fn team_names(table: &StandingsTable) -> Vec<String> {
    table.rows().map(|(_, row)| row.team.clone()).collect()
}

type Events = Arc<Mutex<Vec<StandingsEvent>>>;

fn subscribe_recording(store: &Arc<MemoryStore>) -> (StandingsSubscription, Events) {
    let events: Events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let sub = match subscribe_standings(store.clone(), &query(), move |event| {
        sink.lock().unwrap().push(event);
    }) {
        Ok(sub) => sub,
        Err(err) => panic!("subscribe failed: {err}"),
    };
    (sub, events)
}

fn count(events: &Events) -> usize {
    events.lock().unwrap().len()
}

#[test]
fn initial_snapshot_is_delivered_sorted() {
    let store = Arc::new(MemoryStore::new());
    store.publish(
        &rankings(),
        vec![team("A", 10, 3), team("B", 12, 1), team("C", 10, 5)],
    );
    let (_sub, events) = subscribe_recording(&store);
    assert!(wait_for(|| count(&events) == 1));

    match &events.lock().unwrap()[0] {
        StandingsEvent::Ready(update) => {
            assert_eq!(update.seq, 1);
            assert_eq!(team_names(&update.table), vec!["B", "C", "A"]);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn each_mutation_triggers_a_new_pass() {
    let store = Arc::new(MemoryStore::new());
    store.publish(&rankings(), vec![team("A", 1, 0)]);
    let (_sub, events) = subscribe_recording(&store);
    assert!(wait_for(|| count(&events) == 1));

    store.insert(&rankings(), team("B", 5, 1));
    assert!(wait_for(|| count(&events) == 2));
    match &events.lock().unwrap()[1] {
        StandingsEvent::Ready(update) => {
            assert_eq!(update.seq, 2);
            assert_eq!(team_names(&update.table), vec!["B", "A"]);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn cancelled_subscription_never_calls_back() {
    let store = Arc::new(MemoryStore::new());
    store.publish(&rankings(), vec![team("A", 1, 0)]);
    let (sub, events) = subscribe_recording(&store);
    assert!(wait_for(|| count(&events) == 1));

    sub.cancel();
    assert!(sub.is_cancelled());
    assert_eq!(store.watcher_count(), 0);

    store.publish(&rankings(), vec![team("A", 1, 0), team("B", 3, 1)]);
    thread::sleep(Duration::from_millis(300));
    assert_eq!(count(&events), 1);
}

#[test]
fn dropping_the_subscription_cancels_it() {
    let store = Arc::new(MemoryStore::new());
    store.publish(&rankings(), vec![team("A", 1, 0)]);
    let (sub, events) = subscribe_recording(&store);
    assert!(wait_for(|| count(&events) == 1));

    drop(sub);
    store.insert(&rankings(), team("B", 3, 1));
    thread::sleep(Duration::from_millis(300));
    assert_eq!(count(&events), 1);
}

#[test]
fn cancel_from_inside_the_callback() {
    let store = Arc::new(MemoryStore::new());
    store.publish(&rankings(), vec![team("A", 1, 0)]);

    let slot: Arc<Mutex<Option<StandingsSubscription>>> = Arc::new(Mutex::new(None));
    let seen = Arc::new(Mutex::new(0usize));
    let (cb_slot, cb_seen) = (slot.clone(), seen.clone());
    let sub = match subscribe_standings(store.clone(), &query(), move |_event| {
        let mut n = cb_seen.lock().unwrap();
        *n += 1;
        if *n == 2 {
            if let Some(sub) = cb_slot.lock().unwrap().as_ref() {
                sub.cancel();
            }
        }
    }) {
        Ok(sub) => sub,
        Err(err) => panic!("subscribe failed: {err}"),
    };
    *slot.lock().unwrap() = Some(sub);
    assert!(wait_for(|| *seen.lock().unwrap() == 1));

    store.insert(&rankings(), team("B", 3, 1));
    assert!(wait_for(|| *seen.lock().unwrap() == 2));
    assert!(slot.lock().unwrap().as_ref().unwrap().is_cancelled());

    store.insert(&rankings(), team("C", 6, 2));
    thread::sleep(Duration::from_millis(300));
    assert_eq!(*seen.lock().unwrap(), 2);
}

#[test]
fn snapshots_queued_during_a_pass_collapse_to_the_latest() {
    let store = Arc::new(MemoryStore::new());
    store.publish(&rankings(), vec![team("Start", 1, 0)]);

    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let events: Events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let _sub = match subscribe_standings(store.clone(), &query(), move |event| {
        let first = {
            let mut guard = sink.lock().unwrap();
            guard.push(event);
            guard.len() == 1
        };
        if first {
            // Hold the worker inside the first pass.
            let _ = entered_tx.send(());
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
        }
    }) {
        Ok(sub) => sub,
        Err(err) => panic!("subscribe failed: {err}"),
    };

    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("first pass started");
    store.publish(&rankings(), vec![team("S1", 1, 0)]);
    store.publish(&rankings(), vec![team("S2", 2, 0)]);
    release_tx.send(()).unwrap();

    assert!(wait_for(|| count(&events) == 2));
    thread::sleep(Duration::from_millis(200));
    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2);
    match &events[1] {
        StandingsEvent::Ready(update) => {
            assert_eq!(update.seq, 2);
            assert_eq!(team_names(&update.table), vec!["S2"]);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn watch_failure_is_reported_once() {
    let store = Arc::new(MemoryStore::new());
    store.publish(&rankings(), vec![team("A", 1, 0)]);
    let (_sub, events) = subscribe_recording(&store);
    assert!(wait_for(|| count(&events) == 1));

    store.break_watchers(
        &rankings(),
        StoreError::PermissionDenied("rules".to_string()),
    );
    assert!(wait_for(|| count(&events) == 2));
    store.publish(&rankings(), vec![team("B", 2, 0)]);
    thread::sleep(Duration::from_millis(300));

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[1],
        StandingsEvent::Failed(FeedError::Store(StoreError::PermissionDenied(
            "rules".to_string()
        )))
    );
}

#[test]
fn setup_failure_is_returned_without_callbacks() {
    let store = Arc::new(MemoryStore::new());
    store.fail_next(StoreError::Network("offline".to_string()));
    let called = Arc::new(Mutex::new(false));
    let flag = called.clone();
    let result = subscribe_standings(store.clone(), &query(), move |_| {
        *flag.lock().unwrap() = true;
    });
    match result {
        Ok(_) => panic!("expected setup failure"),
        Err(err) => assert_eq!(
            err,
            FeedError::Store(StoreError::Network("offline".to_string()))
        ),
    }
    thread::sleep(Duration::from_millis(100));
    assert!(!*called.lock().unwrap());
}

#[test]
fn missing_selector_fails_before_touching_the_store() {
    let store = Arc::new(MemoryStore::new());
    store.fail_next(StoreError::Network("should stay armed".to_string()));

    let no_division = StandingsQuery::division(APP, "Karnataka", "  ");
    match subscribe_standings(store.clone(), &no_division, |_| {}) {
        Ok(_) => panic!("expected selector error"),
        Err(err) => assert_eq!(err, FeedError::MissingSelector("division")),
    }

    let placeholder = StandingsQuery::all_leagues(PLACEHOLDER_APP_ID);
    assert_eq!(
        load_standings_once(&*store, &placeholder),
        Err(FeedError::MissingSelector("app id"))
    );

    // The armed failure is still pending, so neither call reached the store.
    assert!(store.list(&rankings()).is_err());
}

#[test]
fn load_once_builds_a_table() {
    let store = MemoryStore::new();
    store.publish(&rankings(), vec![team("A", 10, 3), team("B", 12, 1)]);
    let table = load_standings_once(&store, &query()).expect("table");
    assert_eq!(team_names(&table), vec!["B", "A"]);
    assert_eq!(table.groups[0].league_name, "A Division");

    let empty = StandingsQuery::division(APP, "Delhi", "U15");
    let table = load_standings_once(&store, &empty).expect("empty table");
    assert!(table.is_empty());
    assert!(table.groups.is_empty());
}

#[test]
fn subscriptions_on_different_divisions_are_independent() {
    let store = Arc::new(MemoryStore::new());
    let other = CollectionPath::division(APP, "Kerala", "U17", DivisionCollection::Rankings);
    store.publish(&rankings(), vec![team("Home", 1, 0)]);
    store.publish(&other, vec![team("Away", 1, 0)]);

    let (_sub, events) = subscribe_recording(&store);
    assert!(wait_for(|| count(&events) == 1));
    store.insert(&other, team("Elsewhere", 9, 3));
    thread::sleep(Duration::from_millis(200));
    assert_eq!(count(&events), 1);
}

#[test]
fn cancel_from_another_thread_waits_for_the_running_callback() {
    let store = Arc::new(MemoryStore::new());
    store.publish(&rankings(), vec![team("A", 3, 1)]);

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let finished = Arc::new(AtomicBool::new(false));
    let calls = Arc::new(AtomicUsize::new(0));
    let (done, seen) = (finished.clone(), calls.clone());
    let sub = subscribe_standings(store.clone(), &query(), move |_event| {
        if seen.fetch_add(1, Ordering::SeqCst) == 0 {
            let _ = entered_tx.send(());
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
            done.store(true, Ordering::SeqCst);
        }
    })
    .unwrap();
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("callback started");

    let releaser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        let _ = release_tx.send(());
    });
    sub.cancel();
    assert!(
        finished.load(Ordering::SeqCst),
        "cancel returned while the callback was still running"
    );
    releaser.join().unwrap();

    store.insert(&rankings(), team("B", 6, 2));
    thread::sleep(Duration::from_millis(300));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.watcher_count(), 0);
}
