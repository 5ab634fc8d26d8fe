//! End-to-end queue scenarios against the engine.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use venue_queue::state::{ManualClock, ResetSchedule};
use venue_queue::{
    EngineConfig, KvStateStore, LeavePolicy, MemoryStateStore, QueueEngine, QueueError,
    StateStore, StoreBackend,
};

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
}

fn engine_with(store: Arc<dyn StateStore>, clock: &ManualClock) -> QueueEngine {
    QueueEngine::new("deli", store)
        .with_clock(Arc::new(clock.clone()))
        .with_reset_schedule(ResetSchedule::at_hour(4).unwrap())
}

fn engine(clock: &ManualClock) -> QueueEngine {
    engine_with(Arc::new(MemoryStateStore::new()), clock)
}

fn emails(engine: &QueueEngine) -> Vec<String> {
    engine
        .snapshot()
        .entries()
        .iter()
        .map(|e| e.email.clone())
        .collect()
}

#[test]
fn closed_queue_rejects_join() {
    let clock = ManualClock::new(at(12, 0));
    let mut engine = engine(&clock);

    engine.close();
    assert_eq!(engine.join("a@x.com"), Err(QueueError::QueueClosed));

    engine.open();
    assert_eq!(engine.join("a@x.com").unwrap(), 0);
}

#[test]
fn premium_limit_of_one() {
    let clock = ManualClock::new(at(12, 0));
    let mut engine = engine(&clock);

    engine.set_premium_limit(1).unwrap();
    engine.join("a").unwrap();
    engine.join("b").unwrap();
    engine.join("c").unwrap();

    assert_eq!(engine.join_premium("b").unwrap(), 1);
    assert_eq!(emails(&engine), vec!["a", "b", "c"]);
    assert!(engine.is_premium("b").unwrap());

    assert_eq!(
        engine.join_premium("c"),
        Err(QueueError::NoPremiumSlotsAvailable)
    );
    assert_eq!(emails(&engine), vec!["a", "b", "c"]);
}

#[test]
fn ready_pool_scan() {
    let clock = ManualClock::new(at(12, 0));
    let mut engine = engine(&clock);

    engine.set_ready_pool_limit(2).unwrap();
    engine.join("a").unwrap();
    engine.join("b").unwrap();
    engine.join("c").unwrap();

    assert!(matches!(engine.scan("c"), Err(QueueError::NotReady { .. })));
    engine.scan("b").unwrap();
    assert_eq!(emails(&engine), vec!["a", "c"]);
}

#[test]
fn full_venue_blocks_advance() {
    let clock = ManualClock::new(at(12, 0));
    let mut engine = engine(&clock);

    engine.set_venue_mode(true);
    engine.set_venue_capacity(1).unwrap();
    engine.increment_guests_in_venue().unwrap();
    engine.join("a").unwrap();

    assert_eq!(engine.advance(), Err(QueueError::VenueFull));
    assert_eq!(emails(&engine), vec!["a"]);

    engine.decrement_guests_in_venue().unwrap();
    assert_eq!(engine.advance().unwrap().unwrap().email, "a");
    assert_eq!(engine.snapshot().guests_in_venue, 1);
}

#[test]
fn daily_reset_clears_line_and_venue() {
    let clock = ManualClock::new(at(12, 0));
    let mut engine = engine(&clock);

    engine.set_premium_limit(2).unwrap();
    engine.set_ready_pool_limit(3).unwrap();
    engine.set_venue_mode(true);
    engine.set_venue_capacity(10).unwrap();
    engine.seed_mock_guests(3).unwrap();
    engine.advance().unwrap();
    engine.seed_mock_guests(1).unwrap();

    let report = engine.daily_reset();
    assert_eq!(report.guests_cleared, 3);
    assert_eq!(report.reset_at, at(12, 0));

    let state = engine.snapshot();
    assert!(state.is_empty());
    assert_eq!(state.guests_in_venue, 0);
    assert_eq!(state.premium_limit, 2);
    assert_eq!(state.ready_pool_limit, 3);
    assert_eq!(state.venue_capacity, 10);
    assert!(state.venue_mode_enabled);
}

#[test]
fn automatic_reset_runs_once_per_day() {
    let clock = ManualClock::new(at(3, 59));
    let mut engine = engine(&clock);
    engine.join("a").unwrap();
    engine.join("b").unwrap();

    assert_eq!(engine.status().total_guests, 2);

    clock.set(at(4, 0));
    assert_eq!(engine.status().total_guests, 0);

    // Same window, same day: no second reset
    engine.join("c").unwrap();
    clock.advance(Duration::from_secs(30 * 60));
    assert_eq!(engine.status().total_guests, 1);

    // Next day's window
    clock.advance(Duration::from_secs(24 * 60 * 60));
    assert!(engine.run_scheduled_reset().is_some());
    assert_eq!(engine.status().total_guests, 0);
}

#[test]
fn automatic_reset_marker_is_shared_between_instances() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
    let clock = ManualClock::new(at(4, 5));

    let mut first = engine_with(store.clone(), &clock);
    assert!(first.run_scheduled_reset().is_some());
    first.join("a").unwrap();

    let mut second = engine_with(store, &clock);
    assert!(second.run_scheduled_reset().is_none());
    assert_eq!(second.status().total_guests, 1);
}

#[test]
fn instances_converge_after_freshness_window() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
    let clock = ManualClock::new(at(12, 0));

    let mut kiosk = engine_with(store.clone(), &clock);
    let mut attendant = engine_with(store, &clock);

    kiosk.join("a").unwrap();
    assert_eq!(attendant.position("a").unwrap(), 0);

    kiosk.join("b").unwrap();
    // Attendant's copy is still fresh
    assert_eq!(attendant.position("b"), Err(QueueError::NotInQueue));

    clock.advance(Duration::from_secs(3));
    assert_eq!(attendant.position("b").unwrap(), 1);

    attendant.scan("a").unwrap();
    clock.advance(Duration::from_secs(3));
    assert_eq!(kiosk.position("b").unwrap(), 0);
}

#[test]
fn concurrent_writers_last_save_wins() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
    let clock = ManualClock::new(at(12, 0));

    let mut one = engine_with(store.clone(), &clock);
    let mut two = engine_with(store.clone(), &clock);
    assert_eq!(one.status().total_guests, 0);
    assert_eq!(two.status().total_guests, 0);

    one.join("a").unwrap();
    two.join("b").unwrap();

    // Both wrote inside the window; only the later snapshot survives
    let stored = store.load("deli").unwrap().unwrap();
    let stored_emails: Vec<_> = stored.entries().iter().map(|e| e.email.as_str()).collect();
    assert_eq!(stored_emails, vec!["b"]);
}

#[test]
fn leave_policy_release_keeps_venue_untouched() {
    let clock = ManualClock::new(at(12, 0));
    let mut engine = engine(&clock);
    assert_eq!(engine.leave_policy(), LeavePolicy::Release);

    engine.set_venue_mode(true);
    engine.set_venue_capacity(1).unwrap();
    engine.increment_guests_in_venue().unwrap();
    engine.join("a").unwrap();

    assert_eq!(engine.leave("a").unwrap().unwrap().email, "a");
    assert_eq!(engine.snapshot().guests_in_venue, 1);
}

#[test]
fn leave_policy_admit_is_capacity_checked() {
    let clock = ManualClock::new(at(12, 0));
    let mut engine = engine(&clock).with_leave_policy(LeavePolicy::Admit);

    engine.set_venue_mode(true);
    engine.set_venue_capacity(1).unwrap();
    engine.increment_guests_in_venue().unwrap();
    engine.join("a").unwrap();

    assert_eq!(engine.leave("a"), Err(QueueError::VenueFull));
    assert_eq!(emails(&engine), vec!["a"]);
}

#[test]
fn kv_backed_engine_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig {
        app_id: "deli".to_string(),
        store: StoreBackend::Kv,
        store_path: dir.path().join("queue.db"),
        ..EngineConfig::default()
    };
    let clock = ManualClock::new(at(12, 0));

    {
        let mut engine = QueueEngine::from_config(&config)
            .unwrap()
            .with_clock(Arc::new(clock.clone()));
        engine.join("a").unwrap();
        engine.join_premium("b").unwrap();
        engine.set_one_shot_price(7.5).unwrap();
    }

    let store = KvStateStore::open(&config.store_path).unwrap();
    let mut engine = engine_with(Arc::new(store), &clock);
    assert_eq!(engine.position("b").unwrap(), 1);
    assert_eq!(engine.status().one_shot_price, 7.5);
}

#[test]
fn invalid_settings_are_rejected() {
    let clock = ManualClock::new(at(12, 0));
    let mut engine = engine(&clock);

    for result in [
        engine.set_ready_pool_limit(-1),
        engine.set_venue_capacity(-1),
        engine.set_premium_limit(-3),
        engine.set_one_shot_price(f64::INFINITY),
    ] {
        assert!(matches!(result, Err(QueueError::InvalidArgument(_))));
    }
    assert_eq!(engine.join(""), Err(QueueError::InvalidArgument("email is required".to_string())));
}

#[test]
fn mock_guests_and_counter() {
    let clock = ManualClock::new(at(12, 0));
    let mut engine = engine(&clock);

    assert_eq!(engine.seed_mock_guests(2).unwrap(), 2);
    engine.clear();
    engine.seed_mock_guests(1).unwrap();
    assert_eq!(emails(&engine), vec!["mock2@example.com"]);

    engine.reset_mock_counter();
    engine.seed_mock_guests(2).unwrap();
    assert_eq!(
        emails(&engine),
        vec!["mock2@example.com", "mock0@example.com", "mock1@example.com"]
    );
}
