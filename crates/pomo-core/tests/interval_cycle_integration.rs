//! Integration tests for the full select -> start -> persist cycle.
//!
//! Every interval is run to completion under paused tokio time, so the
//! countdowns finish instantly while still going through the real loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeZone;
use pomo_core::{
    get_interval, Category, InMemoryRepository, Interval, IntervalConfig, IntervalRunner,
    IntervalState, ManualClock, Repository, SqliteRepository,
};
use tokio_util::sync::CancellationToken;

fn ms(n: i64) -> chrono::Duration {
    chrono::Duration::milliseconds(n)
}

fn noop(_: &Interval) {}

async fn run_next(config: &IntervalConfig) -> Interval {
    let next = get_interval(config).unwrap();
    IntervalRunner::new(next)
        .start(CancellationToken::new(), config, noop, noop, noop)
        .await
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_sixteen_selections_rotate_categories() {
    let repo = Arc::new(InMemoryRepository::new());
    let config = IntervalConfig::new(repo.clone(), ms(3), ms(1), ms(2));

    for i in 0..16 {
        let (exp_category, exp_duration) = if i % 2 == 0 {
            (Category::Pomodoro, Duration::from_millis(3))
        } else if ((i + 1) / 2) % 4 == 0 {
            (Category::LongBreak, Duration::from_millis(2))
        } else {
            (Category::ShortBreak, Duration::from_millis(1))
        };

        let selected = get_interval(&config).unwrap();
        assert_eq!(selected.category, exp_category, "selection {i}");
        assert_eq!(selected.planned_duration, exp_duration, "selection {i}");
        assert_eq!(selected.state, IntervalState::NotStarted);

        let finished = IntervalRunner::new(selected)
            .start(CancellationToken::new(), &config, noop, noop, noop)
            .await
            .unwrap();

        let stored = repo.by_id(finished.id).unwrap();
        assert_eq!(stored.state, IntervalState::Done, "selection {i}");
        assert!(stored.actual_duration >= stored.planned_duration);
    }

    assert_eq!(repo.len(), 16);
    assert_eq!(repo.breaks(8).unwrap().len(), 8);
}

#[tokio::test(start_paused = true)]
async fn test_selection_survives_reopening_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pomo.db");

    {
        let repo = Arc::new(SqliteRepository::open(&path).unwrap());
        let config = IntervalConfig::new(repo, ms(3), ms(1), ms(2));
        // P S P S P S P
        for _ in 0..7 {
            run_next(&config).await;
        }
    }

    // Fresh process: nothing but the file remembers the cycle.
    let repo = Arc::new(SqliteRepository::open(&path).unwrap());
    let config = IntervalConfig::new(repo.clone(), ms(3), ms(1), ms(2));
    let next = get_interval(&config).unwrap();
    assert_eq!(next.category, Category::LongBreak);

    let long = run_next(&config).await;
    assert_eq!(long.id, 8);
    assert_eq!(repo.last().unwrap().state, IntervalState::Done);
    assert_eq!(get_interval(&config).unwrap().category, Category::Pomodoro);
}

#[tokio::test(start_paused = true)]
async fn test_interrupted_run_is_resumed_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pomo.db");

    let first_id = {
        let repo = Arc::new(SqliteRepository::open(&path).unwrap());
        let config = IntervalConfig::new(repo, ms(3_000), ms(1_000), ms(2_000))
            .with_tick_period(Duration::from_millis(500));
        let runner = IntervalRunner::new(get_interval(&config).unwrap());
        // Simulate the process dying 1.2s in: the future is simply dropped.
        let _ = tokio::time::timeout(
            Duration::from_millis(1_200),
            runner.start(CancellationToken::new(), &config, noop, noop, noop),
        )
        .await;
        runner.snapshot().id
    };

    let repo = Arc::new(SqliteRepository::open(&path).unwrap());
    let config = IntervalConfig::new(repo.clone(), ms(3_000), ms(1_000), ms(2_000))
        .with_tick_period(Duration::from_millis(500));
    let recovered = get_interval(&config).unwrap();
    assert_eq!(recovered.id, first_id);
    assert_eq!(recovered.state, IntervalState::Running);
    // Only whole ticks were persisted before the crash.
    assert_eq!(recovered.actual_duration, Duration::from_millis(1_000));

    let mut started_with = None;
    let finished = IntervalRunner::new(recovered)
        .start(
            CancellationToken::new(),
            &config,
            |i| started_with = Some(i.actual_duration),
            noop,
            noop,
        )
        .await
        .unwrap();
    assert_eq!(started_with, Some(Duration::from_millis(1_000)));
    assert_eq!(finished.state, IntervalState::Done);
    assert_eq!(finished.id, first_id);
    assert_eq!(repo.breaks(1).unwrap().len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_start_time_comes_from_the_configured_clock() {
    let at = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(at));
    let repo = Arc::new(InMemoryRepository::new());
    let config = IntervalConfig::new(repo.clone(), ms(5), ms(1), ms(2)).with_clock(clock.clone());

    let first = run_next(&config).await;
    assert_eq!(first.start_time, Some(at));

    clock.advance(chrono::Duration::minutes(25));
    let second = run_next(&config).await;
    assert_eq!(second.category, Category::ShortBreak);
    assert_eq!(second.start_time, Some(at + chrono::Duration::minutes(25)));
    assert_eq!(repo.by_id(second.id).unwrap().start_time, second.start_time);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_pomodoro_still_counts_towards_the_cycle() {
    let repo = Arc::new(InMemoryRepository::new());
    let config = IntervalConfig::new(repo.clone(), ms(10_000), ms(1), ms(2));
    let cancel = CancellationToken::new();
    let runner = IntervalRunner::new(get_interval(&config).unwrap());

    let (result, ()) = tokio::join!(
        runner.start(cancel.clone(), &config, noop, noop, noop),
        async {
            tokio::time::sleep(Duration::from_secs(4)).await;
            cancel.cancel();
        }
    );
    let cancelled = result.unwrap();
    assert_eq!(cancelled.state, IntervalState::Cancelled);
    assert!(cancelled.actual_duration < cancelled.planned_duration);

    assert_eq!(get_interval(&config).unwrap().category, Category::ShortBreak);
}
