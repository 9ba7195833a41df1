//! Property tests for category rotation.
//!
//! These drive the selector directly against the in-memory store, marking
//! each selected interval as finished without running a countdown.

use std::sync::Arc;

use pomo_core::{
    get_interval, Category, InMemoryRepository, Interval, IntervalConfig, IntervalState,
    Repository,
};
use proptest::prelude::*;

fn config(repo: Arc<InMemoryRepository>, every: u32) -> IntervalConfig {
    IntervalConfig::new(
        repo,
        chrono::Duration::minutes(25),
        chrono::Duration::minutes(5),
        chrono::Duration::minutes(15),
    )
    .with_long_break_every(every)
}

/// Persist `interval` as if it had been run to the given end state.
fn record(repo: &InMemoryRepository, mut interval: Interval, state: IntervalState) {
    interval.state = state;
    interval.actual_duration = interval.planned_duration;
    repo.create(&interval).unwrap();
}

fn any_category() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::Pomodoro),
        Just(Category::ShortBreak),
        Just(Category::LongBreak),
    ]
}

fn any_end_state() -> impl Strategy<Value = IntervalState> {
    prop_oneof![Just(IntervalState::Done), Just(IntervalState::Cancelled)]
}

proptest! {
    #[test]
    fn every_nth_pomodoro_is_followed_by_a_long_break(every in 1u32..7, pomodoros in 1usize..30) {
        let repo = Arc::new(InMemoryRepository::new());
        let cfg = config(repo.clone(), every);

        for k in 1..=pomodoros {
            let work = get_interval(&cfg).unwrap();
            prop_assert_eq!(work.category, Category::Pomodoro);
            record(&repo, work, IntervalState::Done);

            let rest = get_interval(&cfg).unwrap();
            let expected = if k % every as usize == 0 {
                Category::LongBreak
            } else {
                Category::ShortBreak
            };
            prop_assert_eq!(rest.category, expected, "after pomodoro {}", k);
            prop_assert_eq!(rest.planned_duration, cfg.duration_for(expected));
            record(&repo, rest, IntervalState::Done);
        }
    }

    #[test]
    fn a_finished_break_is_always_followed_by_a_pomodoro(
        history in prop::collection::vec((any_category(), any_end_state()), 0..25),
        last in prop_oneof![Just(Category::ShortBreak), Just(Category::LongBreak)],
        last_state in any_end_state(),
    ) {
        let repo = Arc::new(InMemoryRepository::new());
        for (category, state) in history {
            record(&repo, Interval::new(category, std::time::Duration::from_secs(60)), state);
        }
        record(&repo, Interval::new(last, std::time::Duration::from_secs(60)), last_state);

        let next = get_interval(&config(repo, 4)).unwrap();
        prop_assert_eq!(next.category, Category::Pomodoro);
        prop_assert_eq!(next.state, IntervalState::NotStarted);
        prop_assert_eq!(next.id, 0);
    }
}
