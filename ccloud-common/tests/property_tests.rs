//! Property-based tests for ccloud-common crate.
//!
//! These tests verify universal properties of the retry schedule using proptest.

use ccloud_common::{PlatformError, RecordingSleeper, RetryConfig, RetryPolicy};
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every wait after the first is exactly double the previous one.
    #[test]
    fn prop_schedule_doubles_after_first_attempt(
        max_attempts in 2usize..12,
        initial_ms in 1u64..500,
    ) {
        let policy = RetryPolicy::new(
            RetryConfig::default()
                .with_max_attempts(max_attempts)
                .with_initial_delay(Duration::from_millis(initial_ms)),
        );
        let schedule = policy.schedule();

        prop_assert_eq!(schedule.len(), max_attempts);
        prop_assert_eq!(schedule[0], Duration::ZERO);
        prop_assert_eq!(schedule[1], Duration::from_millis(initial_ms));
        for pair in schedule[1..].windows(2) {
            prop_assert_eq!(pair[1], pair[0] * 2);
        }
    }

    /// A run of `throttled` rate-limited outcomes followed by success takes
    /// `throttled + 1` attempts, or exhausts the schedule if it is too long.
    #[test]
    fn prop_attempts_bounded_by_schedule(throttled in 0usize..12) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let sleeper = Arc::new(RecordingSleeper::new());
            let policy = RetryPolicy::with_defaults().with_sleeper(sleeper.clone());
            let calls = AtomicUsize::new(0);
            let counter = &calls;

            let result: Result<u16, PlatformError> = policy
                .execute(
                    move || async move {
                        let call = counter.fetch_add(1, Ordering::SeqCst);
                        Ok(if call < throttled { 429 } else { 200 })
                    },
                    |status| *status == 429,
                )
                .await;

            let attempts = calls.load(Ordering::SeqCst);
            if throttled < 7 {
                prop_assert_eq!(result.unwrap(), 200);
                prop_assert_eq!(attempts, throttled + 1);
            } else {
                prop_assert!(result.unwrap_err().is_retries_exhausted());
                prop_assert_eq!(attempts, 7);
            }
            prop_assert_eq!(sleeper.waits(), policy.schedule()[..attempts].to_vec());
            Ok::<(), TestCaseError>(())
        })?;
    }
}
