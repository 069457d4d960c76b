//! Validation with a "still working" heartbeat.
//!
//! The check runs on a scoped thread. The calling thread waits for its
//! result and, if it takes longer than the initial delay, fires a tick every
//! interval so the prompt can repaint with the elapsed time. Fast checks
//! never tick, so they never flicker. Ticking ends as soon as the result is
//! in: nothing outlives `run`.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::core::config::Timing;

/// A user check: `Ok(())` accepts the value, `Err(message)` rejects it.
pub type ValidateFn<T> = Box<dyn Fn(&T) -> Result<(), String> + Send + Sync>;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub struct Validator<T> {
    check: Option<ValidateFn<T>>,
    delay: Duration,
    interval: Duration,
}

impl<T: Sync> Validator<T> {
    pub fn new(check: Option<ValidateFn<T>>, timing: &Timing) -> Self {
        Self {
            check,
            delay: timing.validation_delay,
            interval: timing.validation_interval.max(MIN_INTERVAL),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.check.is_some()
    }

    /// Validate `value`, calling `on_tick(elapsed)` while the check is pending.
    ///
    /// Without a configured check this succeeds immediately.
    pub fn run(&self, value: &T, mut on_tick: impl FnMut(Duration)) -> Result<(), String> {
        let Some(check) = self.check.as_ref() else {
            return Ok(());
        };

        let started = Instant::now();
        let result = thread::scope(|scope| {
            let (tx, rx) = mpsc::channel();
            let worker = scope.spawn(move || {
                let _ = tx.send(check(value));
            });

            let mut wait = self.delay;
            loop {
                match rx.recv_timeout(wait) {
                    Ok(result) => return result,
                    Err(RecvTimeoutError::Timeout) => {
                        on_tick(started.elapsed());
                        wait = self.interval;
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        // The check panicked; join so the scope does not re-raise it
                        let _ = worker.join();
                        warn!("Validation function panicked");
                        return Err("Validation failed unexpectedly".to_string());
                    }
                }
            }
        });

        debug!(
            "Validation finished in {:?}: {}",
            started.elapsed(),
            if result.is_ok() { "ok" } else { "rejected" }
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(delay_ms: u64, interval_ms: u64) -> Timing {
        Timing {
            validation_delay: Duration::from_millis(delay_ms),
            validation_interval: Duration::from_millis(interval_ms),
            ..Timing::default()
        }
    }

    #[test]
    fn test_no_check_always_succeeds() {
        let validator: Validator<String> = Validator::new(None, &Timing::default());
        let mut ticks = 0;
        assert!(validator.run(&"anything".to_string(), |_| ticks += 1).is_ok());
        assert_eq!(ticks, 0);
        assert!(!validator.is_configured());
    }

    #[test]
    fn test_rejection_message_is_returned() {
        let validator = Validator::new(
            Some(Box::new(|v: &String| {
                if v.len() < 3 {
                    Err("too short".to_string())
                } else {
                    Ok(())
                }
            })),
            &Timing::default(),
        );
        assert_eq!(validator.run(&"ab".to_string(), |_| {}), Err("too short".to_string()));
        assert_eq!(validator.run(&"abc".to_string(), |_| {}), Ok(()));
    }

    #[test]
    fn test_fast_check_never_ticks() {
        let validator = Validator::new(Some(Box::new(|_: &u32| Ok(()))), &timing(400, 125));
        let mut ticks = 0;
        validator.run(&1, |_| ticks += 1).unwrap();
        assert_eq!(ticks, 0);
    }

    #[test]
    fn test_slow_check_ticks_with_growing_elapsed() {
        let validator = Validator::new(
            Some(Box::new(|_: &u32| {
                thread::sleep(Duration::from_millis(120));
                Ok(())
            })),
            &timing(20, 20),
        );
        let mut elapsed = Vec::new();
        validator.run(&1, |d| elapsed.push(d)).unwrap();

        assert!(elapsed.len() >= 2, "expected several ticks, got {}", elapsed.len());
        assert!(elapsed[0] >= Duration::from_millis(20));
        assert!(elapsed.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_no_ticks_after_completion() {
        let validator = Validator::new(
            Some(Box::new(|_: &u32| {
                thread::sleep(Duration::from_millis(40));
                Ok(())
            })),
            &timing(10, 10),
        );
        let mut ticks = 0;
        validator.run(&1, |_| ticks += 1).unwrap();
        let after_run = ticks;
        thread::sleep(Duration::from_millis(50));
        assert_eq!(ticks, after_run);
    }

    #[test]
    fn test_panicking_check_is_a_rejection() {
        let validator = Validator::new(
            Some(Box::new(|_: &u32| -> Result<(), String> { panic!("boom") })),
            &timing(400, 125),
        );
        assert!(validator.run(&1, |_| {}).is_err());
    }
}
