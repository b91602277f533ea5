//! Periodic background tasks scoped to an owner
//!
//! Every task spawned through a [`TaskSet`] is aborted when the set is
//! dropped, so timers never outlive the application state they act on.
//! Failures are logged and counted; a failing tick never stops the timer.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Consecutive failure bookkeeping for one task
#[derive(Debug, Default)]
struct FailureStreak {
    consecutive_failures: u32,
}

impl FailureStreak {
    fn record_failure(&mut self) -> u32 {
        self.consecutive_failures += 1;
        self.consecutive_failures
    }

    /// Returns the length of the streak that just ended
    fn reset(&mut self) -> u32 {
        std::mem::take(&mut self.consecutive_failures)
    }
}

#[derive(Default)]
pub struct TaskSet {
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task_fn` every `period`; the first run happens one period after
    /// spawning
    pub fn spawn_periodic<F, Fut>(&mut self, name: &str, period: Duration, mut task_fn: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        let task_name = name.to_string();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval fires immediately once
            ticker.tick().await;

            let mut streak = FailureStreak::default();
            loop {
                ticker.tick().await;
                match task_fn().await {
                    Ok(()) => {
                        let ended = streak.reset();
                        if ended > 0 {
                            warn!("Task '{}' recovered after {} failures", task_name, ended);
                        }
                    }
                    Err(e) => {
                        let failures = streak.record_failure();
                        error!("Task '{}' failed ({} in a row): {}", task_name, failures, e);
                    }
                }
            }
        });

        info!("⏱  Started periodic task '{}' every {:?}", name, period);
        self.tasks.push((name.to_string(), handle));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn shutdown(&mut self) {
        for (name, handle) in self.tasks.drain(..) {
            debug!("Stopping periodic task '{}'", name);
            handle.abort();
        }
    }
}

impl Drop for TaskSet {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_run_waits_one_period() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let mut tasks = TaskSet::new();
        tasks.spawn_periodic("count", Duration::from_millis(100), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(runs.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_timer() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let mut tasks = TaskSet::new();
        tasks.spawn_periodic("flaky", Duration::from_millis(10), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n % 2 == 0 {
                    Err("Simulated failure".to_string())
                } else {
                    Ok(())
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(runs.load(Ordering::SeqCst) >= 4);
    }

    #[tokio::test]
    async fn test_drop_aborts_tasks() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let mut tasks = TaskSet::new();
        tasks.spawn_periodic("count", Duration::from_millis(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        assert_eq!(tasks.len(), 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(tasks);
        tokio::time::sleep(Duration::from_millis(5)).await;
        let seen = runs.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), seen);
    }

    #[test]
    fn test_failure_streak() {
        let mut streak = FailureStreak::default();
        assert_eq!(streak.record_failure(), 1);
        assert_eq!(streak.record_failure(), 2);
        assert_eq!(streak.reset(), 2);
        assert_eq!(streak.reset(), 0);
    }
}
