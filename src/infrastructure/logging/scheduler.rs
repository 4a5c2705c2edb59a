//! Daily retention sweep scheduler.
//!
//! Runs the retention sweep once per calendar day at a configured local time
//! of day, independent of whether the file sink rotated. The loop wakes at a
//! coarse interval (one minute by default) and is stopped cooperatively
//! through a cancellation token.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::rotation::RetentionPolicy;
use crate::domain::models::RetentionConfig;

/// How long `stop` waits for the loop to exit.
const STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Source of the local wall-clock time the daily trigger is checked against.
pub type LocalClock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

fn system_clock() -> LocalClock {
    Arc::new(|| Local::now().naive_local())
}

/// Next occurrence of `at` strictly after `now`.
pub fn next_run_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + TimeDelta::days(1)
    }
}

/// Once-a-day trigger at a fixed time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTrigger {
    at: NaiveTime,
    next_run: NaiveDateTime,
}

impl DailyTrigger {
    pub fn new(at: NaiveTime, now: NaiveDateTime) -> Self {
        Self {
            at,
            next_run: next_run_after(now, at),
        }
    }

    pub const fn next_run(&self) -> NaiveDateTime {
        self.next_run
    }

    /// Returns true when the trigger is due at `now` and advances it to the
    /// following day. Missed days fire once, not once per missed day.
    pub fn poll(&mut self, now: NaiveDateTime) -> bool {
        if now < self.next_run {
            return false;
        }
        self.next_run = next_run_after(now, self.at);
        true
    }
}

/// Background task sweeping expired log files once a day.
///
/// Owned by the logging handle; configured once at construction.
pub struct RetentionScheduler {
    config: RetentionConfig,
    policy: RetentionPolicy,
    check_interval: Duration,
    clock: LocalClock,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RetentionScheduler {
    pub fn new(config: RetentionConfig) -> Self {
        let policy = RetentionPolicy::from_config(&config);
        Self {
            config,
            policy,
            check_interval: Duration::from_secs(60),
            clock: system_clock(),
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    /// Override how often the loop checks whether the daily run is due.
    #[must_use]
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Replace the sweep policy (the default is built from the config).
    #[must_use]
    pub fn with_policy(mut self, policy: RetentionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the local time source (the default is [`Local::now`]).
    #[must_use]
    pub fn with_clock(mut self, clock: LocalClock) -> Self {
        self.clock = clock;
        self
    }

    pub const fn config(&self) -> &RetentionConfig {
        &self.config
    }

    pub const fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start the daily loop on the current tokio runtime.
    ///
    /// A no-op when auto cleanup is disabled, when already running, or when
    /// called outside a runtime (the latter is logged).
    pub fn start(&mut self) {
        if !self.config.auto_cleanup {
            info!("auto log cleanup is disabled");
            return;
        }

        if self.is_running() {
            warn!("log cleanup scheduler is already running");
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("log cleanup scheduler needs a tokio runtime; daily cleanup not started");
            return;
        };

        self.cancel = CancellationToken::new();
        let cancel = self.cancel.clone();
        let policy = self.policy.clone();
        let at = self.config.cleanup_time.as_naive_time();
        let check_interval = self.check_interval;
        let clock = Arc::clone(&self.clock);

        self.task = Some(runtime.spawn(run_loop(policy, at, check_interval, clock, cancel)));

        info!(
            cleanup_time = %self.config.cleanup_time,
            retention_days = self.config.retention_days,
            "log cleanup scheduler started"
        );
    }

    /// Stop the loop, waiting briefly for it to exit.
    ///
    /// A sweep already in progress finishes on the blocking pool; only new
    /// ticks are prevented. Safe to call when never started.
    pub async fn stop(&mut self) {
        self.cancel.cancel();

        let Some(task) = self.task.take() else {
            return;
        };

        match tokio::time::timeout(STOP_TIMEOUT, task).await {
            Ok(Ok(())) => debug!("log cleanup scheduler stopped"),
            Ok(Err(e)) => warn!(error = %e, "log cleanup scheduler ended abnormally"),
            Err(_) => warn!("log cleanup scheduler did not stop in time"),
        }
    }
}

impl fmt::Debug for RetentionScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetentionScheduler")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .field("check_interval", &self.check_interval)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Drop for RetentionScheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_loop(
    policy: RetentionPolicy,
    at: NaiveTime,
    check_interval: Duration,
    clock: LocalClock,
    cancel: CancellationToken,
) {
    let mut trigger = DailyTrigger::new(at, clock());
    debug!(next_run = %trigger.next_run(), "scheduled daily log cleanup");

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(check_interval) => {}
        }

        if !trigger.poll(clock()) {
            continue;
        }

        let sweep_policy = policy.clone();
        let result = tokio::task::spawn_blocking(move || {
            let active = sweep_policy.active_file();
            sweep_policy.sweep(&active)
        })
        .await;

        match result {
            Ok(count) => debug!(count, next_run = %trigger.next_run(), "daily log cleanup finished"),
            Err(e) => warn!(error = %e, "daily log cleanup task failed"),
        }
    }
}
