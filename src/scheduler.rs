//! Bounded concurrent probing with early stop
//!
//! One task is spawned per candidate. At most `pool_size` of them hold a
//! semaphore permit and run a probe at any time. Results are consumed as
//! they complete by a single loop that owns the [`Tally`]; once the quota
//! is met a [`CancellationToken`] stops every task that has not finished.

use crate::error::SchedulerError;
use crate::proxy::{Probe, Proxy, Quota, Verdict};
use crate::report::Reporter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Default number of concurrently running probes
const DEFAULT_POOL_SIZE: usize = 100;

/// Default number of completions between heartbeats
const DEFAULT_HEARTBEAT_EVERY: usize = 50;

/// Configuration for the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of probes in flight
    pub pool_size: usize,
    /// Emit a heartbeat every this many completions; 0 disables heartbeats
    pub heartbeat_every: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            heartbeat_every: DEFAULT_HEARTBEAT_EVERY,
        }
    }
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_heartbeat_every(mut self, every: usize) -> Self {
        self.heartbeat_every = every;
        self
    }
}

/// Running counters of a probing run, owned by the result consumer
#[derive(Debug, Clone)]
pub struct Tally {
    total: usize,
    completed: usize,
    succeeded: Vec<Proxy>,
}

impl Tally {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            succeeded: Vec::new(),
        }
    }

    /// Fold one probe result in. Returns whether it was a success.
    pub fn record(&mut self, proxy: Proxy, verdict: Verdict) -> bool {
        self.completed += 1;
        if verdict.is_success() {
            self.succeeded.push(proxy);
            true
        } else {
            false
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.completed)
    }

    /// Working proxies in completion order
    pub fn succeeded(&self) -> &[Proxy] {
        &self.succeeded
    }

    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn is_satisfied(&self, quota: Quota) -> bool {
        self.succeeded.len() >= quota.get()
    }

    fn into_report(self, stopped_early: bool) -> Report {
        Report {
            succeeded_count: self.succeeded.len(),
            succeeded: self.succeeded,
            completed: self.completed,
            total_candidates: self.total,
            stopped_early,
        }
    }
}

/// Final outcome of a probing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub succeeded_count: usize,
    pub total_candidates: usize,
    /// Probes whose result was counted
    pub completed: usize,
    /// Working proxies in completion order
    pub succeeded: Vec<Proxy>,
    /// Whether the quota was met before every candidate was checked
    pub stopped_early: bool,
}

/// Runs probes over a pool of workers until the quota is met or the
/// candidates are exhausted
pub struct Scheduler<P> {
    probe: Arc<P>,
    config: SchedulerConfig,
}

impl<P: Probe + 'static> Scheduler<P> {
    /// Create a scheduler with default configuration
    pub fn new(probe: P) -> Self {
        Self::with_config(probe, SchedulerConfig::default())
    }

    /// Create a scheduler with custom configuration
    pub fn with_config(probe: P, config: SchedulerConfig) -> Self {
        Self {
            probe: Arc::new(probe),
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Probe every candidate against `target` until `quota` of them work.
    ///
    /// Fails before any probe starts if `candidates` is empty. A worker
    /// that panics or is aborted fails the whole run.
    pub async fn run<R>(
        &self,
        candidates: Vec<Proxy>,
        target: &str,
        quota: Quota,
        reporter: &mut R,
    ) -> Result<Report, SchedulerError>
    where
        R: Reporter + ?Sized,
    {
        if candidates.is_empty() {
            return Err(SchedulerError::NoCandidates);
        }

        let pool_size = self.config.pool_size.max(1);
        info!(
            "Probing {} proxies against {} with {} workers, quota {}",
            candidates.len(),
            target,
            pool_size,
            quota
        );

        let mut tally = Tally::new(candidates.len());
        let target: Arc<str> = Arc::from(target);
        let sem = Arc::new(Semaphore::new(pool_size));
        let cancel = CancellationToken::new();
        let mut set = JoinSet::new();

        for proxy in candidates {
            set.spawn(run_worker(
                Arc::clone(&self.probe),
                proxy,
                Arc::clone(&target),
                Arc::clone(&sem),
                cancel.clone(),
            ));
        }

        let mut stopped_early = false;
        while let Some(joined) = set.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Aborting run: probe worker failed: {}", e);
                    cancel.cancel();
                    set.shutdown().await;
                    return Err(SchedulerError::Worker(e));
                }
            };

            // Cancelled before or during its probe
            let Some((proxy, verdict)) = outcome else {
                continue;
            };

            if stopped_early {
                trace!("Discarding late result for {}", proxy);
                continue;
            }

            if tally.record(proxy, verdict) {
                let last = &tally.succeeded()[tally.succeeded_count() - 1];
                reporter.on_success(last, tally.succeeded_count());

                if tally.is_satisfied(quota) {
                    stopped_early = true;
                    cancel.cancel();
                    debug!(
                        "Quota met after {} of {} completions, cancelling the rest",
                        tally.completed(),
                        tally.total()
                    );
                    reporter.on_quota_reached(&tally, quota);
                }
            }

            let every = self.config.heartbeat_every;
            if !stopped_early && every > 0 && tally.completed() % every == 0 {
                reporter.on_heartbeat(&tally);
            }
        }

        // Quota met on the very last completion: nothing was cut short
        let stopped_early = stopped_early && tally.completed() < tally.total();
        let report = tally.into_report(stopped_early);
        info!(
            "Finished: {} working out of {} ({} checked)",
            report.succeeded_count, report.total_candidates, report.completed
        );
        reporter.on_finished(&report);
        Ok(report)
    }
}

/// One probe task. Returns `None` if cancelled before the probe finished.
async fn run_worker<P: Probe + ?Sized>(
    probe: Arc<P>,
    proxy: Proxy,
    target: Arc<str>,
    sem: Arc<Semaphore>,
    cancel: CancellationToken,
) -> Option<(Proxy, Verdict)> {
    // The semaphore is never closed, so acquiring only ends on a permit
    let _permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => return None,
        permit = sem.acquire_owned() => permit.ok()?,
    };

    // The token may have fired while the permit was being handed over
    if cancel.is_cancelled() {
        return None;
    }

    let verdict = tokio::select! {
        biased;
        _ = cancel.cancelled() => return None,
        verdict = probe.probe(&proxy, &target) => verdict,
    };

    Some((proxy, verdict))
}
