//! Progress reporting for probing runs

use crate::proxy::{Proxy, Quota};
use crate::scheduler::{Report, Tally};

/// Receives progress notifications from the scheduler.
///
/// All calls come from the scheduler's single result consumer, in order.
pub trait Reporter: Send {
    /// A proxy was found working; `succeeded` is the running total
    fn on_success(&mut self, proxy: &Proxy, succeeded: usize);

    /// Periodic progress while the quota has not been met
    fn on_heartbeat(&mut self, tally: &Tally);

    /// The quota was met and remaining checks are being cancelled.
    /// Called at most once per run.
    fn on_quota_reached(&mut self, tally: &Tally, quota: Quota);

    /// The run is over
    fn on_finished(&mut self, report: &Report);
}

/// Prints progress to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print nothing, for when the report is rendered another way
    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

impl Reporter for ConsoleReporter {
    fn on_success(&mut self, proxy: &Proxy, succeeded: usize) {
        if !self.quiet {
            println!("Working proxy {}. Total working: {}", proxy, succeeded);
        }
    }

    fn on_heartbeat(&mut self, tally: &Tally) {
        if !self.quiet {
            let percentage = (tally.completed() as f64 / tally.total() as f64 * 100.0) as u32;
            println!(
                "Checked {}/{} ({}%) | Working: {} | Remaining: {}",
                tally.completed(),
                tally.total(),
                percentage,
                tally.succeeded_count(),
                tally.remaining()
            );
        }
    }

    fn on_quota_reached(&mut self, tally: &Tally, quota: Quota) {
        if !self.quiet {
            println!(
                "Found {} working proxies (wanted {}), cancelling remaining checks.",
                tally.succeeded_count(),
                quota
            );
        }
    }

    fn on_finished(&mut self, report: &Report) {
        if !self.quiet {
            println!(
                "\nCompleted. Total working proxies: {} / {}",
                report.succeeded_count, report.total_candidates
            );
        }
    }
}
