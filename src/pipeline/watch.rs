// src/pipeline/watch.rs

//! The polling loop.
//!
//! ```text
//! Initializing ──► FirstPoll ──► SteadyPoll ─┐
//!                                   ▲        │ sleep (interruptible)
//!                                   └────────┘
//!                       shutdown ──► ShuttingDown (stop message, once)
//! ```
//!
//! A failed fetch or an empty listing leaves the phase untouched, so backlog
//! suppression applies to the first poll that actually returned announcements.
//! Shutdown is also observed between deliveries; whatever was confirmed
//! before it is persisted.

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::models::{Announcement, BotStatus, Config, SeenSet};
use crate::pipeline::diff::fresh_announcements;
use crate::pipeline::shutdown::Shutdown;
use crate::services::{AnnouncementSource, Notifier};
use crate::storage::SeenStore;

/// Timing and first-run behaviour of the loop.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Sleep between cycles
    pub interval: Duration,
    /// Pause between consecutive deliveries in one batch
    pub delivery_delay: Duration,
    /// Mark the first listing as seen instead of announcing it
    pub skip_initial: bool,
}

impl WatchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: Duration::from_secs(config.watch.interval_secs),
            delivery_delay: Duration::from_millis(config.notify.delivery_delay_ms),
            skip_initial: config.watch.skip_initial,
        }
    }
}

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    FirstPoll,
    SteadyPoll,
}

/// Outcome of a single poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Announcements on the listing
    pub fetched: usize,
    /// Announcements not yet in the seen-set
    pub fresh: usize,
    /// Confirmed deliveries
    pub delivered: usize,
    /// Failed deliveries (retried next cycle)
    pub failed: usize,
    /// Ids marked seen without a notification
    pub suppressed: usize,
    /// Whether the seen-set was written this cycle
    pub persisted: bool,
    /// Whether shutdown cut the delivery batch short
    pub interrupted: bool,
}

/// Owns the seen-set and drives fetch → diff → notify → persist.
pub struct Watcher {
    source: Arc<dyn AnnouncementSource>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn SeenStore>,
    options: WatchOptions,
    seen: SeenSet,
    phase: Phase,
    dirty: bool,
    stop_announced: bool,
}

impl Watcher {
    /// Load the seen-set and get ready for the first poll.
    pub async fn start(
        source: Arc<dyn AnnouncementSource>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn SeenStore>,
        options: WatchOptions,
    ) -> Self {
        let seen = store.load().await;
        Self {
            source,
            notifier,
            store,
            options,
            seen,
            phase: Phase::FirstPoll,
            dirty: false,
            stop_announced: false,
        }
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run one cycle without observing shutdown.
    pub async fn poll_once(&mut self) -> Result<CycleReport> {
        self.poll_until(&mut Shutdown::never()).await
    }

    /// Run one cycle. Errors mean the listing could not be fetched; delivery
    /// failures are counted in the report instead.
    ///
    /// Once `shutdown` fires no further delivery is started, and the ids
    /// confirmed so far are still persisted.
    pub async fn poll_until(&mut self, shutdown: &mut Shutdown) -> Result<CycleReport> {
        let announcements = self.source.fetch().await?;
        let mut report = CycleReport {
            fetched: announcements.len(),
            ..CycleReport::default()
        };
        let first_poll = self.phase == Phase::FirstPoll;

        if announcements.is_empty() {
            log::warn!("Listing contained no announcements; the page layout may have changed");
            if first_poll {
                log::warn!("Still waiting for a first listing before marking the backlog seen");
                return Ok(report);
            }
        }

        self.phase = Phase::SteadyPoll;

        if first_poll && self.options.skip_initial {
            report.suppressed = self.suppress(&announcements);
            log::info!(
                "Initial poll: marked {} announcements as seen without notifying",
                report.suppressed
            );
        } else {
            self.deliver_fresh(&announcements, &mut report, shutdown).await;
        }

        if first_poll {
            self.dirty = true;
        }
        if self.dirty {
            report.persisted = self.persist().await;
        }

        Ok(report)
    }

    /// Poll until `shutdown` fires, then send the stop message.
    pub async fn run(mut self, mut shutdown: Shutdown) {
        if let Err(e) = self.notifier.send_status(BotStatus::Started).await {
            log::warn!("Failed to send start message: {}", e);
        }

        while !shutdown.is_requested() {
            match self.poll_until(&mut shutdown).await {
                Ok(report) => log_report(&report),
                Err(e) => log::error!("Poll failed, retrying next cycle: {}", e),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.options.interval) => {}
                _ = shutdown.requested() => break,
            }
        }

        self.announce_stopped().await;
    }

    /// Best-effort stop message; sent at most once per watcher.
    pub async fn announce_stopped(&mut self) {
        if self.stop_announced {
            return;
        }
        self.stop_announced = true;

        if let Err(e) = self.notifier.send_status(BotStatus::Stopped).await {
            log::warn!("Failed to send stop message: {}", e);
        }
    }

    fn suppress(&mut self, announcements: &[Announcement]) -> usize {
        let before = self.seen.len();
        self.seen.extend(announcements.iter().map(|a| a.id.clone()));
        self.seen.len() - before
    }

    async fn deliver_fresh(
        &mut self,
        announcements: &[Announcement],
        report: &mut CycleReport,
        shutdown: &mut Shutdown,
    ) {
        let fresh: Vec<Announcement> = fresh_announcements(&self.seen, announcements)
            .into_iter()
            .cloned()
            .collect();
        report.fresh = fresh.len();

        for (i, announcement) in fresh.iter().enumerate() {
            if shutdown.is_requested() {
                report.interrupted = true;
                break;
            }
            if i > 0 && !self.options.delivery_delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.options.delivery_delay) => {}
                    _ = shutdown.requested() => {
                        report.interrupted = true;
                        break;
                    }
                }
            }

            match self.notifier.send_announcement(announcement).await {
                Ok(()) => {
                    self.seen.insert(announcement.id.clone());
                    self.dirty = true;
                    report.delivered += 1;
                }
                Err(e) => {
                    report.failed += 1;
                    log::warn!(
                        "Failed to deliver announcement {} ({}): {}",
                        announcement.id,
                        announcement.title,
                        e
                    );
                }
            }
        }
    }

    async fn persist(&mut self) -> bool {
        match self.store.save(&self.seen).await {
            Ok(()) => {
                self.dirty = false;
                true
            }
            Err(e) => {
                log::error!(
                    "Failed to save seen-set to {}: {}",
                    self.store.location(),
                    e
                );
                false
            }
        }
    }
}

fn log_report(report: &CycleReport) {
    if report.interrupted {
        log::info!(
            "Delivery interrupted by shutdown: {} delivered, {} left for the next run",
            report.delivered,
            report.fresh - report.delivered - report.failed
        );
    } else if report.fresh > 0 {
        log::info!(
            "Found {} new announcements: {} delivered, {} failed",
            report.fresh,
            report.delivered,
            report.failed
        );
    } else if report.suppressed == 0 {
        log::debug!("No new announcements ({} listed)", report.fetched);
    }
}
