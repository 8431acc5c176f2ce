//! Poll loop: waits for the node, then runs fetch → detect → report → guard every interval.
//!
//! Rounds never overlap. A failed fetch skips the round and leaves the retained state alone;
//! the next tick is the retry.

use crate::client::{fetch_snapshot, NodeSource, PoxInfo};
use crate::config::MonitorConfig;
use crate::detector::{detect, MonitorEvent, RetainedState};
use crate::error::{MonitorError, Result};
use crate::guard::{self, FatalCondition};
use crate::report::Reporter;
use crate::schedule::PoxSchedule;
use rand::Rng;
use std::io::Write;
use std::time::Instant;
use tokio::time::{sleep, Duration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Snapshot fetched and processed; carries the events reported this round.
    Completed(Vec<MonitorEvent>),
    /// Fetch failed; nothing changed.
    Skipped,
    /// Guard fired and the config asks to stop.
    Fatal(FatalCondition),
}

pub struct Monitor<S, W: Write> {
    config: MonitorConfig,
    schedule: PoxSchedule,
    source: S,
    reporter: Reporter<W>,
    state: RetainedState,
}

impl<S: NodeSource, W: Write> Monitor<S, W> {
    pub fn new(config: MonitorConfig, source: S, reporter: Reporter<W>) -> Result<Self> {
        let schedule = config.schedule()?;
        Ok(Self {
            config,
            schedule,
            source,
            reporter,
            state: RetainedState::new(Instant::now()),
        })
    }

    pub fn state(&self) -> &RetainedState {
        &self.state
    }

    pub fn into_reporter(self) -> Reporter<W> {
        self.reporter
    }

    /// Poll the node until it answers, or fail after the configured timeout.
    pub async fn wait_until_ready(&self) -> Result<()> {
        let readiness = &self.config.readiness;
        let limit = readiness.timeout(self.config.ready_timeout_secs);
        let started = Instant::now();
        let mut attempts = 0u64;
        loop {
            match self.source.ready().await {
                Ok(()) => {
                    tracing::info!(attempts, "node ready");
                    return Ok(());
                }
                Err(e) => {
                    attempts += 1;
                    if started.elapsed() >= limit {
                        return Err(MonitorError::NotReady(limit));
                    }
                    tracing::debug!(reason = %e, attempts, "waiting for node");
                }
            }
            let jitter = if readiness.max_jitter_ms > 0 {
                rand::thread_rng().gen_range(0..readiness.max_jitter_ms)
            } else {
                0
            };
            sleep(Duration::from_millis(readiness.poll_interval_ms + jitter)).await;
        }
    }

    /// One polling round.
    pub async fn run_round(&mut self) -> RoundOutcome {
        let snapshot = match fetch_snapshot(&self.source).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(reason = %e, "Caught error in monitor run loop");
                return RoundOutcome::Skipped;
            }
        };

        let (events, next) = detect(&self.state, &snapshot, &self.schedule);
        self.state = next;
        if let Err(e) = self.reporter.events(&events) {
            tracing::warn!(reason = %e, "failed to write events");
        }

        if let Some(cond) = guard::check(&snapshot, &self.schedule) {
            if let Err(e) = self.reporter.fatal(&cond) {
                tracing::warn!(reason = %e, "failed to write fatal report");
            }
            if self.config.exit_on_fatal {
                tracing::info!("Exiting...");
                return RoundOutcome::Fatal(cond);
            }
        }
        RoundOutcome::Completed(events)
    }

    /// Wait for readiness, then poll until the guard requests exit.
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(
            node = %self.config.node_url,
            interval_secs = self.config.interval_secs,
            exit_on_fatal = self.config.exit_on_fatal,
            activation_cycle = self.schedule.activation_cycle(),
            "Monitoring..."
        );
        self.wait_until_ready().await?;
        match self.source.pox_info().await {
            Ok(pox) => {
                for (param, configured, node) in schedule_mismatches(&self.schedule, &pox) {
                    tracing::warn!(param, configured, node, "schedule differs from node");
                }
            }
            Err(e) => tracing::debug!(reason = %e, "pox parameters unavailable"),
        }
        loop {
            if let RoundOutcome::Fatal(cond) = self.run_round().await {
                return Err(MonitorError::Fatal(cond));
            }
            sleep(self.config.interval()).await;
        }
    }
}

/// Schedule parameters the node reports differently from the configured ones, as
/// `(name, configured, node)`. Parameters the node omits are not compared.
pub fn schedule_mismatches(schedule: &PoxSchedule, pox: &PoxInfo) -> Vec<(&'static str, u64, u64)> {
    [
        ("first_burn_height", schedule.first_burn_height, pox.first_burnchain_block_height),
        ("reward_cycle_length", schedule.reward_cycle_length, pox.reward_cycle_length),
        ("prepare_phase_length", schedule.prepare_phase_length, pox.prepare_phase_block_length),
    ]
    .into_iter()
    .filter_map(|(name, configured, node)| match node {
        Some(n) if n != configured => Some((name, configured, n)),
        _ => None,
    })
    .collect()
}
