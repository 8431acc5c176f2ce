//! Monitor configuration, from CLI flags with environment fallbacks.

use crate::error::Result;
use crate::report::OutputFormat;
use crate::schedule::PoxSchedule;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use std::time::Duration;

/// Watch a Stacks node and report burn blocks, reward cycles, prepare phases and Nakamoto blocks.
#[derive(Debug, Clone, Parser)]
#[command(name = "pox-monitor", version)]
pub struct MonitorConfig {
    /// Stacks node RPC URL.
    #[arg(long, env = "STACKS_NODE_URL", default_value = "http://127.0.0.1:20443")]
    pub node_url: String,

    /// Stacks API URL (latest block lookups).
    #[arg(long, env = "STACKS_API_URL", default_value = "http://127.0.0.1:3999")]
    pub api_url: String,

    /// Seconds between polling rounds.
    #[arg(long = "interval", env = "MONITOR_INTERVAL", default_value_t = 2)]
    pub interval_secs: u64,

    /// Burn height at which Epoch 3.0 activates.
    #[arg(long = "epoch-30-start", env = "EPOCH_30_START", default_value_t = 131)]
    pub epoch_activation_height: u64,

    /// Burn height at which reward cycle 0 starts.
    #[arg(long, env = "POX_FIRST_BURN_HEIGHT", default_value_t = 0)]
    pub first_burn_height: u64,

    #[arg(long, env = "POX_REWARD_LENGTH", default_value_t = 20)]
    pub reward_cycle_length: u64,

    #[arg(long, env = "POX_PREPARE_LENGTH", default_value_t = 5)]
    pub prepare_phase_length: u64,

    /// Exit with a non-zero status when the signer set is empty after Epoch 3.0.
    #[arg(
        long,
        env = "EXIT_FROM_MONITOR",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub exit_on_fatal: bool,

    /// Seconds to wait for the node to answer before giving up.
    #[arg(long = "ready-timeout", env = "MONITOR_READY_TIMEOUT", default_value_t = 600)]
    pub ready_timeout_secs: u64,

    /// Per-request HTTP timeout in seconds.
    #[arg(long = "request-timeout", env = "MONITOR_REQUEST_TIMEOUT", default_value_t = 10)]
    pub request_timeout_secs: u64,

    #[arg(long, env = "MONITOR_OUTPUT", value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    #[arg(skip)]
    pub readiness: ReadinessConfig,
}

impl MonitorConfig {
    pub fn schedule(&self) -> Result<PoxSchedule> {
        PoxSchedule {
            first_burn_height: self.first_burn_height,
            reward_cycle_length: self.reward_cycle_length,
            prepare_phase_length: self.prepare_phase_length,
            epoch_activation_height: self.epoch_activation_height,
        }
        .validate()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Readiness polling before the first round.
#[derive(Debug, Clone)]
pub struct ReadinessConfig {
    pub poll_interval_ms: u64,
    pub max_jitter_ms: u64,
    pub timeout_secs: Option<u64>,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            max_jitter_ms: 500,
            timeout_secs: None,
        }
    }
}

impl ReadinessConfig {
    /// Effective timeout: the explicit override, else the CLI value.
    pub fn timeout(&self, fallback_secs: u64) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(fallback_secs))
    }
}
