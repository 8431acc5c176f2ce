//! Stacks node monitor: reports consensus transitions instead of every poll.
//!
//! - **detector**: pure `detect(state, snapshot)` deciding which of the burn-block, epoch
//!   activation, prepare-phase, Nakamoto-block and reward-cycle events fired.
//! - **guard**: the one fatal invariant, a non-empty signer set once Epoch 3.0 is active.
//! - **client** / **monitor**: the reqwest fetcher and the sequential poll loop around them.

pub mod client;
pub mod config;
pub mod detector;
pub mod error;
pub mod guard;
pub mod monitor;
pub mod report;
pub mod schedule;
pub mod snapshot;

pub use client::{fetch_snapshot, BlockInfo, NodeSource, PoxInfo, StacksClient};
pub use config::{MonitorConfig, ReadinessConfig};
pub use detector::{detect, MonitorEvent, RetainedState};
pub use error::{MonitorError, Result};
pub use guard::{FatalCondition, SignerShortfall};
pub use monitor::{Monitor, RoundOutcome};
pub use report::{OutputFormat, Reporter};
pub use schedule::PoxSchedule;
pub use snapshot::{SignerKey, SignerSet, Snapshot};
