//! Transition detector: compares a fresh [Snapshot] with the [RetainedState] from the
//! previous round and decides which events fired.
//!
//! [detect] is pure. The caller threads the returned state into the next round; a round
//! whose fetch failed never reaches the detector, so state only ever advances from a
//! complete snapshot.

use crate::schedule::PoxSchedule;
use crate::snapshot::Snapshot;
use serde::{Serialize, Serializer};
use std::time::{Duration, Instant};

/// State carried between rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetainedState {
    /// 0 until the first non-zero burn height is observed.
    pub last_burn_height: u64,
    pub last_stx_height: u64,
    pub last_reward_cycle: u64,
    /// When the last new Stacks block was noticed (monitor start before the first one).
    pub last_stx_block_time: Instant,
    /// Gap between the two most recent new-block observations. The first value includes
    /// the time between monitor start and the first observed block.
    pub last_stx_block_diff: Duration,
}

impl RetainedState {
    pub fn new(started_at: Instant) -> Self {
        Self {
            last_burn_height: 0,
            last_stx_height: 0,
            last_reward_cycle: 0,
            last_stx_block_time: started_at,
            last_stx_block_diff: Duration::ZERO,
        }
    }
}

/// An interesting transition, in reporting order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    BurnBlock {
        burn_height: u64,
        stx_height: u64,
        tx_count: u64,
    },
    /// The burn chain reached the Epoch 3.0 activation height.
    EpochActivated { burn_height: u64 },
    PreparePhase {
        next_cycle: u64,
        /// None when the next cycle's stacker set could not be fetched.
        next_signers: Option<usize>,
    },
    StacksBlock {
        stx_height: u64,
        tx_count: u64,
        #[serde(rename = "gap_secs", serialize_with = "serialize_secs")]
        gap: Duration,
    },
    RewardCycle { cycle: u64, signers: usize },
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Classify `snapshot` against `state`. Returns the fired events in reporting order and the
/// state for the next round.
pub fn detect(
    state: &RetainedState,
    snapshot: &Snapshot,
    schedule: &PoxSchedule,
) -> (Vec<MonitorEvent>, RetainedState) {
    let mut next = *state;
    let mut burn_events = Vec::new();

    let burn_changed = snapshot.burn_height != 0 && snapshot.burn_height != state.last_burn_height;
    if burn_changed {
        burn_events.push(MonitorEvent::BurnBlock {
            burn_height: snapshot.burn_height,
            stx_height: snapshot.stx_height,
            tx_count: snapshot.tx_count,
        });
        // refinements compare against the previous height, before it is overwritten; with
        // no previous observation there is no interval to test
        let prev = state.last_burn_height;
        let observed_before = prev != 0;
        if observed_before && schedule.crossed_activation(prev, snapshot.burn_height) {
            burn_events.push(MonitorEvent::EpochActivated {
                burn_height: snapshot.burn_height,
            });
        }
        if observed_before && schedule.crossed_prepare_phase(prev, snapshot.burn_height) {
            burn_events.push(MonitorEvent::PreparePhase {
                next_cycle: snapshot.reward_cycle_id.saturating_add(1),
                next_signers: snapshot.next_signer_count(),
            });
        }
        next.last_burn_height = snapshot.burn_height;
    }

    let mut cycle_event = None;
    if snapshot.reward_cycle_id != state.last_reward_cycle {
        cycle_event = Some(MonitorEvent::RewardCycle {
            cycle: snapshot.reward_cycle_id,
            signers: snapshot.current_signer_count(),
        });
        next.last_reward_cycle = snapshot.reward_cycle_id;
    }

    let mut block_event = None;
    if snapshot.stx_height != state.last_stx_height {
        let gap = snapshot
            .observed_at
            .saturating_duration_since(state.last_stx_block_time);
        next.last_stx_height = snapshot.stx_height;
        next.last_stx_block_time = snapshot.observed_at;
        next.last_stx_block_diff = gap;
        block_event = Some(MonitorEvent::StacksBlock {
            stx_height: snapshot.stx_height,
            tx_count: snapshot.tx_count,
            gap,
        });
    }

    let mut events = burn_events;
    // The burn report already carries the block height, so a block seen in the same round
    // is only recorded in state.
    if !burn_changed {
        events.extend(block_event);
    }
    events.extend(cycle_event);
    (events, next)
}
