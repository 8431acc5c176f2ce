//! Safety guard: once Epoch 3.0 is active the current reward cycle must have signers.
//!
//! [check] only reports; whether the process exits is up to the caller.

use crate::schedule::PoxSchedule;
use crate::snapshot::Snapshot;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerShortfall {
    /// The stacker set was fetched and holds no signers.
    Empty,
    /// The stacker set for the cycle could not be fetched.
    Unreachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FatalCondition {
    pub reward_cycle: u64,
    pub activation_cycle: u64,
    pub cause: SignerShortfall,
}

impl fmt::Display for FatalCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cause = match self.cause {
            SignerShortfall::Empty => "signer set is empty",
            SignerShortfall::Unreachable => "signer set is unreachable",
        };
        write!(
            f,
            "FATAL: no signers while going in to Epoch 3.0 (cycle {}, activation cycle {}: {})",
            self.reward_cycle, self.activation_cycle, cause
        )
    }
}

/// Evaluated every round regardless of which events fired.
pub fn check(snapshot: &Snapshot, schedule: &PoxSchedule) -> Option<FatalCondition> {
    let activation_cycle = schedule.activation_cycle();
    if snapshot.reward_cycle_id < activation_cycle {
        return None;
    }
    let cause = match &snapshot.current_signers {
        None => SignerShortfall::Unreachable,
        Some(set) if set.is_empty() => SignerShortfall::Empty,
        Some(_) => return None,
    };
    Some(FatalCondition {
        reward_cycle: snapshot.reward_cycle_id,
        activation_cycle,
        cause,
    })
}
