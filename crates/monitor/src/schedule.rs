//! PoX schedule arithmetic: reward cycles, prepare phases and the Epoch 3.0 activation height.
//!
//! Reward cycles are counted from `first_burn_height`; the prepare phase is the last
//! `prepare_phase_length` blocks of each cycle.

use crate::error::{MonitorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoxSchedule {
    /// Burn height at which reward cycle 0 begins.
    pub first_burn_height: u64,
    pub reward_cycle_length: u64,
    pub prepare_phase_length: u64,
    /// Burn height at which Epoch 3.0 (Nakamoto) activates.
    pub epoch_activation_height: u64,
}

impl Default for PoxSchedule {
    fn default() -> Self {
        Self {
            first_burn_height: 0,
            reward_cycle_length: 20,
            prepare_phase_length: 5,
            epoch_activation_height: 131,
        }
    }
}

impl PoxSchedule {
    pub fn validate(self) -> Result<Self> {
        if self.reward_cycle_length == 0 {
            return Err(MonitorError::Config("reward cycle length must be non-zero".into()));
        }
        if self.prepare_phase_length >= self.reward_cycle_length {
            return Err(MonitorError::Config(format!(
                "prepare phase ({}) must be shorter than the reward cycle ({})",
                self.prepare_phase_length, self.reward_cycle_length
            )));
        }
        Ok(self)
    }

    /// Position within a cycle at which the prepare phase begins.
    pub fn prepare_phase_offset(&self) -> u64 {
        self.reward_cycle_length - self.prepare_phase_length
    }

    pub fn reward_cycle_of(&self, burn_height: u64) -> u64 {
        burn_height.saturating_sub(self.first_burn_height) / self.reward_cycle_length
    }

    /// Reward cycle in which Epoch 3.0 activates.
    pub fn activation_cycle(&self) -> u64 {
        self.reward_cycle_of(self.epoch_activation_height)
    }

    /// `prev < activation <= new`.
    pub fn crossed_activation(&self, prev: u64, new: u64) -> bool {
        prev < self.epoch_activation_height && self.epoch_activation_height <= new
    }

    /// True if some height `b` in `(prev, new]` is the first block of a prepare phase.
    pub fn crossed_prepare_phase(&self, prev: u64, new: u64) -> bool {
        if new <= prev {
            return false;
        }
        match self.next_prepare_start_after(prev) {
            Some(start) => start <= new,
            None => false,
        }
    }

    /// Smallest prepare-phase start strictly greater than `height`.
    fn next_prepare_start_after(&self, height: u64) -> Option<u64> {
        let len = self.reward_cycle_length;
        let offset = self.prepare_phase_offset();
        let first_start = self.first_burn_height.checked_add(offset)?;
        if height < first_start {
            return Some(first_start);
        }
        let cycles_past = (height - first_start) / len + 1;
        first_start.checked_add(cycles_past.checked_mul(len)?)
    }
}
