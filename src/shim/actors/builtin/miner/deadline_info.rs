// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::shim::{clock::ChainEpoch, policy::Policy};
use serde::Serialize;

/// Deadline calculations with respect to a current epoch.
/// "Deadline" refers to the window during which proofs may be submitted.
/// Windows are non-overlapping ranges [Open, Close), but the challenge epoch for a window occurs before
/// the window opens.
#[derive(Default, Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "PascalCase")]
pub struct DeadlineInfo {
    /// Epoch at which this info was calculated.
    pub current_epoch: ChainEpoch,
    /// First epoch of the proving period (<= CurrentEpoch).
    pub period_start: ChainEpoch,
    /// Current deadline index, in [0..WPoStProvingPeriodDeadlines).
    pub index: u64,
    /// First epoch from which a proof may be submitted (>= CurrentEpoch).
    pub open: ChainEpoch,
    /// First epoch from which a proof may no longer be submitted (>= Open).
    pub close: ChainEpoch,
    /// Epoch at which to sample the chain for challenge (< Open).
    pub challenge: ChainEpoch,
    /// First epoch at which a fault declaration is rejected (< Open).
    pub fault_cutoff: ChainEpoch,

    // Protocol parameters
    #[serde(rename = "WPoStPeriodDeadlines")]
    pub w_post_period_deadlines: u64,
    #[serde(rename = "WPoStProvingPeriod")]
    pub w_post_proving_period: ChainEpoch,
    #[serde(rename = "WPoStChallengeWindow")]
    pub w_post_challenge_window: ChainEpoch,
    #[serde(rename = "WPoStChallengeLookback")]
    pub w_post_challenge_lookback: ChainEpoch,
    pub fault_declaration_cutoff: ChainEpoch,
}

impl DeadlineInfo {
    pub fn new(
        period_start: ChainEpoch,
        deadline_idx: u64,
        current_epoch: ChainEpoch,
        policy: &Policy,
    ) -> Self {
        let (open, close, challenge, fault_cutoff) = if deadline_idx
            < policy.wpost_period_deadlines
        {
            let deadline_open =
                period_start + (deadline_idx as ChainEpoch * policy.wpost_challenge_window);
            (
                deadline_open,
                deadline_open + policy.wpost_challenge_window,
                deadline_open - policy.wpost_challenge_lookback,
                deadline_open - policy.fault_declaration_cutoff,
            )
        } else {
            let after_last_deadline = period_start + policy.wpost_proving_period;
            (
                after_last_deadline,
                after_last_deadline,
                after_last_deadline,
                0,
            )
        };
        Self {
            current_epoch,
            period_start,
            index: deadline_idx,
            open,
            close,
            challenge,
            fault_cutoff,
            w_post_period_deadlines: policy.wpost_period_deadlines,
            w_post_proving_period: policy.wpost_proving_period,
            w_post_challenge_window: policy.wpost_challenge_window,
            w_post_challenge_lookback: policy.wpost_challenge_lookback,
            fault_declaration_cutoff: policy.fault_declaration_cutoff,
        }
    }

    /// Whether the proving period has begun.
    pub fn period_started(&self) -> bool {
        self.current_epoch >= self.period_start
    }

    /// Whether the proving period has elapsed.
    pub fn period_elapsed(&self) -> bool {
        self.current_epoch >= self.next_period_start()
    }

    /// The last epoch in the proving period.
    pub fn period_end(&self) -> ChainEpoch {
        self.period_start + self.w_post_proving_period - 1
    }

    /// The first epoch in the next proving period.
    pub fn next_period_start(&self) -> ChainEpoch {
        self.period_start + self.w_post_proving_period
    }

    /// Whether the current deadline is currently open.
    pub fn is_open(&self) -> bool {
        self.current_epoch >= self.open && self.current_epoch < self.close
    }

    /// Whether the current deadline has already closed.
    pub fn has_elapsed(&self) -> bool {
        self.current_epoch >= self.close
    }

    /// The last epoch during which a proof may be submitted.
    pub fn last(&self) -> ChainEpoch {
        self.close - 1
    }

    /// Epoch at which the subsequent deadline opens.
    pub fn next_open(&self) -> ChainEpoch {
        self.close
    }

    /// Whether the deadline's fault cutoff has passed.
    pub fn fault_cutoff_passed(&self) -> bool {
        self.current_epoch >= self.fault_cutoff
    }

    /// Returns the next instance of this deadline that has not yet elapsed.
    pub fn next_not_elapsed(self) -> Self {
        let mut info = self;
        while info.has_elapsed() {
            info = Self {
                period_start: info.next_period_start(),
                open: info.open + info.w_post_proving_period,
                close: info.close + info.w_post_proving_period,
                challenge: info.challenge + info.w_post_proving_period,
                fault_cutoff: if info.index < info.w_post_period_deadlines {
                    info.fault_cutoff + info.w_post_proving_period
                } else {
                    0
                },
                ..info
            };
        }
        info
    }

    pub fn quant_spec(&self) -> QuantSpec {
        QuantSpec {
            unit: self.w_post_proving_period,
            offset: self.last(),
        }
    }
}

/// Deadline info for `current_epoch` within the proving period starting at
/// `period_start`. Epochs past the period yield the terminal pseudo-deadline
/// at index `wpost_period_deadlines`.
pub fn compute_proving_period_deadline(
    policy: &Policy,
    period_start: ChainEpoch,
    current_epoch: ChainEpoch,
) -> DeadlineInfo {
    let period_progress = current_epoch - period_start;
    let deadline_idx = if period_progress >= policy.wpost_proving_period {
        // Proving period has completely elapsed.
        policy.wpost_period_deadlines
    } else if period_progress < 0 {
        // Period not yet started.
        0
    } else {
        (period_progress / policy.wpost_challenge_window) as u64
    };
    DeadlineInfo::new(period_start, deadline_idx, current_epoch, policy)
}

/// Quantization of epochs to multiples of `unit` shifted by `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantSpec {
    /// The unit of quantization
    pub unit: ChainEpoch,
    /// The offset from zero from which to base the modulus
    pub offset: ChainEpoch,
}

impl QuantSpec {
    /// Rounds `epoch` to the nearest exact multiple of the quantization unit offset by
    /// `offset % unit`, rounding up.
    ///
    /// This function is equivalent to `unit * ceil(epoch - (offset % unit) / unit) + (offsetSeed % unit)`
    /// with the variables/operations over real numbers instead of ints.
    ///
    /// Precondition: `unit > 0`
    pub fn quantize_up(&self, epoch: ChainEpoch) -> ChainEpoch {
        let offset = self.offset % self.unit;

        let remainder = (epoch - offset) % self.unit;
        let quotient = (epoch - offset) / self.unit;

        // Don't round if epoch falls on a quantization epoch
        if remainder == 0
        // Negative truncating division rounds up
        || epoch - offset < 0
        {
            self.unit * quotient + offset
        } else {
            self.unit * (quotient + 1) + offset
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deadline_windows() {
        let policy = Policy::mainnet();
        let info = DeadlineInfo::new(1000, 3, 1200, &policy);
        assert_eq!(info.open, 1180);
        assert_eq!(info.close, 1240);
        assert_eq!(info.challenge, 1160);
        assert_eq!(info.fault_cutoff, 1110);
        assert_eq!(info.last(), 1239);
        assert!(info.is_open());
        assert!(info.fault_cutoff_passed());
        assert!(!info.has_elapsed());
        assert_eq!(info.period_end(), 3879);
    }

    #[test]
    fn deadline_past_the_period_is_terminal() {
        let policy = Policy::mainnet();
        let info = compute_proving_period_deadline(&policy, 0, 2880);
        assert_eq!(info.index, 48);
        assert_eq!(info.open, 2880);
        assert_eq!(info.close, 2880);
        assert_eq!(info.fault_cutoff, 0);
        assert!(info.period_elapsed());
    }

    #[test]
    fn deadline_index_follows_progress() {
        let policy = Policy::mainnet();
        assert_eq!(compute_proving_period_deadline(&policy, 100, 50).index, 0);
        assert_eq!(compute_proving_period_deadline(&policy, 100, 100).index, 0);
        assert_eq!(compute_proving_period_deadline(&policy, 100, 160).index, 1);
        assert_eq!(compute_proving_period_deadline(&policy, 100, 2979).index, 47);
    }

    #[test]
    fn next_not_elapsed_rolls_periods() {
        let policy = Policy::mainnet();
        let info = DeadlineInfo::new(0, 2, 3000, &policy).next_not_elapsed();
        assert_eq!(info.period_start, 2880);
        assert_eq!(info, DeadlineInfo::new(2880, 2, 3000, &policy));
        assert!(!info.has_elapsed());
    }

    #[test]
    fn quantization() {
        let q = QuantSpec { unit: 10, offset: 3 };
        assert_eq!(q.quantize_up(3), 3);
        assert_eq!(q.quantize_up(4), 13);
        assert_eq!(q.quantize_up(13), 13);
        assert_eq!(q.quantize_up(-6), 3);
        assert_eq!(q.quantize_up(-7), -7);

        let q = QuantSpec {
            unit: 10,
            offset: 23,
        };
        assert_eq!(q.quantize_up(4), 13);
    }

    #[test]
    fn serializes_with_chain_field_names() {
        let info = DeadlineInfo::new(0, 0, 0, &Policy::mainnet());
        let value = serde_json::to_value(info).unwrap();
        assert_eq!(value["WPoStChallengeWindow"], 60);
        assert_eq!(value["FaultCutoff"], -70);
    }
}
