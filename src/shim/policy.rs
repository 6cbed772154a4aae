// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::shim::clock::ChainEpoch;
use crate::utils::io::{read_toml, read_toml_file};
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::path::Path;

const EPOCH_DURATION_SECONDS: ChainEpoch = 30;
const SECONDS_IN_HOUR: ChainEpoch = 60 * 60;
const SECONDS_IN_DAY: ChainEpoch = 24 * SECONDS_IN_HOUR;
const EPOCHS_IN_HOUR: ChainEpoch = SECONDS_IN_HOUR / EPOCH_DURATION_SECONDS;
const EPOCHS_IN_DAY: ChainEpoch = SECONDS_IN_DAY / EPOCH_DURATION_SECONDS;

/// Proving-schedule parameters the miner state views are interpreted with.
///
/// Every field has a default, so a configuration file only needs to list the
/// values it overrides:
///
/// ```toml
/// wpost_challenge_window = 2
/// wpost_proving_period = 96
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// The period over which all a miner's active sectors will be challenged.
    pub wpost_proving_period: ChainEpoch,
    /// The duration of a deadline's challenge window, the period before a
    /// deadline when the challenge is available.
    pub wpost_challenge_window: ChainEpoch,
    /// The number of non-overlapping PoSt deadlines in each proving period.
    pub wpost_period_deadlines: u64,
    /// Lookback from the deadline's challenge window opening from which to
    /// sample chain randomness for the challenge seed.
    pub wpost_challenge_lookback: ChainEpoch,
    /// Minimum period before a deadline's challenge window opens that a fault
    /// must be declared for that deadline.
    pub fault_declaration_cutoff: ChainEpoch,
    /// Maximum number of partitions that may be assigned to a single deadline.
    pub max_partitions_per_deadline: u64,
}

impl Default for Policy {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl Policy {
    pub fn mainnet() -> Self {
        let wpost_challenge_lookback = 20;
        Self {
            wpost_proving_period: EPOCHS_IN_DAY,
            wpost_challenge_window: 30 * 60 / EPOCH_DURATION_SECONDS,
            wpost_period_deadlines: 48,
            wpost_challenge_lookback,
            fault_declaration_cutoff: wpost_challenge_lookback + 50,
            max_partitions_per_deadline: 3000,
        }
    }

    /// Rejects schedules whose deadlines do not tile the proving period.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.wpost_challenge_window > 0,
            "challenge window must be positive, got {}",
            self.wpost_challenge_window
        );
        ensure!(
            self.wpost_period_deadlines > 0,
            "proving period must have at least one deadline"
        );
        let deadlines = ChainEpoch::try_from(self.wpost_period_deadlines)?;
        ensure!(
            self.wpost_proving_period == self.wpost_challenge_window * deadlines,
            "proving period {} is not {} deadlines of {} epochs",
            self.wpost_proving_period,
            self.wpost_period_deadlines,
            self.wpost_challenge_window
        );
        ensure!(
            self.wpost_challenge_lookback >= 0 && self.fault_declaration_cutoff >= 0,
            "lookback and fault cutoff must not be negative"
        );
        Ok(())
    }

    pub fn from_toml(toml_string: &str) -> anyhow::Result<Self> {
        let policy: Self = read_toml(toml_string)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let policy: Self = read_toml_file(path)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Length of a proving period in hours, for display purposes.
    pub fn proving_period_hours(&self) -> ChainEpoch {
        self.wpost_proving_period / EPOCHS_IN_HOUR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;

    #[test]
    fn mainnet_schedule() {
        let policy = Policy::mainnet();
        policy.validate().unwrap();
        assert_eq!(policy.wpost_proving_period, 2880);
        assert_eq!(policy.wpost_challenge_window, 60);
        assert_eq!(policy.fault_declaration_cutoff, 70);
        assert_eq!(policy.proving_period_hours(), 24);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let policy = Policy::from_toml(
            "wpost_challenge_window = 2\nwpost_proving_period = 96\n",
        )
        .unwrap();
        assert_eq!(
            policy,
            Policy {
                wpost_challenge_window: 2,
                wpost_proving_period: 96,
                ..Policy::mainnet()
            }
        );
    }

    #[test]
    fn inconsistent_schedule_is_rejected() {
        let err = Policy::from_toml("wpost_challenge_window = 2\n").unwrap_err();
        assert!(err.to_string().contains("is not 48 deadlines"), "{err}");
    }

    #[test]
    fn reads_policy_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "wpost_period_deadlines = 24").unwrap();
        writeln!(file, "wpost_challenge_window = 120").unwrap();
        let policy = Policy::from_file(file.path()).unwrap();
        assert_eq!(policy.wpost_period_deadlines, 24);
        assert_eq!(policy.wpost_proving_period, 2880);

        assert!(Policy::from_file(&file.path().with_extension("missing")).is_err());
    }
}
