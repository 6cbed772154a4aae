// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::shim::sector::SectorNumber;
use cid::Cid;

/// Errors returned by the miner state views.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The actor code is not the miner actor of any registered version.
    #[error("unsupported miner actor code {0}")]
    UnsupportedVersion(Cid),
    /// The queried entity does not exist in this state snapshot.
    #[error("{kind} {number} not found")]
    NotFound { kind: Lookup, number: SectorNumber },
    /// A deadline or partition index beyond the schedule's bounds.
    #[error("{kind} index {index} out of range, must be less than {bound}")]
    OutOfRange { kind: Index, index: u64, bound: u64 },
    /// The snapshot contradicts the miner actor's own invariants.
    #[error("illegal miner state: {0}")]
    IllegalState(String),
    /// Failure reading or decoding from the block store.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Lookup {
    #[strum(to_string = "sector")]
    Sector,
    #[strum(to_string = "pre-committed sector")]
    PreCommittedSector,
    #[strum(to_string = "location of sector")]
    SectorLocation,
    #[strum(to_string = "expiration of sector")]
    SectorExpiration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Index {
    Deadline,
    Partition,
}

impl Error {
    pub fn not_found(kind: Lookup, number: SectorNumber) -> Self {
        Self::NotFound { kind, number }
    }

    pub fn out_of_range(kind: Index, index: u64, bound: u64) -> Self {
        Self::OutOfRange { kind, index, bound }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<fvm_ipld_amt::Error> for Error {
    fn from(e: fvm_ipld_amt::Error) -> Self {
        Self::Store(e.into())
    }
}

impl From<fvm_ipld_hamt::Error> for Error {
    fn from(e: fvm_ipld_hamt::Error) -> Self {
        Self::Store(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        assert_eq!(
            Error::not_found(Lookup::PreCommittedSector, 7).to_string(),
            "pre-committed sector 7 not found"
        );
        assert_eq!(
            Error::out_of_range(Index::Deadline, 48, 48).to_string(),
            "deadline index 48 out of range, must be less than 48"
        );
    }

    #[test]
    fn store_errors_are_transparent() {
        let err = Error::from(anyhow::anyhow!("block missing"));
        assert_eq!(err.to_string(), "block missing");
        assert!(!err.is_not_found());
    }
}
