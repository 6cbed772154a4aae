// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Version-independent view of storage miner actor state.
//!
//! [`load`] (or a [`Registry`] built with a custom [`Policy`]) picks the
//! decoder for an actor's code CID and returns a [`State`]. Deadlines and
//! partitions are reached through [`State::load_deadline`] and
//! [`Deadline::load_partition`], which borrow from the state they came from.

mod deadline_info;
mod error;
mod registry;
mod sector_set;
mod types;
pub mod v0;

pub use deadline_info::{DeadlineInfo, QuantSpec, compute_proving_period_deadline};
pub use error::{Error, Index, Lookup};
pub use registry::{DecodeFn, Registry, load};
pub use sector_set::{BitFieldExt, PartitionSectors};
pub use types::*;

use crate::shim::{
    actors::ActorVersion,
    clock::ChainEpoch,
    econ::TokenAmount,
    policy::Policy,
    sector::SectorNumber,
};
use fvm_ipld_bitfield::BitField;
use std::collections::BTreeMap;

/// Visitor passed to [`State::for_each_deadline`].
pub type DeadlineVisitor<'v> = dyn FnMut(u64, &dyn Deadline) -> Result<(), Error> + 'v;

/// Visitor passed to [`Deadline::for_each_partition`].
pub type PartitionVisitor<'v> = dyn FnMut(u64, &dyn Partition) -> Result<(), Error> + 'v;

/// Miner actor state at one state root.
///
/// Implementations are read-only snapshots: every method is a pure function
/// of the blocks reachable from the root they were decoded from.
pub trait State: Send + Sync {
    /// Actor version whose layout backs this view.
    fn version(&self) -> ActorVersion;

    /// Funds not locked for vesting, pre-commit deposits or initial pledge.
    fn available_balance(&self, balance: &TokenAmount) -> Result<TokenAmount, Error>;

    /// Funds that have vested before `epoch`.
    fn vested_funds(&self, epoch: ChainEpoch) -> Result<TokenAmount, Error>;

    fn get_sector(&self, sector_number: SectorNumber) -> Result<SectorOnChainInfo, Error>;

    /// Deadline and partition the sector is assigned to.
    fn find_sector(&self, sector_number: SectorNumber) -> Result<SectorLocation, Error>;

    /// Scheduled expiration of a live sector. `early` is set only while the
    /// sector is faulty.
    fn get_sector_expiration(
        &self,
        sector_number: SectorNumber,
    ) -> Result<SectorExpiration, Error>;

    fn get_precommitted_sector(
        &self,
        sector_number: SectorNumber,
    ) -> Result<SectorPreCommitOnChainInfo, Error>;

    /// Committed sectors in ascending order of sector number.
    ///
    /// With a `filter`, keeps only the sectors in it, or only those outside
    /// it when `filter_out` is set.
    fn load_sectors_from_set(
        &self,
        filter: Option<&BitField>,
        filter_out: bool,
    ) -> Result<Vec<SectorOnChainInfo>, Error>;

    fn load_precommitted_sectors(
        &self,
    ) -> Result<BTreeMap<SectorNumber, SectorPreCommitOnChainInfo>, Error>;

    /// Whether the sector number has ever been allocated by this miner.
    fn is_allocated(&self, sector_number: SectorNumber) -> Result<bool, Error>;

    fn load_deadline(&self, idx: u64) -> Result<Box<dyn Deadline + '_>, Error>;

    /// Visits deadlines in ascending index order, stopping at the first
    /// error returned by `f`.
    fn for_each_deadline(&self, f: &mut DeadlineVisitor<'_>) -> Result<(), Error> {
        for idx in 0..self.num_deadlines() {
            let deadline = self.load_deadline(idx)?;
            f(idx, deadline.as_ref())?;
        }
        Ok(())
    }

    fn num_deadlines(&self) -> u64;

    fn info(&self) -> Result<MinerInfo, Error>;

    /// Proving window that is current at `epoch`.
    fn deadline_info(&self, epoch: ChainEpoch) -> DeadlineInfo;

    fn wpost_proving_period(&self) -> ChainEpoch;

    /// Policy the view interprets the proving schedule with.
    fn policy(&self) -> &Policy;

    /// `DAG_CBOR` encoding of the state root.
    fn marshal_cbor(&self) -> Result<Vec<u8>, Error>;
}

/// One window of the proving schedule.
pub trait Deadline {
    fn partitions_count(&self) -> Result<u64, Error>;

    fn load_partition(&self, idx: u64) -> Result<Box<dyn Partition + '_>, Error>;

    /// Visits partitions in ascending index order, stopping at the first
    /// error returned by `f`.
    fn for_each_partition(&self, f: &mut PartitionVisitor<'_>) -> Result<(), Error> {
        for idx in 0..self.partitions_count()? {
            let partition = self.load_partition(idx)?;
            f(idx, partition.as_ref())?;
        }
        Ok(())
    }

    /// Partitions that already submitted a proof in the current period.
    fn post_submissions(&self) -> Result<BitField, Error>;
}

/// Sector sets of one partition.
pub trait Partition {
    fn all_sectors(&self) -> Result<BitField, Error>;

    fn faulty_sectors(&self) -> Result<BitField, Error>;

    /// Faulty sectors declared as recovering.
    fn recovering_sectors(&self) -> Result<BitField, Error>;

    /// Sectors that have not been terminated.
    fn live_sectors(&self) -> Result<BitField, Error>;

    /// Live sectors that are not faulty.
    fn active_sectors(&self) -> Result<BitField, Error> {
        Ok(&self.live_sectors()? - &self.faulty_sectors()?)
    }

    fn terminated_sectors(&self) -> Result<BitField, Error> {
        Ok(&self.all_sectors()? - &self.live_sectors()?)
    }
}

/// Queries built only on the [`State`] contract, shared by every version.
pub trait StateExt: State {
    /// Union of one set across all partitions of all deadlines.
    fn all_partition_sectors<F>(&self, select: F) -> Result<BitField, Error>
    where
        F: Fn(&dyn Partition) -> Result<BitField, Error>,
    {
        let mut union = BitField::new();
        self.for_each_deadline(&mut |_, deadline| {
            deadline.for_each_partition(&mut |_, partition| {
                union = &union | &select(partition)?;
                Ok(())
            })
        })?;
        Ok(union)
    }

    /// Sectors due for proof, that is live and not faulty.
    fn active_sectors(&self) -> Result<BitField, Error> {
        self.all_partition_sectors(|p| p.active_sectors())
    }

    fn faulty_sectors(&self) -> Result<BitField, Error> {
        self.all_partition_sectors(|p| p.faulty_sectors())
    }

    fn recovering_sectors(&self) -> Result<BitField, Error> {
        self.all_partition_sectors(|p| p.recovering_sectors())
    }

    /// Deadline open at `epoch` according to the schedule alone, however far
    /// the stored current deadline has advanced.
    fn proving_deadline_at(&self, epoch: ChainEpoch) -> DeadlineInfo {
        let period_start = self.deadline_info(epoch).period_start;
        compute_proving_period_deadline(self.policy(), period_start, epoch)
    }

    /// Committed sectors paired with their numbers, in the shape chain
    /// queries return them.
    fn load_chain_sectors(
        &self,
        filter: Option<&BitField>,
    ) -> Result<Vec<ChainSectorInfo>, Error> {
        Ok(self
            .load_sectors_from_set(filter, false)?
            .into_iter()
            .map(|info| ChainSectorInfo {
                id: info.sector_number,
                info,
            })
            .collect())
    }

    /// Walks every partition checking its sector sets, and that no sector
    /// is assigned to more than one partition.
    fn check_sector_invariants(&self) -> Result<(), Error> {
        let mut seen = BitField::new();
        self.for_each_deadline(&mut |dl_idx, deadline| {
            deadline.for_each_partition(&mut |p_idx, partition| {
                let sectors = PartitionSectors::load(partition)?;
                sectors.check()?;
                if let Some(dup) = seen.first_shared(&sectors.all) {
                    return Err(Error::IllegalState(format!(
                        "sector {dup} in deadline {dl_idx} partition {p_idx} \
                         is assigned more than once"
                    )));
                }
                seen = &seen | &sectors.all;
                Ok(())
            })
        })
    }
}

impl<S: State + ?Sized> StateExt for S {}
