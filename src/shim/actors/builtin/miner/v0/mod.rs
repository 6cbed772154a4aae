// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Miner state as laid out by the first generation of builtin actors.

mod deadline;
#[cfg(test)]
pub(crate) mod testing;
mod types;

pub use deadline::{MinerDeadline, MinerPartition};
pub use types::*;

use crate::shim::{
    HAMT_BIT_WIDTH,
    actors::{ActorVersion, builtin::miner},
    clock::ChainEpoch,
    econ::TokenAmount,
    policy::Policy,
    sector::SectorNumber,
};
use crate::utils::{
    db::CborStoreExt as _,
    encoding::{parse_u64_key, u64_key},
};
use cid::Cid;
use fvm_ipld_amt::Amtv0;
use fvm_ipld_bitfield::BitField;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_hamt::Hamtv0;
use miner::{Error, Index, Lookup, QuantSpec};
use std::collections::BTreeMap;
use tracing::trace;

/// Decodes a v0 miner state root.
pub fn decode<BS>(
    store: BS,
    root: &Cid,
    policy: &Policy,
) -> Result<Box<dyn miner::State>, Error>
where
    BS: Blockstore + Send + Sync + 'static,
{
    let state: State = store.get_cbor_required(root)?;
    Ok(Box::new(MinerState {
        store,
        policy: policy.clone(),
        state,
    }))
}

/// [`miner::State`] over a decoded v0 state root.
pub struct MinerState<BS> {
    store: BS,
    policy: Policy,
    state: State,
}

impl<BS: Blockstore> MinerState<BS> {
    pub fn native(&self) -> &State {
        &self.state
    }

    fn sectors(&self) -> Result<Amtv0<SectorOnChainInfo, &BS>, Error> {
        Ok(Amtv0::load(&self.state.sectors, &self.store)?)
    }

    /// Pre-committed sectors, in the HAMT node layout of this actor version.
    fn precommitted(&self) -> Result<Hamtv0<&BS, SectorPreCommitOnChainInfo>, Error> {
        Ok(Hamtv0::load_with_bit_width(
            &self.state.pre_committed_sectors,
            &self.store,
            HAMT_BIT_WIDTH,
        )?)
    }

    fn load_deadlines(&self) -> Result<Deadlines, Error> {
        Ok(self.store.get_cbor_required(&self.state.deadlines)?)
    }

    fn deadline_at(&self, deadlines: &Deadlines, idx: u64) -> Result<Deadline, Error> {
        let bound = self.policy.wpost_period_deadlines;
        if idx >= bound {
            return Err(Error::out_of_range(Index::Deadline, idx, bound));
        }
        let cid = usize::try_from(idx)
            .ok()
            .and_then(|i| deadlines.due.get(i))
            .ok_or_else(|| {
                Error::IllegalState(format!(
                    "deadline {idx} missing from table of {} deadlines",
                    deadlines.due.len()
                ))
            })?;
        Ok(self.store.get_cbor_required(cid)?)
    }

    fn deadline_view(&self, deadline: Deadline) -> Result<MinerDeadline<'_, BS>, Error> {
        MinerDeadline::load(
            &self.store,
            deadline,
            self.policy.max_partitions_per_deadline,
        )
    }

    /// Quantization of the expiration queues of deadline `idx`.
    fn quant_spec_for_deadline(&self, idx: u64) -> QuantSpec {
        miner::DeadlineInfo::new(self.state.proving_period_start, idx, 0, &self.policy)
            .quant_spec()
    }
}

impl<BS> miner::State for MinerState<BS>
where
    BS: Blockstore + Send + Sync,
{
    fn version(&self) -> ActorVersion {
        ActorVersion::V0
    }

    fn available_balance(&self, balance: &TokenAmount) -> Result<TokenAmount, Error> {
        let st = &self.state;
        let locked =
            &(&st.locked_funds + &st.pre_commit_deposits) + &st.initial_pledge_requirement;
        let available = balance - &locked;
        if available.is_negative() {
            return Err(Error::IllegalState(format!(
                "balance {balance} is below locked funds {locked}"
            )));
        }
        Ok(available)
    }

    fn vested_funds(&self, epoch: ChainEpoch) -> Result<TokenAmount, Error> {
        let vesting: VestingFunds = self.store.get_cbor_required(&self.state.vesting_funds)?;
        Ok(vesting
            .funds
            .iter()
            .filter(|fund| fund.epoch < epoch)
            .fold(TokenAmount::default(), |vested, fund| vested + &fund.amount))
    }

    fn get_sector(
        &self,
        sector_number: SectorNumber,
    ) -> Result<miner::SectorOnChainInfo, Error> {
        self.sectors()?
            .get(sector_number)?
            .cloned()
            .map(Into::into)
            .ok_or_else(|| Error::not_found(Lookup::Sector, sector_number))
    }

    fn find_sector(
        &self,
        sector_number: SectorNumber,
    ) -> Result<miner::SectorLocation, Error> {
        let deadlines = self.load_deadlines()?;
        for dl_idx in 0..miner::State::num_deadlines(self) {
            let deadline = self.deadline_at(&deadlines, dl_idx)?;
            let partitions: Amtv0<Partition, _> =
                Amtv0::load(&deadline.partitions, &self.store)?;
            let mut found = None;
            partitions.for_each(|p_idx, partition| {
                if found.is_none() && partition.sectors.get(sector_number) {
                    found = Some(p_idx);
                }
                Ok(())
            })?;
            if let Some(partition) = found {
                trace!(sector_number, dl_idx, partition, "located sector");
                return Ok(miner::SectorLocation {
                    deadline: dl_idx,
                    partition,
                });
            }
        }
        Err(Error::not_found(Lookup::SectorLocation, sector_number))
    }

    fn get_sector_expiration(
        &self,
        sector_number: SectorNumber,
    ) -> Result<miner::SectorExpiration, Error> {
        let not_found = || Error::not_found(Lookup::SectorExpiration, sector_number);
        let location = match self.find_sector(sector_number) {
            Err(e) if e.is_not_found() => return Err(not_found()),
            other => other?,
        };
        let deadline = self.deadline_at(&self.load_deadlines()?, location.deadline)?;
        let partitions: Amtv0<Partition, _> = Amtv0::load(&deadline.partitions, &self.store)?;
        let partition = partitions.get(location.partition)?.ok_or_else(|| {
            Error::IllegalState(format!(
                "partition {} of deadline {} vanished",
                location.partition, location.deadline
            ))
        })?;
        if partition.terminated.get(sector_number) {
            return Err(not_found());
        }

        // A faulty sector sits in the early set of the queue entry at which
        // it would be removed; scanning stops at its on-time entry.
        let queue: Amtv0<ExpirationSet, _> =
            Amtv0::load(&partition.expirations_epochs, &self.store)?;
        let (mut on_time, mut early) = (None, None);
        queue.for_each(|epoch, set| {
            if on_time.is_none() {
                if set.early_sectors.get(sector_number) {
                    early = Some(epoch as ChainEpoch);
                } else if set.on_time_sectors.get(sector_number) {
                    on_time = Some(epoch as ChainEpoch);
                }
            }
            Ok(())
        })?;

        let on_time = match (on_time, early) {
            (Some(epoch), _) => epoch,
            (None, Some(_)) => {
                let sector = self.get_sector(sector_number)?;
                self.quant_spec_for_deadline(location.deadline)
                    .quantize_up(sector.expiration)
            }
            (None, None) => return Err(not_found()),
        };
        Ok(miner::SectorExpiration {
            on_time,
            early: early.unwrap_or_default(),
        })
    }

    fn get_precommitted_sector(
        &self,
        sector_number: SectorNumber,
    ) -> Result<miner::SectorPreCommitOnChainInfo, Error> {
        self.precommitted()?
            .get(&u64_key(sector_number))?
            .cloned()
            .map(Into::into)
            .ok_or_else(|| Error::not_found(Lookup::PreCommittedSector, sector_number))
    }

    fn load_sectors_from_set(
        &self,
        filter: Option<&BitField>,
        filter_out: bool,
    ) -> Result<Vec<miner::SectorOnChainInfo>, Error> {
        let mut sectors = Vec::new();
        self.sectors()?.for_each(|sector_number, info| {
            let keep = filter.is_none_or(|filter| filter.get(sector_number) != filter_out);
            if keep {
                sectors.push(info.clone().into());
            }
            Ok(())
        })?;
        Ok(sectors)
    }

    fn load_precommitted_sectors(
        &self,
    ) -> Result<BTreeMap<SectorNumber, miner::SectorPreCommitOnChainInfo>, Error> {
        let mut precommitted = BTreeMap::new();
        self.precommitted()?.for_each(|key, info| {
            precommitted.insert(parse_u64_key(&key.0)?, info.clone().into());
            Ok(())
        })?;
        Ok(precommitted)
    }

    fn is_allocated(&self, sector_number: SectorNumber) -> Result<bool, Error> {
        let allocated: BitField = self
            .store
            .get_cbor_required(&self.state.allocated_sectors)?;
        Ok(allocated.get(sector_number))
    }

    fn load_deadline(&self, idx: u64) -> Result<Box<dyn miner::Deadline + '_>, Error> {
        let deadline = self.deadline_at(&self.load_deadlines()?, idx)?;
        Ok(Box::new(self.deadline_view(deadline)?))
    }

    fn for_each_deadline(&self, f: &mut miner::DeadlineVisitor<'_>) -> Result<(), Error> {
        let deadlines = self.load_deadlines()?;
        for idx in 0..miner::State::num_deadlines(self) {
            let deadline = self.deadline_view(self.deadline_at(&deadlines, idx)?)?;
            f(idx, &deadline)?;
        }
        Ok(())
    }

    fn num_deadlines(&self) -> u64 {
        self.policy.wpost_period_deadlines
    }

    fn info(&self) -> Result<miner::MinerInfo, Error> {
        let info: MinerInfo = self.store.get_cbor_required(&self.state.info)?;
        Ok(info.into())
    }

    fn deadline_info(&self, epoch: ChainEpoch) -> miner::DeadlineInfo {
        miner::DeadlineInfo::new(
            self.state.proving_period_start,
            self.state.current_deadline,
            epoch,
            &self.policy,
        )
    }

    fn wpost_proving_period(&self) -> ChainEpoch {
        self.policy.wpost_proving_period
    }

    fn policy(&self) -> &Policy {
        &self.policy
    }

    fn marshal_cbor(&self) -> Result<Vec<u8>, Error> {
        Ok(fvm_ipld_encoding::to_vec(&self.state).map_err(anyhow::Error::from)?)
    }
}
