// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Deadline, Partition};
use crate::shim::actors::builtin::miner::{self, Error, Index};
use fvm_ipld_amt::Amtv0;
use fvm_ipld_bitfield::BitField;
use fvm_ipld_blockstore::Blockstore;

/// [`miner::Deadline`] over a v0 deadline and its partitions array.
pub struct MinerDeadline<'a, BS> {
    deadline: Deadline,
    partitions: Amtv0<Partition, &'a BS>,
    max_partitions: u64,
}

impl<'a, BS: Blockstore> MinerDeadline<'a, BS> {
    pub(super) fn load(
        store: &'a BS,
        deadline: Deadline,
        max_partitions: u64,
    ) -> Result<Self, Error> {
        let partitions = Amtv0::load(&deadline.partitions, store)?;
        Ok(Self {
            deadline,
            partitions,
            max_partitions,
        })
    }

    pub fn native(&self) -> &Deadline {
        &self.deadline
    }
}

impl<BS: Blockstore> miner::Deadline for MinerDeadline<'_, BS> {
    /// Partitions beyond the policy's per-deadline cap are not counted.
    fn partitions_count(&self) -> Result<u64, Error> {
        Ok(self.partitions.count().min(self.max_partitions))
    }

    fn load_partition(&self, idx: u64) -> Result<Box<dyn miner::Partition + '_>, Error> {
        let count = self.partitions.count();
        let bound = count.min(self.max_partitions);
        if idx >= bound {
            return Err(Error::out_of_range(Index::Partition, idx, bound));
        }
        let partition = self.partitions.get(idx)?.ok_or_else(|| {
            Error::IllegalState(format!(
                "partition {idx} missing from deadline with {count} partitions"
            ))
        })?;
        Ok(Box::new(MinerPartition(partition.clone())))
    }

    fn post_submissions(&self) -> Result<BitField, Error> {
        Ok(self.deadline.post_submissions.clone())
    }
}

/// [`miner::Partition`] over a v0 partition.
///
/// v0 stores terminated sectors explicitly, live sectors are what remains.
#[derive(Debug, Clone, PartialEq)]
pub struct MinerPartition(pub Partition);

impl miner::Partition for MinerPartition {
    fn all_sectors(&self) -> Result<BitField, Error> {
        Ok(self.0.sectors.clone())
    }

    fn faulty_sectors(&self) -> Result<BitField, Error> {
        Ok(self.0.faults.clone())
    }

    fn recovering_sectors(&self) -> Result<BitField, Error> {
        Ok(self.0.recoveries.clone())
    }

    fn live_sectors(&self) -> Result<BitField, Error> {
        Ok(&self.0.sectors - &self.0.terminated)
    }
}
