// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Builds v0 miner states in a [`MemoryDB`] for tests.

use super::*;
use crate::db::MemoryDB;
use crate::shim::{
    address::Address,
    bigint::BigInt,
    sector::{RegisteredSealProof, SectorSize},
    state_tree::ActorState,
};
use crate::utils::db::CborStoreExt as _;
use fvm_ipld_encoding::{DAG_CBOR, RawBytes};
use multihash_codetable::{Code, MultihashDigest as _};

pub fn bits(sectors: impl IntoIterator<Item = u64>) -> BitField {
    let mut sectors: Vec<u64> = sectors.into_iter().collect();
    sectors.sort_unstable();
    sectors.dedup();
    BitField::try_from_bits(sectors).unwrap()
}

pub fn sealed_cid(sector_number: SectorNumber) -> Cid {
    Cid::new_v1(
        DAG_CBOR,
        Code::Blake2b256.digest(format!("sealed-{sector_number}").as_bytes()),
    )
}

pub fn sector(sector_number: SectorNumber, expiration: ChainEpoch) -> SectorOnChainInfo {
    SectorOnChainInfo {
        sector_number,
        seal_proof: RegisteredSealProof::StackedDRG32GiBV1,
        sealed_cid: sealed_cid(sector_number),
        deal_ids: vec![sector_number * 10],
        activation: 100,
        expiration,
        deal_weight: BigInt::from(0),
        verified_deal_weight: BigInt::from(0),
        initial_pledge: TokenAmount::from_atto(1_000),
        expected_day_reward: TokenAmount::from_atto(10),
        expected_storage_pledge: TokenAmount::from_atto(200),
    }
}

pub fn precommit(sector_number: SectorNumber) -> SectorPreCommitOnChainInfo {
    SectorPreCommitOnChainInfo {
        info: SectorPreCommitInfo {
            seal_proof: RegisteredSealProof::StackedDRG32GiBV1,
            sector_number,
            sealed_cid: sealed_cid(sector_number),
            seal_rand_epoch: 90,
            deal_ids: vec![],
            expiration: 600_000,
            replace_capacity: false,
            replace_sector_deadline: 0,
            replace_sector_partition: 0,
            replace_sector_number: 0,
        },
        pre_commit_deposit: TokenAmount::from_atto(50),
        pre_commit_epoch: 95,
        deal_weight: BigInt::from(0),
        verified_deal_weight: BigInt::from(0),
    }
}

/// A partition and its expiration queue, before it is written out.
#[derive(Debug, Clone, Default)]
pub struct PartitionSpec {
    pub all: BitField,
    pub faulty: BitField,
    pub recovering: BitField,
    pub terminated: BitField,
    pub expirations: Vec<(ChainEpoch, ExpirationSet)>,
}

impl PartitionSpec {
    pub fn new(all: impl IntoIterator<Item = u64>) -> Self {
        Self {
            all: bits(all),
            ..Default::default()
        }
    }

    pub fn faulty(mut self, sectors: impl IntoIterator<Item = u64>) -> Self {
        self.faulty = bits(sectors);
        self
    }

    pub fn recovering(mut self, sectors: impl IntoIterator<Item = u64>) -> Self {
        self.recovering = bits(sectors);
        self
    }

    pub fn terminated(mut self, sectors: impl IntoIterator<Item = u64>) -> Self {
        self.terminated = bits(sectors);
        self
    }

    pub fn expiring(
        mut self,
        epoch: ChainEpoch,
        on_time: impl IntoIterator<Item = u64>,
        early: impl IntoIterator<Item = u64>,
    ) -> Self {
        self.expirations.push((
            epoch,
            ExpirationSet {
                on_time_sectors: bits(on_time),
                early_sectors: bits(early),
                ..Default::default()
            },
        ));
        self
    }
}

pub struct StateBuilder {
    pub policy: Policy,
    pub info: MinerInfo,
    pub balance: TokenAmount,
    pub locked_funds: TokenAmount,
    pub pre_commit_deposits: TokenAmount,
    pub initial_pledge: TokenAmount,
    pub vesting: Vec<VestingFund>,
    pub proving_period_start: ChainEpoch,
    pub current_deadline: u64,
    pub sectors: Vec<SectorOnChainInfo>,
    pub precommits: Vec<SectorPreCommitOnChainInfo>,
    pub allocated: BitField,
    pub deadlines: BTreeMap<u64, Vec<PartitionSpec>>,
    pub post_submissions: BTreeMap<u64, BitField>,
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self {
            policy: Policy::mainnet(),
            info: MinerInfo {
                owner: Address::new_id(100),
                worker: Address::new_id(101),
                control_addresses: vec![Address::new_id(102)],
                pending_worker_key: None,
                peer_id: vec![],
                multi_address: vec![RawBytes::new(b"/ip4/127.0.0.1/tcp/1347".to_vec())],
                seal_proof_type: RegisteredSealProof::StackedDRG32GiBV1,
                sector_size: SectorSize::_32GiB,
                window_post_partition_sectors: 2349,
            },
            balance: TokenAmount::from_atto(10_000),
            locked_funds: TokenAmount::from_atto(1_000),
            pre_commit_deposits: TokenAmount::from_atto(500),
            initial_pledge: TokenAmount::from_atto(2_000),
            vesting: vec![],
            proving_period_start: 1000,
            current_deadline: 0,
            sectors: vec![],
            precommits: vec![],
            allocated: BitField::new(),
            deadlines: BTreeMap::new(),
            post_submissions: BTreeMap::new(),
        }
    }
}

impl StateBuilder {
    /// Deadline 3 holds two partitions: `{5, 6, 7}` with 6 faulty, and `{8}`.
    pub fn example() -> Self {
        let mut builder = Self::default();
        builder.sectors = [5, 6, 7, 8].map(|n| sector(n, 200_000)).to_vec();
        builder.allocated = bits([5, 6, 7, 8, 9]);
        builder.deadlines.insert(
            3,
            vec![
                PartitionSpec::new([5, 6, 7]).faulty([6]),
                PartitionSpec::new([8]),
            ],
        );
        builder
    }

    pub fn with_partitions(mut self, deadline: u64, partitions: Vec<PartitionSpec>) -> Self {
        self.deadlines.insert(deadline, partitions);
        self
    }

    fn write_partition(store: &MemoryDB, spec: PartitionSpec) -> Partition {
        let mut queue = Amtv0::<ExpirationSet, _>::new(store);
        for (epoch, set) in spec.expirations {
            queue.set(epoch as u64, set).unwrap();
        }
        let early_terminated = Amtv0::<BitField, _>::new(store).flush().unwrap();
        Partition {
            sectors: spec.all,
            faults: spec.faulty,
            recoveries: spec.recovering,
            terminated: spec.terminated,
            expirations_epochs: queue.flush().unwrap(),
            early_terminated,
            live_power: PowerPair::default(),
            faulty_power: PowerPair::default(),
            recovering_power: PowerPair::default(),
        }
    }

    fn write_deadline(
        store: &MemoryDB,
        partitions: Vec<PartitionSpec>,
        post_submissions: BitField,
    ) -> Cid {
        let mut array = Amtv0::<Partition, _>::new(store);
        let mut live_sectors = 0;
        let mut total_sectors = 0;
        for (idx, spec) in partitions.into_iter().enumerate() {
            total_sectors += spec.all.len();
            live_sectors += (&spec.all - &spec.terminated).len();
            array
                .set(idx as u64, Self::write_partition(store, spec))
                .unwrap();
        }
        let deadline = Deadline {
            partitions: array.flush().unwrap(),
            expirations_epochs: Amtv0::<BitField, _>::new(store).flush().unwrap(),
            post_submissions,
            early_terminations: BitField::new(),
            live_sectors,
            total_sectors,
            faulty_power: PowerPair::default(),
        };
        store.put_cbor_default(&deadline).unwrap()
    }

    /// Writes the state into a fresh store, returning the store and the
    /// actor pointing at the state root.
    pub fn build(self) -> (MemoryDB, ActorState) {
        let store = MemoryDB::default();

        let mut sectors = Amtv0::<SectorOnChainInfo, _>::new(&store);
        for info in self.sectors {
            sectors.set(info.sector_number, info).unwrap();
        }

        let mut precommits = Hamtv0::<_, SectorPreCommitOnChainInfo>::new_with_bit_width(
            &store,
            HAMT_BIT_WIDTH,
        );
        for info in self.precommits {
            precommits
                .set(u64_key(info.info.sector_number), info)
                .unwrap();
        }

        let mut due = Vec::new();
        let mut deadlines = self.deadlines;
        let mut post_submissions = self.post_submissions;
        for idx in 0..self.policy.wpost_period_deadlines {
            let partitions = deadlines.remove(&idx).unwrap_or_default();
            let submitted = post_submissions.remove(&idx).unwrap_or_default();
            due.push(Self::write_deadline(&store, partitions, submitted));
        }

        let state = State {
            info: store.put_cbor_default(&self.info).unwrap(),
            pre_commit_deposits: self.pre_commit_deposits,
            locked_funds: self.locked_funds,
            vesting_funds: store
                .put_cbor_default(&VestingFunds {
                    funds: self.vesting,
                })
                .unwrap(),
            initial_pledge_requirement: self.initial_pledge,
            pre_committed_sectors: precommits.flush().unwrap(),
            pre_committed_sectors_expiry: Amtv0::<BitField, _>::new(&store).flush().unwrap(),
            allocated_sectors: store.put_cbor_default(&self.allocated).unwrap(),
            sectors: sectors.flush().unwrap(),
            proving_period_start: self.proving_period_start,
            current_deadline: self.current_deadline,
            deadlines: store.put_cbor_default(&Deadlines { due }).unwrap(),
            early_terminations: BitField::new(),
        };
        let root = store.put_cbor_default(&state).unwrap();
        let actor = ActorState::new(ActorVersion::V0.miner_code(), root, self.balance, 0);
        (store, actor)
    }
}
