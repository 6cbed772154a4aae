// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::shim::{
    address::Address,
    bigint::BigInt,
    clock::ChainEpoch,
    deal::DealID,
    econ::TokenAmount,
    randomness::Randomness,
    sector::{PoStProof, RegisteredSealProof, SectorNumber, SectorSize},
};
use cid::Cid;
use fvm_ipld_bitfield::BitField;
use fvm_ipld_encoding::{strict_bytes, tuple::*};
use libp2p::PeerId;

/// Static information about miner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinerInfo {
    pub owner: Address,
    pub worker: Address,
    /// Worker key that takes over at `worker_change_epoch`, if a change is pending.
    pub new_worker: Option<Address>,
    pub control_addresses: Vec<Address>, // Must all be ID addresses.
    /// `-1` when no worker change is pending.
    pub worker_change_epoch: ChainEpoch,
    /// `None` if the miner never set a peer id or set one that does not parse.
    pub peer_id: Option<PeerId>,
    pub multiaddrs: Vec<Vec<u8>>,
    pub seal_proof_type: RegisteredSealProof,
    pub sector_size: SectorSize,
    pub window_post_partition_sectors: u64,
}

impl MinerInfo {
    pub fn worker(&self) -> Address {
        self.worker
    }

    pub fn sector_size(&self) -> SectorSize {
        self.sector_size
    }

    pub fn has_pending_worker_change(&self) -> bool {
        self.new_worker.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorOnChainInfo {
    pub sector_number: SectorNumber,
    /// The seal proof type implies the PoSt proofs
    pub seal_proof: RegisteredSealProof,
    /// `CommR`
    pub sealed_cid: Cid,
    pub deal_ids: Vec<DealID>,
    /// Epoch during which the sector proof was accepted
    pub activation: ChainEpoch,
    /// Epoch during which the sector expires
    pub expiration: ChainEpoch,
    /// Integral of active deals over sector lifetime
    pub deal_weight: BigInt,
    /// Integral of active verified deals over sector lifetime
    pub verified_deal_weight: BigInt,
    /// Pledge collected to commit this sector
    pub initial_pledge: TokenAmount,
    /// Expected one day projection of reward for sector computed at activation time
    pub expected_day_reward: TokenAmount,
    /// Expected twenty day projection of reward for sector computed at activation time
    pub expected_storage_pledge: TokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorPreCommitInfo {
    pub seal_proof: RegisteredSealProof,
    pub sector_number: SectorNumber,
    /// `CommR`
    pub sealed_cid: Cid,
    pub seal_rand_epoch: ChainEpoch,
    pub deal_ids: Vec<DealID>,
    pub expiration: ChainEpoch,
    /// Whether to replace a "committed capacity" no-deal sector (requires non-empty `DealIDs`)
    pub replace_capacity: bool,
    /// The committed capacity sector to replace, and its deadline/partition location
    pub replace_sector_deadline: u64,
    pub replace_sector_partition: u64,
    pub replace_sector_number: SectorNumber,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorPreCommitOnChainInfo {
    pub info: SectorPreCommitInfo,
    pub pre_commit_deposit: TokenAmount,
    pub pre_commit_epoch: ChainEpoch,
    /// Integral of active deals over sector lifetime, 0 if `CommittedCapacity` sector
    pub deal_weight: BigInt,
    /// Integral of active verified deals over sector lifetime
    pub verified_deal_weight: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSectorInfo {
    pub info: SectorOnChainInfo,
    pub id: SectorNumber,
}

/// Coordinates of a sector in the proving schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectorLocation {
    pub deadline: u64,
    pub partition: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectorExpiration {
    pub on_time: ChainEpoch,
    /// Non-zero if the sector is faulty: the epoch at which it will be
    /// permanently removed if it doesn't recover.
    pub early: ChainEpoch,
}

impl SectorExpiration {
    pub fn is_faulty(&self) -> bool {
        self.early != 0
    }
}

// Message parameters, encoded as they are sent to the miner actor.

#[derive(Debug, Clone, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct PoStPartition {
    /// Partitions are numbered per-deadline, from zero.
    pub index: u64,
    /// Sectors skipped while proving that weren't already declared faulty.
    pub skipped: BitField,
}

#[derive(Debug, Clone, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct FaultDeclaration {
    /// The deadline to which the faulty sectors are assigned, in range [0..WPoStPeriodDeadlines)
    pub deadline: u64,
    /// Partition index within the deadline containing the faulty sectors.
    pub partition: u64,
    /// Sectors in the partition being declared faulty.
    pub sectors: BitField,
}

#[derive(Debug, Clone, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct RecoveryDeclaration {
    /// The deadline to which the recovered sectors are assigned, in range [0..WPoStPeriodDeadlines)
    pub deadline: u64,
    /// Partition index within the deadline containing the recovered sectors.
    pub partition: u64,
    /// Sectors in the partition being declared recovered.
    pub sectors: BitField,
}

#[derive(Debug, Clone, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct DeclareFaultsParams {
    pub faults: Vec<FaultDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct DeclareFaultsRecoveredParams {
    pub recoveries: Vec<RecoveryDeclaration>,
}

/// Information submitted by a miner to provide a Window PoSt.
#[derive(Debug, Clone, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct SubmitWindowedPoStParams {
    /// The deadline index which the submission targets.
    pub deadline: u64,
    /// The partitions being proven.
    pub partitions: Vec<PoStPartition>,
    /// Array of proofs, one per distinct registered proof type present in the sectors being proven.
    /// In the usual case of a single proof type, this array will always have a single element (independent of number of partitions).
    pub proofs: Vec<PoStProof>,
    /// The epoch at which these proofs is being committed to a particular chain.
    pub chain_commit_epoch: ChainEpoch,
    /// The ticket randomness on the chain at the `chain_commit_epoch` on the chain this post is committed to.
    pub chain_commit_rand: Randomness,
}

#[derive(Debug, Clone, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct ProveCommitSectorParams {
    pub sector_number: SectorNumber,
    #[serde(with = "strict_bytes")]
    pub proof: Vec<u8>,
}

impl FaultDeclaration {
    pub fn location(&self) -> SectorLocation {
        SectorLocation {
            deadline: self.deadline,
            partition: self.partition,
        }
    }
}

impl RecoveryDeclaration {
    pub fn location(&self) -> SectorLocation {
        SectorLocation {
            deadline: self.deadline,
            partition: self.partition,
        }
    }
}
