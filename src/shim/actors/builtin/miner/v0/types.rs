// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::shim::{
    actors::builtin::miner,
    address::Address,
    bigint::{BigInt, bigint_ser},
    clock::ChainEpoch,
    deal::DealID,
    econ::TokenAmount,
    sector::{RegisteredSealProof, SectorNumber, SectorSize, StoragePower},
};
use cid::Cid;
use fvm_ipld_bitfield::BitField;
use fvm_ipld_encoding::{RawBytes, strict_bytes, tuple::*};
use libp2p::PeerId;

/// Balance of miner actor should be greater than or equal to
/// the sum of `PreCommitDeposits` and `LockedFunds`.
/// It is possible for balance to fall below the sum of PCD, LF and
/// `InitialPledgeRequirements`, and this is a bad state (IP Debt)
/// that limits a miner actor's behavior (i.e. no balance withdrawals)
/// Excess balance as computed by `st.GetAvailableBalance` will be
/// withdrawable or usable for pre-commit deposit or pledge lock-up.
#[derive(Debug, Clone, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct State {
    /// Contains static info about this miner
    pub info: Cid,

    /// Total funds locked as `PreCommitDeposits`
    pub pre_commit_deposits: TokenAmount,

    /// Total rewards and added funds locked in vesting table
    pub locked_funds: TokenAmount,

    /// `VestingFunds` (Vesting Funds schedule for the miner).
    pub vesting_funds: Cid,

    /// Sum of initial pledge requirements of all active sectors
    pub initial_pledge_requirement: TokenAmount,

    /// Sectors that have been pre-committed but not yet proven.
    /// Map, HAMT<SectorNumber, SectorPreCommitOnChainInfo>
    pub pre_committed_sectors: Cid,

    /// `PreCommittedSectorsExpiry` maintains the state required to expire
    /// `PreCommittedSectors`.
    pub pre_committed_sectors_expiry: Cid, // BitFieldQueue (AMT[Epoch]*BitField)

    /// Allocated sector IDs. Sector IDs can never be reused once allocated.
    pub allocated_sectors: Cid, // BitField

    /// Information for all proven and not-yet-garbage-collected sectors.
    ///
    /// Sectors are removed from this AMT when the partition to which the
    /// sector belongs is compacted.
    pub sectors: Cid, // Array, AMT[SectorNumber]SectorOnChainInfo (sparse)

    /// The first epoch in this miner's current proving period. This is the first epoch in which a `PoSt` for a
    /// partition at the miner's first deadline may arrive. Alternatively, it is after the last epoch at which
    /// a `PoSt` for the previous window is valid.
    /// Always greater than zero, this may be greater than the current epoch for genesis miners in the first
    /// `WPoStProvingPeriod` epochs of the chain; the epochs before the first proving period starts are exempt from Window
    /// `PoSt` requirements.
    /// Updated at the end of every period by a cron callback.
    pub proving_period_start: ChainEpoch,

    /// Index of the deadline within the proving period beginning at `ProvingPeriodStart` that has not yet been
    /// finalized.
    /// Updated at the end of each deadline window by a cron callback.
    pub current_deadline: u64,

    /// The sector numbers due for `PoSt` at each deadline in the current proving period, frozen at period start.
    /// New sectors are added and expired ones removed at proving period boundary.
    /// Faults are not subtracted from this in state; the intersection must be computed.
    pub deadlines: Cid,

    /// Deadlines with outstanding fees for early sector termination.
    pub early_terminations: BitField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct MinerInfo {
    /// Account that owns this miner.
    /// - Income and returned collateral are paid to this address.
    /// - This address is also allowed to change the worker address for the miner.
    pub owner: Address, // Must be an ID-address.

    /// Worker account for this miner.
    /// The associated pubkey-type address is used to sign blocks and messages on behalf of this miner.
    pub worker: Address, // Must be an ID-address.

    /// Additional addresses that are permitted to submit messages controlling this actor (optional).
    pub control_addresses: Vec<Address>, // Must all be ID addresses.

    pub pending_worker_key: Option<WorkerKeyChange>,

    /// Byte array representing a `Libp2p` identity that should be used when connecting to this miner.
    #[serde(with = "strict_bytes")]
    pub peer_id: Vec<u8>,

    /// Slice of byte arrays representing `Libp2p` multi-addresses used for establishing a connection with this miner.
    pub multi_address: Vec<RawBytes>,

    /// The proof type used by this miner for sealing sectors.
    pub seal_proof_type: RegisteredSealProof,

    /// Amount of space in each sector committed to the network by this miner.
    pub sector_size: SectorSize,

    /// The number of sectors in each Window `PoSt` partition (proof).
    pub window_post_partition_sectors: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct WorkerKeyChange {
    /// Must be an ID address
    pub new_worker: Address,
    pub effective_at: ChainEpoch,
}

/// Information provided by a miner when pre-committing a sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
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

/// Information stored on-chain for a pre-committed sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct SectorPreCommitOnChainInfo {
    pub info: SectorPreCommitInfo,
    pub pre_commit_deposit: TokenAmount,
    pub pre_commit_epoch: ChainEpoch,
    /// Integral of active deals over sector lifetime, 0 if `CommittedCapacity` sector
    #[serde(with = "bigint_ser")]
    pub deal_weight: BigInt,
    /// Integral of active verified deals over sector lifetime
    #[serde(with = "bigint_ser")]
    pub verified_deal_weight: BigInt,
}

/// Information stored on-chain for a proven sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct SectorOnChainInfo {
    pub sector_number: SectorNumber,
    /// The seal proof type implies the `PoSt` proofs
    pub seal_proof: RegisteredSealProof,
    /// `CommR`
    pub sealed_cid: Cid,
    pub deal_ids: Vec<DealID>,
    /// Epoch during which the sector proof was accepted
    pub activation: ChainEpoch,
    /// Epoch during which the sector expires
    pub expiration: ChainEpoch,
    /// Integral of active deals over sector lifetime
    #[serde(with = "bigint_ser")]
    pub deal_weight: BigInt,
    /// Integral of active verified deals over sector lifetime
    #[serde(with = "bigint_ser")]
    pub verified_deal_weight: BigInt,
    /// Pledge collected to commit this sector
    pub initial_pledge: TokenAmount,
    /// Expected one day projection of reward for sector computed at activation time
    pub expected_day_reward: TokenAmount,
    /// Expected twenty day projection of reward for sector computed at activation time
    pub expected_storage_pledge: TokenAmount,
}

/// Represents miner funds that will vest at the given epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct VestingFund {
    pub epoch: ChainEpoch,
    pub amount: TokenAmount,
}

/// Represents the vesting table state for the miner.
/// It is a slice of (`VestingEpoch`, `VestingAmount`).
/// The slice will always be sorted by the `VestingEpoch`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct VestingFunds {
    pub funds: Vec<VestingFund>,
}

/// Deadlines contains `Deadline` objects, describing the sectors due at the given
/// deadline and their state (faulty, terminated, recovering, etc.).
#[derive(Debug, Clone, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct Deadlines {
    /// Note: we could inline part of the deadline struct (e.g., active/assigned sectors)
    /// to make new sector assignment cheaper. At the moment, assigning a sector requires
    /// loading all deadlines to figure out where best to assign new sectors.
    pub due: Vec<Cid>, // []Deadline
}

/// Deadline holds the state for all sectors due at a specific deadline.
#[derive(Debug, Clone, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct Deadline {
    /// Partitions in this deadline, in order.
    /// The keys of this AMT are always sequential integers beginning with zero.
    pub partitions: Cid, // AMT[PartitionNumber]Partition

    /// Maps epochs to partitions that _may_ have sectors that expire in or
    /// before that epoch, either on-time or early as faults.
    /// Keys are quantized to final epochs in each proving deadline.
    ///
    /// NOTE: Partitions MUST NOT be removed from this queue (until the
    /// associated epoch has passed) even if they no longer have sectors
    /// expiring at that epoch. Sectors expiring at this epoch may later be
    /// recovered, and this queue will not be updated at that time.
    pub expirations_epochs: Cid, // AMT[ChainEpoch]BitField

    /// Partitions numbers with `PoSt` submissions since the proving period started.
    pub post_submissions: BitField,

    /// Partitions with sectors that terminated early.
    pub early_terminations: BitField,

    /// The number of non-terminated sectors in this deadline (incl faulty).
    pub live_sectors: u64,

    /// The total number of sectors in this deadline (incl dead).
    pub total_sectors: u64,

    /// Memoized sum of faulty power in partitions.
    pub faulty_power: PowerPair,
}

#[derive(Debug, Clone, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct Partition {
    /// Sector numbers in this partition, including faulty and terminated sectors.
    pub sectors: BitField,
    /// Subset of sectors detected/declared faulty and not yet recovered (excl. from `PoSt`).
    /// Faults ∩ Terminated = ∅
    pub faults: BitField,
    /// Subset of faulty sectors expected to recover on next `PoSt`
    /// Recoveries ∩ Terminated = ∅
    pub recoveries: BitField,
    /// Subset of sectors terminated but not yet removed from partition (excl. from `PoSt`)
    pub terminated: BitField,
    /// Maps epochs sectors that expire in or before that epoch.
    /// An expiration may be an "on-time" scheduled expiration, or early "faulty" expiration.
    /// Keys are quantized to last-in-deadline epochs.
    pub expirations_epochs: Cid, // AMT[ChainEpoch]ExpirationSet
    /// Subset of terminated that were before their committed expiration epoch, by termination epoch.
    /// Termination fees have not yet been calculated or paid and associated deals have not yet been
    /// canceled but effective power has already been adjusted.
    /// Not quantized.
    pub early_terminated: Cid, // AMT[ChainEpoch]BitField

    /// Power of not-yet-terminated sectors (incl faulty).
    pub live_power: PowerPair,
    /// Power of currently-faulty sectors. `FaultyPower` <= `LivePower`.
    pub faulty_power: PowerPair,
    /// Power of expected-to-recover sectors. `RecoveringPower` <= `FaultyPower`.
    pub recovering_power: PowerPair,
}

/// `ExpirationSet` is a collection of sector numbers that are expiring, either due to
/// expected "on-time" expiration at the end of their life, or unexpected "early" termination
/// due to being faulty for too long consecutively.
/// Note that there is not a direct correspondence between on-time sectors and active power;
/// a sector may be faulty but expiring on-time if it faults just prior to expected termination.
/// Early sectors are always faulty, and active power always represents on-time sectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct ExpirationSet {
    /// Sectors expiring "on time" at the end of their committed life
    pub on_time_sectors: BitField,
    /// Sectors expiring "early" due to being faulty for too long
    pub early_sectors: BitField,
    /// Pledge total for the on-time sectors
    pub on_time_pledge: TokenAmount,
    /// Power that is currently active (not faulty)
    pub active_power: PowerPair,
    /// Power that is currently faulty
    pub faulty_power: PowerPair,
}

/// Raw and quality-adjusted power, as stored alongside sector sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct PowerPair {
    #[serde(with = "bigint_ser")]
    pub raw: StoragePower,
    #[serde(with = "bigint_ser")]
    pub qa: StoragePower,
}

impl From<MinerInfo> for miner::MinerInfo {
    fn from(info: MinerInfo) -> Self {
        let (new_worker, worker_change_epoch) = match info.pending_worker_key {
            Some(change) => (Some(change.new_worker), change.effective_at),
            None => (None, -1),
        };
        Self {
            owner: info.owner,
            worker: info.worker,
            new_worker,
            control_addresses: info.control_addresses,
            worker_change_epoch,
            peer_id: PeerId::from_bytes(&info.peer_id).ok(),
            multiaddrs: info
                .multi_address
                .iter()
                .map(|addr| addr.bytes().to_vec())
                .collect(),
            seal_proof_type: info.seal_proof_type,
            sector_size: info.sector_size,
            window_post_partition_sectors: info.window_post_partition_sectors,
        }
    }
}

impl From<SectorOnChainInfo> for miner::SectorOnChainInfo {
    fn from(info: SectorOnChainInfo) -> Self {
        Self {
            sector_number: info.sector_number,
            seal_proof: info.seal_proof,
            sealed_cid: info.sealed_cid,
            deal_ids: info.deal_ids,
            activation: info.activation,
            expiration: info.expiration,
            deal_weight: info.deal_weight,
            verified_deal_weight: info.verified_deal_weight,
            initial_pledge: info.initial_pledge,
            expected_day_reward: info.expected_day_reward,
            expected_storage_pledge: info.expected_storage_pledge,
        }
    }
}

impl From<SectorPreCommitInfo> for miner::SectorPreCommitInfo {
    fn from(info: SectorPreCommitInfo) -> Self {
        Self {
            seal_proof: info.seal_proof,
            sector_number: info.sector_number,
            sealed_cid: info.sealed_cid,
            seal_rand_epoch: info.seal_rand_epoch,
            deal_ids: info.deal_ids,
            expiration: info.expiration,
            replace_capacity: info.replace_capacity,
            replace_sector_deadline: info.replace_sector_deadline,
            replace_sector_partition: info.replace_sector_partition,
            replace_sector_number: info.replace_sector_number,
        }
    }
}

impl From<SectorPreCommitOnChainInfo> for miner::SectorPreCommitOnChainInfo {
    fn from(info: SectorPreCommitOnChainInfo) -> Self {
        Self {
            info: info.info.into(),
            pre_commit_deposit: info.pre_commit_deposit,
            pre_commit_epoch: info.pre_commit_epoch,
            deal_weight: info.deal_weight,
            verified_deal_weight: info.verified_deal_weight,
        }
    }
}
