// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod actors;
pub mod policy;
pub mod state_tree;

pub mod address {
    pub use super::fvm_shared_latest::address::Address;
}

pub mod bigint {
    pub use super::fvm_shared_latest::bigint::{BigInt, bigint_ser};
}

pub mod clock {
    pub use super::fvm_shared_latest::clock::ChainEpoch;
}

pub mod deal {
    pub use super::fvm_shared_latest::deal::DealID;
}

pub mod econ {
    pub use super::fvm_shared_latest::econ::TokenAmount;
}

pub mod randomness {
    pub use super::fvm_shared_latest::randomness::Randomness;
}

pub mod sector {
    pub use super::fvm_shared_latest::sector::{
        PoStProof, RegisteredPoStProof, RegisteredSealProof, SectorNumber, SectorSize,
        StoragePower,
    };
}

pub use fvm_shared_latest::HAMT_BIT_WIDTH;

mod fvm_shared_latest {
    pub use fvm_shared4::*;
}
