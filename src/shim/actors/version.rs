// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use cid::multihash::Multihash;
use fvm_ipld_encoding::IPLD_RAW;
use std::sync::LazyLock;

const IDENTITY_HASH: u64 = 0x00;

/// Builtin actor versions whose state layouts this crate can decode.
///
/// Early actor versions identify their code by an identity-hashed raw CID of
/// the string `fil/<n>/<actor>`, where `<n>` counts from one.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum ActorVersion {
    V0,
}

static V0_MINER_CODE: LazyLock<Cid> = LazyLock::new(|| builtin_actor_code(1, "storageminer"));

impl ActorVersion {
    /// Code CID of the storage miner actor at this version.
    pub fn miner_code(self) -> Cid {
        match self {
            ActorVersion::V0 => *V0_MINER_CODE,
        }
    }

    /// Version whose miner actor has the given code, if any.
    pub fn from_miner_code(code: &Cid) -> Option<Self> {
        <Self as strum::IntoEnumIterator>::iter().find(|v| v.miner_code() == *code)
    }
}

fn builtin_actor_code(generation: u64, actor: &str) -> Cid {
    let name = format!("fil/{generation}/{actor}");
    let digest = Multihash::wrap(IDENTITY_HASH, name.as_bytes())
        .expect("builtin actor names fit in an identity multihash");
    Cid::new_v1(IPLD_RAW, digest)
}
