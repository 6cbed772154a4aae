// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod builtin;
mod version;

pub use builtin::miner;
pub use version::ActorVersion;
