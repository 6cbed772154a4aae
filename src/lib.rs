// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Version-independent access to storage miner actor state.
//!
//! The miner actor's on-chain layout changes between actor versions. This
//! crate decodes a miner's state root with the decoder registered for the
//! actor's code CID and exposes it through the [`miner::State`],
//! [`miner::Deadline`] and [`miner::Partition`] traits, so callers never
//! match on the version themselves.
//!
//! ```ignore
//! let state = forest_actor_interface::miner::load(store, &actor)?;
//! let location = state.find_sector(sector_number)?;
//! let partition = state
//!     .load_deadline(location.deadline)?
//!     .load_partition(location.partition)?;
//! assert!(partition.all_sectors()?.get(sector_number));
//! ```

pub mod db;
pub mod shim;
pub mod utils;

pub use shim::actors::{ActorVersion, miner};
pub use shim::policy::Policy;
pub use shim::state_tree::ActorState;
