// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Error, State, v0};
use crate::shim::{actors::ActorVersion, policy::Policy, state_tree::ActorState};
use ahash::{HashMap, HashMapExt as _};
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use tracing::{debug, warn};

/// Decodes the state root `cid` of one miner actor version.
pub type DecodeFn<BS> = fn(BS, &Cid, &Policy) -> Result<Box<dyn State>, Error>;

/// Maps miner actor code CIDs to the decoder for their state layout.
pub struct Registry<BS> {
    decoders: HashMap<Cid, DecodeFn<BS>>,
    policy: Policy,
}

fn decoder_for<BS>(version: ActorVersion) -> DecodeFn<BS>
where
    BS: Blockstore + Send + Sync + 'static,
{
    match version {
        ActorVersion::V0 => v0::decode::<BS>,
    }
}

impl<BS> Registry<BS>
where
    BS: Blockstore + Send + Sync + 'static,
{
    /// Registry of every [`ActorVersion`], interpreting deadlines with `policy`.
    ///
    /// Fails if `policy` does not pass [`Policy::validate`].
    pub fn new(policy: Policy) -> anyhow::Result<Self> {
        policy.validate()?;
        Ok(Self::with_builtin_decoders(policy))
    }

    fn with_builtin_decoders(policy: Policy) -> Self {
        let mut registry = Self {
            decoders: HashMap::new(),
            policy,
        };
        for version in <ActorVersion as strum::IntoEnumIterator>::iter() {
            registry.register(version.miner_code(), decoder_for(version));
        }
        registry
    }

    /// Adds or replaces the decoder for `code`, returning the one it replaced.
    pub fn register(&mut self, code: Cid, decode: DecodeFn<BS>) -> Option<DecodeFn<BS>> {
        self.decoders.insert(code, decode)
    }

    pub fn is_miner_actor(&self, code: &Cid) -> bool {
        self.decoders.contains_key(code)
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Decodes the miner state `actor` points at.
    ///
    /// Fails with [`Error::UnsupportedVersion`] when no decoder is registered
    /// for the actor's code. Store and decoding failures surface as
    /// [`Error::Store`].
    pub fn load(&self, store: BS, actor: &ActorState) -> Result<Box<dyn State>, Error> {
        let Some(decode) = self.decoders.get(&actor.code) else {
            warn!(code = %actor.code, "no miner state decoder for actor code");
            return Err(Error::UnsupportedVersion(actor.code));
        };
        debug!(code = %actor.code, state = %actor.state, "loading miner state");
        decode(store, &actor.state, &self.policy)
    }
}

impl<BS> Default for Registry<BS>
where
    BS: Blockstore + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::with_builtin_decoders(Policy::mainnet())
    }
}

/// Loads a miner actor's state with the default registry and mainnet policy.
pub fn load<BS>(store: BS, actor: &ActorState) -> Result<Box<dyn State>, Error>
where
    BS: Blockstore + Send + Sync + 'static,
{
    Registry::default().load(store, actor)
}
