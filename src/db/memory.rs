// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use ahash::HashMap;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use parking_lot::RwLock;
use std::sync::Arc;

/// In-memory block store. Clones share the same underlying blocks.
#[derive(Debug, Default, Clone)]
pub struct MemoryDB {
    blockchain_db: Arc<RwLock<HashMap<Cid, Vec<u8>>>>,
}

impl MemoryDB {
    /// Number of blocks currently held.
    pub fn len(&self) -> usize {
        self.blockchain_db.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blockchain_db.read().is_empty()
    }

    /// Drops a block, simulating a store that lost part of a state tree.
    pub fn remove(&self, k: &Cid) -> Option<Vec<u8>> {
        self.blockchain_db.write().remove(k)
    }
}

impl Blockstore for MemoryDB {
    fn get(&self, k: &Cid) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.blockchain_db.read().get(k).cloned())
    }

    fn put_keyed(&self, k: &Cid, block: &[u8]) -> anyhow::Result<()> {
        self.blockchain_db.write().insert(*k, block.to_vec());
        Ok(())
    }

    fn has(&self, k: &Cid) -> anyhow::Result<bool> {
        Ok(self.blockchain_db.read().contains_key(k))
    }
}
