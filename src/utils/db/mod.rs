// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::Context as _;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::{CborStore, DAG_CBOR};
use multihash_codetable::{Code, MultihashDigest as _};
use serde::{Serialize, de::DeserializeOwned};

/// Extension methods for inserting and retrieving IPLD data with CIDs
pub trait CborStoreExt: Blockstore + Sized {
    /// Default `DAG_CBOR` encoding, keyed by a `Blake2b256` CID.
    fn put_cbor_default<S: Serialize>(&self, obj: &S) -> anyhow::Result<Cid> {
        let bytes = fvm_ipld_encoding::to_vec(obj)?;
        let cid = Cid::new_v1(DAG_CBOR, Code::Blake2b256.digest(&bytes));
        self.put_keyed(&cid, &bytes)?;
        Ok(cid)
    }

    /// Get typed object from block store by `CID`. Missing entries are an error.
    fn get_cbor_required<T: DeserializeOwned>(&self, cid: &Cid) -> anyhow::Result<T> {
        self.get_cbor(cid)?
            .with_context(|| format!("Entry not found in block store: cid={cid}"))
    }
}

impl<T: Blockstore> CborStoreExt for T {}
