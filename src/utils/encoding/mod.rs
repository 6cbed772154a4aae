// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_hamt::BytesKey;
use integer_encoding::VarInt as _;

/// HAMT key of an integer, encoded as an unsigned varint.
pub fn u64_key(k: u64) -> BytesKey {
    BytesKey(k.encode_var_vec())
}

/// Inverse of [`u64_key`].
pub fn parse_u64_key(key: &[u8]) -> anyhow::Result<u64> {
    match u64::decode_var(key) {
        Some((k, n)) if n == key.len() => Ok(k),
        Some(_) => anyhow::bail!("trailing bytes after varint key"),
        None => anyhow::bail!("Error decoding varint"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn small_keys_are_single_bytes() {
        assert_eq!(u64_key(0).0, vec![0]);
        assert_eq!(u64_key(127).0, vec![127]);
        assert_eq!(u64_key(128).0, vec![0x80, 0x01]);
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(parse_u64_key(&[]).is_err());
        assert!(parse_u64_key(&[0x80]).is_err());
        assert!(parse_u64_key(&[0x01, 0x02]).is_err());
    }

    #[quickcheck]
    fn key_parses_back(k: u64) -> bool {
        parse_u64_key(&u64_key(k).0).ok() == Some(k)
    }
}
