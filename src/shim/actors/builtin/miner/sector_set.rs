// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Error, Partition};
use fvm_ipld_bitfield::BitField;

pub trait BitFieldExt {
    /// Every bit set in `self` is also set in `other`.
    fn is_subset_of(&self, other: &BitField) -> bool;

    /// First bit set in both fields.
    fn first_shared(&self, other: &BitField) -> Option<u64>;
}

impl BitFieldExt for BitField {
    fn is_subset_of(&self, other: &BitField) -> bool {
        other.contains_all(self)
    }

    fn first_shared(&self, other: &BitField) -> Option<u64> {
        (self & other).iter().next()
    }
}

/// The sector sets of one partition, read once.
///
/// Only `all`, `faulty`, `recovering` and `live` come from the partition;
/// `active` and `terminated` are always derived from them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartitionSectors {
    pub all: BitField,
    pub faulty: BitField,
    pub recovering: BitField,
    pub live: BitField,
}

impl PartitionSectors {
    pub fn load(partition: &dyn Partition) -> Result<Self, Error> {
        Ok(Self {
            all: partition.all_sectors()?,
            faulty: partition.faulty_sectors()?,
            recovering: partition.recovering_sectors()?,
            live: partition.live_sectors()?,
        })
    }

    /// Live sectors that are not faulty.
    pub fn active(&self) -> BitField {
        &self.live - &self.faulty
    }

    pub fn terminated(&self) -> BitField {
        &self.all - &self.live
    }

    /// Checks the containment relations between the sets.
    pub fn check(&self) -> Result<(), Error> {
        let subset = |name: &str, sub: &BitField, sup_name: &str, sup: &BitField| {
            if sub.is_subset_of(sup) {
                Ok(())
            } else {
                let stray = (sub - sup).iter().next().unwrap_or_default();
                Err(Error::IllegalState(format!(
                    "{name} sector {stray} is not in {sup_name} sectors"
                )))
            }
        };
        subset("faulty", &self.faulty, "all", &self.all)?;
        subset("recovering", &self.recovering, "faulty", &self.faulty)?;
        subset("live", &self.live, "all", &self.all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;
    use std::collections::BTreeSet;

    fn bits(v: impl IntoIterator<Item = u64>) -> BitField {
        BitField::try_from_bits(v.into_iter().collect::<BTreeSet<_>>()).unwrap()
    }

    fn sectors(
        all: &[u64],
        faulty: &[u64],
        recovering: &[u64],
        live: &[u64],
    ) -> PartitionSectors {
        PartitionSectors {
            all: bits(all.iter().copied()),
            faulty: bits(faulty.iter().copied()),
            recovering: bits(recovering.iter().copied()),
            live: bits(live.iter().copied()),
        }
    }

    #[test]
    fn derived_sets() {
        let s = sectors(&[5, 6, 7, 9], &[6, 9], &[9], &[5, 6, 7]);
        s.check().unwrap();
        assert_eq!(s.active().iter().collect::<Vec<_>>(), vec![5, 7]);
        assert_eq!(s.terminated().iter().collect::<Vec<_>>(), vec![9]);
    }

    #[test]
    fn containment_violations_name_the_sector() {
        let err = sectors(&[1, 2], &[3], &[], &[1, 2]).check().unwrap_err();
        assert_eq!(
            err.to_string(),
            "illegal miner state: faulty sector 3 is not in all sectors"
        );

        let err = sectors(&[1, 2], &[1], &[2], &[1, 2]).check().unwrap_err();
        assert!(err.to_string().contains("recovering sector 2"), "{err}");

        let err = sectors(&[1], &[], &[], &[1, 4]).check().unwrap_err();
        assert!(err.to_string().contains("live sector 4"), "{err}");
    }

    #[test]
    fn first_shared_bit() {
        assert_eq!(bits([1, 4, 8]).first_shared(&bits([2, 8, 4])), Some(4));
        assert_eq!(bits([1]).first_shared(&bits([2])), None);
    }

    #[quickcheck]
    fn active_is_live_minus_faulty(
        all: BTreeSet<u16>,
        faulty: BTreeSet<u16>,
        dead: BTreeSet<u16>,
    ) -> bool {
        let all: BTreeSet<u64> = all.into_iter().map(u64::from).collect();
        let faulty: BTreeSet<u64> = faulty
            .into_iter()
            .map(u64::from)
            .filter(|n| all.contains(n))
            .collect();
        let live: BTreeSet<u64> = all
            .iter()
            .copied()
            .filter(|n| !dead.contains(&(*n as u16)))
            .collect();
        let s = PartitionSectors {
            all: bits(all.iter().copied()),
            faulty: bits(faulty.iter().copied()),
            recovering: BitField::new(),
            live: bits(live.iter().copied()),
        };
        let active: BTreeSet<u64> = s.active().iter().collect();
        let terminated: BTreeSet<u64> = s.terminated().iter().collect();
        s.check().is_ok()
            && active == live.difference(&faulty).copied().collect::<BTreeSet<_>>()
            && terminated == all.difference(&live).copied().collect::<BTreeSet<_>>()
            && s.active().is_subset_of(&s.all)
    }
}
