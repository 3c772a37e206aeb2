//! Shared fixtures for the integration tests under `tests/`.

use keysplit_core::range::{IndexRef, KeyRange};
use keysplit_core::split::InputSplit;
use keysplit_locate::MemoryLocator;

/// Every one- and two-byte key.
pub fn probe_keys() -> Vec<Vec<u8>> {
    let mut keys: Vec<Vec<u8>> = (0..=255u8).map(|b| vec![b]).collect();
    for hi in 0..=255u8 {
        for lo in 0..=255u8 {
            keys.push(vec![hi, lo]);
        }
    }
    keys
}

/// How many of `ranges` contain each probe key.
pub fn coverage(ranges: &[KeyRange], probes: &[Vec<u8>]) -> Vec<usize> {
    probes
        .iter()
        .map(|key| ranges.iter().filter(|r| r.contains(key)).count())
        .collect()
}

/// All ranges of `index` across `splits`.
pub fn ranges_of(splits: &[InputSplit], index: &IndexRef) -> Vec<KeyRange> {
    splits
        .iter()
        .flat_map(|s| s.ranges.get(index).cloned().unwrap_or_default())
        .collect()
}

/// One tablet per `(end_row, server)`, in order; the last should have no end.
pub fn locator_with_tablets(index: &IndexRef, tablets: &[(Option<u8>, &str)]) -> MemoryLocator {
    let locator = MemoryLocator::new();
    add_tablets(&locator, index, tablets);
    locator
}

pub fn add_tablets(locator: &MemoryLocator, index: &IndexRef, tablets: &[(Option<u8>, &str)]) {
    let mut prev: Option<Vec<u8>> = None;
    for (end, server) in tablets {
        let end = end.map(|b| vec![b]);
        locator.add_tablet(index.clone(), prev.clone(), end.clone(), *server);
        prev = end;
    }
}
