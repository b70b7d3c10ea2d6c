//! Device Registry and Window Diff
//!
//! The registry is the bounded set of devices seen during the current scan
//! window. Indices are assigned in first-seen order and stay stable for the
//! lifetime of the window; every other per-device accumulator (observation
//! logs, service presence) is addressed by registry index.
//!
//! The diff side compares two registries - the current window's and the
//! snapshot taken from the previous window - to derive the
//! appearance/disappearance counts that lead the feature row. Both counts
//! are computed by pairwise exact-match scans; with at most
//! [`MAX_DEVICES`] entries per side that stays comfortably cheap.

use heapless::Vec;

use crate::{
    constants::MAX_DEVICES,
    errors::{AggregateError, AggregateResult},
    events::DeviceId,
};

/// Bounded first-seen-ordered device table for one scan window.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    entries: Vec<DeviceId, MAX_DEVICES>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Index of `id`, if it was registered this window. Linear scan.
    pub fn index_of(&self, id: &DeviceId) -> Option<usize> {
        self.entries.iter().position(|entry| entry == id)
    }

    /// Register `id`, returning its index.
    ///
    /// An already-registered identifier returns its existing index; a new
    /// identifier is appended while capacity remains. Beyond capacity the
    /// identifier is rejected with [`AggregateError::RegistryFull`] and
    /// stays untracked for the rest of the window.
    pub fn insert(&mut self, id: &DeviceId) -> AggregateResult<usize> {
        if let Some(index) = self.index_of(id) {
            return Ok(index);
        }
        self.entries
            .push(*id)
            .map_err(|_| AggregateError::RegistryFull)?;
        Ok(self.entries.len() - 1)
    }

    /// Whether `id` was registered this window.
    pub fn contains(&self, id: &DeviceId) -> bool {
        self.index_of(id).is_some()
    }

    /// Identifier at `index`.
    pub fn get(&self, index: usize) -> Option<&DeviceId> {
        self.entries.get(index)
    }

    /// Number of registered devices.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no device was registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate identifiers in index order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceId> {
        self.entries.iter()
    }

    /// Forget all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Appearance/disappearance counts between two consecutive windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WindowDiff {
    /// Devices in the current window that the previous window never saw.
    pub new_devices: i32,
    /// Devices from the previous window that the current window lost.
    pub lost_devices: i32,
}

impl WindowDiff {
    /// Compare the current window's registry against the previous window's
    /// snapshot.
    pub fn between(current: &DeviceRegistry, previous: &DeviceRegistry) -> Self {
        let new_devices = current
            .iter()
            .filter(|id| !previous.contains(id))
            .count() as i32;
        let lost_devices = previous
            .iter()
            .filter(|id| !current.contains(id))
            .count() as i32;
        Self {
            new_devices,
            lost_devices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(s: &str) -> DeviceId {
        DeviceId::new(s).unwrap()
    }

    #[test]
    fn insert_assigns_stable_indices() {
        let mut registry = DeviceRegistry::new();
        assert_eq!(registry.insert(&id("A")), Ok(0));
        assert_eq!(registry.insert(&id("B")), Ok(1));
        // Re-inserting returns the existing index
        assert_eq!(registry.insert(&id("A")), Ok(0));
        assert_eq!(registry.index_of(&id("B")), Some(1));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn insert_beyond_capacity_is_rejected() {
        let mut registry = DeviceRegistry::new();
        let mut name = heapless::String::<16>::new();
        for i in 0..MAX_DEVICES {
            name.clear();
            core::fmt::Write::write_fmt(&mut name, format_args!("dev{}", i)).unwrap();
            assert!(registry.insert(&id(name.as_str())).is_ok());
        }
        assert_eq!(
            registry.insert(&id("one-too-many")),
            Err(AggregateError::RegistryFull)
        );
        // Existing entries are untouched
        assert_eq!(registry.len(), MAX_DEVICES);
        assert_eq!(registry.index_of(&id("dev0")), Some(0));
        assert_eq!(registry.index_of(&id("one-too-many")), None);
    }

    #[test]
    fn diff_counts_appearances_and_disappearances() {
        let mut previous = DeviceRegistry::new();
        for name in ["A", "B", "C"] {
            previous.insert(&id(name)).unwrap();
        }
        let mut current = DeviceRegistry::new();
        for name in ["B", "C", "D"] {
            current.insert(&id(name)).unwrap();
        }

        let diff = WindowDiff::between(&current, &previous);
        assert_eq!(diff.new_devices, 1);
        assert_eq!(diff.lost_devices, 1);
    }

    proptest! {
        #[test]
        fn indices_stay_stable(ids in proptest::collection::vec("[a-f0-9]{4,12}", 1..40)) {
            let mut registry = DeviceRegistry::new();
            let mut expected: std::vec::Vec<(DeviceId, usize)> = std::vec::Vec::new();
            for s in &ids {
                let id = DeviceId::new(s).unwrap();
                let index = registry.insert(&id).unwrap();
                match expected.iter().find(|(seen, _)| seen == &id) {
                    Some((_, first)) => prop_assert_eq!(index, *first),
                    None => expected.push((id, index)),
                }
            }
            for (id, index) in &expected {
                prop_assert_eq!(registry.index_of(id), Some(*index));
            }
        }
    }

    #[test]
    fn diff_against_empty_snapshot() {
        let mut current = DeviceRegistry::new();
        current.insert(&id("A")).unwrap();
        current.insert(&id("B")).unwrap();

        let diff = WindowDiff::between(&current, &DeviceRegistry::new());
        assert_eq!(diff.new_devices, 2);
        assert_eq!(diff.lost_devices, 0);

        let diff = WindowDiff::between(&DeviceRegistry::new(), &current);
        assert_eq!(diff.new_devices, 0);
        assert_eq!(diff.lost_devices, 2);
    }
}
