//! Service-Presence Matrix
//!
//! Tracks which device advertised which service during the current window.
//! Storage is split in two:
//!
//! - a bounded table of distinct service UUIDs in first-seen order
//!   (positions are stable for the window), and
//! - one bit mask per device index, bit `t` meaning "this device advertised
//!   the service at table position `t`".
//!
//! With [`MAX_WINDOW_SERVICES`] at 23 a single `u32` mask per device covers
//! the whole table. The running `tagged_total` counts distinct
//! (device, service) pairs - re-advertisements of a pair do not count twice.
//!
//! The feature-row tail is *not* emitted in table order: the builder walks
//! the fixed [`KNOWN_SERVICES`](crate::constants::KNOWN_SERVICES) list and
//! looks each entry up in this window's table, so discovery order never
//! leaks into the row layout.

use heapless::Vec;

use crate::{
    constants::{MAX_DEVICES, MAX_WINDOW_SERVICES},
    errors::{AggregateError, AggregateResult},
    events::ServiceUuid,
};

/// Per-device service presence bits, positionally indexed by the window's
/// distinct-service table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServiceFlags(u32);

impl ServiceFlags {
    /// No services tagged.
    pub const EMPTY: Self = Self(0);

    /// Set the bit for a table position.
    pub fn set(&mut self, position: usize) {
        self.0 |= 1 << position;
    }

    /// Whether the bit for a table position is set.
    pub const fn contains(&self, position: usize) -> bool {
        (self.0 >> position) & 1 == 1
    }
}

/// First 16-bit UUID of a raw little-endian UUID list.
///
/// `Ok(None)` for an empty list; [`AggregateError::MalformedUuidList`] when
/// the byte length is not a multiple of two (the caller abandons the
/// element, per the malformed-payload policy).
pub fn first_uuid16(list: &[u8]) -> AggregateResult<Option<u16>> {
    if list.len() % 2 != 0 {
        return Err(AggregateError::MalformedUuidList { len: list.len() });
    }
    Ok(list
        .first()
        .map(|_| u16::from_le_bytes([list[0], list[1]])))
}

/// Distinct-service table plus device×service presence matrix for one
/// window.
#[derive(Debug, Clone)]
pub struct ServiceMatrix {
    table: Vec<ServiceUuid, MAX_WINDOW_SERVICES>,
    presence: [ServiceFlags; MAX_DEVICES],
    tagged_total: u32,
}

impl ServiceMatrix {
    /// Create an empty matrix.
    pub const fn new() -> Self {
        Self {
            table: Vec::new(),
            presence: [ServiceFlags::EMPTY; MAX_DEVICES],
            tagged_total: 0,
        }
    }

    /// Record that the device at `device_index` advertised `uuid`.
    ///
    /// A known uuid sets the device's presence bit (once; repeats are
    /// no-ops). An unknown uuid claims the next table position while
    /// capacity remains, else the tag is rejected with
    /// [`AggregateError::ServiceTableFull`] and lost.
    ///
    /// `device_index` must come from this window's registry.
    pub fn tag(&mut self, device_index: usize, uuid: ServiceUuid) -> AggregateResult<()> {
        debug_assert!(device_index < MAX_DEVICES);
        if let Some(position) = self.position(uuid.as_str()) {
            if !self.presence[device_index].contains(position) {
                self.presence[device_index].set(position);
                self.tagged_total += 1;
            }
            return Ok(());
        }

        let position = self.table.len();
        self.table
            .push(uuid)
            .map_err(|_| AggregateError::ServiceTableFull)?;
        self.presence[device_index].set(position);
        self.tagged_total += 1;
        Ok(())
    }

    /// Table position of a printed uuid, if seen this window.
    pub fn position(&self, uuid: &str) -> Option<usize> {
        self.table.iter().position(|entry| entry.as_str() == uuid)
    }

    /// Number of distinct services seen this window.
    pub fn distinct(&self) -> usize {
        self.table.len()
    }

    /// Total distinct (device, service) pairs tagged this window.
    pub fn tagged_total(&self) -> u32 {
        self.tagged_total
    }

    /// How many devices advertised the service at `position`.
    pub fn devices_at(&self, position: usize) -> i32 {
        self.presence
            .iter()
            .filter(|flags| flags.contains(position))
            .count() as i32
    }

    /// Uuid at a table position.
    pub fn uuid_at(&self, position: usize) -> Option<&ServiceUuid> {
        self.table.get(position)
    }

    /// Forget the table, all presence bits, and the running total.
    pub fn clear(&mut self) {
        self.table.clear();
        self.presence = [ServiceFlags::EMPTY; MAX_DEVICES];
        self.tagged_total = 0;
    }
}

impl Default for ServiceMatrix {
    fn default() -> Self {
        Self::new()
    }
}
