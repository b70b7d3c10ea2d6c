//! Feature Row and Rolling Sample Buffer
//!
//! ## Overview
//!
//! At window close every accumulator is reduced into one [`FeatureRow`] of
//! 46 integers at fixed offsets, and the row is shifted into the rolling
//! [`FeatureBuffer`] of the 5 most recent windows (230 values,
//! most-recent-first). The buffer is the classifier's input and the shape
//! of the persisted training samples, so both the offsets and the exact
//! arithmetic below are frozen: truncating integer division everywhere,
//! min/max folds from the seeds in [`constants`](crate::constants), and the
//! known-service tail in the fixed [`KNOWN_SERVICES`] order.
//!
//! ## Row layout
//!
//! ```text
//! 0  device_count                 12 avg_received
//! 1  lost_devices                 13 min_received
//! 2  new_devices                  14 max_received
//! 3  different_services           15 avg_avg_rssi
//! 4  services_count               16 min_avg_rssi
//! 5  txpower_count                17 max_avg_rssi
//! 6  tx_power_avg                 18 min_rssi
//! 7  min_txpower                  19 max_rssi
//! 8  max_txpower                  20 avg_rssi_difference
//! 9  man_packet_len_count         21 avg_avg_difference_between_beacons
//! 10 manufacturer_data_lengths_sum 22 avg_difference_first_last
//! 11 manufacturer_data_len_avg    23..45 known-service device counts
//! ```
//!
//! ## Empty-window semantics
//!
//! A window with no registered devices produces zeros for every log-derived
//! feature - the cross-device seeds never leak into an empty row. Histogram
//! features keep their seed folds regardless, so an empty TX power table
//! still reports its degenerate minimum of 200.

use crate::{
    aggregator::WindowAggregator,
    constants::{
        KNOWN_SERVICES, MAX_OBSERVATIONS, RSSI_MAX_SEED, RSSI_MIN_SEED, TX_POWER_MAX_SEED,
        TX_POWER_MIN_SEED,
    },
};

/// Serialize a fixed-size `i32` array as a tuple.
///
/// serde only auto-derives `Serialize` for arrays up to length 32; the
/// feature row (46) and buffer (230) exceed that, so their array fields
/// route through this helper, which matches serde's native fixed-array
/// representation.
#[cfg(feature = "serde")]
fn serialize_i32_array<S, const N: usize>(
    array: &[i32; N],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeTuple;
    let mut tuple = serializer.serialize_tuple(N)?;
    for value in array {
        tuple.serialize_element(value)?;
    }
    tuple.end()
}

/// Number of features per scan window.
pub const FEATURE_ROW_LEN: usize = 46;

/// Number of windows held by the rolling buffer.
pub const FEATURE_ROWS: usize = 5;

/// Total values in the classifier input buffer.
pub const FEATURE_BUFFER_LEN: usize = FEATURE_ROW_LEN * FEATURE_ROWS;

/// Fixed offsets of every feature within a row.
pub mod offset {
    #![allow(missing_docs)]

    pub const DEVICE_COUNT: usize = 0;
    pub const LOST_DEVICES: usize = 1;
    pub const NEW_DEVICES: usize = 2;
    pub const DIFFERENT_SERVICES: usize = 3;
    pub const SERVICES_COUNT: usize = 4;
    pub const TXPOWER_COUNT: usize = 5;
    pub const TX_POWER_AVG: usize = 6;
    pub const MIN_TXPOWER: usize = 7;
    pub const MAX_TXPOWER: usize = 8;
    pub const MAN_PACKET_LEN_COUNT: usize = 9;
    pub const MANUFACTURER_DATA_LENGTHS_SUM: usize = 10;
    pub const MANUFACTURER_DATA_LEN_AVG: usize = 11;
    pub const AVG_RECEIVED: usize = 12;
    pub const MIN_RECEIVED: usize = 13;
    pub const MAX_RECEIVED: usize = 14;
    pub const AVG_AVG_RSSI: usize = 15;
    pub const MIN_AVG_RSSI: usize = 16;
    pub const MAX_AVG_RSSI: usize = 17;
    pub const MIN_RSSI: usize = 18;
    pub const MAX_RSSI: usize = 19;
    pub const AVG_RSSI_DIFFERENCE: usize = 20;
    pub const AVG_AVG_DIFFERENCE_BETWEEN_BEACONS: usize = 21;
    pub const AVG_DIFFERENCE_FIRST_LAST: usize = 22;
    /// Start of the known-service tail (one slot per
    /// [`KNOWN_SERVICES`](crate::constants::KNOWN_SERVICES) entry).
    pub const KNOWN_SERVICES: usize = 23;
}

/// One scan window reduced to its 46 features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FeatureRow {
    values: [i32; FEATURE_ROW_LEN],
}

impl FeatureRow {
    /// All-zero row.
    pub const fn zeroed() -> Self {
        Self {
            values: [0; FEATURE_ROW_LEN],
        }
    }

    /// Reduce a closed window's accumulators into a feature row.
    ///
    /// Must run before [`WindowAggregator::reset`] - the diff needs the
    /// current registry against the previous snapshot.
    pub fn from_window(aggregator: &WindowAggregator) -> Self {
        let mut row = Self::zeroed();
        let values = &mut row.values;

        let diff = aggregator.diff();
        values[offset::DEVICE_COUNT] = aggregator.device_count() as i32;
        values[offset::LOST_DEVICES] = diff.lost_devices;
        values[offset::NEW_DEVICES] = diff.new_devices;

        let services = aggregator.services();
        values[offset::DIFFERENT_SERVICES] = services.distinct() as i32;
        values[offset::SERVICES_COUNT] = services.tagged_total() as i32;

        let tx_power = aggregator.tx_power();
        values[offset::TXPOWER_COUNT] = tx_power.total();
        values[offset::TX_POWER_AVG] = tx_power.weighted_mean();
        values[offset::MIN_TXPOWER] = tx_power.min_value(TX_POWER_MIN_SEED);
        values[offset::MAX_TXPOWER] = tx_power.max_value(TX_POWER_MAX_SEED);

        let packet_lengths = aggregator.packet_lengths();
        values[offset::MAN_PACKET_LEN_COUNT] = packet_lengths.total();
        values[offset::MANUFACTURER_DATA_LENGTHS_SUM] = packet_lengths.distinct_sum();
        values[offset::MANUFACTURER_DATA_LEN_AVG] = packet_lengths.weighted_mean();

        let signal = SignalSummary::reduce(aggregator);
        values[offset::AVG_RECEIVED] = signal.avg_received;
        values[offset::MIN_RECEIVED] = signal.min_received;
        values[offset::MAX_RECEIVED] = signal.max_received;
        values[offset::AVG_AVG_RSSI] = signal.avg_avg_rssi;
        values[offset::MIN_AVG_RSSI] = signal.min_avg_rssi;
        values[offset::MAX_AVG_RSSI] = signal.max_avg_rssi;
        values[offset::MIN_RSSI] = signal.min_rssi;
        values[offset::MAX_RSSI] = signal.max_rssi;
        values[offset::AVG_RSSI_DIFFERENCE] = signal.avg_rssi_difference;
        values[offset::AVG_AVG_DIFFERENCE_BETWEEN_BEACONS] = signal.avg_gap;
        values[offset::AVG_DIFFERENCE_FIRST_LAST] = signal.avg_span;

        // Tail in the constant list's order, not this window's discovery order
        for (slot, known) in KNOWN_SERVICES.iter().enumerate() {
            values[offset::KNOWN_SERVICES + slot] = match services.position(known) {
                Some(position) => services.devices_at(position),
                None => 0,
            };
        }

        row
    }

    /// The raw feature values.
    pub fn as_slice(&self) -> &[i32; FEATURE_ROW_LEN] {
        &self.values
    }

    /// Value at a row offset (see [`offset`]).
    pub fn get(&self, index: usize) -> i32 {
        self.values[index]
    }
}

impl Default for FeatureRow {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Rolling buffer of the 5 most recent feature rows, most-recent-first.
///
/// The only state that survives across windows (together with the device
/// snapshot); it is never cleared, only shifted.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FeatureBuffer {
    values: [i32; FEATURE_BUFFER_LEN],
}

impl FeatureBuffer {
    /// All-zero buffer.
    pub const fn new() -> Self {
        Self {
            values: [0; FEATURE_BUFFER_LEN],
        }
    }

    /// Shift the four newest rows down one slot (evicting the oldest) and
    /// write `row` at the front.
    pub fn shift_insert(&mut self, row: &FeatureRow) {
        self.values
            .copy_within(0..FEATURE_ROW_LEN * (FEATURE_ROWS - 1), FEATURE_ROW_LEN);
        self.values[..FEATURE_ROW_LEN].copy_from_slice(row.as_slice());
    }

    /// The full 230-value classifier input.
    pub fn as_values(&self) -> &[i32; FEATURE_BUFFER_LEN] {
        &self.values
    }

    /// One row's slice; index 0 is the most recent window.
    pub fn row(&self, index: usize) -> &[i32] {
        let start = index * FEATURE_ROW_LEN;
        &self.values[start..start + FEATURE_ROW_LEN]
    }

    /// Iterate rows, most recent first.
    pub fn rows(&self) -> impl Iterator<Item = &[i32]> {
        self.values.chunks_exact(FEATURE_ROW_LEN)
    }
}

impl Default for FeatureBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Cross-device reduction of the observation logs.
///
/// Every field is 0 when no device was registered; with devices present the
/// min/max fields fold from their seeds and all means divide by the device
/// count with truncation.
#[derive(Debug, Default, Clone, Copy)]
struct SignalSummary {
    avg_received: i32,
    min_received: i32,
    max_received: i32,
    avg_avg_rssi: i32,
    min_avg_rssi: i32,
    max_avg_rssi: i32,
    min_rssi: i32,
    max_rssi: i32,
    avg_rssi_difference: i32,
    avg_gap: i32,
    avg_span: i32,
}

impl SignalSummary {
    fn reduce(aggregator: &WindowAggregator) -> Self {
        let device_count = aggregator.device_count();
        if device_count == 0 {
            return Self::default();
        }

        let mut received_sum: i32 = 0;
        let mut min_received: i32 = MAX_OBSERVATIONS as i32;
        let mut max_received: i32 = 0;
        let mut mean_rssi_sum: i32 = 0;
        let mut min_avg_rssi = RSSI_MIN_SEED;
        let mut max_avg_rssi = RSSI_MAX_SEED;
        let mut min_rssi = RSSI_MIN_SEED;
        let mut max_rssi = RSSI_MAX_SEED;
        let mut spread_sum: i32 = 0;
        let mut gap_sum: i64 = 0;
        let mut span_sum: i64 = 0;

        for index in 0..device_count {
            let stats = match aggregator.log(index).reduce() {
                Some(stats) => stats,
                None => continue,
            };

            received_sum += stats.received;
            if stats.received < min_received {
                min_received = stats.received;
            }
            if stats.received > max_received {
                max_received = stats.received;
            }

            spread_sum += stats.max_rssi - stats.min_rssi;
            mean_rssi_sum += stats.mean_rssi;
            if stats.mean_rssi < min_avg_rssi {
                min_avg_rssi = stats.mean_rssi;
            }
            if stats.mean_rssi > max_avg_rssi {
                max_avg_rssi = stats.mean_rssi;
            }
            if stats.min_rssi < min_rssi {
                min_rssi = stats.min_rssi;
            }
            if stats.max_rssi > max_rssi {
                max_rssi = stats.max_rssi;
            }

            gap_sum += stats.mean_gap as i64;
            span_sum += stats.span as i64;
        }

        let n = device_count as i32;
        Self {
            avg_received: received_sum / n,
            min_received,
            max_received,
            avg_avg_rssi: mean_rssi_sum / n,
            min_avg_rssi,
            max_avg_rssi,
            min_rssi,
            max_rssi,
            avg_rssi_difference: spread_sum / n,
            avg_gap: (gap_sum / n as i64) as i32,
            avg_span: (span_sum / n as i64) as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{BeaconEvent, DeviceId};

    fn ingest(aggregator: &mut WindowAggregator, addr: &str, rssi: i8, ticks: u32) {
        aggregator.ingest(&BeaconEvent::new(DeviceId::new(addr).unwrap(), rssi, ticks));
    }

    #[test]
    fn empty_window_row() {
        let aggregator = WindowAggregator::new();
        let row = FeatureRow::from_window(&aggregator);

        assert_eq!(row.get(offset::DEVICE_COUNT), 0);
        // Only the TX power minimum keeps its seed on an empty window
        assert_eq!(row.get(offset::MIN_TXPOWER), TX_POWER_MIN_SEED);
        for index in 0..FEATURE_ROW_LEN {
            if index != offset::MIN_TXPOWER {
                assert_eq!(row.get(index), 0, "offset {} not zero", index);
            }
        }
    }

    #[test]
    fn single_device_window_row() {
        let mut aggregator = WindowAggregator::new();
        ingest(&mut aggregator, "A", -50, 100);
        ingest(&mut aggregator, "A", -60, 110);
        ingest(&mut aggregator, "A", -40, 125);

        let row = FeatureRow::from_window(&aggregator);
        assert_eq!(row.get(offset::DEVICE_COUNT), 1);
        assert_eq!(row.get(offset::NEW_DEVICES), 1);
        assert_eq!(row.get(offset::LOST_DEVICES), 0);
        assert_eq!(row.get(offset::AVG_RECEIVED), 3);
        assert_eq!(row.get(offset::MIN_RECEIVED), 3);
        assert_eq!(row.get(offset::MAX_RECEIVED), 3);
        assert_eq!(row.get(offset::AVG_AVG_RSSI), -50);
        assert_eq!(row.get(offset::MIN_AVG_RSSI), -50);
        assert_eq!(row.get(offset::MAX_AVG_RSSI), -50);
        assert_eq!(row.get(offset::MIN_RSSI), -60);
        assert_eq!(row.get(offset::MAX_RSSI), -40);
        assert_eq!(row.get(offset::AVG_RSSI_DIFFERENCE), 20);
        assert_eq!(row.get(offset::AVG_AVG_DIFFERENCE_BETWEEN_BEACONS), 12);
        assert_eq!(row.get(offset::AVG_DIFFERENCE_FIRST_LAST), 25);
    }

    #[test]
    fn cross_device_means_divide_by_device_count() {
        let mut aggregator = WindowAggregator::new();
        // Device A: two observations, gap 10, mean -50
        ingest(&mut aggregator, "A", -40, 0);
        ingest(&mut aggregator, "A", -60, 10);
        // Device B: one observation, mean -70
        ingest(&mut aggregator, "B", -70, 5);

        let row = FeatureRow::from_window(&aggregator);
        assert_eq!(row.get(offset::DEVICE_COUNT), 2);
        assert_eq!(row.get(offset::AVG_RECEIVED), 1); // (2 + 1) / 2
        assert_eq!(row.get(offset::MIN_RECEIVED), 1);
        assert_eq!(row.get(offset::MAX_RECEIVED), 2);
        assert_eq!(row.get(offset::AVG_AVG_RSSI), -60); // (-50 + -70) / 2
        assert_eq!(row.get(offset::MIN_AVG_RSSI), -70);
        assert_eq!(row.get(offset::MAX_AVG_RSSI), -50);
        assert_eq!(row.get(offset::MIN_RSSI), -70);
        assert_eq!(row.get(offset::MAX_RSSI), -40);
        // Spreads 20 and 0 average to 10
        assert_eq!(row.get(offset::AVG_RSSI_DIFFERENCE), 10);
        // Gap 10 and span 10 from A only, divided by both devices
        assert_eq!(row.get(offset::AVG_AVG_DIFFERENCE_BETWEEN_BEACONS), 5);
        assert_eq!(row.get(offset::AVG_DIFFERENCE_FIRST_LAST), 5);
    }

    #[test]
    fn known_service_tail_uses_fixed_order() {
        use crate::events::AdvElement;
        let mut aggregator = WindowAggregator::new();

        // Tag 1812 before 180f so the window's discovery order differs from
        // the known-services order
        for (addr, uuid) in [("A", 0x1812u16), ("B", 0x180f), ("C", 0x180f)] {
            let mut event = BeaconEvent::new(DeviceId::new(addr).unwrap(), -50, 0);
            let mut raw: heapless::Vec<u8, 31> = heapless::Vec::new();
            for byte in uuid.to_le_bytes() {
                raw.push(byte).unwrap();
            }
            event.push_element(AdvElement::ServiceUuids16(raw)).unwrap();
            aggregator.ingest(&event);
        }
        assert_eq!(aggregator.services().position("1812"), Some(0));

        let row = FeatureRow::from_window(&aggregator);
        let tail_180f = KNOWN_SERVICES.iter().position(|s| *s == "180f").unwrap();
        let tail_1812 = KNOWN_SERVICES.iter().position(|s| *s == "1812").unwrap();
        assert_eq!(row.get(offset::KNOWN_SERVICES + tail_180f), 2);
        assert_eq!(row.get(offset::KNOWN_SERVICES + tail_1812), 1);
        // 0af0 was never advertised
        assert_eq!(row.get(offset::KNOWN_SERVICES), 0);
    }

    #[test]
    fn buffer_shift_evicts_oldest() {
        let mut buffer = FeatureBuffer::new();
        for window in 1..=6 {
            let mut row = FeatureRow::zeroed();
            row.values[offset::DEVICE_COUNT] = window;
            buffer.shift_insert(&row);
        }

        assert_eq!(buffer.row(0)[offset::DEVICE_COUNT], 6);
        assert_eq!(buffer.row(1)[offset::DEVICE_COUNT], 5);
        assert_eq!(buffer.row(4)[offset::DEVICE_COUNT], 2);
        assert_eq!(buffer.as_values()[184 + offset::DEVICE_COUNT], 2);
    }
}
