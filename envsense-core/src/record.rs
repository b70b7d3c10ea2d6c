//! Storage Record Formatting
//!
//! The storage collaborator consumes plain text; this module produces it.
//! Two record shapes exist:
//!
//! - the labeled **sample record**, a CSV-like block with one header line
//!   (label column, the 23 scalar feature names, the 23 known-service
//!   uuids, three timing columns) and one data line per row of the
//!   5-window sample buffer, and
//! - the short **eval record**, `"<predicted> <percent>%, "`, appended to a
//!   per-label evaluation file by the sink.
//!
//! Everything is formatted into bounded `heapless` strings; a record that
//! would not fit reports `fmt::Error` instead of truncating silently.

use core::fmt::{self, Write};

use heapless::String;

use crate::{
    constants::KNOWN_SERVICES,
    features::FeatureBuffer,
    pipeline::WindowTiming,
    traits::Classification,
};

/// Capacity of a formatted sample record.
pub const SAMPLE_RECORD_CAPACITY: usize = 4096;

/// Capacity of a formatted eval record.
pub const EVAL_RECORD_CAPACITY: usize = 48;

/// Header names of the 23 scalar features, in row-offset order.
pub const FEATURE_NAMES: [&str; 23] = [
    "device_count",
    "lost_devices",
    "new_devices",
    "different_services",
    "services_count",
    "txpower_count",
    "tx_power_avg",
    "min_txpower",
    "max_txpower",
    "man_packet_len_count",
    "manufacturer_data_lengths_sum",
    "manufacturer_data_len_avg",
    "avg_received",
    "min_received",
    "max_received",
    "avg_avg_rssi",
    "min_avg_rssi",
    "max_avg_rssi",
    "min_rssi",
    "max_rssi",
    "avg_rssi_difference",
    "avg_avg_difference_between_beacons",
    "avg_difference_first_last",
];

/// Format one labeled sample record from the full 5-window buffer.
pub fn sample_record(
    label: &str,
    buffer: &FeatureBuffer,
    timing: &WindowTiming,
) -> Result<String<SAMPLE_RECORD_CAPACITY>, fmt::Error> {
    let mut out: String<SAMPLE_RECORD_CAPACITY> = String::new();

    write!(out, "label")?;
    for name in FEATURE_NAMES {
        write!(out, ", {}", name)?;
    }
    for uuid in KNOWN_SERVICES {
        write!(out, ", {}", uuid)?;
    }
    for point in 1..=3 {
        write!(out, ", time_point_{}", point)?;
    }
    writeln!(out)?;

    for row in buffer.rows() {
        write!(out, "{}", label)?;
        for value in row {
            write!(out, ", {}", value)?;
        }
        writeln!(out, ", {}, {}, {}", timing.scan, timing.aggregate, timing.classify)?;
    }

    Ok(out)
}

/// Format one classification-result record.
pub fn eval_record(
    predicted: &str,
    classification: &Classification,
) -> Result<String<EVAL_RECORD_CAPACITY>, fmt::Error> {
    let percent = libm::roundf(classification.confidence * 100.0) as i32;
    let mut out: String<EVAL_RECORD_CAPACITY> = String::new();
    write!(out, "{} {}%, ", predicted, percent)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureRow, FEATURE_ROWS};

    #[test]
    fn sample_record_shape() {
        let mut buffer = FeatureBuffer::new();
        buffer.shift_insert(&FeatureRow::zeroed());
        let timing = WindowTiming {
            scan: 100,
            aggregate: 150,
            classify: 200,
        };

        let record = sample_record("street", &buffer, &timing).unwrap();
        let mut lines = record.as_str().lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("label, device_count, lost_devices"));
        assert!(header.ends_with("time_point_1, time_point_2, time_point_3"));
        // label + 23 features + 23 services + 3 timing columns
        assert_eq!(header.split(", ").count(), 50);

        let data_lines: heapless::Vec<&str, 8> = lines.collect();
        assert_eq!(data_lines.len(), FEATURE_ROWS);
        for line in data_lines {
            assert!(line.starts_with("street, "));
            assert!(line.ends_with(", 100, 150, 200"));
            assert_eq!(line.split(", ").count(), 50);
        }
    }

    #[test]
    fn eval_record_rounds_confidence() {
        let classification = Classification {
            class_index: 3,
            confidence: 0.837,
        };
        let record = eval_record("street", &classification).unwrap();
        assert_eq!(record.as_str(), "street 84%, ");

        let low = Classification {
            class_index: 0,
            confidence: 0.004,
        };
        assert_eq!(eval_record("gym", &low).unwrap().as_str(), "gym 0%, ");
    }
}
