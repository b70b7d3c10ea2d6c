//! Capacity Caps, Reduction Seeds, and the Known-Services Table
//!
//! All numeric limits of the aggregation core live here. The capacity caps
//! are sized to max out the SRAM budget of the nRF52840-class targets this
//! pipeline was profiled on; changing any of them changes the memory
//! footprint of [`WindowAggregator`](crate::aggregator::WindowAggregator)
//! directly.
//!
//! The seed constants are part of the pipeline's observable behavior: every
//! min/max reduction folds from its seed, and downstream consumers (the
//! pretrained classifier in particular) were trained on rows produced with
//! exactly these seeds. Do not "fix" them.

// ===== PER-WINDOW CAPACITY CAPS =====

/// Maximum unique devices tracked per scan window.
///
/// Beacons from further devices still feed the histograms, but get no
/// observation log and no service tagging.
pub const MAX_DEVICES: usize = 150;

/// Maximum observations retained per device per window.
///
/// Once full, newer observations for that device are dropped; the oldest
/// data is favored (this is not a sliding window).
pub const MAX_OBSERVATIONS: usize = 140;

/// Maximum distinct TX power levels counted per window.
pub const MAX_TX_POWER_BUCKETS: usize = 30;

/// Maximum distinct manufacturer-data payload lengths counted per window.
pub const MAX_PACKET_LEN_BUCKETS: usize = 30;

/// Maximum distinct service UUIDs tracked per window.
pub const MAX_WINDOW_SERVICES: usize = 23;

// ===== REDUCTION SEEDS =====

/// Seed for every minimum-RSSI fold (per device and across devices).
///
/// A window whose observations are all above 0 dBm reports 0, which is
/// indistinguishable from "no observation below 0". Inherited behavior;
/// the classifier depends on it.
pub const RSSI_MIN_SEED: i32 = 0;

/// Seed for every maximum-RSSI fold (per device and across devices).
pub const RSSI_MAX_SEED: i32 = -100;

/// Seed for the TX power minimum fold. An empty window reports 200.
pub const TX_POWER_MIN_SEED: i32 = 200;

/// Seed for the TX power maximum fold.
pub const TX_POWER_MAX_SEED: i32 = 0;

// ===== CLASSIFICATION CADENCE =====

/// A completed sample is classified every this many windows, once the
/// feature buffer holds a full history.
pub const CLASSIFY_INTERVAL_WINDOWS: u32 = 5;

// ===== KNOWN SERVICES =====

/// The fixed list of service UUIDs reported in the feature-row tail.
///
/// One tail slot per entry, in exactly this order, independent of the order
/// services were discovered in any particular window. The pretrained
/// classifier's input layout depends on this ordering.
pub const KNOWN_SERVICES: [&str; 23] = [
    "0af0", "1802", "180f", "1812", "1826", "2222", "ec88", "fd5a",
    "fd6f", "fdd2", "fddf", "fe03", "fe07", "fe0f", "fe61", "fe9f",
    "fea0", "feb9", "febe", "fee0", "ff0d", "ffc0", "ffe0",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_services_width_matches_row_tail() {
        use crate::features::{offset, FEATURE_ROW_LEN};
        assert_eq!(offset::KNOWN_SERVICES + KNOWN_SERVICES.len(), FEATURE_ROW_LEN);
    }

    #[test]
    fn known_services_are_distinct() {
        for (i, a) in KNOWN_SERVICES.iter().enumerate() {
            for b in &KNOWN_SERVICES[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
