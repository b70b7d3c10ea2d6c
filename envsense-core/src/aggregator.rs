//! Per-Window Accumulator State
//!
//! ## Overview
//!
//! [`WindowAggregator`] owns every piece of state that lives for exactly one
//! scan window: the device registry, the per-device observation logs, the
//! two metadata histograms, and the service-presence matrix. The previous
//! window's device set is the one exception - it is kept as a snapshot so
//! the diff against the current window can be computed at close.
//!
//! Keeping all of this in one owned value (instead of process-wide statics)
//! means the borrow checker enforces the window lifecycle: event dispatch
//! takes `&mut self`, the read-side reductions take `&self`, and
//! [`reset`](WindowAggregator::reset) is the only way state crosses a
//! window boundary.
//!
//! ## Dispatch policy
//!
//! [`ingest`](WindowAggregator::ingest) is the single entry point for
//! discovery events. Per event:
//!
//! 1. The device is registered (or found); with the registry full the
//!    device stays index-less - its observation is not logged and its
//!    services are not tagged, but its metadata elements still feed the
//!    histograms.
//! 2. The (RSSI, timestamp) observation is appended to the device's log.
//! 3. Advertised elements are dispatched by type. A UUID16 list tags only
//!    its first uuid and then ends processing of the whole payload; an
//!    odd-length list is skipped as malformed and processing continues with
//!    the next element.
//!
//! Every capacity error is absorbed here - dropped data never fails a
//! window.

use crate::{
    constants::{MAX_DEVICES, MAX_PACKET_LEN_BUCKETS, MAX_TX_POWER_BUCKETS},
    events::{AdvElement, BeaconEvent, ServiceUuid},
    histogram::Histogram,
    observations::{Observation, ObservationLog},
    registry::{DeviceRegistry, WindowDiff},
    services::{first_uuid16, ServiceMatrix},
};

// Optional logging, compiled out without the `log` feature
#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

/// All accumulator state for one scan window, plus the previous window's
/// device snapshot.
pub struct WindowAggregator {
    registry: DeviceRegistry,
    previous: DeviceRegistry,
    logs: [ObservationLog; MAX_DEVICES],
    tx_power: Histogram<MAX_TX_POWER_BUCKETS>,
    packet_lengths: Histogram<MAX_PACKET_LEN_BUCKETS>,
    services: ServiceMatrix,
}

impl WindowAggregator {
    /// Create a fresh aggregator with an empty previous-window snapshot.
    pub const fn new() -> Self {
        const EMPTY_LOG: ObservationLog = ObservationLog::new();
        Self {
            registry: DeviceRegistry::new(),
            previous: DeviceRegistry::new(),
            logs: [EMPTY_LOG; MAX_DEVICES],
            tx_power: Histogram::new(),
            packet_lengths: Histogram::new(),
            services: ServiceMatrix::new(),
        }
    }

    /// Accumulate one discovery event. Never fails; capacity overflows and
    /// malformed elements are absorbed per the drop policy.
    pub fn ingest(&mut self, event: &BeaconEvent) {
        let index = match self.registry.insert(&event.device) {
            Ok(index) => Some(index),
            Err(_) => {
                log_debug!("registry full, {:?} untracked this window", event.device);
                None
            }
        };

        if let Some(index) = index {
            let observation = Observation {
                rssi: event.rssi,
                ticks: event.timestamp,
            };
            if self.logs[index].record(observation).is_err() {
                log_debug!("observation log full for device {}", index);
            }
        }

        for element in event.elements.iter() {
            match element {
                AdvElement::TxPower(level) => {
                    if self.tx_power.observe(*level as i32).is_err() {
                        log_debug!("tx power histogram full, dropped {}", level);
                    }
                }
                AdvElement::ManufacturerData(data) => {
                    if self.packet_lengths.observe(data.len() as i32).is_err() {
                        log_debug!("packet length histogram full, dropped {}", data.len());
                    }
                }
                AdvElement::ServiceUuids16(list) => {
                    match first_uuid16(list) {
                        Err(_) => {
                            // Malformed list: skip this element only
                            log_warn!("malformed uuid list ({} bytes)", list.len());
                            continue;
                        }
                        Ok(None) => continue,
                        Ok(Some(value)) => {
                            if let Some(index) = index {
                                let uuid = ServiceUuid::from_u16(value);
                                if self.services.tag(index, uuid).is_err() {
                                    log_debug!("service table full, dropped {:?}", uuid);
                                }
                                // A handled uuid ends processing of this payload
                                return;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Appearance/disappearance counts of the current window against the
    /// previous window's snapshot.
    pub fn diff(&self) -> WindowDiff {
        WindowDiff::between(&self.registry, &self.previous)
    }

    /// Close the window's state: snapshot the registry for the next diff,
    /// then clear every accumulator. Call only after the read side is done.
    pub fn reset(&mut self) {
        core::mem::swap(&mut self.previous, &mut self.registry);
        self.registry.clear();
        for log in self.logs.iter_mut() {
            log.clear();
        }
        self.tx_power.clear();
        self.packet_lengths.clear();
        self.services.clear();
    }

    /// Devices registered this window.
    pub fn device_count(&self) -> usize {
        self.registry.len()
    }

    /// The current window's registry.
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// The previous window's device snapshot.
    pub fn previous(&self) -> &DeviceRegistry {
        &self.previous
    }

    /// Observation log of the device at a registry index.
    pub fn log(&self, index: usize) -> &ObservationLog {
        &self.logs[index]
    }

    /// TX power histogram.
    pub fn tx_power(&self) -> &Histogram<MAX_TX_POWER_BUCKETS> {
        &self.tx_power
    }

    /// Manufacturer-data length histogram.
    pub fn packet_lengths(&self) -> &Histogram<MAX_PACKET_LEN_BUCKETS> {
        &self.packet_lengths
    }

    /// Service-presence matrix.
    pub fn services(&self) -> &ServiceMatrix {
        &self.services
    }
}

impl Default for WindowAggregator {
    fn default() -> Self {
        Self::new()
    }
}
