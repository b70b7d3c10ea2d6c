//! Scan-window aggregation core for BLE environment sensing
//!
//! Turns a stream of beacon discovery events into fixed-shape feature
//! vectors: bounded per-window accumulators reduce each scan window to 46
//! integers, a rolling buffer keeps the 5 most recent windows, and the
//! assembled 230-value sample feeds a pretrained classifier.
//!
//! Designed for edge devices with hard memory limits:
//! - Every container is capacity-capped and allocation-free
//! - Overflowing data is dropped by policy, never an error that fails a window
//! - Reductions are exact integer arithmetic, frozen for classifier
//!   compatibility
//!
//! ```no_run
//! use envsense_core::{WindowPipeline, BeaconEvent, DeviceId};
//! use envsense_core::time::FixedTicks;
//! # use envsense_core::{Classification, Classifier};
//! # struct Nn;
//! # impl Classifier for Nn {
//! #     fn classify(&mut self, _s: &[i32; 230]) -> Classification {
//! #         Classification { class_index: 0, confidence: 1.0 }
//! #     }
//! # }
//!
//! let mut pipeline = WindowPipeline::new();
//! let ticks = FixedTicks::new(0);
//! # let mut classifier = Nn;
//!
//! pipeline.begin_window(&ticks);
//! // ... scanning collaborator delivers events ...
//! pipeline.ingest(&BeaconEvent::new(DeviceId::new("AA:BB").unwrap(), -52, 100));
//! let report = pipeline.close_window(&ticks, &mut classifier);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregator;
pub mod constants;
pub mod errors;
pub mod events;
pub mod features;
pub mod histogram;
pub mod observations;
pub mod pipeline;
pub mod queue;
pub mod record;
pub mod registry;
pub mod services;
pub mod time;
pub mod traits;

// Public API
pub use aggregator::WindowAggregator;
pub use errors::{AggregateError, AggregateResult};
pub use events::{AdvElement, BeaconEvent, DeviceId, ServiceUuid};
pub use features::{FeatureBuffer, FeatureRow, FEATURE_BUFFER_LEN, FEATURE_ROWS, FEATURE_ROW_LEN};
pub use pipeline::{WindowPipeline, WindowReport};
pub use registry::WindowDiff;
pub use traits::{Classification, Classifier, RecordSink, TickSource};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
