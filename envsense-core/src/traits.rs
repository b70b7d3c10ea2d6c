//! Collaborator Seams
//!
//! The aggregation core stays free of radio, model, and storage code; each
//! external subsystem plugs in through one narrow trait:
//!
//! - the scanning collaborator *produces* [`BeaconEvent`]s (no trait - it
//!   pushes into the [`queue`](crate::queue)),
//! - [`Classifier`] consumes the assembled 230-value sample,
//! - [`RecordSink`] consumes pre-formatted text records,
//! - [`TickSource`](crate::time::TickSource) supplies counter readings for
//!   the timing marks.

use crate::features::FEATURE_BUFFER_LEN;

#[allow(unused_imports)] // doc links
use crate::events::BeaconEvent;

pub use crate::time::TickSource;

/// Outcome of classifying one assembled sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Classification {
    /// Index into the collaborator's class-label table.
    pub class_index: usize,
    /// Confidence score in `[0, 1]`.
    pub confidence: f32,
}

/// Inference collaborator: consumes the raw 230-value sample buffer.
///
/// Normalization of the raw integers into the model's input space is the
/// collaborator's concern (see the `envsense-ml` crate).
pub trait Classifier {
    /// Classify one assembled sample.
    fn classify(&mut self, sample: &[i32; FEATURE_BUFFER_LEN]) -> Classification;
}

/// Storage collaborator: consumes pre-formatted text records.
///
/// The core formats; the sink owns paths, durability, and any retry policy.
/// A sink error fails only the write that raised it, never the window.
pub trait RecordSink {
    /// Sink-specific failure type.
    type Error;

    /// Persist one labeled multi-line sample record.
    fn write_sample(&mut self, record: &str) -> Result<(), Self::Error>;

    /// Append one short classification-result record.
    fn append_eval(&mut self, record: &str) -> Result<(), Self::Error>;
}
