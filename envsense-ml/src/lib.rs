//! Classifier Front-End for envsense
//!
//! ## Overview
//!
//! The neural network itself lives outside this workspace (it is a
//! pretrained model run by whatever inference engine the target ships).
//! What belongs here is everything between the aggregation core's raw
//! integer sample and that engine:
//!
//! 1. **Normalization** ([`Normalizer`]): the model is trained on
//!    standardized inputs, so each raw value becomes
//!    `(raw - mean[column]) / std[column]`, with zero-variance columns
//!    pinned to 0.
//! 2. **Decoding** ([`decode`]): the model's per-class scores reduce to a
//!    [`Classification`] - the argmax index and its score as confidence.
//! 3. **Adapting** ([`ModelClassifier`]): wraps a raw model function into
//!    the core's [`Classifier`](envsense_core::Classifier) seam.
//!
//! The class-label table ships here too: eval records print label text,
//! and the label order is part of the trained model's contract.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod classifier;
pub mod normalize;

pub use classifier::{decode, ModelClassifier};
pub use normalize::Normalizer;

/// Environment classes the pretrained network distinguishes, in model
/// output order.
pub const ENVIRONMENT_LABELS: [&str; 14] = [
    "apartment",
    "house",
    "street",
    "car",
    "train",
    "bus",
    "plane",
    "supermarket",
    "clothing_store",
    "gym",
    "park",
    "nature",
    "cinema",
    "unknown",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_distinct() {
        for (i, a) in ENVIRONMENT_LABELS.iter().enumerate() {
            for b in &ENVIRONMENT_LABELS[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
