//! Score Decoding and the Classifier Adapter
//!
//! The model reports one score per environment class. [`decode`] reduces
//! those scores to the class with the highest one; [`ModelClassifier`]
//! glues normalization, the raw model function, and decoding into the
//! core's [`Classifier`] seam.

use envsense_core::features::FEATURE_BUFFER_LEN;
use envsense_core::{Classification, Classifier};

use crate::normalize::Normalizer;

/// Reduce per-class scores to the best class and its confidence.
///
/// The fold starts at a score of 0, so a vector with no positive score
/// decodes to class 0 with confidence 0 - the index stays valid for label
/// lookup either way.
pub fn decode(scores: &[f32]) -> Classification {
    let mut class_index = 0;
    let mut confidence = 0.0f32;
    for (index, &score) in scores.iter().enumerate() {
        if score > confidence {
            confidence = score;
            class_index = index;
        }
    }
    Classification {
        class_index,
        confidence,
    }
}

/// [`Classifier`] implementation wrapping a raw inference function.
///
/// `C` is the model's class count; the function receives the standardized
/// 230-value input and returns its per-class scores.
pub struct ModelClassifier<M, const C: usize> {
    normalizer: Normalizer,
    model: M,
}

impl<M, const C: usize> ModelClassifier<M, C>
where
    M: FnMut(&[f32; FEATURE_BUFFER_LEN]) -> [f32; C],
{
    /// Combine a model's normalization tables with its inference function.
    pub fn new(normalizer: Normalizer, model: M) -> Self {
        Self { normalizer, model }
    }
}

impl<M, const C: usize> Classifier for ModelClassifier<M, C>
where
    M: FnMut(&[f32; FEATURE_BUFFER_LEN]) -> [f32; C],
{
    fn classify(&mut self, sample: &[i32; FEATURE_BUFFER_LEN]) -> Classification {
        let prepared = self.normalizer.prepare(sample);
        let scores = (self.model)(&prepared);
        decode(&scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envsense_core::features::FEATURE_ROW_LEN;

    #[test]
    fn decode_picks_argmax() {
        let classification = decode(&[0.1, 0.7, 0.2]);
        assert_eq!(classification.class_index, 1);
        assert!((classification.confidence - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn decode_without_positive_scores() {
        let classification = decode(&[-0.5, -0.1, 0.0]);
        assert_eq!(classification.class_index, 0);
        assert_eq!(classification.confidence, 0.0);

        let empty = decode(&[]);
        assert_eq!(empty.class_index, 0);
    }

    #[test]
    fn model_classifier_normalizes_then_decodes() {
        let normalizer = Normalizer::new([0.0; FEATURE_ROW_LEN], [2.0; FEATURE_ROW_LEN]);
        // Score class 1 by the first standardized value, class 0 flat
        let mut classifier = ModelClassifier::<_, 2>::new(normalizer, |input: &[f32; FEATURE_BUFFER_LEN]| {
            [0.25, input[0]]
        });

        let mut sample = [0i32; FEATURE_BUFFER_LEN];
        sample[0] = 8; // standardizes to 4.0
        let classification = classifier.classify(&sample);
        assert_eq!(classification.class_index, 1);
        assert_eq!(classification.confidence, 4.0);

        sample[0] = 0;
        let classification = classifier.classify(&sample);
        assert_eq!(classification.class_index, 0);
    }
}
