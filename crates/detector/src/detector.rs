//! Labelled AI-content detection on top of a raw classifier.

use crate::classifier::SequenceClassifier;
use deck_core::{DetectionResult, Result};

/// Texts shorter than this (trimmed, in characters) are classified with a
/// warning about reliability.
pub const MIN_TEXT_LENGTH_FOR_DETECTION: usize = 50;

/// A classifier bound to the model name it reports.
pub struct AiDetector {
    model_name: String,
    classifier: Box<dyn SequenceClassifier>,
    min_text_length: usize,
}

impl AiDetector {
    pub fn new(model_name: impl Into<String>, classifier: Box<dyn SequenceClassifier>) -> Self {
        Self {
            model_name: model_name.into(),
            classifier,
            min_text_length: MIN_TEXT_LENGTH_FOR_DETECTION,
        }
    }

    /// Override the length below which a reliability warning is logged.
    pub fn with_min_text_length(mut self, min_text_length: usize) -> Self {
        self.min_text_length = min_text_length;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Classify `text`. Short inputs are still classified.
    pub fn detect(&self, text: &str) -> Result<DetectionResult> {
        let length = text.trim().chars().count();
        if length < self.min_text_length {
            log::warn!(
                "Text length ({}) is below minimum ({}). Results may be unreliable.",
                length,
                self.min_text_length
            );
        }

        let probability = self.classifier.ai_probability(text)?;
        let result = DetectionResult::from_probability(probability, self.model_name.as_str());

        log::info!(
            "Detection complete: {} (confidence: {:.2}) for text of length {}",
            result.label,
            result.confidence,
            text.chars().count()
        );
        Ok(result)
    }

    /// Classify each text in order; the first failure aborts the batch.
    pub fn detect_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<DetectionResult>> {
        log::info!("Running batch detection on {} texts", texts.len());
        texts.iter().map(|text| self.detect(text.as_ref())).collect()
    }
}

impl std::fmt::Debug for AiDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiDetector")
            .field("model_name", &self.model_name)
            .field("min_text_length", &self.min_text_length)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use deck_core::{DetectionLabel, Error};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Returns a fixed probability and counts calls.
    pub(crate) struct FixedClassifier {
        pub probability: f64,
        pub calls: Arc<AtomicUsize>,
    }

    impl FixedClassifier {
        pub(crate) fn boxed(probability: f64) -> (Box<dyn SequenceClassifier>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let classifier = Self {
                probability,
                calls: Arc::clone(&calls),
            };
            (Box::new(classifier), calls)
        }
    }

    impl SequenceClassifier for FixedClassifier {
        fn ai_probability(&self, _text: &str) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.probability)
        }
    }

    struct FailingClassifier;

    impl SequenceClassifier for FailingClassifier {
        fn ai_probability(&self, _text: &str) -> Result<f64> {
            Err(Error::Inference("boom".into()))
        }
    }

    #[test]
    fn test_label_follows_probability() {
        let (classifier, _) = FixedClassifier::boxed(0.93);
        let detector = AiDetector::new("stub", classifier);

        let result = detector.detect("Some text that is long enough to not warn about anything.").unwrap();

        assert!(result.is_ai_generated);
        assert_eq!(result.label, DetectionLabel::Ai);
        assert_eq!(result.model_name, "stub");
        assert!((result.confidence - 0.93).abs() < 1e-9);
    }

    #[test]
    fn test_boundary_is_human() {
        let (classifier, _) = FixedClassifier::boxed(0.5);
        let result = AiDetector::new("stub", classifier).detect("short").unwrap();

        assert!(!result.is_ai_generated);
        assert_eq!(result.label, DetectionLabel::Human);
    }

    #[test]
    fn test_out_of_range_probability_is_clamped() {
        let (classifier, _) = FixedClassifier::boxed(1.7);
        let result = AiDetector::new("stub", classifier).detect("text").unwrap();

        assert!((0.0..=1.0).contains(&result.confidence));
    }

    #[test]
    fn test_batch_keeps_order_and_calls_each() {
        let (classifier, calls) = FixedClassifier::boxed(0.2);
        let detector = AiDetector::new("stub", classifier);

        let results = detector.detect_batch(&["a", "b", "c"]).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_classifier_error_propagates() {
        let detector = AiDetector::new("stub", Box::new(FailingClassifier));
        let err = detector.detect("text").unwrap_err();
        assert_eq!(err.kind(), "InferenceError");
    }
}
