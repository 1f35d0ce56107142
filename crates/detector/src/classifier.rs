//! The seam between detection logic and the model that backs it.

use deck_core::Result;

/// A binary sequence classifier: text in, probability of the AI class out.
pub trait SequenceClassifier: Send + Sync {
    /// Probability, in `[0, 1]`, that `text` was machine-generated.
    fn ai_probability(&self, text: &str) -> Result<f64>;
}

/// Creates classifiers by model identifier.
pub trait ClassifierLoader: Send + Sync {
    /// Load the classifier for `model_id`, fetching its files if needed.
    fn load(&self, model_id: &str) -> Result<Box<dyn SequenceClassifier>>;

    /// Whether `load` could succeed without contacting anything unreachable.
    fn is_available(&self, model_id: &str) -> bool;
}

/// Numerically stable softmax over raw logits.
pub fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
