//! AI-content detection for slide text.
//!
//! A [`SequenceClassifier`] produces the AI-class probability for a piece of
//! text; [`AiDetector`] turns it into a labelled result, and
//! [`DetectorRegistry`] shares one detector per model across callers. The
//! [`pipeline`] module runs detection, rewriting, and restyling over whole
//! presentations.

pub mod classifier;
pub mod detector;
pub mod onnx;
pub mod pipeline;
pub mod registry;
pub mod store;

pub use classifier::{ClassifierLoader, SequenceClassifier};
pub use detector::{AiDetector, MIN_TEXT_LENGTH_FOR_DETECTION};
pub use onnx::{OnnxClassifier, OnnxClassifierLoader, OnnxOptions};
pub use pipeline::{
    detect_presentation, detect_slides, modify_presentation, plan_replacements,
    ModificationSummary, ModifyOptions, DEFAULT_CONFIDENCE_THRESHOLD,
};
pub use registry::DetectorRegistry;
pub use store::{HubConfig, ModelStore};
