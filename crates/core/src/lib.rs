//! Core domain types, errors, and rule-based rewriting for slide-deck
//! AI-content detection.

pub mod error;
pub mod rewrite;
pub mod types;

pub use error::{Error, Result};
pub use rewrite::ContentRewriter;
pub use types::{
    DetectionLabel, DetectionResult, PresentationDetection, PresentationFormat,
    PresentationInfo, Replacement, RgbColor, SlideDetection, SlideText, StyleConfig,
};
