//! Whole-presentation workflows: detect every slide, rewrite the ones that
//! look machine-generated, and restyle.

use crate::detector::AiDetector;
use crate::registry::DetectorRegistry;
use deck_core::{
    ContentRewriter, DetectionResult, Error, PresentationDetection, Replacement, Result,
    SlideDetection, SlideText, StyleConfig,
};
use deck_pptx::{PptxModifier, PptxPackage, PptxReader};
use serde::Serialize;
use std::path::Path;

/// Default minimum AI confidence for a slide to be rewritten.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Classify each slide. Blank slides get a "Human" placeholder and are never
/// sent to the classifier.
pub fn detect_slides(detector: &AiDetector, slides: &[SlideText]) -> Result<Vec<SlideDetection>> {
    slides
        .iter()
        .map(|slide| {
            let (text, detection) = if slide.is_blank() {
                (String::new(), DetectionResult::empty_slide(detector.model_name()))
            } else {
                (slide.text.clone(), detector.detect(&slide.text)?)
            };

            Ok(SlideDetection {
                slide_number: slide.slide_number,
                text,
                detection,
            })
        })
        .collect()
}

/// Read a presentation and classify every slide.
pub fn detect_presentation(
    detector: &AiDetector,
    path: &Path,
    file_name: &str,
) -> Result<PresentationDetection> {
    let slides = PptxReader::new().read_path(path)?;
    let detection = PresentationDetection::from_slides(file_name, detect_slides(detector, &slides)?);

    log::info!(
        "PPTX detection complete: {}/{} slides detected as AI",
        detection.ai_slides,
        detection.total_slides
    );
    Ok(detection)
}

/// Replacements for every slide labelled AI with at least `threshold`
/// confidence. The whole slide text is replaced by its rewrite.
pub fn plan_replacements(
    detector: &AiDetector,
    rewriter: &ContentRewriter,
    slides: &[SlideText],
    threshold: f64,
) -> Result<Vec<Replacement>> {
    let mut replacements = Vec::new();

    for slide in slides.iter().filter(|s| !s.is_blank()) {
        let detection = detector.detect(&slide.text)?;
        if detection.is_ai_generated && detection.confidence >= threshold {
            log::info!(
                "Replacing AI content in slide {} (confidence: {:.2})",
                slide.slide_number,
                detection.confidence
            );
            replacements.push(Replacement::new(
                slide.slide_number,
                slide.text.as_str(),
                rewriter.rewrite(&slide.text),
            ));
        }
    }

    Ok(replacements)
}

/// What to do to a presentation.
#[derive(Debug, Clone)]
pub struct ModifyOptions {
    pub replace_ai_content: bool,
    /// In `[0, 1]`.
    pub confidence_threshold: f64,
    /// Detector model; the registry default when `None`.
    pub model: Option<String>,
    pub style: StyleConfig,
}

impl Default for ModifyOptions {
    fn default() -> Self {
        Self {
            replace_ai_content: true,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            model: None,
            style: StyleConfig::default(),
        }
    }
}

/// Counts reported after a modification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModificationSummary {
    pub total_slides: usize,
    pub replacements_planned: usize,
    pub replacements_applied: usize,
    pub runs_styled: usize,
}

/// Detect and rewrite AI content, apply style overrides, and save to `output`.
///
/// The detector is only loaded when replacement is requested.
pub fn modify_presentation(
    detectors: &DetectorRegistry,
    rewriter: &ContentRewriter,
    input: &Path,
    output: &Path,
    options: &ModifyOptions,
) -> Result<ModificationSummary> {
    if !(0.0..=1.0).contains(&options.confidence_threshold) {
        return Err(Error::InvalidInput(format!(
            "Confidence threshold must be between 0.0 and 1.0, got {}",
            options.confidence_threshold
        )));
    }

    let package = PptxPackage::open_path(input)?;
    let slides = PptxReader::new().read_package(&package)?;
    let mut modifier = PptxModifier::from_package(package)?;

    let mut summary = ModificationSummary {
        total_slides: slides.len(),
        ..Default::default()
    };

    if options.replace_ai_content {
        log::info!("Detecting and replacing AI content");
        let detector = detectors.get(options.model.as_deref())?;
        let replacements = plan_replacements(&detector, rewriter, &slides, options.confidence_threshold)?;

        summary.replacements_planned = replacements.len();
        if replacements.is_empty() {
            log::info!("No AI content detected above threshold");
        } else {
            summary.replacements_applied = modifier.replace_content(&replacements);
            log::info!(
                "Applied {}/{} content replacements",
                summary.replacements_applied,
                summary.replacements_planned
            );
        }
    }

    if !options.style.is_empty() {
        summary.runs_styled = modifier.modify_styles(&options.style)?;
    }

    modifier.save(output)?;
    log::info!("Presentation modified successfully: {}", output.display());
    Ok(summary)
}
