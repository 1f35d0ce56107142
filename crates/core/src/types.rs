//! Domain types shared by the reader, writer, detector, and API layers.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest font size, in points, a style override may set.
pub const MIN_FONT_SIZE: u32 = 8;

/// Largest font size, in points, a style override may set.
pub const MAX_FONT_SIZE: u32 = 72;

/// The container format of an uploaded presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy PPT (OLE/CFB binary). Recognized so it can be rejected clearly.
    Ppt,
}

impl PresentationFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "ppt" => Some(Self::Ppt),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        // PPT is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if bytes.len() >= 8
            && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::Ppt);
        }

        None
    }
}

/// Text extracted from one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideText {
    /// 0-based slide index in presentation order.
    pub slide_number: usize,

    /// Space-joined text of every shape and table cell on the slide.
    pub text: String,

    /// Number of direct child shapes on the slide.
    pub shape_count: usize,
}

impl SlideText {
    /// Whether the slide carries no text worth classifying.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Basic presentation metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationInfo {
    pub total_slides: usize,
    /// Slide width in EMU.
    pub slide_width: Option<u64>,
    /// Slide height in EMU.
    pub slide_height: Option<u64>,
}

/// A text substitution to apply to one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    /// 0-based slide index.
    pub slide_number: usize,
    pub old_text: String,
    pub new_text: String,
}

impl Replacement {
    pub fn new(slide_number: usize, old_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        Self {
            slide_number,
            old_text: old_text.into(),
            new_text: new_text.into(),
        }
    }
}

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `RRGGBB`, case-insensitive.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidInput(format!(
                "Invalid hex color '{}': expected 6 hex digits like #1F2937",
                hex
            )));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|e| Error::InvalidInput(format!("Invalid hex color '{}': {}", hex, e)))
        };

        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Uppercase `RRGGBB`, the form stored in `a:srgbClr@val`.
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for RgbColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Global style overrides. `None` fields are left unchanged on every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub font_name: Option<String>,
    /// Font size in points, within `MIN_FONT_SIZE..=MAX_FONT_SIZE`.
    pub font_size: Option<u32>,
    pub color: Option<RgbColor>,
}

impl StyleConfig {
    /// Build a style config, rejecting font sizes outside 8–72 pt.
    pub fn new(font_name: Option<String>, font_size: Option<u32>, color: Option<RgbColor>) -> Result<Self> {
        if let Some(size) = font_size {
            if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size) {
                return Err(Error::InvalidInput(format!(
                    "Font size {} is outside the allowed range {}-{}",
                    size, MIN_FONT_SIZE, MAX_FONT_SIZE
                )));
            }
        }

        let font_name = font_name.filter(|name| !name.trim().is_empty());

        Ok(Self {
            font_name,
            font_size,
            color,
        })
    }

    /// True when no field would change anything.
    pub fn is_empty(&self) -> bool {
        self.font_name.is_none() && self.font_size.is_none() && self.color.is_none()
    }
}

/// Classification label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionLabel {
    #[serde(rename = "AI")]
    Ai,
    Human,
}

impl DetectionLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "AI",
            Self::Human => "Human",
        }
    }
}

impl fmt::Display for DetectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub is_ai_generated: bool,
    /// Probability mass on the AI-generated class, in `[0, 1]`.
    pub confidence: f64,
    pub label: DetectionLabel,
    pub model_name: String,
}

impl DetectionResult {
    /// Derive the label from an AI probability. Values are clamped into `[0, 1]`.
    pub fn from_probability(confidence: f64, model_name: impl Into<String>) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        let is_ai_generated = confidence > 0.5;

        Self {
            is_ai_generated,
            confidence,
            label: if is_ai_generated {
                DetectionLabel::Ai
            } else {
                DetectionLabel::Human
            },
            model_name: model_name.into(),
        }
    }

    /// Placeholder for a slide with no text; the classifier is never consulted.
    pub fn empty_slide(model_name: impl Into<String>) -> Self {
        Self {
            is_ai_generated: false,
            confidence: 0.0,
            label: DetectionLabel::Human,
            model_name: model_name.into(),
        }
    }
}

/// Detection outcome for a single slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideDetection {
    pub slide_number: usize,
    pub text: String,
    pub detection: DetectionResult,
}

/// Detection outcome for a whole presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationDetection {
    pub file_name: String,
    pub total_slides: usize,
    pub ai_slides: usize,
    pub human_slides: usize,
    pub slides: Vec<SlideDetection>,
}

impl PresentationDetection {
    /// Aggregate per-slide detections into slide counts.
    pub fn from_slides(file_name: impl Into<String>, slides: Vec<SlideDetection>) -> Self {
        let ai_slides = slides
            .iter()
            .filter(|s| s.detection.is_ai_generated)
            .count();

        Self {
            file_name: file_name.into(),
            total_slides: slides.len(),
            ai_slides,
            human_slides: slides.len() - ai_slides,
            slides,
        }
    }
}
