//! PPTX text reader.

use crate::package::PptxPackage;
use crate::slide;
use crate::xml::Element;
use deck_core::{Error, PresentationInfo, Result, SlideText};
use std::io::{Read, Seek};
use std::path::Path;

/// Reader that extracts per-slide text from PPTX files.
pub struct PptxReader;

impl PptxReader {
    /// Create a new PPTX reader.
    pub fn new() -> Self {
        Self
    }

    /// Read slide text from a file.
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<Vec<SlideText>> {
        let path = path.as_ref();
        log::info!("Extracting text from: {}", path.display());

        let package = PptxPackage::open_path(path).map_err(|e| {
            log::error!("Failed to open {}: {}", path.display(), e);
            e
        })?;
        self.read_package(&package)
    }

    /// Read slide text from any seekable source.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<Vec<SlideText>> {
        let package = PptxPackage::open(reader)?;
        self.read_package(&package)
    }

    /// Read slide text from an already-opened package.
    ///
    /// Any malformed slide aborts the whole read.
    pub fn read_package(&self, package: &PptxPackage) -> Result<Vec<SlideText>> {
        let slide_paths = package.slide_paths()?;
        let mut slides = Vec::with_capacity(slide_paths.len());

        for (slide_number, path) in slide_paths.iter().enumerate() {
            let document = package.xml_part(path)?;
            let slide = extract_slide(&document.root, slide_number)
                .ok_or_else(|| Error::CorruptedFile(format!("'{}' has no shape tree", path)))?;

            log::debug!(
                "Slide {}: Extracted {} characters from {} shapes",
                slide_number,
                slide.text.len(),
                slide.shape_count
            );
            slides.push(slide);
        }

        log::info!("Successfully extracted text from {} slides", slides.len());
        Ok(slides)
    }

    /// Slide count and dimensions of a presentation file.
    pub fn info(&self, path: impl AsRef<Path>) -> Result<PresentationInfo> {
        let package = PptxPackage::open_path(path)?;
        self.info_from_package(&package)
    }

    /// Slide count and dimensions of an opened package.
    pub fn info_from_package(&self, package: &PptxPackage) -> Result<PresentationInfo> {
        let presentation = package.xml_part(&package.presentation_path()?)?;
        let size = presentation.root.child("sldSz");
        let dimension = |key: &str| size.and_then(|s| s.attr(key)).and_then(|v| v.parse().ok());

        Ok(PresentationInfo {
            total_slides: package.slide_paths()?.len(),
            slide_width: dimension("cx"),
            slide_height: dimension("cy"),
        })
    }
}

impl Default for PptxReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the SlideText of one slide root, or `None` without a shape tree.
fn extract_slide(slide_root: &Element, slide_number: usize) -> Option<SlideText> {
    let tree = slide::shape_tree(slide_root)?;

    let parts: Vec<String> = slide::shapes(tree)
        .map(shape_text)
        .filter(|text| !text.trim().is_empty())
        .collect();

    Some(SlideText {
        slide_number,
        text: parts.join(" "),
        shape_count: slide::shapes(tree).count(),
    })
}

/// Text of a single shape: its text frame, its table, and any grouped shapes.
fn shape_text(shape: &Element) -> String {
    let mut parts = Vec::new();

    if let Some(body) = shape.child("txBody") {
        parts.extend(
            body.children_named("p")
                .map(|p| slide::paragraph_text(p).trim().to_string())
                .filter(|text| !text.is_empty()),
        );
    }

    if shape.is("graphicFrame") {
        if let Some(table) = slide::table(shape) {
            let text = table_text(table);
            if !text.is_empty() {
                parts.push(text);
            }
        }
    }

    if shape.is("grpSp") {
        parts.extend(
            slide::shapes(shape)
                .map(shape_text)
                .filter(|text| !text.trim().is_empty()),
        );
    }

    parts.join(" ")
}

/// Non-empty cell texts of a table joined by spaces.
fn table_text(table: &Element) -> String {
    slide::cell_bodies(table)
        .map(|body| {
            body.children_named("p")
                .map(slide::paragraph_text)
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{run, DeckBuilder, SlideBuilder};
    use std::io::Cursor;

    fn read(bytes: Vec<u8>) -> Vec<SlideText> {
        PptxReader::new().read(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn test_one_entry_per_slide_in_order() {
        let bytes = DeckBuilder::new()
            .slide(SlideBuilder::new().text_box("Alpha"))
            .slide(SlideBuilder::new())
            .slide(SlideBuilder::new().text_box("Gamma"))
            .build();

        let slides = read(bytes);

        assert_eq!(slides.len(), 3);
        let numbers: Vec<usize> = slides.iter().map(|s| s.slide_number).collect();
        assert_eq!(numbers, vec![0, 1, 2]);
        assert_eq!(slides[0].text, "Alpha");
        assert_eq!(slides[2].text, "Gamma");
    }

    #[test]
    fn test_empty_slide_has_empty_text() {
        let bytes = DeckBuilder::new()
            .slide(SlideBuilder::new().empty_shape().picture().text_box("   "))
            .build();

        let slides = read(bytes);

        assert_eq!(slides[0].text, "");
        assert_eq!(slides[0].shape_count, 3);
    }

    #[test]
    fn test_paragraphs_trimmed_and_space_joined() {
        let bytes = DeckBuilder::new()
            .slide(
                SlideBuilder::new()
                    .paragraphs(&["  Title  ", "", "Body line"])
                    .runs(&[run("Split "), run("run").bold(true)]),
            )
            .build();

        let slides = read(bytes);

        assert_eq!(slides[0].text, "Title Body line Split run");
    }

    #[test]
    fn test_tables_and_nested_groups() {
        let inner = SlideBuilder::new()
            .text_box("Deep")
            .group(SlideBuilder::new().text_box("Deeper"));
        let bytes = DeckBuilder::new()
            .slide(
                SlideBuilder::new()
                    .text_box("Top")
                    .table(&[&["A1", ""], &[" B1 ", "B2"]])
                    .group(inner),
            )
            .build();

        let slides = read(bytes);

        assert_eq!(slides[0].text, "Top A1 B1 B2 Deep Deeper");
        // Only direct children are counted
        assert_eq!(slides[0].shape_count, 3);
    }

    #[test]
    fn test_malformed_slide_aborts_read() {
        let bytes = DeckBuilder::new()
            .slide(SlideBuilder::new().text_box("fine"))
            .raw_slide("<p:sld><p:cSld><p:spTree></p:sld>")
            .build();

        let result = PptxReader::new().read(Cursor::new(bytes));
        assert!(result.is_err());
    }

    #[test]
    fn test_line_break_reads_as_vertical_tab() {
        let bytes = DeckBuilder::new()
            .raw_slide(
                r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:txBody><a:bodyPr/><a:p><a:r><a:t>First line</a:t></a:r><a:br/><a:r><a:t>second line </a:t></a:r><a:br/></a:p><a:p><a:r><a:t>Next</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
            )
            .build();

        let slides = read(bytes);
        assert_eq!(slides[0].text, "First line\u{0B}second line Next");
    }

    #[test]
    fn test_not_a_zip_is_an_error() {
        let result = PptxReader::new().read(Cursor::new(b"plain text".to_vec()));
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_presentation_info() {
        let bytes = DeckBuilder::new()
            .slide(SlideBuilder::new())
            .slide(SlideBuilder::new())
            .build();

        let package = PptxPackage::open(Cursor::new(bytes)).unwrap();
        let info = PptxReader::new().info_from_package(&package).unwrap();

        assert_eq!(info.total_slides, 2);
        assert_eq!(info.slide_width, Some(12_192_000));
        assert_eq!(info.slide_height, Some(6_858_000));
    }
}
