//! PPTX content replacement, style overrides, and saving.

use crate::package::PptxPackage;
use crate::run::{run_properties_mut, RunStyle, TextRun};
use crate::slide;
use crate::xml::{Element, XmlDocument};
use deck_core::{Error, Replacement, Result, StyleConfig};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

/// Number of characters of replaced text shown in log lines.
const LOG_PREVIEW_CHARS: usize = 50;

/// An opened presentation that can be edited in memory and saved elsewhere.
pub struct PptxModifier {
    package: PptxPackage,
    slide_paths: Vec<String>,
    /// Slides parsed so far, by 0-based index.
    slides: BTreeMap<usize, XmlDocument>,
    /// Slides whose XML changed since opening.
    dirty: BTreeSet<usize>,
    source: Option<PathBuf>,
}

impl PptxModifier {
    /// Open a presentation file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut modifier = Self::from_package(PptxPackage::open_path(path)?)?;
        modifier.source = Some(path.to_path_buf());

        log::info!("Loaded presentation: {}", path.display());
        Ok(modifier)
    }

    /// Open a presentation from any seekable source.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_package(PptxPackage::open(reader)?)
    }

    /// Edit an already-opened package.
    pub fn from_package(package: PptxPackage) -> Result<Self> {
        let slide_paths = package.slide_paths()?;
        Ok(Self {
            package,
            slide_paths,
            slides: BTreeMap::new(),
            dirty: BTreeSet::new(),
            source: None,
        })
    }

    /// Number of slides in the presentation.
    pub fn slide_count(&self) -> usize {
        self.slide_paths.len()
    }

    /// Apply text replacements, each independently.
    ///
    /// A replacement that fails is logged and skipped. Returns how many
    /// replacements changed a run.
    pub fn replace_content(&mut self, replacements: &[Replacement]) -> usize {
        log::info!("Applying {} content replacements", replacements.len());

        let mut applied = 0;
        for replacement in replacements {
            match self.replace_in_slide(
                replacement.slide_number,
                &replacement.old_text,
                &replacement.new_text,
            ) {
                Ok(true) => {
                    applied += 1;
                    log::debug!(
                        "Replaced text in slide {}: '{}...' -> '{}...'",
                        replacement.slide_number,
                        preview(&replacement.old_text),
                        preview(&replacement.new_text)
                    );
                }
                Ok(false) => {
                    log::debug!(
                        "No single run in slide {} contains '{}...'",
                        replacement.slide_number,
                        preview(&replacement.old_text)
                    );
                }
                Err(e) => {
                    log::error!(
                        "Failed to replace content in slide {}: {}",
                        replacement.slide_number,
                        e
                    );
                }
            }
        }

        applied
    }

    /// Replace `old_text` in the first run of the slide that contains it.
    fn replace_in_slide(&mut self, slide_number: usize, old_text: &str, new_text: &str) -> Result<bool> {
        if slide_number >= self.slide_count() {
            log::warn!("Slide {} does not exist", slide_number);
            return Ok(false);
        }
        if old_text.is_empty() {
            log::warn!("Ignoring empty replacement target for slide {}", slide_number);
            return Ok(false);
        }

        let document = self.slide_mut(slide_number)?;
        let tree = slide::shape_tree_mut(&mut document.root)
            .ok_or_else(|| Error::CorruptedFile(format!("slide {} has no shape tree", slide_number)))?;

        let replaced = replace_first_run(tree, old_text, new_text);
        if replaced {
            self.dirty.insert(slide_number);
        }
        Ok(replaced)
    }

    /// Apply every set field of `config` to every run on every slide.
    ///
    /// Returns the number of runs touched.
    pub fn modify_styles(&mut self, config: &StyleConfig) -> Result<usize> {
        if config.is_empty() {
            return Ok(0);
        }
        log::info!("Applying style modifications");

        let style = RunStyle::from_overrides(config);
        let mut touched = 0;

        for slide_number in 0..self.slide_count() {
            let document = self.slide_mut(slide_number)?;
            let Some(tree) = slide::shape_tree_mut(&mut document.root) else {
                continue;
            };

            let mut slide_runs = 0;
            for shape in tree.elements_mut().filter(|el| slide::is_shape(el)) {
                for body in text_bodies_mut(shape) {
                    for run in slide::runs_mut(body) {
                        style.apply_to(run_properties_mut(run));
                        slide_runs += 1;
                    }
                }
            }

            if slide_runs > 0 {
                self.dirty.insert(slide_number);
                touched += slide_runs;
            }
        }

        log::debug!("Styled {} runs", touched);
        Ok(touched)
    }

    /// Write the current state to `path`.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if self.source.as_deref() == Some(path) {
            log::warn!("Overwriting the source presentation at {}", path.display());
        }

        let result = self.flush().and_then(|_| {
            let file = File::create(path)?;
            let mut writer = self.package.write_to(BufWriter::new(file))?;
            writer.flush()?;
            Ok(())
        });

        match result {
            Ok(()) => {
                log::info!("Saved modified presentation to: {}", path.display());
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to save presentation: {}", e);
                Err(e)
            }
        }
    }

    /// Serialize the current state into memory.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush()?;
        self.package.to_bytes()
    }

    /// Parsed slide, loading it on first access.
    fn slide_mut(&mut self, slide_number: usize) -> Result<&mut XmlDocument> {
        match self.slides.entry(slide_number) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = self.slide_paths.get(slide_number).ok_or_else(|| {
                    Error::InvalidInput(format!("slide {} does not exist", slide_number))
                })?;
                let document = self.package.xml_part(path)?;
                Ok(entry.insert(document))
            }
        }
    }

    /// Copy modified slides back into the package.
    fn flush(&mut self) -> Result<()> {
        for &slide_number in &self.dirty {
            if let Some(document) = self.slides.get(&slide_number) {
                let bytes = document.to_bytes()?;
                self.package.set_part(&self.slide_paths[slide_number], bytes);
            }
        }
        Ok(())
    }
}

/// Replace in the first run, across top-level shapes and table cells, that
/// contains `old_text`. Text split over several runs is never matched.
fn replace_first_run(tree: &mut Element, old_text: &str, new_text: &str) -> bool {
    for shape in tree.elements_mut().filter(|el| slide::is_shape(el)) {
        for body in text_bodies_mut(shape) {
            for run in slide::runs_mut(body) {
                let current = TextRun::from_element(run);
                if current.text.contains(old_text) {
                    current.with_replaced_text(old_text, new_text).write_to(run);
                    return true;
                }
            }
        }
    }
    false
}

/// Text bodies directly editable on a shape: its own text frame, or the
/// cells of its table.
fn text_bodies_mut(shape: &mut Element) -> Vec<&mut Element> {
    if shape.is("graphicFrame") {
        match slide::table_mut(shape) {
            Some(table) => slide::cell_bodies_mut(table).collect(),
            None => Vec::new(),
        }
    } else {
        shape.child_mut("txBody").into_iter().collect()
    }
}

fn preview(text: &str) -> String {
    text.chars().take(LOG_PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{run, DeckBuilder, SlideBuilder};
    use crate::parser::PptxReader;
    use deck_core::RgbColor;
    use std::io::Cursor;

    fn open(bytes: Vec<u8>) -> PptxModifier {
        PptxModifier::from_reader(Cursor::new(bytes)).unwrap()
    }

    fn texts(modifier: &mut PptxModifier) -> Vec<String> {
        let bytes = modifier.to_bytes().unwrap();
        PptxReader::new()
            .read(Cursor::new(bytes))
            .unwrap()
            .into_iter()
            .map(|s| s.text)
            .collect()
    }

    fn runs_of(bytes: Vec<u8>, slide_number: usize) -> Vec<TextRun> {
        let package = PptxPackage::open(Cursor::new(bytes)).unwrap();
        let path = &package.slide_paths().unwrap()[slide_number];
        let mut document = package.xml_part(path).unwrap();
        let tree = slide::shape_tree_mut(&mut document.root).unwrap();

        let mut runs = Vec::new();
        for shape in tree.elements_mut().filter(|el| slide::is_shape(el)) {
            for body in text_bodies_mut(shape) {
                for r in slide::runs_mut(body) {
                    runs.push(TextRun::from_element(r));
                }
            }
        }
        runs
    }

    #[test]
    fn test_replace_preserves_formatting() {
        let bytes = DeckBuilder::new()
            .slide(SlideBuilder::new().runs(&[run("We utilize tools. We utilize data.")
                .font("Georgia")
                .size(2000)
                .bold(true)
                .italic(false)
                .color("336699")]))
            .build();
        let mut modifier = open(bytes);

        let applied = modifier.replace_content(&[Replacement::new(0, "utilize", "use")]);
        assert_eq!(applied, 1);

        let runs = runs_of(modifier.to_bytes().unwrap(), 0);
        assert_eq!(runs[0].text, "We use tools. We use data.");
        assert_eq!(runs[0].style.font_name.as_deref(), Some("Georgia"));
        assert_eq!(runs[0].style.size, Some(2000));
        assert_eq!(runs[0].style.bold, Some(true));
        assert_eq!(runs[0].style.italic, Some(false));
        assert_eq!(runs[0].style.color, Some(RgbColor::new(0x33, 0x66, 0x99)));
    }

    #[test]
    fn test_only_first_matching_run_changes() {
        let bytes = DeckBuilder::new()
            .slide(SlideBuilder::new().text_box("same text").text_box("same text"))
            .build();
        let mut modifier = open(bytes);

        modifier.replace_content(&[Replacement::new(0, "same", "other")]);

        assert_eq!(texts(&mut modifier), vec!["other text same text"]);
    }

    #[test]
    fn test_cross_run_text_is_not_found() {
        let bytes = DeckBuilder::new()
            .slide(SlideBuilder::new().runs(&[run("Hello "), run("world")]))
            .build();
        let mut modifier = open(bytes);

        let applied = modifier.replace_content(&[Replacement::new(0, "Hello world", "Hi")]);

        assert_eq!(applied, 0);
        assert_eq!(texts(&mut modifier), vec!["Hello world"]);
    }

    #[test]
    fn test_out_of_range_slide_is_noop() {
        let bytes = DeckBuilder::new()
            .slide(SlideBuilder::new().text_box("Only slide"))
            .build();
        let mut modifier = open(bytes.clone());

        let applied = modifier.replace_content(&[Replacement::new(5, "Only", "First")]);

        assert_eq!(applied, 0);
        let original = PptxPackage::open(Cursor::new(bytes)).unwrap();
        let rewritten = PptxPackage::open(Cursor::new(modifier.to_bytes().unwrap())).unwrap();
        assert_eq!(
            original.part("ppt/slides/slide1.xml"),
            rewritten.part("ppt/slides/slide1.xml")
        );
    }

    #[test]
    fn test_table_cells_are_searched() {
        let bytes = DeckBuilder::new()
            .slide(SlideBuilder::new().table(&[&["prior to launch", "x"]]))
            .build();
        let mut modifier = open(bytes);

        modifier.replace_content(&[Replacement::new(0, "prior to", "before")]);

        assert_eq!(texts(&mut modifier), vec!["before launch x"]);
    }

    #[test]
    fn test_failed_replacement_does_not_stop_others() {
        let bytes = DeckBuilder::new()
            .raw_slide("<p:sld><p:cSld><p:spTree></p:sld>")
            .slide(SlideBuilder::new().text_box("fix me"))
            .build();
        let mut modifier = open(bytes);

        let applied = modifier.replace_content(&[
            Replacement::new(0, "anything", "x"),
            Replacement::new(1, "fix me", "fixed"),
        ]);

        assert_eq!(applied, 1);
        let runs = runs_of(modifier.to_bytes().unwrap(), 1);
        assert_eq!(runs[0].text, "fixed");
    }

    #[test]
    fn test_style_overrides_apply_everywhere() {
        let bytes = DeckBuilder::new()
            .slide(SlideBuilder::new().runs(&[run("a").font("Arial").bold(true), run("b").scheme_color("accent1")]))
            .slide(SlideBuilder::new().table(&[&["c"]]))
            .build();
        let mut modifier = open(bytes);

        let config = StyleConfig::new(Some("Calibri".into()), None, Some(RgbColor::new(0x11, 0x22, 0x33))).unwrap();
        let touched = modifier.modify_styles(&config).unwrap();
        assert_eq!(touched, 3);

        let bytes = modifier.to_bytes().unwrap();
        for (slide_number, expected_runs) in [(0, 2), (1, 1)] {
            let runs = runs_of(bytes.clone(), slide_number);
            assert_eq!(runs.len(), expected_runs);
            for r in runs {
                assert_eq!(r.style.font_name.as_deref(), Some("Calibri"));
                assert_eq!(r.style.color, Some(RgbColor::new(0x11, 0x22, 0x33)));
            }
        }

        // Fields not in the config are left alone
        assert_eq!(runs_of(bytes, 0)[0].style.bold, Some(true));
    }

    #[test]
    fn test_style_overrides_are_idempotent() {
        let bytes = DeckBuilder::new()
            .slide(SlideBuilder::new().runs(&[run("a").color("FF0000"), run("b")]))
            .build();
        let config = StyleConfig::new(Some("Verdana".into()), Some(24), Some(RgbColor::new(0, 0, 0))).unwrap();

        let mut once = open(bytes.clone());
        once.modify_styles(&config).unwrap();
        let once_bytes = once.to_bytes().unwrap();

        let mut twice = open(bytes);
        twice.modify_styles(&config).unwrap();
        twice.modify_styles(&config).unwrap();
        let twice_bytes = twice.to_bytes().unwrap();

        let part = |bytes: Vec<u8>| {
            PptxPackage::open(Cursor::new(bytes))
                .unwrap()
                .part("ppt/slides/slide1.xml")
                .unwrap()
                .to_vec()
        };
        assert_eq!(part(once_bytes), part(twice_bytes));
    }

    #[test]
    fn test_empty_style_config_changes_nothing() {
        let bytes = DeckBuilder::new().slide(SlideBuilder::new().text_box("x")).build();
        let mut modifier = open(bytes);

        assert_eq!(modifier.modify_styles(&StyleConfig::default()).unwrap(), 0);
    }

    #[test]
    fn test_save_writes_new_file() {
        let bytes = DeckBuilder::new()
            .slide(SlideBuilder::new().text_box("in order to win"))
            .build();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.pptx");
        let output = dir.path().join("output.pptx");
        std::fs::write(&input, &bytes).unwrap();

        let mut modifier = PptxModifier::open(&input).unwrap();
        assert_eq!(modifier.slide_count(), 1);
        modifier.replace_content(&[Replacement::new(0, "in order to", "to")]);
        modifier.save(&output).unwrap();

        let reader = PptxReader::new();
        assert_eq!(reader.read_path(&output).unwrap()[0].text, "to win");
        assert_eq!(reader.read_path(&input).unwrap()[0].text, "in order to win");
    }
}
