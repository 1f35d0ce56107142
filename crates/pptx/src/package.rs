//! In-memory access to the parts of a PPTX package.

use crate::xml::XmlDocument;
use deck_core::{Error, PresentationFormat, Result};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const ROOT_RELS_PATH: &str = "_rels/.rels";
const DEFAULT_PRESENTATION_PATH: &str = "ppt/presentation.xml";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";
const SLIDE_REL: &str = "/slide";

/// One entry of the zip archive.
#[derive(Debug, Clone)]
struct PackagePart {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
}

/// A PPTX archive loaded into memory, with entry order preserved.
#[derive(Debug, Clone)]
pub struct PptxPackage {
    parts: Vec<PackagePart>,
}

impl PptxPackage {
    /// Load every entry of the archive.
    pub fn open<R: Read + Seek>(mut reader: R) -> Result<Self> {
        let mut magic = Vec::with_capacity(8);
        reader.by_ref().take(8).read_to_end(&mut magic)?;
        match PresentationFormat::from_magic(&magic) {
            Some(PresentationFormat::Pptx) => {}
            Some(PresentationFormat::Ppt) => {
                return Err(Error::UnsupportedFormat(
                    "legacy binary .ppt files cannot be opened; save the deck as .pptx".to_string(),
                ))
            }
            None => {
                return Err(Error::UnsupportedFormat(
                    "file is not a PPTX (zip) package".to_string(),
                ))
            }
        }
        reader.rewind()?;

        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", index, e)))?;

            if file.is_dir() {
                continue;
            }

            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", file.name(), e)))?;

            parts.push(PackagePart {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
            });
        }

        log::debug!("Loaded package with {} parts", parts.len());
        Ok(Self { parts })
    }

    /// Load a package from a file path.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::open(BufReader::new(file))
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// Parse a part as XML.
    pub fn xml_part(&self, name: &str) -> Result<XmlDocument> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::CorruptedFile(format!("missing part '{}'", name)))?;
        let content = std::str::from_utf8(data)
            .map_err(|e| Error::XmlError(format!("'{}' is not valid UTF-8: {}", name, e)))?;
        XmlDocument::parse(content)
            .map_err(|e| Error::XmlError(format!("in '{}': {}", name, e)))
    }

    /// Replace the bytes of an existing part, or add a new one.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(PackagePart {
                name: name.to_string(),
                data,
                compression: CompressionMethod::Deflated,
            }),
        }
    }

    /// Path of the main presentation part, from the package relationships.
    pub fn presentation_path(&self) -> Result<String> {
        if self.part(ROOT_RELS_PATH).is_none() {
            return Ok(DEFAULT_PRESENTATION_PATH.to_string());
        }

        let relationships = self.relationships("", ROOT_RELS_PATH)?;
        Ok(relationships
            .into_iter()
            .find(|rel| rel.rel_type.ends_with(OFFICE_DOCUMENT_REL))
            .map(|rel| rel.target)
            .unwrap_or_else(|| DEFAULT_PRESENTATION_PATH.to_string()))
    }

    /// Slide part paths in presentation order (`p:sldIdLst`).
    pub fn slide_paths(&self) -> Result<Vec<String>> {
        let presentation_path = self.presentation_path()?;
        let presentation = self.xml_part(&presentation_path)?;
        let relationships = self.relationships(&presentation_path, &rels_path_for(&presentation_path))?;

        let Some(id_list) = presentation.root.child("sldIdLst") else {
            return Ok(Vec::new());
        };

        let mut slides = Vec::new();
        for slide_id in id_list.children_named("sldId") {
            let rel_id = slide_id
                .attributes
                .iter()
                .find(|(key, _)| key.ends_with(":id"))
                .map(|(_, value)| value.as_str())
                .ok_or_else(|| Error::CorruptedFile("slide id without relationship".to_string()))?;

            let rel = relationships
                .iter()
                .find(|rel| rel.id == rel_id && rel.rel_type.ends_with(SLIDE_REL))
                .ok_or_else(|| {
                    Error::CorruptedFile(format!("slide relationship '{}' not found", rel_id))
                })?;

            slides.push(rel.target.clone());
        }

        Ok(slides)
    }

    /// Relationships declared in `rels_path`, with targets resolved against `source_path`.
    fn relationships(&self, source_path: &str, rels_path: &str) -> Result<Vec<Relationship>> {
        if self.part(rels_path).is_none() {
            return Ok(Vec::new());
        }

        let rels = self.xml_part(rels_path)?;
        let base = source_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");

        Ok(rels
            .root
            .children_named("Relationship")
            .filter(|rel| rel.attr("TargetMode") != Some("External"))
            .map(|rel| Relationship {
                id: rel.attr("Id").unwrap_or_default().to_string(),
                rel_type: rel.attr("Type").unwrap_or_default().to_string(),
                target: resolve_target(base, rel.attr("Target").unwrap_or_default()),
            })
            .collect())
    }

    /// Write the package as a zip archive.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);

        for part in &self.parts {
            let method = match part.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = FileOptions::default().compression_method(method);

            zip.start_file(part.name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to start '{}': {}", part.name, e)))?;
            zip.write_all(&part.data)?;
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))
    }

    /// Serialize the package into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }
}

/// A package relationship with a resolved target path.
#[derive(Debug, Clone)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

/// `ppt/presentation.xml` -> `ppt/_rels/presentation.xml.rels`.
fn rels_path_for(part_path: &str) -> String {
    match part_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_path),
    }
}

/// Resolve a relationship target relative to the source part's directory.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
