//! In-memory PPTX decks for tests.
//!
//! Produces the smallest package the reader and writer understand:
//! content types, package and presentation relationships, the presentation
//! part with its slide id list, and one part per slide.

use std::fmt::Write as _;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const NS: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);

const SLIDE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";

/// A formatted run inside a fixture paragraph.
#[derive(Debug, Clone, Default)]
pub struct FixtureRun {
    text: String,
    font: Option<String>,
    size: Option<u32>,
    bold: Option<bool>,
    italic: Option<bool>,
    color: Option<String>,
    scheme_color: Option<String>,
}

/// Start a run with the given text.
pub fn run(text: &str) -> FixtureRun {
    FixtureRun {
        text: text.to_string(),
        ..Default::default()
    }
}

impl FixtureRun {
    pub fn font(mut self, name: &str) -> Self {
        self.font = Some(name.to_string());
        self
    }

    /// Size in hundredths of a point, as stored in `sz`.
    pub fn size(mut self, centipoints: u32) -> Self {
        self.size = Some(centipoints);
        self
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = Some(italic);
        self
    }

    /// Explicit sRGB color, `RRGGBB`.
    pub fn color(mut self, hex: &str) -> Self {
        self.color = Some(hex.to_string());
        self
    }

    /// Theme color such as `accent1`.
    pub fn scheme_color(mut self, name: &str) -> Self {
        self.scheme_color = Some(name.to_string());
        self
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from("<a:r><a:rPr lang=\"en-US\"");
        if let Some(size) = self.size {
            let _ = write!(xml, " sz=\"{}\"", size);
        }
        if let Some(bold) = self.bold {
            let _ = write!(xml, " b=\"{}\"", u8::from(bold));
        }
        if let Some(italic) = self.italic {
            let _ = write!(xml, " i=\"{}\"", u8::from(italic));
        }
        xml.push('>');
        if let Some(ref color) = self.color {
            let _ = write!(xml, "<a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill>", color);
        } else if let Some(ref scheme) = self.scheme_color {
            let _ = write!(xml, "<a:solidFill><a:schemeClr val=\"{}\"/></a:solidFill>", scheme);
        }
        if let Some(ref font) = self.font {
            let _ = write!(xml, "<a:latin typeface=\"{}\"/>", escape(font));
        }
        let _ = write!(xml, "</a:rPr><a:t>{}</a:t></a:r>", escape(&self.text));
        xml
    }
}

/// Builder for one slide's shape tree.
#[derive(Debug, Clone, Default)]
pub struct SlideBuilder {
    shapes: Vec<String>,
}

impl SlideBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A text box with a single paragraph holding a single plain run.
    pub fn text_box(self, text: &str) -> Self {
        self.runs(&[run(text)])
    }

    /// A text box with one plain run per paragraph.
    pub fn paragraphs(self, paragraphs: &[&str]) -> Self {
        let body: Vec<Vec<FixtureRun>> = paragraphs.iter().map(|p| vec![run(p)]).collect();
        self.shape_with_paragraphs(&body)
    }

    /// A text box with one paragraph made of the given runs.
    pub fn runs(self, runs: &[FixtureRun]) -> Self {
        self.shape_with_paragraphs(&[runs.to_vec()])
    }

    /// A text box with full control over paragraphs and runs.
    pub fn shape_with_paragraphs(mut self, paragraphs: &[Vec<FixtureRun>]) -> Self {
        let id = self.shapes.len() + 2;
        let mut xml = format!(
            "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"TextBox {id}\"/><p:cNvSpPr txBox=\"1\"/><p:nvPr/></p:nvSpPr>\
             <p:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"100\" cy=\"100\"/></a:xfrm></p:spPr>\
             <p:txBody><a:bodyPr/><a:lstStyle/>"
        );
        for paragraph in paragraphs {
            xml.push_str("<a:p>");
            for r in paragraph {
                xml.push_str(&r.to_xml());
            }
            xml.push_str("</a:p>");
        }
        xml.push_str("</p:txBody></p:sp>");
        self.shapes.push(xml);
        self
    }

    /// A shape without a text body (e.g. a plain rectangle).
    pub fn empty_shape(mut self) -> Self {
        let id = self.shapes.len() + 2;
        self.shapes.push(format!(
            "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"Rect {id}\"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/></p:sp>"
        ));
        self
    }

    /// A picture; never carries text.
    pub fn picture(mut self) -> Self {
        let id = self.shapes.len() + 2;
        self.shapes.push(format!(
            "<p:pic><p:nvPicPr><p:cNvPr id=\"{id}\" name=\"Picture {id}\"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr>\
             <p:blipFill/><p:spPr/></p:pic>"
        ));
        self
    }

    /// A table shape; each cell holds one plain run.
    pub fn table(mut self, rows: &[&[&str]]) -> Self {
        let id = self.shapes.len() + 2;
        let mut xml = format!(
            "<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id=\"{id}\" name=\"Table {id}\"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr>\
             <p:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"100\" cy=\"100\"/></p:xfrm>\
             <a:graphic><a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/table\"><a:tbl><a:tblGrid/>"
        );
        for row in rows {
            xml.push_str("<a:tr h=\"100\">");
            for cell in row.iter() {
                xml.push_str("<a:tc><a:txBody><a:bodyPr/><a:lstStyle/><a:p>");
                if !cell.is_empty() {
                    xml.push_str(&run(cell).to_xml());
                }
                xml.push_str("</a:p></a:txBody><a:tcPr/></a:tc>");
            }
            xml.push_str("</a:tr>");
        }
        xml.push_str("</a:tbl></a:graphicData></a:graphic></p:graphicFrame>");
        self.shapes.push(xml);
        self
    }

    /// A group containing the shapes of `inner`.
    pub fn group(mut self, inner: SlideBuilder) -> Self {
        let id = self.shapes.len() + 2;
        let mut xml = format!(
            "<p:grpSp><p:nvGrpSpPr><p:cNvPr id=\"{id}\" name=\"Group {id}\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"
        );
        for shape in &inner.shapes {
            xml.push_str(shape);
        }
        xml.push_str("</p:grpSp>");
        self.shapes.push(xml);
        self
    }

    /// Slide part XML.
    pub fn to_xml(&self) -> String {
        let mut xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
             <p:sld {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"
        );
        for shape in &self.shapes {
            xml.push_str(shape);
        }
        xml.push_str("</p:spTree></p:cSld></p:sld>");
        xml
    }
}

/// Builder for a whole package.
#[derive(Debug, Clone, Default)]
pub struct DeckBuilder {
    slides: Vec<String>,
    reverse_part_names: bool,
    extra_parts: Vec<(String, Vec<u8>)>,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slide(mut self, slide: SlideBuilder) -> Self {
        self.slides.push(slide.to_xml());
        self
    }

    /// Add a slide from raw part XML.
    pub fn raw_slide(mut self, xml: &str) -> Self {
        self.slides.push(xml.to_string());
        self
    }

    /// Name slide parts in reverse of presentation order, so part names
    /// cannot be used to infer order.
    pub fn reverse_part_names(mut self) -> Self {
        self.reverse_part_names = true;
        self
    }

    /// Add an arbitrary extra part (e.g. media).
    pub fn part(mut self, name: &str, data: &[u8]) -> Self {
        self.extra_parts.push((name.to_string(), data.to_vec()));
        self
    }

    /// Serialize to PPTX bytes.
    pub fn build(&self) -> Vec<u8> {
        let count = self.slides.len();
        let part_number = |index: usize| {
            if self.reverse_part_names {
                count - index
            } else {
                index + 1
            }
        };

        let mut content_types = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
             <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
             <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
             <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
             <Override PartName=\"/ppt/presentation.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml\"/>",
        );
        for index in 0..count {
            let _ = write!(
                content_types,
                "<Override PartName=\"/ppt/slides/slide{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>",
                part_number(index)
            );
        }
        content_types.push_str("</Types>");

        let root_rels = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
             <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
             <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"ppt/presentation.xml\"/>\
             </Relationships>";

        let mut presentation = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n<p:presentation {NS}><p:sldIdLst>"
        );
        let mut presentation_rels = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
             <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
        );
        for index in 0..count {
            let number = part_number(index);
            let _ = write!(presentation, "<p:sldId id=\"{}\" r:id=\"rId{}\"/>", 256 + index, number + 10);
            let _ = write!(
                presentation_rels,
                "<Relationship Id=\"rId{}\" Type=\"{}\" Target=\"slides/slide{}.xml\"/>",
                number + 10,
                SLIDE_REL_TYPE,
                number
            );
        }
        presentation.push_str("</p:sldIdLst><p:sldSz cx=\"12192000\" cy=\"6858000\"/></p:presentation>");
        presentation_rels.push_str("</Relationships>");

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();

        let mut add = |name: &str, data: &[u8]| {
            zip.start_file(name, options).expect("start fixture entry");
            zip.write_all(data).expect("write fixture entry");
        };

        add("[Content_Types].xml", content_types.as_bytes());
        add("_rels/.rels", root_rels.as_bytes());
        add("ppt/presentation.xml", presentation.as_bytes());
        add("ppt/_rels/presentation.xml.rels", presentation_rels.as_bytes());
        for (index, slide) in self.slides.iter().enumerate() {
            add(&format!("ppt/slides/slide{}.xml", part_number(index)), slide.as_bytes());
        }
        for (name, data) in &self.extra_parts {
            add(name, data);
        }

        zip.finish().expect("finish fixture archive").into_inner()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
