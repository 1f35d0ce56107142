//! Text runs as values: content plus character formatting.
//!
//! A run (`a:r`) is read into a [`TextRun`], edited as a value, and written
//! back. Only the fields a run actually sets are captured, so writing a run
//! back never adds formatting that was inherited before.

use crate::xml::{Element, Node};
use deck_core::{RgbColor, StyleConfig};

/// Fill choices of `a:rPr`; at most one may be present.
const FILL_CHOICES: &[&str] = &["noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill"];

/// Color choices inside `a:solidFill`.
const COLOR_CHOICES: &[&str] = &["scrgbClr", "srgbClr", "hslClr", "sysClr", "schemeClr", "prstClr"];

/// `a:rPr` children that must come after a fill element.
const AFTER_FILL: &[&str] = &[
    "effectLst", "effectDag", "highlight", "uLnTx", "uLn", "uFillTx", "uFill", "latin", "ea", "cs",
    "sym", "hlinkClick", "hlinkMouseOver", "rtl", "extLst",
];

/// `a:rPr` children that must come after `a:latin`.
const AFTER_LATIN: &[&str] = &["ea", "cs", "sym", "hlinkClick", "hlinkMouseOver", "rtl", "extLst"];

/// Character formatting set directly on a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStyle {
    /// Latin typeface.
    pub font_name: Option<String>,
    /// Size in hundredths of a point.
    pub size: Option<u32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    /// Explicit sRGB color; theme colors are not captured.
    pub color: Option<RgbColor>,
}

impl RunStyle {
    /// Read the directly-set attributes of an `a:rPr` element.
    pub fn from_properties(rpr: &Element) -> Self {
        let color = rpr
            .child("solidFill")
            .and_then(|fill| fill.elements().find(|el| COLOR_CHOICES.contains(&el.local_name())))
            .filter(|color| color.is("srgbClr"))
            .and_then(|color| color.attr("val"))
            .and_then(|hex| RgbColor::from_hex(hex).ok());

        Self {
            font_name: rpr
                .child("latin")
                .and_then(|latin| latin.attr("typeface"))
                .map(str::to_string),
            size: rpr.attr("sz").and_then(|sz| sz.parse().ok()),
            bold: rpr.attr("b").and_then(parse_xsd_bool),
            italic: rpr.attr("i").and_then(parse_xsd_bool),
            color,
        }
    }

    /// Style carrying the non-null fields of a global override.
    pub fn from_overrides(config: &StyleConfig) -> Self {
        Self {
            font_name: config.font_name.clone(),
            size: config.font_size.map(|pt| pt * 100),
            bold: None,
            italic: None,
            color: config.color,
        }
    }

    /// Assign every non-null field onto `a:rPr`, leaving the others alone.
    pub fn apply_to(&self, rpr: &mut Element) {
        if let Some(size) = self.size {
            rpr.set_attr("sz", size.to_string());
        }
        if let Some(bold) = self.bold {
            rpr.set_attr("b", if bold { "1" } else { "0" });
        }
        if let Some(italic) = self.italic {
            rpr.set_attr("i", if italic { "1" } else { "0" });
        }
        if let Some(color) = self.color {
            set_solid_color(rpr, color);
        }
        if let Some(ref font_name) = self.font_name {
            set_latin_typeface(rpr, font_name);
        }
    }
}

/// A run's text together with its formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub style: RunStyle,
}

impl TextRun {
    /// Read an `a:r` element.
    pub fn from_element(run: &Element) -> Self {
        Self {
            text: run.children_named("t").map(|t| t.text()).collect(),
            style: run
                .child("rPr")
                .map(RunStyle::from_properties)
                .unwrap_or_default(),
        }
    }

    /// Same formatting, with every occurrence of `old` replaced by `new`.
    pub fn with_replaced_text(&self, old: &str, new: &str) -> Self {
        Self {
            text: self.text.replace(old, new),
            style: self.style.clone(),
        }
    }

    /// Write text and formatting back onto an `a:r` element.
    ///
    /// The run keeps a single `a:t`; formatting fields that are `None` are
    /// not touched.
    pub fn write_to(&self, run: &mut Element) {
        let t_name = run.qualified("t");
        run.remove_children(&["t"]);
        let mut t = Element::new(t_name);
        t.set_text(self.text.as_str());
        run.insert_ordered(t, &["extLst"]);

        if self.style != RunStyle::default() {
            self.style.apply_to(run_properties_mut(run));
        }
    }
}

/// `a:rPr` of a run, created as the first child when missing.
pub fn run_properties_mut(run: &mut Element) -> &mut Element {
    run.ensure_child("rPr", &["t", "extLst"])
}

fn set_solid_color(rpr: &mut Element, color: RgbColor) {
    let other_fills: Vec<&str> = FILL_CHOICES.iter().copied().filter(|f| *f != "solidFill").collect();
    rpr.remove_children(&other_fills);

    let fill = rpr.ensure_child("solidFill", AFTER_FILL);
    fill.remove_children(COLOR_CHOICES);
    let mut srgb = Element::new(fill.qualified("srgbClr"));
    srgb.set_attr("val", color.to_hex());
    fill.children.insert(0, Node::Element(srgb));
}

fn set_latin_typeface(rpr: &mut Element, font_name: &str) {
    match rpr.child_mut("latin") {
        Some(latin) => latin.set_attr("typeface", font_name),
        None => {
            let mut latin = Element::new(rpr.qualified("latin"));
            latin.set_attr("typeface", font_name);
            rpr.insert_ordered(latin, AFTER_LATIN);
        }
    }
}

fn parse_xsd_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
