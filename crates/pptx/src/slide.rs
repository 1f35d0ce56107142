//! Navigation over a slide part's shape tree.

use crate::xml::Element;

/// Local names of the elements that count as shapes inside `p:spTree`.
const SHAPE_ELEMENTS: &[&str] = &["sp", "grpSp", "graphicFrame", "pic", "cxnSp", "contentPart"];

/// Whether an element is a shape (as opposed to tree properties or extensions).
pub fn is_shape(element: &Element) -> bool {
    SHAPE_ELEMENTS.contains(&element.local_name())
}

/// The `p:spTree` of a slide root (`p:sld`).
pub fn shape_tree(slide_root: &Element) -> Option<&Element> {
    slide_root.child("cSld")?.child("spTree")
}

/// Mutable variant of [`shape_tree`].
pub fn shape_tree_mut(slide_root: &mut Element) -> Option<&mut Element> {
    slide_root.child_mut("cSld")?.child_mut("spTree")
}

/// Direct child shapes of a shape tree or group.
pub fn shapes(container: &Element) -> impl Iterator<Item = &Element> {
    container.elements().filter(|el| is_shape(el))
}

/// The `a:tbl` inside a graphic frame, if it holds a table.
pub fn table(graphic_frame: &Element) -> Option<&Element> {
    graphic_frame.child("graphic")?.child("graphicData")?.child("tbl")
}

/// Mutable variant of [`table`].
pub fn table_mut(graphic_frame: &mut Element) -> Option<&mut Element> {
    graphic_frame
        .child_mut("graphic")?
        .child_mut("graphicData")?
        .child_mut("tbl")
}

/// Text bodies of every cell of a table, row by row.
pub fn cell_bodies(table: &Element) -> impl Iterator<Item = &Element> {
    table
        .children_named("tr")
        .flat_map(|row| row.children_named("tc"))
        .filter_map(|cell| cell.child("txBody"))
}

/// Mutable variant of [`cell_bodies`].
pub fn cell_bodies_mut(table: &mut Element) -> impl Iterator<Item = &mut Element> {
    table
        .children_named_mut("tr")
        .flat_map(|row| row.children_named_mut("tc"))
        .filter_map(|cell| cell.child_mut("txBody"))
}

/// Soft line break (`a:br`) inside a paragraph's text.
pub const LINE_BREAK: char = '\u{0B}';

/// Plain text of one paragraph (`a:p`): runs, fields, and line breaks.
/// A line break reads as a vertical tab so it stays distinct from the
/// newline between paragraphs.
pub fn paragraph_text(paragraph: &Element) -> String {
    let mut text = String::new();
    for child in paragraph.elements() {
        match child.local_name() {
            "r" | "fld" => {
                for t in child.children_named("t") {
                    text.push_str(&t.text());
                }
            }
            "br" => text.push(LINE_BREAK),
            _ => {}
        }
    }
    text
}

/// Every `a:r` of a text body, paragraph by paragraph.
pub fn runs_mut(text_body: &mut Element) -> impl Iterator<Item = &mut Element> {
    text_body
        .children_named_mut("p")
        .flat_map(|paragraph| paragraph.children_named_mut("r"))
}
