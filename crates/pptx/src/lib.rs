//! PPTX (Office Open XML) backend: slide text extraction and in-place editing.
//!
//! A .pptx file is a ZIP archive of XML parts. The package is loaded into
//! memory, slide parts are parsed into a small mutable tree, and edited parts
//! are written back into a new archive.

pub mod modifier;
pub mod package;
pub mod parser;
pub mod run;
pub mod slide;
pub mod xml;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use modifier::PptxModifier;
pub use package::PptxPackage;
pub use parser::PptxReader;
pub use run::{RunStyle, TextRun};
