//! Error types for slide-deck detection and modification.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, classifying, or rewriting decks.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read, or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or serialization error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),

    /// The package is a valid archive but is missing a required part.
    #[error("Invalid or corrupted presentation: {0}")]
    CorruptedFile(String),

    /// A caller-supplied value is out of range or malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The classifier model or its tokenizer could not be loaded.
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// Tokenization of the input text failed.
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// The inference session failed to run.
    #[error("Inference error: {0}")]
    Inference(String),

    /// Fetching model files from the hub failed.
    #[error("Download error: {0}")]
    Download(String),
}

impl Error {
    /// Stable name of the error variant, reported to API clients as `error_type`.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::IoError(_) => "IoError",
            Error::UnsupportedFormat(_) => "UnsupportedFormat",
            Error::ZipError(_) => "ZipError",
            Error::XmlError(_) => "XmlError",
            Error::CorruptedFile(_) => "CorruptedFile",
            Error::InvalidInput(_) => "InvalidInput",
            Error::ModelLoad(_) => "ModelLoadError",
            Error::Tokenizer(_) => "TokenizerError",
            Error::Inference(_) => "InferenceError",
            Error::Download(_) => "DownloadError",
        }
    }
}
