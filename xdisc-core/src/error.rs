use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the disc and executable format parsers.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// I/O error while reading the image
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The data is not in the expected format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The header is corrupted or points outside the data
    #[error("Corrupted header: {0}")]
    CorruptedHeader(String),

    /// The data is too small to contain the requested structure
    #[error("Data too small: expected at least {expected} bytes, got {actual}")]
    TooSmall { expected: u64, actual: u64 },

    /// A file was not found on the disc filesystem
    #[error("File '{0}' not found on disc")]
    NotFound(String),
}

impl AnalysisError {
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    pub fn corrupted_header(msg: impl Into<String>) -> Self {
        Self::CorruptedHeader(msg.into())
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }
}

/// Terminal errors that end an extraction run.
///
/// Messages are shown to the user verbatim, so they carry the full context
/// (which file, what to try next).
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The image file could not be opened or read at open time
    #[error("Failed to open ISO image. Reason:\n\n{0}")]
    OpenFailed(String),

    /// Opening the image failed for a reason other than I/O
    #[error("Unhandled exception occured when opening ISO image. Reason:\n\n{0}")]
    OpenUnhandled(String),

    /// Neither entry binary exists in the disc root
    #[error("Could not locate default.xex or default.xbe.")]
    NoEntryBinary,

    /// The entry binary could not be read from the disc
    #[error("Unable to extract {file}. Reason:\n\n{reason}")]
    ReadBinary { file: String, reason: String },

    /// Reading or persisting the Xbox 360 binary failed
    #[error(
        "A problem occured when reading the contents of the ISO image.\n\nPlease ensure this is a valid Xbox 360 ISO by running it through ABGX360.\n\n{0}"
    )]
    ReadImage(String),

    /// The entry binary exists but has no content
    #[error("Couldn't locate {0}. Please check this ISO is valid.")]
    MissingBinary(String),

    /// The entry binary failed header validation
    #[error("{0} is not valid.")]
    InvalidBinary(String),

    /// The XEX header carried no execution info, so there is nothing to fill in
    #[error("default.xex has no execution info; title metadata is unavailable.")]
    MissingExecutionInfo,

    /// The external resource tool is not at the configured location
    #[error(
        "Couldn't locate XexTool. Expected location was:\n{}\n\nTry disabling User Access Control if it's enabled.",
        .0.display()
    )]
    ToolNotFound(PathBuf),

    /// The external resource tool exists but could not be started
    #[error("Could not launch XexTool! {0}")]
    ToolLaunch(String),

    /// The worker failed in an unexpected way
    #[error("Unhandled error during extraction: {0}")]
    Unhandled(String),
}
