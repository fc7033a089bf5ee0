use crate::error::ExtractionError;
use crate::metadata::Metadata;

/// An event emitted by an extraction run.
///
/// Events arrive in emission order over a single channel. Any number of
/// `Progress` and `Notice` events may precede exactly one terminal event
/// (`Failed` or `Completed`).
#[derive(Debug)]
pub enum ExtractionEvent {
    /// Human-readable status update
    Progress(String),

    /// Non-fatal degraded outcome; the run continues with a fallback
    Notice(Notice),

    /// The run ended with an error
    Failed(ExtractionError),

    /// The run ended successfully
    Completed(Box<Metadata>),
}

impl ExtractionEvent {
    /// True for `Failed` and `Completed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Completed(_))
    }
}

/// Degraded outcomes that substitute a fallback instead of failing the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The disc carries both an Xbox and an Xbox 360 binary
    DualPlatform,

    /// A thumbnail candidate section could not be converted
    ThumbnailDecode { section: String, reason: String },

    /// A texture used a pixel format we do not decode; a blank image was used
    UnknownTextureFormat { section: String, tag: u8 },

    /// The resource tool output could not be parsed as XML
    ToolOutputParse(String),

    /// The game name was missing from the resource tool output
    NameLookup,

    /// The game icon was missing or undecodable
    IconLookup(String),
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DualPlatform => write!(
                f,
                "Dual platform game detected (both Xbox 360 and original Xbox). \
                 An Xbox 360 GOD package will be created and the original Xbox version will be discarded."
            ),
            Self::ThumbnailDecode { section, reason } => {
                write!(f, "Failed to convert {section} thumbnail to PNG.\n\n{reason}")
            }
            Self::UnknownTextureFormat { section, tag } => write!(
                f,
                "Unrecognized texture format 0x{tag:02X} in {section}; using a blank thumbnail."
            ),
            Self::ToolOutputParse(reason) => {
                write!(f, "Failed to parse xextool output! {reason}")
            }
            Self::NameLookup => write!(f, "Couldn't find game name in xextool output."),
            Self::IconLookup(reason) => {
                write!(f, "Couldn't find thumbnail in xextool output. {reason}")
            }
        }
    }
}
