//! Shared types for inspecting Xbox and Xbox 360 disc images.
//!
//! The parser crates report [`AnalysisError`]s; the extraction pipeline turns
//! those into a stream of [`ExtractionEvent`]s ending in either
//! [`Metadata`] or an [`ExtractionError`].

use std::io::{Read, Seek};

pub mod checksum;
pub mod error;
pub mod metadata;
pub mod platform;
pub mod progress;
pub mod util;

pub use checksum::{content_hash, hex_upper};
pub use error::{AnalysisError, ExtractionError};
pub use metadata::{Metadata, MetadataSummary, Thumbnail};
pub use platform::Platform;
pub use progress::{ExtractionEvent, Notice};

/// A reader that implements both Read and Seek.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}
