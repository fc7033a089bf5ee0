//! Thumbnail decoding shared by both extraction paths.
//!
//! Xbox titles embed XPR textures that are decoded, stretched to a 64x64
//! square and re-encoded as PNG. Xbox 360 titles get a ready-made image
//! (base64 text from the resource tool) that only needs decoding.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use thiserror::Error;
use xdisc_core::{AnalysisError, Thumbnail};
use xdisc_microsoft::XprTexture;

/// Edge length of the square thumbnail canvas.
pub const THUMBNAIL_SIZE: u32 = 64;

/// Why a thumbnail could not be produced.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("{0}")]
    Texture(#[from] AnalysisError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("No image data")]
    Empty,
}

/// Outcome of decoding an XPR thumbnail.
#[derive(Debug)]
pub enum ThumbnailOutcome {
    Decoded(Thumbnail),
    /// The texture format is not decodable; the thumbnail is a blank canvas
    Blank { thumbnail: Thumbnail, tag: u8 },
}

impl ThumbnailOutcome {
    pub fn into_thumbnail(self) -> Thumbnail {
        match self {
            Self::Decoded(t) | Self::Blank { thumbnail: t, .. } => t,
        }
    }
}

/// Decode an XPR section into a 64x64 PNG thumbnail.
pub fn decode_xpr_thumbnail(section: &[u8]) -> Result<ThumbnailOutcome, ThumbnailError> {
    let texture = XprTexture::parse(section)?;
    log::debug!(
        "XPR texture {}x{} format tag 0x{:02X}",
        texture.width,
        texture.height,
        texture.tag
    );

    match texture.format.layout() {
        Some(layout) => {
            let decoded = texture.decode(layout)?;
            Ok(ThumbnailOutcome::Decoded(encode_thumbnail(&decoded)?))
        }
        None => Ok(ThumbnailOutcome::Blank {
            thumbnail: encode_thumbnail(&RgbaImage::new(THUMBNAIL_SIZE, THUMBNAIL_SIZE))?,
            tag: texture.tag,
        }),
    }
}

/// Stretch `source` onto the thumbnail canvas and encode it as PNG.
///
/// Point sampling, no aspect ratio preservation.
pub fn encode_thumbnail(source: &RgbaImage) -> Result<Thumbnail, ThumbnailError> {
    let image = imageops::resize(source, THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Nearest);
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(Thumbnail { image, bytes })
}

/// Decode a base64 encoded image file; the decoded file bytes are kept as-is.
pub fn decode_icon_thumbnail(base64_text: &str) -> Result<Thumbnail, ThumbnailError> {
    let compact: String = base64_text.split_whitespace().collect();
    if compact.is_empty() {
        return Err(ThumbnailError::Empty);
    }
    let bytes = STANDARD.decode(compact)?;
    let image = image::load_from_memory(&bytes)?.into_rgba8();
    Ok(Thumbnail { image, bytes })
}

#[cfg(test)]
#[path = "tests/thumbnail_tests.rs"]
mod tests;
