use image::RgbaImage;
use serde::Serialize;

use crate::platform::Platform;

/// Title metadata gathered from a disc image.
///
/// Built up field by field as each extraction stage succeeds, then moved
/// into the terminal `Completed` event.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub platform: Platform,

    /// Display name (may be a placeholder when the lookup failed)
    pub name: String,

    /// Title ID as upper-case hex
    pub title_id: String,

    /// Media ID as upper-case hex (Xbox 360 only)
    pub media_id: Option<String>,

    /// Platform tag from the XEX execution info (Xbox 360 only)
    pub platform_tag: Option<String>,

    /// Executable type from the XEX execution info (Xbox 360 only)
    pub executable_type: Option<String>,

    /// Disc number, decimal
    pub disc_number: String,

    /// Disc count, decimal
    pub disc_count: String,

    /// MD5 of the whole entry binary, lower-case hex (Xbox only)
    pub content_hash: Option<String>,

    pub thumbnail: Option<Thumbnail>,
}

impl Metadata {
    pub fn new(platform: Platform, name: impl Into<String>, title_id: impl Into<String>) -> Self {
        Self {
            platform,
            name: name.into(),
            title_id: title_id.into(),
            media_id: None,
            platform_tag: None,
            executable_type: None,
            disc_number: "1".to_string(),
            disc_count: "1".to_string(),
            content_hash: None,
            thumbnail: None,
        }
    }

    /// A serializable view of the text fields, for display and export.
    pub fn summary(&self) -> MetadataSummary {
        MetadataSummary {
            platform: self.platform,
            name: self.name.clone(),
            title_id: self.title_id.clone(),
            media_id: self.media_id.clone(),
            platform_tag: self.platform_tag.clone(),
            executable_type: self.executable_type.clone(),
            disc_number: self.disc_number.clone(),
            disc_count: self.disc_count.clone(),
            content_hash: self.content_hash.clone(),
            thumbnail_size: self.thumbnail.as_ref().map(|t| t.image.dimensions()),
        }
    }
}

/// [`Metadata`] without the thumbnail pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataSummary {
    pub platform: Platform,
    pub name: String,
    pub title_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable_type: Option<String>,
    pub disc_number: String,
    pub disc_count: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    /// Width and height of the thumbnail, if one was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_size: Option<(u32, u32)>,
}

/// A title thumbnail: the decoded raster and its encoded byte form.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub image: RgbaImage,
    /// Encoded image file (PNG for Xbox titles, the original resource for Xbox 360)
    pub bytes: Vec<u8>,
}

#[cfg(test)]
#[path = "tests/metadata_tests.rs"]
mod tests;
