//! XPR0 texture container decoder.
//!
//! XBE title images are stored as XPR resources: a small header followed by
//! a single NV2A texture. The texture format dword packs the pixel format tag
//! and the log2 of each dimension. Two layouts are decoded:
//!
//! - A8R8G8B8, either swizzled (tag 0x06) or linear (tag 0x12)
//! - DXT1 block compression (tag 0x0C)

use image::{Rgba, RgbaImage};
use xdisc_core::AnalysisError;
use xdisc_core::util::{read_u32_le, slice_at};

/// XPR magic bytes.
pub const XPR_MAGIC: &[u8; 4] = b"XPR0";

const HEADER_SIZE_OFFSET: usize = 0x08;
const TEXTURE_FORMAT_OFFSET: usize = 0x18;
const MIN_HEADER_SIZE: usize = 0x1C;

/// Largest supported log2 dimension (4096 pixels).
const MAX_DIMENSION_LOG2: u32 = 12;

pub const TAG_ARGB_SWIZZLED: u8 = 0x06;
pub const TAG_DXT1: u8 = 0x0C;
pub const TAG_ARGB_LINEAR: u8 = 0x12;

/// Pixel format of an XPR texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XprFormat {
    Argb { swizzled: bool },
    Dxt1,
    /// Any tag we do not decode
    Unknown(u8),
}

impl XprFormat {
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            TAG_ARGB_SWIZZLED => Self::Argb { swizzled: true },
            TAG_ARGB_LINEAR => Self::Argb { swizzled: false },
            TAG_DXT1 => Self::Dxt1,
            other => Self::Unknown(other),
        }
    }

    /// The pixel layout used to decode this format, if supported.
    pub fn layout(&self) -> Option<PixelLayout> {
        match self {
            Self::Argb { .. } => Some(PixelLayout::Argb),
            Self::Dxt1 => Some(PixelLayout::Dxt1),
            Self::Unknown(_) => None,
        }
    }
}

/// The two pixel layouts the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Argb,
    Dxt1,
}

/// A parsed XPR texture borrowing its resource bytes.
///
/// `parse` only checks the signature and reads the format dword; dimension
/// limits and the pixel data offset are validated by `decode`.
#[derive(Debug, Clone)]
pub struct XprTexture<'a> {
    pub width: u32,
    pub height: u32,
    pub tag: u8,
    pub format: XprFormat,
    header_size: usize,
    bytes: &'a [u8],
}

impl<'a> XprTexture<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, AnalysisError> {
        if bytes.len() < MIN_HEADER_SIZE {
            return Err(AnalysisError::TooSmall {
                expected: MIN_HEADER_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }
        if &bytes[..4] != XPR_MAGIC {
            return Err(AnalysisError::invalid_format("Missing XPR0 signature"));
        }

        let header_size = read_u32_le(bytes, HEADER_SIZE_OFFSET)? as usize;
        let format_word = read_u32_le(bytes, TEXTURE_FORMAT_OFFSET)?;

        let tag = ((format_word >> 8) & 0xFF) as u8;
        let width_log2 = (format_word >> 20) & 0xF;
        let height_log2 = (format_word >> 24) & 0xF;

        Ok(Self {
            width: 1 << width_log2,
            height: 1 << height_log2,
            tag,
            format: XprFormat::from_tag(tag),
            header_size,
            bytes,
        })
    }

    /// Decode the texture as `layout`.
    pub fn decode(&self, layout: PixelLayout) -> Result<RgbaImage, AnalysisError> {
        let data = self.pixel_data()?;
        match layout {
            PixelLayout::Argb => {
                let swizzled = !matches!(self.format, XprFormat::Argb { swizzled: false });
                decode_argb(data, self.width, self.height, swizzled)
            }
            PixelLayout::Dxt1 => decode_dxt1(data, self.width, self.height),
        }
    }

    fn pixel_data(&self) -> Result<&'a [u8], AnalysisError> {
        let max = 1u32 << MAX_DIMENSION_LOG2;
        if self.width > max || self.height > max {
            return Err(AnalysisError::corrupted_header(format!(
                "Texture dimensions {}x{} exceed the supported maximum",
                self.width, self.height
            )));
        }
        self.bytes.get(self.header_size..).ok_or_else(|| {
            AnalysisError::corrupted_header(format!(
                "XPR header size {} exceeds resource size {}",
                self.header_size,
                self.bytes.len()
            ))
        })
    }
}

// ---------------------------------------------------------------------------
// A8R8G8B8
// ---------------------------------------------------------------------------

fn decode_argb(
    data: &[u8],
    width: u32,
    height: u32,
    swizzled: bool,
) -> Result<RgbaImage, AnalysisError> {
    let needed = width as usize * height as usize * 4;
    let pixels = slice_at(data, 0, needed)?;

    let mut img = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let index = if swizzled {
                swizzle_index(x, y, width, height)
            } else {
                (y * width + x) as usize
            };
            // Little-endian ARGB: B, G, R, A in memory
            let p = &pixels[index * 4..index * 4 + 4];
            img.put_pixel(x, y, Rgba([p[2], p[1], p[0], p[3]]));
        }
    }
    Ok(img)
}

/// Linear index of texel (x, y) in an NV2A swizzled (Morton order) texture.
///
/// Bits of x and y are interleaved, x first, until the smaller dimension runs
/// out; the remaining bits of the larger dimension follow.
fn swizzle_index(x: u32, y: u32, width: u32, height: u32) -> usize {
    let (mut x, mut y) = (x, y);
    let (mut w, mut h) = (width, height);
    let mut index = 0usize;
    let mut shift = 0;
    while w > 1 || h > 1 {
        if w > 1 {
            index |= ((x & 1) as usize) << shift;
            shift += 1;
            x >>= 1;
            w >>= 1;
        }
        if h > 1 {
            index |= ((y & 1) as usize) << shift;
            shift += 1;
            y >>= 1;
            h >>= 1;
        }
    }
    index
}

// ---------------------------------------------------------------------------
// DXT1
// ---------------------------------------------------------------------------

fn decode_dxt1(data: &[u8], width: u32, height: u32) -> Result<RgbaImage, AnalysisError> {
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let needed = blocks_x as usize * blocks_y as usize * 8;
    let blocks = slice_at(data, 0, needed)?;

    let mut img = RgbaImage::new(width, height);
    for (i, block) in blocks.chunks_exact(8).enumerate() {
        let bx = (i as u32 % blocks_x) * 4;
        let by = (i as u32 / blocks_x) * 4;

        let c0 = u16::from_le_bytes([block[0], block[1]]);
        let c1 = u16::from_le_bytes([block[2], block[3]]);
        let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
        let palette = dxt1_palette(c0, c1);

        for texel in 0..16u32 {
            let (x, y) = (bx + texel % 4, by + texel / 4);
            if x < width && y < height {
                let color = palette[((indices >> (texel * 2)) & 0x3) as usize];
                img.put_pixel(x, y, color);
            }
        }
    }
    Ok(img)
}

fn dxt1_palette(c0: u16, c1: u16) -> [Rgba<u8>; 4] {
    let a = rgb565(c0);
    let b = rgb565(c1);
    let mix = |wa: u16, wb: u16, div: u16| -> Rgba<u8> {
        let ch = |i: usize| ((a[i] as u16 * wa + b[i] as u16 * wb) / div) as u8;
        Rgba([ch(0), ch(1), ch(2), 0xFF])
    };

    if c0 > c1 {
        [
            Rgba([a[0], a[1], a[2], 0xFF]),
            Rgba([b[0], b[1], b[2], 0xFF]),
            mix(2, 1, 3),
            mix(1, 2, 3),
        ]
    } else {
        [
            Rgba([a[0], a[1], a[2], 0xFF]),
            Rgba([b[0], b[1], b[2], 0xFF]),
            mix(1, 1, 2),
            Rgba([0, 0, 0, 0]),
        ]
    }
}

fn rgb565(c: u16) -> [u8; 3] {
    let r = ((c >> 11) & 0x1F) as u8;
    let g = ((c >> 5) & 0x3F) as u8;
    let b = (c & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

#[cfg(test)]
#[path = "tests/xpr_tests.rs"]
mod tests;
