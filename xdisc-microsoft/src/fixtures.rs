//! Builders for synthetic disc images and executables.
//!
//! Only compiled for tests (or with the `test-support` feature) so that
//! parser and pipeline tests can assemble minimal but structurally valid
//! inputs byte by byte.

use crate::gdf::{SECTOR_SIZE, VOLUME_MAGIC};
use crate::xex::{EXECUTION_INFO_KEY, ExecutionInfo, XEX_MAGIC};
use crate::xpr::XPR_MAGIC;

// ---------------------------------------------------------------------------
// GDF
// ---------------------------------------------------------------------------

enum Node {
    File(Vec<u8>),
    Dir(GdfDir),
}

/// A directory tree to be laid out as an XDVDFS partition.
#[derive(Default)]
pub struct GdfDir {
    entries: Vec<(String, Node)>,
}

impl GdfDir {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push((name.to_string(), Node::File(data.to_vec())));
        self
    }

    pub fn dir(mut self, name: &str, dir: GdfDir) -> Self {
        self.entries.push((name.to_string(), Node::Dir(dir)));
        self
    }

    /// Build an image with the partition at offset 0.
    pub fn build(&self) -> Vec<u8> {
        let sector = SECTOR_SIZE as usize;
        // Sectors 0..=32 are reserved; the descriptor is filled in last.
        let mut image = vec![0u8; 33 * sector];
        let (root_sector, root_size) = self.write_into(&mut image);

        let descriptor = &mut image[32 * sector..33 * sector];
        descriptor[..20].copy_from_slice(VOLUME_MAGIC);
        descriptor[0x14..0x18].copy_from_slice(&root_sector.to_le_bytes());
        descriptor[0x18..0x1C].copy_from_slice(&root_size.to_le_bytes());
        descriptor[0x7EC..0x7EC + 20].copy_from_slice(VOLUME_MAGIC);
        image
    }

    /// Append children then this directory's table; returns (sector, size).
    fn write_into(&self, image: &mut Vec<u8>) -> (u32, u32) {
        let mut placed = Vec::with_capacity(self.entries.len());
        for (name, node) in &self.entries {
            let (sector, size, attributes) = match node {
                Node::File(data) => {
                    let sector = append_extent(image, data);
                    (sector, data.len() as u32, 0x20u8)
                }
                Node::Dir(dir) => {
                    let (sector, size) = dir.write_into(image);
                    (sector, size, 0x10u8)
                }
            };
            placed.push((name.as_str(), sector, size, attributes));
        }

        let table = build_directory_table(&placed);
        let size = table.len() as u32;
        (append_extent(image, &table), size)
    }
}

/// Lay out entries as a right-leaning chain, never crossing a sector boundary.
fn build_directory_table(entries: &[(&str, u32, u32, u8)]) -> Vec<u8> {
    let sector = SECTOR_SIZE as usize;
    let mut table: Vec<u8> = Vec::new();
    let mut offsets = Vec::new();

    for (name, _, _, _) in entries {
        let len = (14 + name.len()).next_multiple_of(4);
        let room = sector - table.len() % sector;
        if len > room {
            table.resize(table.len() + room, 0xFF);
        }
        offsets.push(table.len());
        table.resize(table.len() + len, 0);
    }

    for (i, (name, start, size, attributes)) in entries.iter().enumerate() {
        let o = offsets[i];
        let right = offsets.get(i + 1).map_or(0u16, |next| (next / 4) as u16);
        table[o..o + 2].copy_from_slice(&0u16.to_le_bytes());
        table[o + 2..o + 4].copy_from_slice(&right.to_le_bytes());
        table[o + 4..o + 8].copy_from_slice(&start.to_le_bytes());
        table[o + 8..o + 12].copy_from_slice(&size.to_le_bytes());
        table[o + 12] = *attributes;
        table[o + 13] = name.len() as u8;
        table[o + 14..o + 14 + name.len()].copy_from_slice(name.as_bytes());
    }

    let padded = table.len().max(1).next_multiple_of(sector);
    table.resize(padded, 0xFF);
    table
}

/// Append `data` at the next sector boundary and return its sector number.
fn append_extent(image: &mut Vec<u8>, data: &[u8]) -> u32 {
    let sector = SECTOR_SIZE as usize;
    let start = image.len().next_multiple_of(sector);
    image.resize(start, 0);
    image.extend_from_slice(data);
    image.resize(image.len().next_multiple_of(sector), 0);
    (start / sector) as u32
}

// ---------------------------------------------------------------------------
// XBE
// ---------------------------------------------------------------------------

const XBE_BASE: u32 = 0x0001_0000;
const XBE_CERT_OFFSET: usize = 0x180;
const XBE_CERT_SIZE: usize = 0x1D0;

/// Build an XBE with the given certificate fields and named sections.
pub fn build_xbe(
    title_name: &str,
    title_id: u32,
    disk_number: u32,
    sections: &[(&str, Vec<u8>)],
) -> Vec<u8> {
    let headers_offset = XBE_CERT_OFFSET + XBE_CERT_SIZE;
    let names_offset = headers_offset + sections.len() * 0x38;
    let names_len: usize = sections.iter().map(|(n, _)| n.len() + 1).sum();
    let mut data_offset = (names_offset + names_len).next_multiple_of(16);

    let mut xbe = vec![0u8; data_offset];
    xbe[..4].copy_from_slice(b"XBEH");
    xbe[0x104..0x108].copy_from_slice(&XBE_BASE.to_le_bytes());
    xbe[0x118..0x11C].copy_from_slice(&(XBE_BASE + XBE_CERT_OFFSET as u32).to_le_bytes());
    xbe[0x11C..0x120].copy_from_slice(&(sections.len() as u32).to_le_bytes());
    xbe[0x120..0x124].copy_from_slice(&(XBE_BASE + headers_offset as u32).to_le_bytes());

    let cert = XBE_CERT_OFFSET;
    xbe[cert..cert + 4].copy_from_slice(&(XBE_CERT_SIZE as u32).to_le_bytes());
    xbe[cert + 0x08..cert + 0x0C].copy_from_slice(&title_id.to_le_bytes());
    for (i, unit) in title_name.encode_utf16().take(39).enumerate() {
        let o = cert + 0x0C + i * 2;
        xbe[o..o + 2].copy_from_slice(&unit.to_le_bytes());
    }
    xbe[cert + 0xA8..cert + 0xAC].copy_from_slice(&disk_number.to_le_bytes());

    let mut name_cursor = names_offset;
    for (i, (name, payload)) in sections.iter().enumerate() {
        let h = headers_offset + i * 0x38;
        xbe[h + 0x0C..h + 0x10].copy_from_slice(&(data_offset as u32).to_le_bytes());
        xbe[h + 0x10..h + 0x14].copy_from_slice(&(payload.len() as u32).to_le_bytes());
        xbe[h + 0x14..h + 0x18].copy_from_slice(&(XBE_BASE + name_cursor as u32).to_le_bytes());
        xbe[name_cursor..name_cursor + name.len()].copy_from_slice(name.as_bytes());
        name_cursor += name.len() + 1;

        xbe.resize(data_offset, 0);
        xbe.extend_from_slice(payload);
        data_offset = xbe.len().next_multiple_of(16);
    }
    xbe
}

// ---------------------------------------------------------------------------
// XEX
// ---------------------------------------------------------------------------

/// Build a XEX2 header, with an execution info block when `info` is given.
pub fn build_xex(info: Option<&ExecutionInfo>) -> Vec<u8> {
    let mut headers: Vec<(u32, u32)> = vec![(0x0001_00FF, 0)];
    let directory_end = 0x18 + 8 * (headers.len() + info.is_some() as usize);
    if info.is_some() {
        headers.push((EXECUTION_INFO_KEY, directory_end as u32));
    }

    let mut xex = vec![0u8; directory_end];
    xex[..4].copy_from_slice(XEX_MAGIC);
    xex[0x14..0x18].copy_from_slice(&(headers.len() as u32).to_be_bytes());
    for (i, (key, value)) in headers.iter().enumerate() {
        let o = 0x18 + i * 8;
        xex[o..o + 4].copy_from_slice(&key.to_be_bytes());
        xex[o + 4..o + 8].copy_from_slice(&value.to_be_bytes());
    }

    if let Some(info) = info {
        xex.extend_from_slice(&info.media_id);
        xex.extend_from_slice(&info.version.to_be_bytes());
        xex.extend_from_slice(&info.base_version.to_be_bytes());
        xex.extend_from_slice(&info.title_id);
        xex.extend_from_slice(&[
            info.platform,
            info.executable_type,
            info.disc_number,
            info.disc_count,
        ]);
        xex.extend_from_slice(&info.savegame_id.to_be_bytes());
    }
    xex.resize(xex.len() + 0x100, 0);
    xex
}

/// A representative execution info block.
pub fn sample_execution_info() -> ExecutionInfo {
    ExecutionInfo {
        media_id: [0x1A, 0x2B, 0x3C, 0x4D],
        version: 0x2000_0000,
        base_version: 0x2000_0000,
        title_id: [0x4D, 0x53, 0x08, 0x2F],
        platform: 0,
        executable_type: 0,
        disc_number: 1,
        disc_count: 2,
        savegame_id: 0,
    }
}

// ---------------------------------------------------------------------------
// XPR
// ---------------------------------------------------------------------------

/// Build an XPR0 resource with the given format tag, log2 dimensions and data.
pub fn build_xpr(tag: u8, width_log2: u32, height_log2: u32, pixel_data: &[u8]) -> Vec<u8> {
    const HEADER_SIZE: u32 = 0x800;
    let format = (height_log2 << 24) | (width_log2 << 20) | ((tag as u32) << 8) | 0x29;

    let mut xpr = vec![0u8; HEADER_SIZE as usize];
    xpr[..4].copy_from_slice(XPR_MAGIC);
    xpr[4..8].copy_from_slice(&(HEADER_SIZE + pixel_data.len() as u32).to_le_bytes());
    xpr[8..12].copy_from_slice(&HEADER_SIZE.to_le_bytes());
    xpr[0x0C..0x10].copy_from_slice(&0x0004_0001u32.to_le_bytes());
    xpr[0x18..0x1C].copy_from_slice(&format.to_le_bytes());
    xpr.extend_from_slice(pixel_data);
    xpr
}

/// An opaque single-color DXT1 texture of 2^`log2` square pixels.
pub fn build_dxt1_xpr(log2: u32, rgb565: u16) -> Vec<u8> {
    let side = 1usize << log2;
    let blocks = side.div_ceil(4) * side.div_ceil(4);
    let mut data = Vec::with_capacity(blocks * 8);
    for _ in 0..blocks {
        data.extend_from_slice(&rgb565.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
    }
    build_xpr(crate::xpr::TAG_DXT1, log2, log2, &data)
}
