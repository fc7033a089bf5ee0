//! GDF (XDVDFS) disc filesystem reader.
//!
//! Xbox and Xbox 360 game discs store their game partition in the XDVDFS
//! format. The partition starts at a format-dependent offset inside the
//! image; its volume descriptor sits 32 sectors in and points at the root
//! directory table. Directory tables are binary search trees of variable
//! length entries packed into 2048-byte sectors.

use std::collections::HashSet;
use std::fs::File;
use std::io::{ErrorKind, SeekFrom};
use std::path::Path;

use xdisc_core::util::{read_u16_le, read_u32_le, slice_at};
use xdisc_core::{AnalysisError, ReadSeek};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// GDF sector size.
pub const SECTOR_SIZE: u64 = 2048;

/// Volume descriptor sector, relative to the partition start.
const VOLUME_DESCRIPTOR_SECTOR: u64 = 32;

/// Magic at the start (and at offset 0x7EC) of the volume descriptor.
pub const VOLUME_MAGIC: &[u8; 20] = b"MICROSOFT*XBOX*MEDIA";

/// Offset of the trailing copy of the magic inside the volume descriptor.
const VOLUME_MAGIC_TAIL: usize = 0x7EC;

/// Partition offsets probed in order: XISO / bare partition, full XGD1
/// dump, XGD2, XGD3.
const PARTITION_OFFSETS: [u64; 4] = [0, 0x1830_0000, 0x0FD9_0000, 0x0208_0000];

/// Directory entry attribute bit for subdirectories.
const ATTR_DIRECTORY: u8 = 0x10;

/// Fixed part of a directory entry before the name.
const ENTRY_HEADER_SIZE: usize = 14;

/// Marker filling unused space in a directory sector.
const PADDING: u16 = 0xFFFF;

/// Directory tables larger than this are treated as corrupt.
const MAX_DIRECTORY_SIZE: u32 = 16 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A parsed directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    /// First sector of the file data, relative to the partition start
    pub sector: u32,
    pub size: u32,
    pub attributes: u8,
}

impl DirEntry {
    pub fn is_directory(&self) -> bool {
        self.attributes & ATTR_DIRECTORY != 0
    }
}

/// An opened GDF disc image.
///
/// Owns its reader; dropping the image releases the underlying file.
#[derive(Debug)]
pub struct GdfImage<R> {
    reader: R,
    /// Absolute byte offset of the game partition
    partition_offset: u64,
    image_len: u64,
    root_sector: u32,
    root_size: u32,
}

impl GdfImage<File> {
    /// Open an image file read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }
}

impl<R: ReadSeek> GdfImage<R> {
    /// Locate the XDVDFS volume descriptor and read the root directory location.
    pub fn from_reader(mut reader: R) -> Result<Self, AnalysisError> {
        let image_len = reader.seek(SeekFrom::End(0))?;

        for &partition_offset in &PARTITION_OFFSETS {
            let descriptor_offset = partition_offset + VOLUME_DESCRIPTOR_SECTOR * SECTOR_SIZE;
            if descriptor_offset + SECTOR_SIZE > image_len {
                continue;
            }

            let mut sector = vec![0u8; SECTOR_SIZE as usize];
            reader.seek(SeekFrom::Start(descriptor_offset))?;
            reader.read_exact(&mut sector)?;

            if &sector[..VOLUME_MAGIC.len()] != VOLUME_MAGIC
                || &sector[VOLUME_MAGIC_TAIL..VOLUME_MAGIC_TAIL + VOLUME_MAGIC.len()]
                    != VOLUME_MAGIC
            {
                continue;
            }

            let root_sector = read_u32_le(&sector, 0x14)?;
            let root_size = read_u32_le(&sector, 0x18)?;
            log::debug!(
                "GDF volume at 0x{:X}: root sector {}, root size {}",
                partition_offset,
                root_sector,
                root_size
            );

            return Ok(Self {
                reader,
                partition_offset,
                image_len,
                root_sector,
                root_size,
            });
        }

        Err(AnalysisError::invalid_format(
            "No XDVDFS volume descriptor found; this does not look like an Xbox or Xbox 360 image",
        ))
    }

    /// Byte offset of the game partition within the image.
    pub fn partition_offset(&self) -> u64 {
        self.partition_offset
    }

    /// Whether a file or directory exists at `path` (case-insensitive).
    ///
    /// Read errors count as "not present".
    pub fn exists(&mut self, path: &str) -> bool {
        matches!(self.find(path), Ok(Some(_)))
    }

    /// Read the full contents of the file at `path`.
    pub fn read_file(&mut self, path: &str) -> Result<Vec<u8>, AnalysisError> {
        let entry = self
            .find(path)?
            .ok_or_else(|| AnalysisError::not_found(path))?;
        if entry.is_directory() {
            return Err(AnalysisError::invalid_format(format!(
                "'{}' is a directory",
                path
            )));
        }
        self.read_extent(entry.sector, entry.size)
    }

    /// Resolve a `/` or `\` separated path to its directory entry.
    pub fn find(&mut self, path: &str) -> Result<Option<DirEntry>, AnalysisError> {
        let components: Vec<&str> = path
            .split(['/', '\\'])
            .filter(|c| !c.is_empty())
            .collect();
        if components.is_empty() {
            return Ok(None);
        }

        let (mut dir_sector, mut dir_size) = (self.root_sector, self.root_size);
        for (i, component) in components.iter().enumerate() {
            let table = self.read_directory_table(dir_sector, dir_size)?;
            let Some(entry) = find_in_table(&table, component) else {
                return Ok(None);
            };
            if i + 1 == components.len() {
                return Ok(Some(entry));
            }
            if !entry.is_directory() {
                return Ok(None);
            }
            dir_sector = entry.sector;
            dir_size = entry.size;
        }
        Ok(None)
    }

    /// List the entries of the root directory.
    pub fn root_entries(&mut self) -> Result<Vec<DirEntry>, AnalysisError> {
        let table = self.read_directory_table(self.root_sector, self.root_size)?;
        Ok(walk_table(&table, |_| false).0)
    }

    fn read_directory_table(&mut self, sector: u32, size: u32) -> Result<Vec<u8>, AnalysisError> {
        if size > MAX_DIRECTORY_SIZE {
            return Err(AnalysisError::corrupted_header(format!(
                "Directory table at sector {} claims {} bytes",
                sector, size
            )));
        }
        self.read_extent(sector, size)
    }

    fn read_extent(&mut self, sector: u32, size: u32) -> Result<Vec<u8>, AnalysisError> {
        let offset = self.partition_offset + sector as u64 * SECTOR_SIZE;
        let end = offset + size as u64;
        if end > self.image_len {
            return Err(AnalysisError::corrupted_header(format!(
                "Extent at sector {} ({} bytes) runs past end of image",
                sector, size
            )));
        }

        self.reader.seek(SeekFrom::Start(offset))?;
        let mut data = vec![0u8; size as usize];
        self.reader.read_exact(&mut data).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                AnalysisError::corrupted_header(format!("Sector {} is beyond end of image", sector))
            } else {
                AnalysisError::Io(e)
            }
        })?;
        Ok(data)
    }
}

// ---------------------------------------------------------------------------
// Directory table parsing
// ---------------------------------------------------------------------------

/// Find `name` (case-insensitive) in a directory table.
fn find_in_table(table: &[u8], name: &str) -> Option<DirEntry> {
    walk_table(table, |entry| entry.name.eq_ignore_ascii_case(name)).1
}

/// Visit every entry reachable from the start of the table.
///
/// Walks the whole tree instead of trusting its ordering, and tracks visited
/// offsets so a malformed table with cycles still terminates. An entry whose
/// name overruns the table is skipped, but its children are still visited.
/// Stops early when `stop` returns true and hands back that entry.
fn walk_table(
    table: &[u8],
    mut stop: impl FnMut(&DirEntry) -> bool,
) -> (Vec<DirEntry>, Option<DirEntry>) {
    let mut entries = Vec::new();
    let mut visited = HashSet::new();
    let mut pending = vec![0usize];

    while let Some(offset) = pending.pop() {
        if !visited.insert(offset) || offset + ENTRY_HEADER_SIZE > table.len() {
            continue;
        }

        let (Ok(left), Ok(right)) = (read_u16_le(table, offset), read_u16_le(table, offset + 2))
        else {
            continue;
        };
        if left == PADDING {
            continue;
        }
        if right != 0 {
            pending.push(right as usize * 4);
        }
        if left != 0 {
            pending.push(left as usize * 4);
        }

        match parse_entry(table, offset) {
            Ok(entry) if stop(&entry) => return (entries, Some(entry)),
            Ok(entry) => entries.push(entry),
            Err(e) => log::debug!("Skipping directory entry at offset {offset}: {e}"),
        }
    }

    (entries, None)
}

fn parse_entry(table: &[u8], offset: usize) -> Result<DirEntry, AnalysisError> {
    let sector = read_u32_le(table, offset + 4)?;
    let size = read_u32_le(table, offset + 8)?;
    let attributes = table[offset + 12];
    let name_len = table[offset + 13] as usize;
    let name_bytes = slice_at(table, offset + ENTRY_HEADER_SIZE, name_len)
        .map_err(|_| AnalysisError::corrupted_header("Directory entry name runs past table end"))?;

    Ok(DirEntry {
        name: String::from_utf8_lossy(name_bytes).into_owned(),
        sector,
        size,
        attributes,
    })
}

#[cfg(test)]
#[path = "tests/gdf_tests.rs"]
mod tests;
