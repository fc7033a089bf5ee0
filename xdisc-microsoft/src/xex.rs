//! Xbox 360 executable (XEX2) header parser.
//!
//! The XEX header is big-endian. After a fixed 0x18-byte prologue comes a
//! directory of optional headers, each a `(key, value)` pair. For keys whose
//! low byte is 0x00 or 0x01 the value is inline; otherwise it is a file
//! offset to the header data. We only need the execution info block.

use xdisc_core::AnalysisError;
use xdisc_core::util::{read_u32_be, slice_at};

/// XEX2 magic bytes.
pub const XEX_MAGIC: &[u8; 4] = b"XEX2";

const MODULE_FLAGS_OFFSET: usize = 0x04;
const HEADER_COUNT_OFFSET: usize = 0x14;
const HEADER_DIRECTORY_OFFSET: usize = 0x18;
const HEADER_ENTRY_SIZE: usize = 8;

/// Optional header key for the execution info block.
pub const EXECUTION_INFO_KEY: u32 = 0x0004_0006;

const EXECUTION_INFO_SIZE: usize = 24;

/// Sanity cap on the optional header directory.
const MAX_OPTIONAL_HEADERS: u32 = 0x1000;

/// Title identifiers and disc numbering from a XEX execution info block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionInfo {
    pub media_id: [u8; 4],
    pub version: u32,
    pub base_version: u32,
    pub title_id: [u8; 4],
    pub platform: u8,
    pub executable_type: u8,
    pub disc_number: u8,
    pub disc_count: u8,
    pub savegame_id: u32,
}

impl ExecutionInfo {
    fn parse(block: &[u8]) -> Result<Self, AnalysisError> {
        let bytes4 = |offset: usize| -> Result<[u8; 4], AnalysisError> {
            let b = slice_at(block, offset, 4)?;
            Ok([b[0], b[1], b[2], b[3]])
        };
        Ok(Self {
            media_id: bytes4(0x00)?,
            version: read_u32_be(block, 0x04)?,
            base_version: read_u32_be(block, 0x08)?,
            title_id: bytes4(0x0C)?,
            platform: block[0x10],
            executable_type: block[0x11],
            disc_number: block[0x12],
            disc_count: block[0x13],
            savegame_id: read_u32_be(block, 0x14)?,
        })
    }
}

/// Parsed XEX2 header.
#[derive(Debug, Clone)]
pub struct XexInfo {
    pub module_flags: u32,
    /// Every optional header key present, in directory order
    pub header_keys: Vec<u32>,
    pub execution_info: Option<ExecutionInfo>,
}

impl XexInfo {
    pub fn parse(data: &[u8]) -> Result<Self, AnalysisError> {
        if data.len() < HEADER_DIRECTORY_OFFSET {
            return Err(AnalysisError::TooSmall {
                expected: HEADER_DIRECTORY_OFFSET as u64,
                actual: data.len() as u64,
            });
        }
        if &data[..4] != XEX_MAGIC {
            return Err(AnalysisError::invalid_format("Missing XEX2 signature"));
        }

        let module_flags = read_u32_be(data, MODULE_FLAGS_OFFSET)?;
        let header_count = read_u32_be(data, HEADER_COUNT_OFFSET)?;
        if header_count > MAX_OPTIONAL_HEADERS {
            return Err(AnalysisError::corrupted_header(format!(
                "Implausible optional header count {}",
                header_count
            )));
        }

        let mut header_keys = Vec::with_capacity(header_count as usize);
        let mut execution_info = None;
        for i in 0..header_count as usize {
            let entry_offset = HEADER_DIRECTORY_OFFSET + i * HEADER_ENTRY_SIZE;
            let entry = slice_at(data, entry_offset, HEADER_ENTRY_SIZE).map_err(|_| {
                AnalysisError::corrupted_header("Optional header directory truncated")
            })?;
            let key = read_u32_be(entry, 0)?;
            let value = read_u32_be(entry, 4)?;
            header_keys.push(key);

            if key == EXECUTION_INFO_KEY {
                let block = slice_at(data, value as usize, EXECUTION_INFO_SIZE).map_err(|_| {
                    AnalysisError::corrupted_header("Execution info points past end of XEX")
                })?;
                execution_info = Some(ExecutionInfo::parse(block)?);
            }
        }

        if execution_info.is_none() {
            log::debug!("XEX has {} optional headers but no execution info", header_count);
        }

        Ok(Self {
            module_flags,
            header_keys,
            execution_info,
        })
    }
}

#[cfg(test)]
#[path = "tests/xex_tests.rs"]
mod tests;
