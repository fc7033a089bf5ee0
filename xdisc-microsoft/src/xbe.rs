//! Original Xbox executable (XBE) header parser.
//!
//! Only the parts needed for identification are read: the certificate
//! (title ID, title name, disk number) and the section table, whose
//! `$$XTIMAGE` / `$$XSIMAGE` sections carry the title's thumbnail.

use xdisc_core::AnalysisError;
use xdisc_core::util::{read_ascii, read_u32_le, read_utf16_le, slice_at};

/// XBE magic bytes.
pub const XBE_MAGIC: &[u8; 4] = b"XBEH";

/// Image header offsets.
const BASE_ADDRESS_OFFSET: usize = 0x104;
const CERTIFICATE_ADDRESS_OFFSET: usize = 0x118;
const SECTION_COUNT_OFFSET: usize = 0x11C;
const SECTION_HEADERS_ADDRESS_OFFSET: usize = 0x120;
const IMAGE_HEADER_SIZE: usize = 0x178;

/// Certificate field offsets.
const CERT_TITLE_ID: usize = 0x08;
const CERT_TITLE_NAME: usize = 0x0C;
const CERT_TITLE_NAME_LEN: usize = 80;
const CERT_DISK_NUMBER: usize = 0xA8;
const CERT_VERSION: usize = 0xAC;
const CERT_MIN_SIZE: usize = 0xB0;

/// Section header layout.
const SECTION_HEADER_SIZE: usize = 0x38;
const SECTION_RAW_ADDRESS: usize = 0x0C;
const SECTION_RAW_SIZE: usize = 0x10;
const SECTION_NAME_ADDRESS: usize = 0x14;

/// Section names are short; anything longer is garbage.
const MAX_SECTION_NAME: usize = 64;

/// Sanity cap on the section table.
const MAX_SECTIONS: u32 = 1024;

/// Title section holding the game's thumbnail.
pub const TITLE_IMAGE_SECTION: &str = "$$XTIMAGE";

/// Title section holding the save-game image.
pub const SAVE_IMAGE_SECTION: &str = "$$XSIMAGE";

/// The XBE certificate fields used for identification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XbeCertificate {
    pub title_id: u32,
    pub title_name: String,
    pub disk_number: u32,
    pub version: u32,
}

impl XbeCertificate {
    /// Title ID as eight upper-case hex digits.
    pub fn title_id_hex(&self) -> String {
        format!("{:08X}", self.title_id)
    }
}

/// A named XBE section and its raw bytes.
#[derive(Debug, Clone)]
pub struct XbeSection {
    pub name: String,
    pub data: Vec<u8>,
}

/// Parsed XBE header.
#[derive(Debug, Clone)]
pub struct XbeInfo {
    pub base_address: u32,
    pub certificate: XbeCertificate,
    pub sections: Vec<XbeSection>,
}

impl XbeInfo {
    /// Parse an XBE image. Any structural problem makes the whole binary invalid.
    pub fn parse(data: &[u8]) -> Result<Self, AnalysisError> {
        if data.len() < IMAGE_HEADER_SIZE {
            return Err(AnalysisError::TooSmall {
                expected: IMAGE_HEADER_SIZE as u64,
                actual: data.len() as u64,
            });
        }
        if &data[..4] != XBE_MAGIC {
            return Err(AnalysisError::invalid_format("Missing XBEH signature"));
        }

        let base_address = read_u32_le(data, BASE_ADDRESS_OFFSET)?;
        let to_offset = |va: u32, what: &str| -> Result<usize, AnalysisError> {
            va.checked_sub(base_address)
                .map(|o| o as usize)
                .ok_or_else(|| {
                    AnalysisError::corrupted_header(format!(
                        "{} address 0x{:08X} is below base address 0x{:08X}",
                        what, va, base_address
                    ))
                })
        };

        let cert_offset = to_offset(
            read_u32_le(data, CERTIFICATE_ADDRESS_OFFSET)?,
            "Certificate",
        )?;
        let cert = slice_at(data, cert_offset, CERT_MIN_SIZE)
            .map_err(|_| AnalysisError::corrupted_header("Certificate runs past end of XBE"))?;
        let certificate = XbeCertificate {
            title_id: read_u32_le(cert, CERT_TITLE_ID)?,
            title_name: read_utf16_le(
                &cert[CERT_TITLE_NAME..CERT_TITLE_NAME + CERT_TITLE_NAME_LEN],
            ),
            disk_number: read_u32_le(cert, CERT_DISK_NUMBER)?,
            version: read_u32_le(cert, CERT_VERSION)?,
        };

        let section_count = read_u32_le(data, SECTION_COUNT_OFFSET)?;
        if section_count > MAX_SECTIONS {
            return Err(AnalysisError::corrupted_header(format!(
                "Implausible section count {}",
                section_count
            )));
        }
        let headers_offset = to_offset(
            read_u32_le(data, SECTION_HEADERS_ADDRESS_OFFSET)?,
            "Section headers",
        )?;

        let mut sections = Vec::with_capacity(section_count as usize);
        for i in 0..section_count as usize {
            let header_offset = headers_offset + i * SECTION_HEADER_SIZE;
            let header = slice_at(data, header_offset, SECTION_HEADER_SIZE).map_err(|_| {
                AnalysisError::corrupted_header("Section table runs past end of XBE")
            })?;

            let raw_address = read_u32_le(header, SECTION_RAW_ADDRESS)? as usize;
            let raw_size = read_u32_le(header, SECTION_RAW_SIZE)? as usize;
            let name_offset =
                to_offset(read_u32_le(header, SECTION_NAME_ADDRESS)?, "Section name")?;

            let name_end = (name_offset + MAX_SECTION_NAME).min(data.len());
            let name = data
                .get(name_offset..name_end)
                .map(read_ascii)
                .ok_or_else(|| AnalysisError::corrupted_header("Section name outside XBE"))?;

            let section_data = slice_at(data, raw_address, raw_size).map_err(|_| {
                AnalysisError::corrupted_header(format!(
                    "Section '{}' data runs past end of XBE",
                    name
                ))
            })?;

            sections.push(XbeSection {
                name,
                data: section_data.to_vec(),
            });
        }

        Ok(Self {
            base_address,
            certificate,
            sections,
        })
    }

    /// All sections with the given name, in table order.
    pub fn sections_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XbeSection> {
        self.sections.iter().filter(move |s| s.name == name)
    }
}

#[cfg(test)]
#[path = "tests/xbe_tests.rs"]
mod tests;
