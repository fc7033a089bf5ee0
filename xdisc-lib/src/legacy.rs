//! Original Xbox extraction: everything comes from `default.xbe` itself.

use xdisc_core::{ExtractionError, Metadata, Notice, Platform, content_hash};
use xdisc_microsoft::XbeInfo;
use xdisc_microsoft::xbe::{SAVE_IMAGE_SECTION, TITLE_IMAGE_SECTION};

use crate::pipeline::{DiscFs, Reporter};
use crate::thumbnail::{ThumbnailOutcome, decode_xpr_thumbnail};

/// Thumbnail candidates, in priority order.
const IMAGE_SECTIONS: [&str; 2] = [SAVE_IMAGE_SECTION, TITLE_IMAGE_SECTION];

/// Read `default.xbe` and build its metadata.
pub fn extract_xbox<D: DiscFs>(
    disc: &mut D,
    reporter: &Reporter<'_>,
) -> Result<Metadata, ExtractionError> {
    let file = Platform::Xbox.entry_binary();

    reporter.progress(format!("Locating {file}..."));
    let data = disc
        .read_file(file)
        .map_err(|e| ExtractionError::ReadBinary {
            file: file.to_string(),
            reason: e.to_string(),
        })?;

    reporter.progress(format!("Found! Reading {file}..."));
    let xbe = XbeInfo::parse(&data).map_err(|e| {
        log::warn!("{file} failed to parse: {e}");
        ExtractionError::InvalidBinary("Default.xbe".to_string())
    })?;

    let cert = &xbe.certificate;
    log::debug!(
        "XBE certificate version 0x{:X}, {} sections",
        cert.version,
        xbe.sections.len()
    );
    let mut metadata = Metadata::new(Platform::Xbox, cert.title_name.clone(), cert.title_id_hex());
    metadata.disc_number = disc_number_or_default(cert.disk_number);
    // Xbox titles are always packaged as a single disc
    metadata.disc_count = "1".to_string();
    metadata.content_hash = Some(content_hash(&data));

    reporter.progress("Extracting thumbnail...");
    for name in IMAGE_SECTIONS {
        if metadata.thumbnail.is_some() {
            break;
        }
        metadata.thumbnail = thumbnail_from_sections(&xbe, name, reporter);
    }

    Ok(metadata)
}

/// The certificate's disk number as text, with 0 meaning disc 1.
pub fn disc_number_or_default(disk_number: u32) -> String {
    if disk_number == 0 {
        "1".to_string()
    } else {
        disk_number.to_string()
    }
}

/// Try every section called `name` until one decodes.
fn thumbnail_from_sections(
    xbe: &XbeInfo,
    name: &str,
    reporter: &Reporter<'_>,
) -> Option<xdisc_core::Thumbnail> {
    for section in xbe.sections_named(name) {
        match decode_xpr_thumbnail(&section.data) {
            Ok(ThumbnailOutcome::Decoded(thumbnail)) => return Some(thumbnail),
            Ok(ThumbnailOutcome::Blank { thumbnail, tag }) => {
                reporter.notice(Notice::UnknownTextureFormat {
                    section: name.to_string(),
                    tag,
                });
                return Some(thumbnail);
            }
            Err(e) => reporter.notice(Notice::ThumbnailDecode {
                section: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }
    None
}

#[cfg(test)]
#[path = "tests/legacy_tests.rs"]
mod tests;
