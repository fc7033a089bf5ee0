//! Xbox 360 extraction: coarse identifiers from the XEX header, name and
//! icon from the external resource tool.

use std::fs;

use xdisc_core::{AnalysisError, ExtractionError, Metadata, Notice, Platform, hex_upper};
use xdisc_microsoft::{ExecutionInfo, XexInfo};

use crate::pipeline::{DiscFs, ExtractionRequest, Reporter};
use crate::thumbnail::decode_icon_thumbnail;
use crate::xextool::{
    GAME_ICON_PATH, GAME_NAME_PATH, ToolDocument, XEX_FILE_NAME, repair_char_refs, run_tool,
};

/// Name used when the tool output has no title name.
pub const NAME_PLACEHOLDER: &str = "Unable to read name.";

/// Read `default.xex`, run the resource tool over it and build its metadata.
pub fn extract_xbox360<D: DiscFs>(
    disc: &mut D,
    request: &ExtractionRequest,
    reporter: &Reporter<'_>,
) -> Result<Metadata, ExtractionError> {
    let file = Platform::Xbox360.entry_binary();

    reporter.progress(format!("Locating {file}..."));
    let data = disc.read_file(file).map_err(|e| match e {
        AnalysisError::NotFound(_) => ExtractionError::MissingBinary(file.to_string()),
        other => ExtractionError::ReadImage(other.to_string()),
    })?;

    reporter.progress(format!("Extracting {file}..."));
    if data.is_empty() {
        return Err(ExtractionError::MissingBinary(file.to_string()));
    }
    let persisted = request.work_dir.join(XEX_FILE_NAME);
    fs::create_dir_all(&request.work_dir)
        .and_then(|()| fs::write(&persisted, &data))
        .map_err(|e| ExtractionError::ReadImage(e.to_string()))?;
    log::debug!("Wrote {} bytes to {}", data.len(), persisted.display());

    reporter.progress(format!("Found! Reading {file}..."));
    let xex = XexInfo::parse(&data).map_err(|e| {
        log::warn!("{file} failed to parse: {e}");
        ExtractionError::InvalidBinary("Default.xex".to_string())
    })?;
    log::debug!("XEX module flags 0x{:08X}", xex.module_flags);

    // Without execution info there is nothing to seed; the gap surfaces once
    // the name is filled in below.
    let seeded = xex.execution_info.as_ref().map(seed_metadata);

    reporter.progress("Extracting resources...");
    let raw_output = run_tool(&request.xextool_path, &request.work_dir)?;

    reporter.progress("Parsing xextool output...");
    let document = match ToolDocument::parse(&repair_char_refs(&raw_output)) {
        Ok(doc) => {
            if doc.is_empty() {
                log::debug!("xextool output contained no elements");
            }
            doc
        }
        Err(e) => {
            reporter.notice(Notice::ToolOutputParse(e.to_string()));
            ToolDocument::default()
        }
    };

    let mut metadata = seeded.ok_or(ExtractionError::MissingExecutionInfo)?;

    reporter.progress("Extracting name...");
    metadata.name = match document.get(GAME_NAME_PATH) {
        Some(name) => name.to_string(),
        None => {
            reporter.notice(Notice::NameLookup);
            NAME_PLACEHOLDER.to_string()
        }
    };

    reporter.progress("Extracting thumbnail...");
    let icon = document
        .get(GAME_ICON_PATH)
        .ok_or_else(|| format!("{GAME_ICON_PATH} not present"))
        .and_then(|text| decode_icon_thumbnail(text).map_err(|e| e.to_string()));
    match icon {
        Ok(thumbnail) => metadata.thumbnail = Some(thumbnail),
        Err(reason) => reporter.notice(Notice::IconLookup(reason)),
    }

    Ok(metadata)
}

/// Metadata from the execution info block; the name is filled in later.
pub fn seed_metadata(info: &ExecutionInfo) -> Metadata {
    let mut metadata = Metadata::new(Platform::Xbox360, "", hex_upper(&info.title_id));
    metadata.media_id = Some(hex_upper(&info.media_id));
    metadata.platform_tag = Some(info.platform.to_string());
    metadata.executable_type = Some(info.executable_type.to_string());
    metadata.disc_number = info.disc_number.to_string();
    metadata.disc_count = info.disc_count.to_string();
    metadata
}

#[cfg(test)]
#[path = "tests/nextgen_tests.rs"]
mod tests;
