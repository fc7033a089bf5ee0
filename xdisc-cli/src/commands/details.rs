use std::fs;
use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use xdisc_core::{ExtractionEvent, Metadata, MetadataSummary};
use xdisc_lib::{ExtractionRequest, Settings, spawn_extraction};

use crate::CliError;
use crate::spinner::RunSpinner;

/// Run the details command.
pub(crate) fn run_details(
    iso: PathBuf,
    work_dir: Option<PathBuf>,
    xextool: Option<PathBuf>,
    thumbnail: Option<PathBuf>,
    as_toml: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let settings = Settings::load();
    let request = ExtractionRequest::new(
        iso,
        settings.resolve_work_dir(work_dir),
        settings.resolve_xextool(xextool),
    );
    log::debug!("Working directory: {}", request.work_dir.display());
    log::debug!("xextool: {}", request.xextool_path.display());

    log::info!(
        "{} {}",
        "Inspecting".if_supports_color(Stdout, |t| t.bold()),
        request.iso_path.display().if_supports_color(Stdout, |t| t.cyan()),
    );

    let metadata = collect_run(request, quiet)?;

    let summary = metadata.summary();
    if as_toml {
        let text = toml::to_string_pretty(&summary).map_err(|e| CliError::other(e.to_string()))?;
        println!("{text}");
    } else {
        for line in format_details(&summary) {
            log::info!("{line}");
        }
    }

    if let Some(path) = thumbnail {
        write_thumbnail(&metadata, &path)?;
    }
    Ok(())
}

/// Drive one extraction, rendering events until the terminal one arrives.
fn collect_run(request: ExtractionRequest, quiet: bool) -> Result<Metadata, CliError> {
    let (handle, rx) = spawn_extraction(request)?;
    let spinner = RunSpinner::new(quiet);

    let mut outcome = None;
    for event in rx {
        match event {
            ExtractionEvent::Progress(msg) => spinner.update(&msg),
            ExtractionEvent::Notice(notice) => spinner.suspend(|| {
                log::warn!(
                    "{} {}",
                    "Warning:".if_supports_color(Stdout, |t| t.yellow()),
                    notice
                );
            }),
            ExtractionEvent::Failed(e) => outcome = Some(Err(CliError::from(e))),
            ExtractionEvent::Completed(metadata) => outcome = Some(Ok(*metadata)),
        }
    }
    spinner.finish();

    if handle.join().is_err() {
        return Err(CliError::other("Extraction worker terminated abnormally"));
    }
    outcome.unwrap_or_else(|| Err(CliError::other("Extraction ended without a result")))
}

/// Format the summary as aligned label/value lines.
pub(crate) fn format_details(summary: &MetadataSummary) -> Vec<String> {
    let mut fields: Vec<(&str, String)> = vec![
        ("Platform:", summary.platform.display_name().to_string()),
        ("Name:", summary.name.clone()),
        ("Title ID:", summary.title_id.clone()),
    ];
    if let Some(media_id) = &summary.media_id {
        fields.push(("Media ID:", media_id.clone()));
    }
    fields.push((
        "Disc:",
        format!("{} of {}", summary.disc_number, summary.disc_count),
    ));
    if let Some(tag) = &summary.platform_tag {
        fields.push(("Platform tag:", tag.clone()));
    }
    if let Some(kind) = &summary.executable_type {
        fields.push(("Exec type:", kind.clone()));
    }
    if let Some(hash) = &summary.content_hash {
        fields.push(("MD5:", hash.clone()));
    }
    fields.push((
        "Thumbnail:",
        match summary.thumbnail_size {
            Some((w, h)) => format!("{w}x{h}"),
            None => "none".to_string(),
        },
    ));

    let width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    fields
        .into_iter()
        .map(|(label, value)| {
            let padding = " ".repeat(width - label.len());
            format!(
                "  {}{}  {}",
                label.if_supports_color(Stdout, |t| t.cyan()),
                padding,
                value
            )
        })
        .collect()
}

fn write_thumbnail(metadata: &Metadata, path: &Path) -> Result<(), CliError> {
    match &metadata.thumbnail {
        Some(thumbnail) => {
            fs::write(path, &thumbnail.bytes)?;
            log::info!(
                "{} {}",
                "Wrote thumbnail to".if_supports_color(Stdout, |t| t.green()),
                path.display()
            );
        }
        None => log::warn!("No thumbnail available; {} not written", path.display()),
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/details_tests.rs"]
mod tests;
