//! The extraction pipeline: open the disc, detect the platform, run the
//! matching extraction path and report every step as an [`ExtractionEvent`].
//!
//! A run is a plain function ([`run_extraction`]) driven by a typed request
//! and a channel sender. [`spawn_extraction`] runs it on a dedicated worker
//! thread for callers that need to stay responsive (CLI spinner, GUI).

use std::any::Any;
use std::fs::File;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use xdisc_core::{
    AnalysisError, ExtractionError, ExtractionEvent, Metadata, Notice, Platform, ReadSeek,
};
use xdisc_microsoft::GdfImage;

use crate::classify::classify;
use crate::legacy::extract_xbox;
use crate::nextgen::extract_xbox360;

/// Everything a run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    /// Disc image to inspect
    pub iso_path: PathBuf,
    /// Writable directory shared with the resource tool
    pub work_dir: PathBuf,
    /// Path to the resource tool executable
    pub xextool_path: PathBuf,
}

impl ExtractionRequest {
    pub fn new(
        iso_path: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
        xextool_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            iso_path: iso_path.into(),
            work_dir: work_dir.into(),
            xextool_path: xextool_path.into(),
        }
    }
}

/// File lookups over a disc filesystem.
pub trait DiscFs {
    fn exists(&mut self, path: &str) -> bool;
    fn read_file(&mut self, path: &str) -> Result<Vec<u8>, AnalysisError>;
}

impl<R: ReadSeek> DiscFs for GdfImage<R> {
    fn exists(&mut self, path: &str) -> bool {
        GdfImage::exists(self, path)
    }

    fn read_file(&mut self, path: &str) -> Result<Vec<u8>, AnalysisError> {
        GdfImage::read_file(self, path)
    }
}

/// Sends events for one run and mirrors them to the log.
///
/// A dropped receiver is not an error; the run simply finishes unobserved.
pub struct Reporter<'a> {
    tx: &'a Sender<ExtractionEvent>,
}

impl<'a> Reporter<'a> {
    pub fn new(tx: &'a Sender<ExtractionEvent>) -> Self {
        Self { tx }
    }

    pub fn progress(&self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{message}");
        let _ = self.tx.send(ExtractionEvent::Progress(message));
    }

    pub fn notice(&self, notice: Notice) {
        log::warn!("{notice}");
        let _ = self.tx.send(ExtractionEvent::Notice(notice));
    }

    /// Send the terminal event for `result`.
    pub fn finish(&self, result: Result<Metadata, ExtractionError>) {
        let event = match result {
            Ok(metadata) => {
                log::info!("Extracted {} ({})", metadata.name, metadata.title_id);
                ExtractionEvent::Completed(Box::new(metadata))
            }
            Err(e) => {
                log::error!("{e}");
                ExtractionEvent::Failed(e)
            }
        };
        let _ = self.tx.send(event);
    }
}

/// Open a disc image, separating I/O faults from everything else.
pub fn open_disc(path: &Path) -> Result<GdfImage<File>, ExtractionError> {
    let disc = GdfImage::open(path).map_err(|e| match e {
        AnalysisError::Io(io) => ExtractionError::OpenFailed(io.to_string()),
        other => ExtractionError::OpenUnhandled(other.to_string()),
    })?;
    log::debug!("Game partition at offset 0x{:X}", disc.partition_offset());
    Ok(disc)
}

/// Run one extraction synchronously, ending with exactly one terminal event.
pub fn run_extraction(request: &ExtractionRequest, tx: &Sender<ExtractionEvent>) {
    let reporter = Reporter::new(tx);
    let result = open_disc(&request.iso_path)
        .and_then(|mut disc| extract_from_disc(&mut disc, request, &reporter));
    // The disc handle is dropped before the terminal event goes out.
    reporter.finish(result);
}

/// Classify an opened disc and run the matching extraction path.
pub fn extract_from_disc<D: DiscFs>(
    disc: &mut D,
    request: &ExtractionRequest,
    reporter: &Reporter<'_>,
) -> Result<Metadata, ExtractionError> {
    let detection = classify(
        disc.exists(Platform::Xbox360.entry_binary()),
        disc.exists(Platform::Xbox.entry_binary()),
    )?;
    if detection.dual_platform {
        reporter.notice(Notice::DualPlatform);
    }
    log::debug!("Detected {}", detection.platform);

    match detection.platform {
        Platform::Xbox => extract_xbox(disc, reporter),
        Platform::Xbox360 => extract_xbox360(disc, request, reporter),
    }
}

/// Run an extraction on a dedicated worker thread.
///
/// Events arrive on the returned receiver in emission order. The run cannot
/// be cancelled; the channel closes after the terminal event. A panic in the
/// worker is reported as [`ExtractionError::Unhandled`].
pub fn spawn_extraction(
    request: ExtractionRequest,
) -> io::Result<(JoinHandle<()>, Receiver<ExtractionEvent>)> {
    let (tx, rx) = mpsc::channel();
    let handle = thread::Builder::new()
        .name("xdisc-extract".to_string())
        .spawn(move || run_guarded(&tx, |tx| run_extraction(&request, tx)))?;
    Ok((handle, rx))
}

/// Call `run`, turning a panic into a terminal `Failed(Unhandled)` event.
fn run_guarded<F>(tx: &Sender<ExtractionEvent>, run: F)
where
    F: FnOnce(&Sender<ExtractionEvent>),
{
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| run(tx))) {
        let message = panic_message(&*payload);
        log::error!("Extraction worker panicked: {message}");
        let _ = tx.send(ExtractionEvent::Failed(ExtractionError::Unhandled(message)));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
