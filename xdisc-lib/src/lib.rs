//! Extraction pipeline for Xbox and Xbox 360 disc images.
//!
//! Given an ISO, [`spawn_extraction`] (or [`run_extraction`] on the calling
//! thread) detects the platform, reads the entry binary and produces a
//! [`Metadata`](xdisc_core::Metadata) record, reporting progress and
//! recoverable problems as [`ExtractionEvent`](xdisc_core::ExtractionEvent)s.
//! Xbox 360 titles additionally need the external `xextool` program to
//! recover the title name and icon.

pub mod classify;
pub mod legacy;
pub mod nextgen;
pub mod pipeline;
pub mod settings;
pub mod thumbnail;
pub mod xextool;

pub use classify::{Detection, classify};
pub use pipeline::{
    DiscFs, ExtractionRequest, Reporter, extract_from_disc, open_disc, run_extraction,
    spawn_extraction,
};
pub use settings::{SettingKey, Settings};
pub use thumbnail::THUMBNAIL_SIZE;
