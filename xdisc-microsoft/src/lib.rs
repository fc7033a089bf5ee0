//! Microsoft console disc and executable formats.
//!
//! This crate parses the on-disc structures needed to identify a title:
//!
//! - GDF / XDVDFS disc filesystem (Xbox and Xbox 360)
//! - XBE executables (Xbox)
//! - XEX2 executables (Xbox 360)
//! - XPR texture containers embedded in XBE sections

pub mod gdf;
pub mod xbe;
pub mod xex;
pub mod xpr;

#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;

pub use gdf::GdfImage;
pub use xbe::{XbeCertificate, XbeInfo, XbeSection};
pub use xex::{ExecutionInfo, XexInfo};
pub use xpr::{PixelLayout, XprFormat, XprTexture};
