//! Platform detection from the entry binaries present in the disc root.

use xdisc_core::{ExtractionError, Platform};

/// Result of classifying a disc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub platform: Platform,
    /// Both entry binaries were present; the Xbox one is ignored
    pub dual_platform: bool,
}

/// Decide the platform from the presence of `default.xex` and `default.xbe`.
///
/// Xbox 360 always wins when both are present.
pub fn classify(has_xex: bool, has_xbe: bool) -> Result<Detection, ExtractionError> {
    match (has_xex, has_xbe) {
        (true, dual_platform) => Ok(Detection {
            platform: Platform::Xbox360,
            dual_platform,
        }),
        (false, true) => Ok(Detection {
            platform: Platform::Xbox,
            dual_platform: false,
        }),
        (false, false) => Err(ExtractionError::NoEntryBinary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xex_only_is_xbox360() {
        let d = classify(true, false).unwrap();
        assert_eq!(d.platform, Platform::Xbox360);
        assert!(!d.dual_platform);
    }

    #[test]
    fn xbe_only_is_xbox() {
        let d = classify(false, true).unwrap();
        assert_eq!(d.platform, Platform::Xbox);
        assert!(!d.dual_platform);
    }

    #[test]
    fn both_prefers_xbox360_and_flags_dual() {
        let d = classify(true, true).unwrap();
        assert_eq!(d.platform, Platform::Xbox360);
        assert!(d.dual_platform);
    }

    #[test]
    fn neither_is_an_error() {
        assert!(matches!(
            classify(false, false),
            Err(ExtractionError::NoEntryBinary)
        ));
    }
}
