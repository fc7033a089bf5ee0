/// The two console families whose disc images can be inspected.
///
/// Each family is identified on disc by the presence of its entry binary
/// in the root of the GDF filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Original Xbox (boots `default.xbe`).
    Xbox,
    /// Xbox 360 (boots `default.xex`).
    Xbox360,
}

impl Platform {
    /// Full display name for the platform.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Xbox => "Microsoft Xbox",
            Self::Xbox360 => "Microsoft Xbox 360",
        }
    }

    /// Root-level file whose presence marks a disc as belonging to this platform.
    pub fn entry_binary(&self) -> &'static str {
        match self {
            Self::Xbox => "default.xbe",
            Self::Xbox360 => "default.xex",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
#[path = "tests/platform_tests.rs"]
mod tests;
