//! Persistent settings (tool location, working directory).
//!
//! Settings live in `~/.config/xdisc/settings.toml`:
//!
//! ```toml
//! [tools]
//! xextool = "/opt/xextool/xextool.exe"
//!
//! [paths]
//! work_dir = "/tmp/xdisc"
//! ```
//!
//! Every value is optional; each one resolves through a priority chain of
//! command-line override, settings file, then a built-in default.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Canonical path to the settings file: `~/.config/xdisc/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("xdisc").join("settings.toml")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub tools: ToolSettings,
    #[serde(default)]
    pub paths: PathSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSettings {
    pub xextool: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSettings {
    pub work_dir: Option<PathBuf>,
}

/// A settings value that can be saved with [`save_setting`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Xextool,
    WorkDir,
}

impl SettingKey {
    fn table_and_key(&self) -> (&'static str, &'static str) {
        match self {
            Self::Xextool => ("tools", "xextool"),
            Self::WorkDir => ("paths", "work_dir"),
        }
    }
}

impl Settings {
    /// Load from the canonical settings file; a missing or broken file gives defaults.
    pub fn load() -> Self {
        Self::load_from(&settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        toml::from_str(&contents).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable settings file {}: {e}", path.display());
            Self::default()
        })
    }

    /// Resolve the resource tool path: override, then settings, then a file
    /// named `xextool(.exe)` next to the running executable.
    pub fn resolve_xextool(&self, cli_override: Option<PathBuf>) -> PathBuf {
        if let Some(p) = cli_override {
            return p;
        }
        if let Some(p) = &self.tools.xextool {
            return p.clone();
        }
        let name = if cfg!(windows) { "xextool.exe" } else { "xextool" };
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(name)))
            .unwrap_or_else(|| PathBuf::from(name))
    }

    /// Resolve the working directory: override, then settings, then
    /// `<system temp>/xdisc`.
    pub fn resolve_work_dir(&self, cli_override: Option<PathBuf>) -> PathBuf {
        cli_override
            .or_else(|| self.paths.work_dir.clone())
            .unwrap_or_else(|| std::env::temp_dir().join("xdisc"))
    }
}

/// Save (or clear) one value in the canonical settings file.
pub fn save_setting(key: SettingKey, value: Option<&Path>) -> io::Result<()> {
    save_setting_at(&settings_path(), key, value)
}

/// Save (or clear) one value in the settings file at `settings`.
///
/// Uses `toml::Value` for a surgical update so unrelated keys are preserved.
pub fn save_setting_at(settings: &Path, key: SettingKey, value: Option<&Path>) -> io::Result<()> {
    let mut doc: toml::Value = if let Ok(contents) = std::fs::read_to_string(settings) {
        contents
            .parse()
            .unwrap_or_else(|_| toml::Value::Table(Default::default()))
    } else {
        toml::Value::Table(Default::default())
    };

    let (table_name, field) = key.table_and_key();
    let root = doc
        .as_table_mut()
        .ok_or_else(|| io::Error::other("settings.toml root is not a table"))?;
    let table = root
        .entry(table_name)
        .or_insert_with(|| toml::Value::Table(Default::default()))
        .as_table_mut()
        .ok_or_else(|| io::Error::other(format!("[{table_name}] is not a table")))?;

    match value {
        Some(p) => {
            table.insert(
                field.to_string(),
                toml::Value::String(p.to_string_lossy().into_owned()),
            );
        }
        None => {
            table.remove(field);
        }
    }

    // Write atomically
    if let Some(parent) = settings.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(&doc).map_err(io::Error::other)?;
    let tmp = settings.with_extension("toml.tmp");
    std::fs::write(&tmp, &serialized)?;
    std::fs::rename(&tmp, settings)?;

    Ok(())
}

/// Load the settings file as a pretty-printed TOML string for display.
pub fn load_settings_string() -> Option<String> {
    let contents = std::fs::read_to_string(settings_path()).ok()?;
    let doc: toml::Value = contents.parse().ok()?;
    toml::to_string_pretty(&doc).ok()
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
