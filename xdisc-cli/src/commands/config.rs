use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use xdisc_lib::settings::{self, SettingKey, Settings};

use crate::CliError;

/// Show the settings file, stored values and what each resolves to.
pub(crate) fn run_config_show() {
    let path = settings::settings_path();
    let loaded = Settings::load();

    log::info!(
        "{}",
        "xdisc Configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    crate::log_blank();

    if path.exists() {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        );
    } else {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    crate::log_blank();

    let rows = [
        (
            "xextool",
            loaded.tools.xextool.is_some(),
            loaded.resolve_xextool(None),
        ),
        (
            "work_dir",
            loaded.paths.work_dir.is_some(),
            loaded.resolve_work_dir(None),
        ),
    ];
    for (name, from_file, resolved) in rows {
        let source = if from_file { "(settings)" } else { "(default)" };
        log::info!(
            "  {:<10} {} {}",
            name,
            resolved.display(),
            source.if_supports_color(Stdout, |t| t.dimmed()),
        );
    }

    if let Some(contents) = settings::load_settings_string() {
        crate::log_blank();
        for line in contents.lines() {
            log::info!("  {}", line.if_supports_color(Stdout, |t| t.dimmed()));
        }
    }
}

/// Print the settings file path.
pub(crate) fn run_config_path() {
    log::info!("{}", settings::settings_path().display());
}

/// Store (or clear) one setting.
pub(crate) fn run_config_set(key: SettingKey, value: Option<PathBuf>) -> Result<(), CliError> {
    let value = value.map(absolutize).transpose()?;
    settings::save_setting(key, value.as_deref())
        .map_err(|e| CliError::config(format!("Failed to save settings: {e}")))?;

    let name = match key {
        SettingKey::Xextool => "xextool",
        SettingKey::WorkDir => "work_dir",
    };
    match value {
        Some(v) => log::info!(
            "{} {} = {}",
            "Saved".if_supports_color(Stdout, |t| t.green()),
            name,
            v.display()
        ),
        None => log::info!(
            "{} {}",
            "Cleared".if_supports_color(Stdout, |t| t.green()),
            name
        ),
    }
    Ok(())
}

/// Relative paths are stored relative to the current directory.
fn absolutize(path: PathBuf) -> Result<PathBuf, CliError> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
