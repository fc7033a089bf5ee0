//! xdisc CLI
//!
//! Command-line interface for extracting title details from Xbox and
//! Xbox 360 disc images.

mod cli_types;
mod error;
mod spinner;

mod commands {
    pub(crate) mod config;
    pub(crate) mod details;
}

use std::io::Write;

use clap::Parser;
use log::LevelFilter;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stderr;

use xdisc_lib::SettingKey;

use cli_types::{Cli, Commands, ConfigAction};
pub(crate) use error::CliError;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Details {
            iso,
            work_dir,
            xextool,
            thumbnail,
            toml,
        } => commands::details::run_details(iso, work_dir, xextool, thumbnail, toml, cli.quiet),
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                commands::config::run_config_show();
                Ok(())
            }
            ConfigAction::Path => {
                commands::config::run_config_path();
                Ok(())
            }
            ConfigAction::SetXextool { path } => {
                commands::config::run_config_set(SettingKey::Xextool, path)
            }
            ConfigAction::SetWorkDir { dir } => {
                commands::config::run_config_set(SettingKey::WorkDir, dir)
            }
        },
    };

    if let Err(e) = result {
        log::error!("{}", e.if_supports_color(Stderr, |t| t.red()));
        std::process::exit(1);
    }
}

/// Set up `env_logger`: plain messages by default, timestamps with `--verbose`.
///
/// The library mirrors every event to the log; the CLI renders those events
/// itself, so the mirror is only shown in verbose mode. `RUST_LOG` overrides.
fn init_logging(verbose: bool, quiet: bool) {
    let mut builder = env_logger::Builder::new();
    if verbose {
        builder
            .filter_level(LevelFilter::Debug)
            .format_timestamp_millis();
    } else {
        let own_level = if quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        };
        builder
            .filter_level(LevelFilter::Warn)
            .filter_module("xdisc", own_level)
            .filter_module("xdisc_lib", LevelFilter::Off)
            .format(|buf, record| writeln!(buf, "{}", record.args()));
    }
    builder.parse_default_env();
    builder.init();
}

/// Log an empty line (spacing in info output).
pub(crate) fn log_blank() {
    log::info!("");
}
