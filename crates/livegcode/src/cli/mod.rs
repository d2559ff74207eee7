//! CLI subcommands — stream filtering, rule inspection, lighting control.

mod check;
mod config_cmd;
mod filter;
mod lighting_cmd;
mod rules_cmd;
mod run;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use livegcode_lib::channel::ConfigChannel;
pub(super) use livegcode_lib::config::Config;
pub(super) use livegcode_lib::error::Result;
pub(super) use livegcode_lib::intercept::{Intercepted, Interceptor, command_token};
pub(super) use livegcode_lib::lighting;
pub(super) use livegcode_lib::sink::{CommandBatch, CommandSink, WriterSink};

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

/// Print a value as pretty JSON on stdout.
pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| livegcode_lib::LiveGcodeError::Config(format!("JSON output: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Resolve the settings path: `--config` override, else the platform default.
pub(super) fn config_path(custom: Option<&Path>) -> Option<PathBuf> {
    custom.map(Path::to_path_buf).or_else(Config::path)
}

/// Load settings, logging parse warnings and validation problems.
pub(super) fn load_config(custom: Option<&Path>) -> Config {
    let (config, warnings) = match config_path(custom) {
        Some(path) => Config::load_from(&path),
        None => (Config::default(), vec![]),
    };
    for w in &warnings {
        log::warn!("{w}");
    }
    if let Err(errors) = config.validate() {
        for e in &errors {
            log::warn!("[config] {e}");
        }
    }
    config
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct CheckOutput {
    pub command: String,
    pub token: Option<String>,
    pub matched_pattern: Option<String>,
    pub decision: Intercepted,
    pub output: Vec<String>,
}

#[derive(Serialize)]
pub(super) struct RuleJson {
    pub index: usize,
    pub pattern: String,
    pub enabled: bool,
    pub action: String,
    pub lines: Vec<String>,
    pub pattern_error: Option<String>,
}

#[derive(Serialize)]
pub(super) struct RulesOutput {
    pub count: usize,
    pub rules: Vec<RuleJson>,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
    pub problems: Vec<String>,
}

#[derive(Serialize)]
pub(super) struct RenderOutput {
    pub mode: String,
    pub printing: bool,
    pub commands: Vec<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a command stream (file or stdin) through the interception rules
    Filter {
        /// Input file, one command per line (default: stdin)
        input: Option<PathBuf>,
    },

    /// Show what the rules do to a single command
    Check {
        /// Raw command line, e.g. "G28 X0"
        command: String,
        /// Classification token to match against (default: derived from the command)
        #[arg(long)]
        token: Option<String>,
    },

    /// List loaded rules and their resolved actions
    Rules,

    /// Show current settings and file path
    Config,

    /// Print one lighting frame
    Render {
        /// Render as if a print job were running
        #[arg(long)]
        printing: bool,
        /// Clock value in milliseconds (default: now)
        #[arg(long)]
        time_ms: Option<f64>,
    },

    /// Apply a partial lighting update (JSON) and save it to the settings file
    SetLighting {
        /// Update payload, e.g. '{"mode": "solid", "colors": ["#00FF00"]}'
        update: String,
    },

    /// Run the LED worker, writing lighting commands to stdout
    Run {
        /// Report the machine as printing
        #[arg(long)]
        printing: bool,
        /// Stop after this many frames (default: run until Ctrl+C)
        #[arg(long)]
        frames: Option<u64>,
    },
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, json: bool, config: Option<&Path>) -> Result<()> {
    match cmd {
        Command::Filter { input } => {
            if json {
                warn_json_unsupported("filter");
            }
            filter::cmd_filter(config, input.as_deref())
        }
        Command::Check { command, token } => {
            check::cmd_check(config, &command, token.as_deref(), json)
        }
        Command::Rules => rules_cmd::cmd_rules(config, json),
        Command::Config => config_cmd::cmd_config(config, json),
        Command::Render { printing, time_ms } => {
            lighting_cmd::cmd_render(config, printing, time_ms, json)
        }
        Command::SetLighting { update } => {
            if json {
                warn_json_unsupported("set-lighting");
            }
            lighting_cmd::cmd_set_lighting(config, &update)
        }
        Command::Run { printing, frames } => {
            if json {
                warn_json_unsupported("run");
            }
            run::cmd_run(config, printing, frames)
        }
    }
}

#[cfg(test)]
mod format_tests {
    use super::*;

    #[test]
    fn kv_width_top_only() {
        let w = kv_width(&["Short:", "Longer key:"], &[]);
        // "Longer key:" = 11 + PADDING = 13
        assert_eq!(w, 13);
    }

    #[test]
    fn kv_width_indent_drives_width() {
        let w = kv_width(&["A:"], &["Very long indent key:"]);
        // "Very long indent key:" = 21 + PADDING + 2 = 25
        assert_eq!(w, 25);
    }

    #[test]
    fn kv_width_empty_both() {
        assert_eq!(kv_width(&[], &[]), 0);
    }

    #[test]
    fn values_align_across_levels() {
        let w = kv_width(&["Top:"], &["Indent:"]);
        let top = format_kv("Top:", "V", w);
        let indent = format!("  {:<width$}{}", "Indent:", "V", width = w - 2);
        assert_eq!(top.find('V'), indent.find('V'));
    }

    #[test]
    fn format_kv_basic() {
        assert_eq!(format_kv("Key:", "value", 10), "Key:      value");
    }
}
