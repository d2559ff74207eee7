//! `config` subcommand — show current settings and file path.

use std::path::Path;

use super::{ConfigOutput, Result, kv, kv_indent, kv_width, lighting};

pub(super) fn cmd_config(custom_path: Option<&Path>, json: bool) -> Result<()> {
    let config = super::load_config(custom_path);
    let config_path = super::config_path(custom_path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let problems: Vec<String> = match config.validate() {
        Ok(()) => vec![],
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    };

    if json {
        return super::print_json(&ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings: config,
            problems,
        });
    }

    let w = kv_width(
        &["Config file:"],
        &[
            "colors:",
            "mode:",
            "speed:",
            "led_count:",
            "idle_interval_ms:",
            "printing_interval_ms:",
            "paused_interval_ms:",
            "error_backoff_ms:",
            "rules:",
        ],
    );

    match &config_path {
        Some(p) if config_exists => kv("Config file:", format_args!("{} (loaded)", p.display()), w),
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Lighting:");
    let colors: Vec<String> = config
        .lighting
        .colors
        .iter()
        .map(|c| match lighting::hex_to_channels(c) {
            Ok(rgb) => format!("{c} -> {}", lighting::format_channels(rgb)),
            Err(_) => format!("{c} (invalid)"),
        })
        .collect();
    let colors = if colors.is_empty() {
        "(none, solid falls back to white)".to_string()
    } else {
        colors.join(", ")
    };
    kv_indent("colors:", colors, w);
    kv_indent("mode:", config.lighting.mode, w);
    kv_indent("speed:", config.lighting.speed, w);
    kv_indent("led_count:", config.lighting.led_count, w);
    println!();

    println!("Worker:");
    kv_indent("idle_interval_ms:", config.worker.idle_interval_ms, w);
    kv_indent("printing_interval_ms:", config.worker.printing_interval_ms, w);
    kv_indent("paused_interval_ms:", config.worker.paused_interval_ms, w);
    kv_indent("error_backoff_ms:", config.worker.error_backoff_ms, w);
    println!();

    println!("Interception:");
    let enabled = config.rules.iter().filter(|r| r.enabled).count();
    kv_indent(
        "rules:",
        format_args!("{} ({enabled} enabled)", config.rules.len()),
        w,
    );

    if !problems.is_empty() {
        println!();
        println!("Problems:");
        for p in &problems {
            println!("  {p}");
        }
    }
    Ok(())
}
