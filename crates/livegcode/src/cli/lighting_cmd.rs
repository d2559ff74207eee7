//! `render` and `set-lighting` subcommands.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use livegcode_lib::LiveGcodeError;
use livegcode_lib::lighting::LightingUpdate;

use super::{Config, RenderOutput, Result, lighting};

fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

pub(super) fn cmd_render(
    config_path: Option<&Path>,
    printing: bool,
    time_ms: Option<f64>,
    json: bool,
) -> Result<()> {
    let config = super::load_config(config_path);
    let time_ms = time_ms.unwrap_or_else(now_ms);
    let commands = lighting::render_frame(&config.lighting, time_ms, printing)?;

    if json {
        return super::print_json(&RenderOutput {
            mode: lighting::effective_mode(&config.lighting, printing).to_string(),
            printing,
            commands,
        });
    }

    for command in &commands {
        println!("{command}");
    }
    Ok(())
}

/// Apply a partial update to the stored lighting settings.
///
/// The update is validated and the existing file parsed before anything is
/// written; a rejected payload or an unreadable file leaves the file untouched.
pub(super) fn cmd_set_lighting(config_path: Option<&Path>, payload: &str) -> Result<()> {
    let update = LightingUpdate::from_json(payload)?;
    if update.is_empty() {
        log::warn!("[lighting] update has no fields, nothing to do");
        return Ok(());
    }

    let Some(path) = super::config_path(config_path) else {
        return Err(LiveGcodeError::Config("no config directory".into()));
    };
    // Saving over a file that failed to parse would replace it with defaults
    let (mut config, warnings) = Config::load_from(&path);
    if let Some(warning) = warnings.into_iter().next() {
        return Err(LiveGcodeError::Config(format!(
            "{warning}; fix the settings file before updating it"
        )));
    }
    config.lighting.apply(update);
    config.save_to(&path)?;

    log::info!(
        "[lighting] saved: mode={} speed={} colors={}",
        config.lighting.mode,
        config.lighting.speed,
        config.lighting.colors.join(",")
    );
    println!("Lighting updated ({}).", path.display());
    Ok(())
}
