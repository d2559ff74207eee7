//! Frame rendering — lighting config + clock + machine activity → commands.
//!
//! Commands use Marlin's `M150` (set LED color): `R`/`U`/`B` carry the red,
//! green and blue channels, `I` selects a single LED.

use super::color::hex_to_channels;
use super::settings::{LightingConfig, LightingMode, MAX_LED_COUNT};

/// Fallback when the palette is empty.
const WHITE: (u8, u8, u8) = (255, 255, 255);

/// Wave period scale: one radian of phase every `WAVE_PERIOD_SCALE / speed` ms.
const WAVE_PERIOD_SCALE: f64 = 20_000.0;

/// Per-LED phase step divisor: neighbouring LEDs are `1 / WAVE_INDEX_DIVISOR` radians apart.
const WAVE_INDEX_DIVISOR: f64 = 5.0;

/// The mode actually rendered. While printing, spatial modes collapse to
/// [`LightingMode::Solid`] so lighting traffic does not grow with LED count.
pub fn effective_mode(config: &LightingConfig, is_printing: bool) -> LightingMode {
    if is_printing && config.mode.is_spatial() {
        LightingMode::Solid
    } else {
        config.mode
    }
}

/// Aggregate command setting the whole strip to one color.
pub fn solid_command((r, g, b): (u8, u8, u8)) -> String {
    format!("M150 R{r} U{g} B{b}")
}

/// Per-LED command for the wave pattern (green is always off).
pub fn wave_command(index: u32, r: u8, b: u8) -> String {
    format!("M150 I{index} R{r} U0 B{b}")
}

/// Map `sin`/`cos` output in `[-1, 1]` onto `[1, 255]`.
fn wave_channel(v: f64) -> u8 {
    (v * 127.0 + 128.0).floor().clamp(0.0, 255.0) as u8
}

fn render_wave(config: &LightingConfig, time_ms: f64) -> Vec<String> {
    let base = time_ms / (WAVE_PERIOD_SCALE / f64::from(config.speed));
    (0..config.led_count)
        .map(|i| {
            let phase = base + f64::from(i) / WAVE_INDEX_DIVISOR;
            wave_command(i, wave_channel(phase.sin()), wave_channel(phase.cos()))
        })
        .collect()
}

/// Render one frame.
///
/// `time_ms` is wall-clock time in milliseconds. Fails if the first palette
/// color is not a valid `#RRGGBB` string, or if a wave is requested for more
/// than [`MAX_LED_COUNT`] LEDs.
pub fn render_frame(
    config: &LightingConfig,
    time_ms: f64,
    is_printing: bool,
) -> crate::error::Result<Vec<String>> {
    match effective_mode(config, is_printing) {
        LightingMode::Solid => {
            let rgb = match config.colors.first() {
                Some(color) => hex_to_channels(color)?,
                None => WHITE,
            };
            Ok(vec![solid_command(rgb)])
        }
        LightingMode::SpatialWave => {
            if config.led_count > MAX_LED_COUNT {
                return Err(crate::LiveGcodeError::Config(format!(
                    "led_count {} exceeds {MAX_LED_COUNT}",
                    config.led_count
                )));
            }
            Ok(render_wave(config, time_ms))
        }
    }
}
