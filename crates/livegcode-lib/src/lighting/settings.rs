//! Lighting configuration and the typed partial-update payload.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::color::is_hex_color;

/// Largest strip the wave renderer will drive.
pub const MAX_LED_COUNT: u32 = 1024;

/// Pattern the worker renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingMode {
    /// One aggregate color for the whole strip.
    Solid,
    /// Per-LED red/blue wave travelling along the strip.
    #[default]
    SpatialWave,
}

impl LightingMode {
    /// Spatial modes address LEDs individually; their traffic scales with
    /// the LED count.
    pub fn is_spatial(self) -> bool {
        matches!(self, LightingMode::SpatialWave)
    }
}

impl fmt::Display for LightingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightingMode::Solid => write!(f, "solid"),
            LightingMode::SpatialWave => write!(f, "spatial_wave"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightingConfig {
    /// Palette as `#RRGGBB` strings. Solid mode uses the first entry.
    #[serde(default = "default_colors")]
    pub colors: Vec<String>,

    #[serde(default)]
    pub mode: LightingMode,

    /// Animation speed; higher is faster. Must be positive.
    #[serde(default = "default_speed")]
    pub speed: u32,

    /// Number of addressable LEDs on the strip, `1..=MAX_LED_COUNT`.
    #[serde(default = "default_led_count")]
    pub led_count: u32,
}

fn default_colors() -> Vec<String> {
    vec!["#FF0000".into(), "#0000FF".into()]
}
fn default_speed() -> u32 {
    150
}
fn default_led_count() -> u32 {
    30
}

impl Default for LightingConfig {
    fn default() -> Self {
        LightingConfig {
            colors: default_colors(),
            mode: LightingMode::default(),
            speed: default_speed(),
            led_count: default_led_count(),
        }
    }
}

impl LightingConfig {
    /// Merge the fields present in `update`, leaving the rest untouched.
    pub fn apply(&mut self, update: LightingUpdate) {
        if let Some(colors) = update.colors {
            self.colors = colors;
        }
        if let Some(mode) = update.mode {
            self.mode = mode;
        }
        if let Some(speed) = update.speed {
            self.speed = speed;
        }
    }
}

/// Partial lighting update from the API side. Absent fields are left as is.
///
/// Unknown keys are rejected when deserializing rather than dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LightingUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<LightingMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<u32>,
}

impl LightingUpdate {
    /// Parse and validate a JSON update payload.
    pub fn from_json(payload: &str) -> crate::error::Result<Self> {
        let update: LightingUpdate = serde_json::from_str(payload)
            .map_err(|e| crate::LiveGcodeError::Config(format!("invalid lighting update: {e}")))?;
        update.validate()?;
        Ok(update)
    }

    /// Check every present field: colors must be `#RRGGBB`, speed positive.
    pub fn validate(&self) -> crate::error::Result<()> {
        if let Some(colors) = &self.colors
            && let Some(bad) = colors.iter().find(|c| !is_hex_color(c))
        {
            return Err(crate::LiveGcodeError::Config(format!(
                "invalid color {bad:?} (use #RRGGBB)"
            )));
        }
        if self.speed == Some(0) {
            return Err(crate::LiveGcodeError::Config(
                "speed must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_none() && self.mode.is_none() && self.speed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = LightingConfig::default();
        assert_eq!(c.colors, vec!["#FF0000", "#0000FF"]);
        assert_eq!(c.mode, LightingMode::SpatialWave);
        assert_eq!(c.speed, 150);
        assert_eq!(c.led_count, 30);
    }

    #[test]
    fn mode_serializes_snake_case() {
        let json = serde_json::to_string(&LightingMode::SpatialWave).unwrap();
        assert_eq!(json, "\"spatial_wave\"");
        let mode: LightingMode = serde_json::from_str("\"solid\"").unwrap();
        assert_eq!(mode, LightingMode::Solid);
        assert_eq!(LightingMode::SpatialWave.to_string(), "spatial_wave");
    }

    #[test]
    fn only_wave_is_spatial() {
        assert!(LightingMode::SpatialWave.is_spatial());
        assert!(!LightingMode::Solid.is_spatial());
    }

    #[test]
    fn partial_update_speed_only() {
        let mut c = LightingConfig::default();
        let update = LightingUpdate::from_json(r#"{"speed": 200}"#).unwrap();
        c.apply(update);
        assert_eq!(c.speed, 200);
        assert_eq!(c.colors, vec!["#FF0000", "#0000FF"]);
        assert_eq!(c.mode, LightingMode::SpatialWave);
    }

    #[test]
    fn full_update() {
        let mut c = LightingConfig::default();
        let update =
            LightingUpdate::from_json(r##"{"colors": ["#00FF00"], "mode": "solid", "speed": 10}"##)
                .unwrap();
        c.apply(update);
        assert_eq!(c.colors, vec!["#00FF00"]);
        assert_eq!(c.mode, LightingMode::Solid);
        assert_eq!(c.speed, 10);
        assert_eq!(c.led_count, 30, "led_count is not part of the update payload");
    }

    #[test]
    fn empty_update_changes_nothing() {
        let mut c = LightingConfig::default();
        let update = LightingUpdate::from_json("{}").unwrap();
        assert!(update.is_empty());
        c.apply(update);
        assert_eq!(c, LightingConfig::default());
    }

    #[test]
    fn unknown_field_rejected() {
        let err = LightingUpdate::from_json(r#"{"speed": 5, "brightness": 3}"#).unwrap_err();
        assert!(err.to_string().contains("brightness"), "got: {err}");
    }

    #[test]
    fn unknown_mode_rejected() {
        assert!(LightingUpdate::from_json(r#"{"mode": "strobe"}"#).is_err());
    }

    #[test]
    fn zero_speed_rejected() {
        let err = LightingUpdate::from_json(r#"{"speed": 0}"#).unwrap_err();
        assert!(err.to_string().contains("positive"), "got: {err}");
    }

    #[test]
    fn negative_speed_rejected() {
        assert!(LightingUpdate::from_json(r#"{"speed": -5}"#).is_err());
    }

    #[test]
    fn bad_color_rejected() {
        let err = LightingUpdate::from_json(r##"{"colors": ["#FF0000", "red"]}"##).unwrap_err();
        assert!(err.to_string().contains("red"), "got: {err}");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c: LightingConfig = toml::from_str("led_count = 8").unwrap();
        assert_eq!(c.led_count, 8);
        assert_eq!(c.speed, 150);
        assert_eq!(c.mode, LightingMode::SpatialWave);
    }
}
