//! Application settings — TOML-based, platform-aware paths.
//!
//! The settings file is the store the core reads its rule list and lighting
//! configuration from. It is read at startup and re-read on every explicit
//! save; the rule list is always replaced as a whole.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::lighting::{LightingConfig, MAX_LED_COUNT, WorkerTiming, is_hex_color};
use crate::rules::{ActionType, RuleConfig, RuleSet};

/// Header comment prepended to saved settings files.
const CONFIG_HEADER: &str =
    "# livegcode settings — changes made outside the app may be overwritten.\n\n";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// LED strip settings.
    #[serde(default)]
    pub lighting: LightingConfig,

    /// LED worker cadence.
    #[serde(default)]
    pub worker: WorkerTiming,

    /// Ordered interception rules; earlier rules take precedence.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// Problems [`Config::validate`] can report.
///
/// None of these stop the settings from loading; they describe rules that
/// will be inert or lighting that will fail to render.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Rule pattern does not compile (`rule` is 1-based).
    InvalidPattern { rule: usize, reason: String },
    /// Rule action label is not recognized; a match passes the command through.
    UnknownActionType { rule: usize, action: String },
    /// A palette entry is not `#RRGGBB`.
    InvalidColor(String),
    /// `lighting.speed` is zero.
    ZeroSpeed,
    /// `lighting.led_count` is zero.
    ZeroLedCount,
    /// `lighting.led_count` is above [`MAX_LED_COUNT`].
    TooManyLeds(u32),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidPattern { rule, reason } => {
                write!(f, "Rule {rule}: invalid pattern: {reason}")
            }
            ValidationError::UnknownActionType { rule, action } => {
                write!(f, "Rule {rule}: unknown action type {action:?}")
            }
            ValidationError::InvalidColor(c) => write!(f, "Invalid lighting color: {c:?}"),
            ValidationError::ZeroSpeed => write!(f, "Lighting speed must be positive"),
            ValidationError::ZeroLedCount => write!(f, "LED count must be positive"),
            ValidationError::TooManyLeds(n) => {
                write!(f, "LED count {n} exceeds the maximum of {MAX_LED_COUNT}")
            }
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("livegcode"))
    }

    /// Full path to the settings file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Load settings from the default path, or defaults if absent.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Save settings to an arbitrary path atomically (write to temp file, then rename).
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{serialized}");
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems; fall back to direct write + cleanup
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result
            }
        }
    }

    /// Save settings to the default platform path.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config directory",
            ));
        };
        self.save_to(&path)
    }

    /// Load settings from an arbitrary path, returning them with any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist (no rules).
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Load settings from the default path, returning them with any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Compile the rule list into an evaluation-ready set.
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::from_configs(&self.rules)
    }

    /// Check the whole file, collecting every problem found.
    ///
    /// Disabled rules are checked too, so they are fixed before being
    /// switched on.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let rules = self.rule_set();
        for (i, rule) in rules.rules().iter().enumerate() {
            if let Some(reason) = rules.pattern_error(&rule.pattern) {
                errors.push(ValidationError::InvalidPattern {
                    rule: i + 1,
                    reason: reason.to_string(),
                });
            }
            if let ActionType::Unknown(action) = &rule.action_type {
                errors.push(ValidationError::UnknownActionType {
                    rule: i + 1,
                    action: action.clone(),
                });
            }
        }

        for color in &self.lighting.colors {
            if !is_hex_color(color) {
                errors.push(ValidationError::InvalidColor(color.clone()));
            }
        }
        if self.lighting.speed == 0 {
            errors.push(ValidationError::ZeroSpeed);
        }
        if self.lighting.led_count == 0 {
            errors.push(ValidationError::ZeroLedCount);
        } else if self.lighting.led_count > MAX_LED_COUNT {
            errors.push(ValidationError::TooManyLeds(self.lighting.led_count));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::LightingMode;

    fn rule(pattern: &str, action: &str, gcode: &str) -> RuleConfig {
        RuleConfig {
            pattern: pattern.into(),
            enabled: true,
            action_type: action.into(),
            action_gcode: gcode.into(),
        }
    }

    // ── defaults ──

    #[test]
    fn defaults() {
        let c = Config::default();
        assert!(c.rules.is_empty());
        assert_eq!(c.lighting, LightingConfig::default());
        assert_eq!(c.worker, WorkerTiming::default());
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let c: Config = toml::from_str("").unwrap();
        assert_eq!(c, Config::default());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r##"
[lighting]
mode = "solid"

[worker]
printing_interval_ms = 750
"##;
        let c: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(c.lighting.mode, LightingMode::Solid);
        assert_eq!(c.lighting.speed, 150);
        assert_eq!(c.worker.printing_interval_ms, 750);
        assert_eq!(c.worker.idle_interval_ms, 50);
        assert!(c.rules.is_empty());
    }

    #[test]
    fn rules_use_settings_key_names() {
        let toml_str = r##"
[[rules]]
pattern = "^M104"
enabled = true
actionType = "inject_after"
actionGcode = """
M105
M400
"""

[[rules]]
pattern = "G28"
actionType = "skip"
"##;
        let c: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(c.rules.len(), 2);
        assert_eq!(c.rules[0].action_type, "inject_after");
        assert_eq!(c.rules[0].action_gcode, "M105\nM400\n");
        assert!(!c.rules[1].enabled, "enabled defaults to false");

        let rules = c.rule_set();
        assert_eq!(rules.rules()[0].action_lines, vec!["M105", "M400"]);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let result: std::result::Result<Config, _> = toml::from_str("this is { not valid toml");
        assert!(result.is_err());
    }

    #[test]
    fn wrong_type_toml_is_an_error() {
        let result: std::result::Result<Config, _> =
            toml::from_str("[lighting]\nspeed = \"fast\"");
        assert!(result.is_err());
    }

    #[test]
    fn config_path_ends_with_toml() {
        if let Some(path) = Config::path() {
            assert_eq!(path.file_name().unwrap(), "config.toml");
            assert_eq!(path.parent(), Config::dir().as_deref());
        }
    }

    // ── validate ──

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_reports_bad_pattern_and_unknown_action() {
        let c = Config {
            rules: vec![rule("G28", "skip", ""), rule("G(28", "explode", "")],
            ..Config::default()
        };
        let errs = c.validate().unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(matches!(errs[0], ValidationError::InvalidPattern { rule: 2, .. }));
        assert!(matches!(
            &errs[1],
            ValidationError::UnknownActionType { rule: 2, action } if action == "explode"
        ));
    }

    #[test]
    fn validate_checks_disabled_rules() {
        let mut bad = rule("[", "skip", "");
        bad.enabled = false;
        let c = Config {
            rules: vec![bad],
            ..Config::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_collects_lighting_errors() {
        let c = Config {
            lighting: LightingConfig {
                colors: vec!["#FF0000".into(), "purple".into()],
                speed: 0,
                led_count: 0,
                ..LightingConfig::default()
            },
            ..Config::default()
        };
        let errs = c.validate().unwrap_err();
        assert_eq!(
            errs,
            vec![
                ValidationError::InvalidColor("purple".into()),
                ValidationError::ZeroSpeed,
                ValidationError::ZeroLedCount,
            ]
        );
    }

    #[test]
    fn validate_flags_oversized_strip() {
        let (c, warnings) = {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("config.toml");
            std::fs::write(&path, "[lighting]\nled_count = 4000000000\n").unwrap();
            Config::load_from(&path)
        };
        assert!(warnings.is_empty());
        assert_eq!(
            c.validate().unwrap_err(),
            vec![ValidationError::TooManyLeds(4_000_000_000)]
        );

        let at_limit = Config {
            lighting: LightingConfig {
                led_count: MAX_LED_COUNT,
                ..LightingConfig::default()
            },
            ..Config::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn validation_error_display() {
        let e = ValidationError::UnknownActionType {
            rule: 3,
            action: "teleport".into(),
        };
        assert_eq!(e.to_string(), "Rule 3: unknown action type \"teleport\"");
        assert_eq!(
            ValidationError::ZeroSpeed.to_string(),
            "Lighting speed must be positive"
        );
    }

    // ── save_to / load_from ──

    #[test]
    fn save_to_load_from_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config {
            lighting: LightingConfig {
                colors: vec!["#00FF00".into()],
                mode: LightingMode::Solid,
                speed: 42,
                led_count: 12,
            },
            worker: WorkerTiming {
                idle_interval_ms: 20,
                ..WorkerTiming::default()
            },
            rules: vec![
                rule("^G28", "inject_before", "G4 P100\nM400"),
                rule("M106", "skip", ""),
            ],
        };
        config.save_to(&path).unwrap();

        let (loaded, warnings) = Config::load_from(&path);
        assert!(warnings.is_empty());
        assert_eq!(loaded, config);
    }

    #[test]
    fn save_to_includes_header_comment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        Config::default().save_to(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# livegcode settings"));
        let tmp = dir.path().join("config.toml.tmp");
        assert!(!tmp.exists(), "temp file should not remain after save");
    }

    #[test]
    fn save_to_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        Config::default().save_to(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = Config::load_from(&dir.path().join("nonexistent.toml"));
        assert!(warnings.is_empty());
        assert!(config.rules.is_empty());
    }

    #[test]
    fn load_from_invalid_toml_returns_defaults_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is { not valid toml").unwrap();

        let (config, warnings) = Config::load_from(&path);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("config parse error"));
        assert!(config.rules.is_empty());
    }
}
