//! Integration tests: settings file → live channel → interception hook.
//!
//! These exercise the path the host drives: rules are loaded from a TOML
//! settings file, commands flow through `Interceptor`, and a settings save
//! swaps the rule set wholesale.

use std::sync::Arc;

use livegcode_lib::channel::ConfigChannel;
use livegcode_lib::config::Config;
use livegcode_lib::intercept::{Intercepted, Interceptor};
use livegcode_lib::rules::RuleConfig;

const SETTINGS: &str = r##"
[[rules]]
pattern = "^G28$"
enabled = true
actionType = "inject_before"
actionGcode = "G4 P100"

[[rules]]
pattern = "^M10[67]$"
enabled = true
actionType = "Skip/Suppress"
actionGcode = "M107"

[[rules]]
pattern = "(unbalanced"
enabled = true
actionType = "skip"
actionGcode = ""

[[rules]]
pattern = "^M104$"
enabled = false
actionType = "skip"
actionGcode = ""

[[rules]]
pattern = "^M117$"
enabled = true
actionType = "modify"
actionGcode = """
M117 intercepted

"""
"##;

fn load(contents: &str) -> (tempfile::TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).unwrap();
    let (config, warnings) = Config::load_from(&path);
    assert!(warnings.is_empty(), "{warnings:?}");
    (dir, config)
}

fn hook(config: &Config) -> Interceptor {
    Interceptor::new(Arc::new(ConfigChannel::from_config(config)))
}

#[test]
fn settings_drive_interception() {
    let (_dir, config) = load(SETTINGS);
    let hook = hook(&config);

    assert_eq!(
        hook.intercept("G28", "G28"),
        Intercepted::Send(vec!["G4 P100".into(), "G28".into()])
    );
    assert_eq!(hook.intercept("M106 S255", "M106"), Intercepted::Suppress);
    assert_eq!(hook.intercept("M104 S200", "M104"), Intercepted::Pass);
    assert_eq!(
        hook.intercept("M117 Hello", "M117"),
        Intercepted::Send(vec!["M117 intercepted".into()])
    );
    assert_eq!(hook.last_matched_pattern().as_deref(), Some("^M117$"));
}

#[test]
fn invalid_pattern_never_blocks_later_rules() {
    let (_dir, config) = load(SETTINGS);
    let errs = config.validate().unwrap_err();
    assert_eq!(errs.len(), 1, "{errs:?}");

    let hook = hook(&config);
    for _ in 0..3 {
        assert_eq!(hook.intercept("M107", "M107"), Intercepted::Suppress);
        assert_eq!(hook.intercept("G1 X1", "G1"), Intercepted::Pass);
    }
}

#[test]
fn commands_without_a_token_pass_untouched() {
    let (_dir, config) = load(SETTINGS);
    let hook = hook(&config);
    assert_eq!(hook.intercept("G28", ""), Intercepted::Pass);
    assert!(hook.last_matched_pattern().is_none());
}

#[test]
fn settings_save_replaces_rules() {
    let (dir, config) = load(SETTINGS);
    let hook = hook(&config);
    assert_eq!(hook.intercept("M106", "M106"), Intercepted::Suppress);

    let saved = Config {
        rules: vec![RuleConfig {
            pattern: "^M104$".into(),
            enabled: true,
            action_type: "inject_after".into(),
            action_gcode: "M105".into(),
        }],
        ..config
    };
    let path = dir.path().join("config.toml");
    saved.save_to(&path).unwrap();
    let (reloaded, _) = Config::load_from(&path);
    hook.channel().apply_settings(&reloaded);

    // Old rules are gone, not merged.
    assert_eq!(hook.intercept("M106", "M106"), Intercepted::Pass);
    assert_eq!(
        hook.intercept("M104 S0", "M104"),
        Intercepted::Send(vec!["M104 S0".into(), "M105".into()])
    );
}

#[test]
fn missing_settings_mean_no_rules() {
    let dir = tempfile::tempdir().unwrap();
    let (config, warnings) = Config::load_from(&dir.path().join("absent.toml"));
    assert!(warnings.is_empty());
    let hook = hook(&config);
    assert_eq!(hook.intercept("G28", "G28"), Intercepted::Pass);
}

#[test]
fn unparseable_settings_mean_no_rules() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[[rules]\npattern = ").unwrap();
    let (config, warnings) = Config::load_from(&path);
    assert_eq!(warnings.len(), 1);
    let hook = hook(&config);
    assert_eq!(hook.intercept("G28", "G28"), Intercepted::Pass);
}

#[test]
fn interception_runs_alongside_reloads() {
    let (_dir, config) = load(SETTINGS);
    let hook = Arc::new(hook(&config));

    let reloader = {
        let hook = Arc::clone(&hook);
        let config = config.clone();
        std::thread::spawn(move || {
            for i in 0..500 {
                if i % 2 == 0 {
                    hook.channel().apply_settings(&Config::default());
                } else {
                    hook.channel().apply_settings(&config);
                }
            }
        })
    };

    // Each evaluation sees either the full rule set or none at all.
    for _ in 0..500 {
        let out = hook.intercept("G28", "G28");
        assert!(
            out == Intercepted::Pass
                || out == Intercepted::Send(vec!["G4 P100".into(), "G28".into()]),
            "{out:?}"
        );
    }
    reloader.join().unwrap();
}
