//! Rule definitions — persisted rule schema and its resolved, typed form.

use serde::{Deserialize, Serialize};

use super::engine::Decision;

/// A rule as persisted in the settings file.
///
/// Key names follow the plugin settings schema (`actionType`, `actionGcode`),
/// so rule lists exported from the web UI load unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Regular expression matched against the command token.
    #[serde(default)]
    pub pattern: String,

    /// Disabled rules are never evaluated.
    #[serde(default)]
    pub enabled: bool,

    /// Free-form action label, e.g. `"skip"`, `"inject_before"`, `"replace"`.
    #[serde(default, rename = "actionType")]
    pub action_type: String,

    /// Multi-line G-code used by inject/replace actions.
    #[serde(default, rename = "actionGcode")]
    pub action_gcode: String,
}

/// Effect category of a matched rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionType {
    Skip,
    InjectBefore,
    InjectAfter,
    /// Covers both the `replace` and `modify` labels.
    Replace,
    /// Unrecognized label, kept verbatim for log output.
    Unknown(String),
}

impl ActionType {
    /// Map a free-form label to an action type (case-insensitive).
    pub fn parse(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "skip" | "skip/suppress" => ActionType::Skip,
            "inject_before" => ActionType::InjectBefore,
            "inject_after" => ActionType::InjectAfter,
            "replace" | "modify" => ActionType::Replace,
            _ => ActionType::Unknown(label.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ActionType::Unknown(_))
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Skip => write!(f, "skip"),
            ActionType::InjectBefore => write!(f, "inject_before"),
            ActionType::InjectAfter => write!(f, "inject_after"),
            ActionType::Replace => write!(f, "replace"),
            ActionType::Unknown(label) => write!(f, "unknown ({label:?})"),
        }
    }
}

/// Split multi-line action text into commands, dropping blank lines.
///
/// `\n`, `\r\n` and a lone `\r` all end a line. Lines are kept as written;
/// only whitespace-only lines are removed.
pub fn split_action_lines(text: &str) -> Vec<String> {
    text.split(['\n', '\r'])
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// A rule in evaluation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub pattern: String,
    pub enabled: bool,
    pub action_type: ActionType,
    pub action_lines: Vec<String>,
}

impl Rule {
    pub fn new(pattern: &str, action_type: ActionType, action_gcode: &str) -> Self {
        Rule {
            pattern: pattern.to_string(),
            enabled: true,
            action_type,
            action_lines: split_action_lines(action_gcode),
        }
    }

    /// Whether this rule takes part in evaluation at all.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.pattern.is_empty()
    }

    /// The decision this rule produces once its pattern has matched.
    pub fn resolve(&self) -> Decision {
        match &self.action_type {
            ActionType::Skip => Decision::Suppressed,
            ActionType::InjectBefore => Decision::Prepend(self.action_lines.clone()),
            ActionType::InjectAfter => Decision::Append(self.action_lines.clone()),
            ActionType::Replace if self.action_lines.is_empty() => Decision::Suppressed,
            ActionType::Replace => Decision::ReplaceWith(self.action_lines.clone()),
            ActionType::Unknown(_) => Decision::Unchanged,
        }
    }
}

impl From<&RuleConfig> for Rule {
    fn from(config: &RuleConfig) -> Self {
        Rule {
            pattern: config.pattern.clone(),
            enabled: config.enabled,
            action_type: ActionType::parse(&config.action_type),
            action_lines: split_action_lines(&config.action_gcode),
        }
    }
}
