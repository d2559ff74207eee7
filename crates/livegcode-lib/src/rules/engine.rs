//! Rule evaluation — compiled rule sets and the first-match-wins evaluator.
//!
//! A [`RuleSet`] is immutable once built. Patterns are compiled when the set
//! is constructed and cached by source string, so the per-command path does
//! no compilation and replacing the set discards the cache with it.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};

use super::action::{ActionType, Rule, RuleConfig};

/// Upper bound on a compiled pattern's program size.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Outcome of evaluating one command against a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Pass the original command through.
    Unchanged,
    /// Drop the command entirely.
    Suppressed,
    /// Send these lines, then the original command.
    Prepend(Vec<String>),
    /// Send the original command, then these lines.
    Append(Vec<String>),
    /// Send these lines instead of the original command.
    ReplaceWith(Vec<String>),
}

/// A decision plus the pattern of the rule that produced it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub decision: Decision,
    pub matched_pattern: Option<String>,
}

impl Evaluation {
    fn unchanged() -> Self {
        Evaluation {
            decision: Decision::Unchanged,
            matched_pattern: None,
        }
    }
}

/// Ordered rules plus their compiled patterns.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    compiled: HashMap<String, Result<Regex, String>>,
}

fn compile_pattern(pattern: &str) -> Result<Regex, String> {
    RegexBuilder::new(pattern)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|e| e.to_string())
}

impl RuleSet {
    /// Build a rule set, compiling each distinct non-empty pattern once.
    ///
    /// Patterns that fail to compile are logged and kept as errors; their
    /// rules never match.
    pub fn new(rules: Vec<Rule>) -> Self {
        let mut compiled = HashMap::new();
        for (i, rule) in rules.iter().enumerate() {
            if rule.pattern.is_empty() || compiled.contains_key(&rule.pattern) {
                continue;
            }
            let result = compile_pattern(&rule.pattern);
            if let Err(e) = &result {
                log::warn!(
                    "rule {}: invalid pattern {:?}, rule will never match: {e}",
                    i + 1,
                    rule.pattern
                );
            }
            compiled.insert(rule.pattern.clone(), result);
        }
        RuleSet { rules, compiled }
    }

    /// Build a rule set from persisted rule entries.
    pub fn from_configs(configs: &[RuleConfig]) -> Self {
        Self::new(configs.iter().map(Rule::from).collect())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Compiled regex for a pattern, or `None` if empty, unknown, or invalid.
    pub fn regex(&self, pattern: &str) -> Option<&Regex> {
        self.compiled.get(pattern).and_then(|r| r.as_ref().ok())
    }

    /// Compilation error for a pattern, if it failed to compile.
    pub fn pattern_error(&self, pattern: &str) -> Option<&str> {
        self.compiled
            .get(pattern)
            .and_then(|r| r.as_ref().err())
            .map(String::as_str)
    }
}

/// Evaluate one command against a rule set.
///
/// `token` is the command's classification key (e.g. `"G28"`); rules match
/// against it, while inject actions carry `raw` along. An empty token means
/// the command has no key and no rule is consulted.
pub fn evaluate(raw: &str, token: &str, rules: &RuleSet) -> Evaluation {
    if token.is_empty() {
        return Evaluation::unchanged();
    }

    for rule in rules.rules().iter().filter(|r| r.is_active()) {
        // Invalid patterns were reported when the set was built.
        let Some(regex) = rules.regex(&rule.pattern) else {
            continue;
        };
        if !regex.is_match(token) {
            continue;
        }

        log::info!("rule {:?} matched {token:?} ({raw})", rule.pattern);
        if let ActionType::Unknown(label) = &rule.action_type {
            log::warn!(
                "unknown action type {label:?} for rule {:?}, passing command through",
                rule.pattern
            );
        }
        let decision = rule.resolve();
        log::debug!("{} -> {decision:?}", rule.action_type);
        return Evaluation {
            decision,
            matched_pattern: Some(rule.pattern.clone()),
        };
    }

    Evaluation::unchanged()
}
