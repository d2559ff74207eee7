//! `rules` subcommand — list the configured rules as the engine sees them.

use std::path::Path;

use livegcode_lib::rules::{Decision, RuleSet};

use super::{Result, RuleJson, RulesOutput};

fn describe(decision: &Decision) -> (&'static str, Vec<String>) {
    match decision {
        Decision::Unchanged => ("none", vec![]),
        Decision::Suppressed => ("suppress", vec![]),
        Decision::Prepend(lines) => ("inject before", lines.clone()),
        Decision::Append(lines) => ("inject after", lines.clone()),
        Decision::ReplaceWith(lines) => ("replace", lines.clone()),
    }
}

fn collect(rules: &RuleSet) -> Vec<RuleJson> {
    rules
        .rules()
        .iter()
        .enumerate()
        .map(|(i, rule)| {
            let (action, lines) = describe(&rule.resolve());
            let action = if rule.action_type.is_known() {
                action.to_string()
            } else {
                rule.action_type.to_string()
            };
            RuleJson {
                index: i + 1,
                pattern: rule.pattern.clone(),
                enabled: rule.enabled,
                action,
                lines,
                pattern_error: rules.pattern_error(&rule.pattern).map(str::to_string),
            }
        })
        .collect()
}

pub(super) fn cmd_rules(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = super::load_config(config_path);
    let rules = collect(&config.rule_set());

    if json {
        return super::print_json(&RulesOutput {
            count: rules.len(),
            rules,
        });
    }

    if rules.is_empty() {
        println!("No rules configured.");
        return Ok(());
    }

    for rule in &rules {
        let state = if rule.enabled { "" } else { " (disabled)" };
        println!("{:>3}. /{}/ -> {}{state}", rule.index, rule.pattern, rule.action);
        if let Some(err) = &rule.pattern_error {
            println!("     invalid pattern: {err}");
        }
        for line in &rule.lines {
            println!("     {line}");
        }
    }
    Ok(())
}
