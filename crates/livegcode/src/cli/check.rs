//! `check` subcommand — show the decision for a single command.

use std::path::Path;
use std::sync::Arc;

use super::{CheckOutput, ConfigChannel, Interceptor, Result, command_token, kv, kv_width};

pub(super) fn cmd_check(
    config_path: Option<&Path>,
    command: &str,
    token: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = super::load_config(config_path);
    let interceptor = Interceptor::new(Arc::new(ConfigChannel::from_config(&config)));

    let token = match token {
        Some(t) => Some(t.to_string()),
        None => command_token(command),
    };
    let intercepted = interceptor.intercept(command, token.as_deref().unwrap_or(""));
    let matched = interceptor.last_matched_pattern();
    let output = intercepted.commands(command);

    if json {
        return super::print_json(&CheckOutput {
            command: command.to_string(),
            token,
            matched_pattern: matched,
            decision: intercepted,
            output,
        });
    }

    let w = kv_width(&["Command:", "Token:", "Matched:", "Result:"], &[]);
    kv("Command:", command, w);
    kv("Token:", token.as_deref().unwrap_or("(none)"), w);
    kv("Matched:", matched.as_deref().unwrap_or("(no rule)"), w);
    let result = match &intercepted {
        super::Intercepted::Pass => "pass",
        super::Intercepted::Suppress => "suppress",
        super::Intercepted::Send(_) => "send",
    };
    kv("Result:", result, w);
    if !output.is_empty() {
        println!();
        for line in &output {
            println!("  {line}");
        }
    }
    Ok(())
}
