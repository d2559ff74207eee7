//! Command interception — the hook the host calls for every outgoing command.
//!
//! [`Interceptor::intercept`] runs synchronously on the host's send path. It
//! takes a snapshot of the live rule set, evaluates, records the last match,
//! and returns what the host should queue. It never fails.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::channel::ConfigChannel;
use crate::rules::{Decision, evaluate};

/// What the host should send in place of the intercepted command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "commands", rename_all = "snake_case")]
pub enum Intercepted {
    /// Send the original command as is.
    Pass,
    /// Send nothing.
    Suppress,
    /// Send these commands, in order, instead of the original.
    Send(Vec<String>),
}

impl Intercepted {
    /// The commands that reach the machine for this interception.
    pub fn commands(&self, raw: &str) -> Vec<String> {
        match self {
            Intercepted::Pass => vec![raw.to_string()],
            Intercepted::Suppress => vec![],
            Intercepted::Send(lines) => lines.clone(),
        }
    }
}

impl Decision {
    /// Expand a decision into host output, placing `raw` where the action requires.
    pub fn into_intercepted(self, raw: &str) -> Intercepted {
        match self {
            Decision::Unchanged => Intercepted::Pass,
            Decision::Suppressed => Intercepted::Suppress,
            Decision::Prepend(mut lines) => {
                lines.push(raw.to_string());
                Intercepted::Send(lines)
            }
            Decision::Append(lines) => {
                let mut out = Vec::with_capacity(lines.len() + 1);
                out.push(raw.to_string());
                out.extend(lines);
                Intercepted::Send(out)
            }
            Decision::ReplaceWith(lines) => Intercepted::Send(lines),
        }
    }
}

/// Classification token of a raw command line: the command word, e.g.
/// `"G28"` for `"N12 G28 X0*71"`.
///
/// Line numbers, checksums and `;` comments are stripped and the word is
/// upper-cased. Returns `None` for lines without a `G`/`M`/`T`-style command
/// word (blank lines, comments, host `@` commands).
pub fn command_token(raw: &str) -> Option<String> {
    let line = raw.split(';').next().unwrap_or_default();
    let line = line.split('*').next().unwrap_or_default();
    let mut words = line.split_whitespace();
    let mut word = words.next()?;
    if is_line_number(word) {
        word = words.next()?;
    }
    let mut chars = word.chars();
    let letter = chars.next()?;
    let number = chars.as_str();
    let numeric = !number.is_empty()
        && number.chars().all(|c| c.is_ascii_digit() || c == '.')
        && number.starts_with(|c: char| c.is_ascii_digit());
    if letter.is_ascii_alphabetic() && numeric {
        Some(word.to_ascii_uppercase())
    } else {
        None
    }
}

fn is_line_number(word: &str) -> bool {
    word.strip_prefix(['N', 'n'])
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

/// Host-facing interception hook.
pub struct Interceptor {
    channel: Arc<ConfigChannel>,
    last_match: Mutex<Option<String>>,
}

impl Interceptor {
    pub fn new(channel: Arc<ConfigChannel>) -> Self {
        Self {
            channel,
            last_match: Mutex::new(None),
        }
    }

    pub fn channel(&self) -> &Arc<ConfigChannel> {
        &self.channel
    }

    /// Decide what to send for one outgoing command.
    ///
    /// `token` is the host's classification key for `raw` (empty if none).
    pub fn intercept(&self, raw: &str, token: &str) -> Intercepted {
        let rules = self.channel.snapshot_rules();
        let evaluation = evaluate(raw, token, &rules);
        if let Some(pattern) = evaluation.matched_pattern {
            *self.last_match.lock().unwrap_or_else(PoisonError::into_inner) = Some(pattern);
        }
        evaluation.decision.into_intercepted(raw)
    }

    /// Intercept a raw line, deriving its token with [`command_token`].
    pub fn intercept_line(&self, raw: &str) -> Intercepted {
        let token = command_token(raw).unwrap_or_default();
        self.intercept(raw, &token)
    }

    /// Pattern of the most recently matched rule, for status display.
    pub fn last_matched_pattern(&self) -> Option<String> {
        self.last_match
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
