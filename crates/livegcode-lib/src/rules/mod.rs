//! Rule engine — ordered, first-match-wins pattern rules over the command stream.

mod action;
mod engine;

pub use action::{ActionType, Rule, RuleConfig, split_action_lines};
pub use engine::{Decision, Evaluation, RuleSet, evaluate};
