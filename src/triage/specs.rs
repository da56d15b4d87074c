//! Static triage specs, configured at startup.
//!
//! Content (exemplar descriptions, handler directives) is data; the
//! control flow that evaluates it lives in [`crate::triage::router`].

use serde::{Deserialize, Serialize};

use crate::directive::Directive;

/// One branch of the routed intent space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySpec {
    /// Stable identifier, also the classifier label.
    pub id: String,
    /// Exemplar descriptions calibrating the classifier toward this id.
    pub descriptions: Vec<String>,
    /// Directive emitted when this category wins.
    pub handler: Directive,
}

/// What an exception does to the conversation's downstream context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMode {
    /// Run the handler, keep any in-progress sub-flow.
    Continue,
    /// Discard in-progress context before running the handler.
    Reset,
}

/// An interrupt condition that outranks category resolution
/// (e.g. "talk to a human").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionSpec {
    pub id: String,
    pub descriptions: Vec<String>,
    pub action_mode: ActionMode,
    pub handler: Directive,
}

/// Escalation once consecutive unresolved turns exceed the threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StuckPolicy {
    /// Consecutive inconclusive turns tolerated before escalating.
    /// Must be at least 1.
    pub max_attempts: u32,
    /// Directive emitted on escalation.
    pub handler: Directive,
}
