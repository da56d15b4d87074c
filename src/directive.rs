//! Response directives — the single output action a turn produces.
//!
//! The controller never renders human-facing text itself; it emits a
//! `Directive` and leaves phrasing to the rendering collaborator
//! (for the CLI channel, plain stdout).

use serde::{Deserialize, Serialize};

/// How a `Respond` directive should be rendered downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Render the text exactly as given.
    Verbatim,
    /// The renderer may rephrase in the brand voice.
    Paraphrase,
}

/// The output action of one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum Directive {
    /// Ask the user a question and wait for the answer.
    Prompt { question: String },
    /// Reply with text.
    Respond { text: String, mode: ResponseMode },
    /// Hand the conversation to another topic/queue.
    Redirect { topic: String },
    /// Close the session.
    Terminate { reason: String },
}

impl Directive {
    pub fn prompt(question: impl Into<String>) -> Self {
        Self::Prompt {
            question: question.into(),
        }
    }

    pub fn respond_verbatim(text: impl Into<String>) -> Self {
        Self::Respond {
            text: text.into(),
            mode: ResponseMode::Verbatim,
        }
    }

    pub fn respond_paraphrase(text: impl Into<String>) -> Self {
        Self::Respond {
            text: text.into(),
            mode: ResponseMode::Paraphrase,
        }
    }

    pub fn redirect(topic: impl Into<String>) -> Self {
        Self::Redirect {
            topic: topic.into(),
        }
    }

    pub fn terminate(reason: impl Into<String>) -> Self {
        Self::Terminate {
            reason: reason.into(),
        }
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Prompt { .. } => "prompt",
            Self::Respond { .. } => "respond",
            Self::Redirect { .. } => "redirect",
            Self::Terminate { .. } => "terminate",
        }
    }
}

/// Everything one turn emits.
///
/// At most one directive per turn, except a prompt preceded by an error
/// notice (failed credential validation) — the only two-piece output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutput {
    /// Error text surfaced before the directive, at most once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    /// The turn's directive.
    pub directive: Directive,
}

impl TurnOutput {
    pub fn new(directive: Directive) -> Self {
        Self {
            notice: None,
            directive,
        }
    }

    pub fn with_notice(notice: impl Into<String>, directive: Directive) -> Self {
        Self {
            notice: Some(notice.into()),
            directive,
        }
    }
}

impl From<Directive> for TurnOutput {
    fn from(directive: Directive) -> Self {
        Self::new(directive)
    }
}
