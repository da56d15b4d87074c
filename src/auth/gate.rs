//! Authentication gate — two-slot credential collection state machine.
//!
//! Collects a member ID and a date of birth across turns, then validates
//! the pair against the directory. Failed validation clears both slots
//! and loops back to the member-ID question; there is no attempt cap at
//! this layer (the triage stuck policy is a separate concern and does
//! not apply here).

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::directory::CredentialDirectory;

pub const MEMBER_ID_PROMPT: &str = "Please enter your Member ID.";
pub const DATE_OF_BIRTH_PROMPT: &str = "Please enter your Date of Birth (MM/DD/YYYY).";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials. Please try again.";

/// Which credential question is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CredentialSlot {
    MemberId,
    DateOfBirth,
}

/// Per-conversation authentication state.
///
/// Which question comes next follows from which slots are filled; the
/// `pending` marker records whether that question has actually been
/// asked, so the utterance that first wakes the gate is never captured
/// as a credential.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthState {
    member_id: Option<String>,
    date_of_birth: Option<String>,
    last_error: Option<String>,
    pending: Option<CredentialSlot>,
    verified: bool,
}

/// What one gate turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Ask (or re-ask) a credential question, optionally preceded by the
    /// error from a just-failed validation. The error is surfaced
    /// exactly once.
    Prompt {
        error: Option<String>,
        question: &'static str,
    },
    /// Validation succeeded. `leftover` carries the turn's utterance
    /// only when the gate was already verified when it arrived, so the
    /// caller can forward it downstream unconsumed.
    Authenticated { leftover: Option<String> },
}

impl AuthState {
    pub fn is_verified(&self) -> bool {
        self.verified
    }

    /// Advance the gate by one turn.
    ///
    /// `input` is the inbound utterance, if the turn carried one.
    /// Whitespace is trimmed; whatever remains (even an empty string) is
    /// accepted as a literal credential value — a bogus value simply
    /// fails validation and loops.
    pub fn advance(&mut self, input: Option<&str>, directory: &CredentialDirectory) -> AuthOutcome {
        if self.verified {
            return AuthOutcome::Authenticated {
                leftover: input.map(str::to_string),
            };
        }

        // Capture the answer to an outstanding question. An input-less
        // turn leaves the question outstanding.
        if let Some(text) = input {
            if let Some(slot) = self.pending.take() {
                let value = text.trim().to_string();
                match slot {
                    CredentialSlot::MemberId => self.member_id = Some(value),
                    CredentialSlot::DateOfBirth => self.date_of_birth = Some(value),
                }
            }
        }

        if self.member_id.is_none() {
            self.pending = Some(CredentialSlot::MemberId);
            return AuthOutcome::Prompt {
                error: self.last_error.take(),
                question: MEMBER_ID_PROMPT,
            };
        }
        if self.date_of_birth.is_none() {
            self.pending = Some(CredentialSlot::DateOfBirth);
            return AuthOutcome::Prompt {
                error: self.last_error.take(),
                question: DATE_OF_BIRTH_PROMPT,
            };
        }

        // Both slots filled — validate synchronously.
        let member_id = self.member_id.as_deref().unwrap_or_default();
        let date_of_birth = self.date_of_birth.as_deref().unwrap_or_default();
        if directory.verify(member_id, date_of_birth) {
            info!(member_id, "Member verified");
            self.verified = true;
            AuthOutcome::Authenticated { leftover: None }
        } else {
            debug!(member_id, "Credential validation failed");
            self.member_id = None;
            self.date_of_birth = None;
            self.last_error = Some(INVALID_CREDENTIALS.to_string());
            self.pending = Some(CredentialSlot::MemberId);
            AuthOutcome::Prompt {
                error: self.last_error.take(),
                question: MEMBER_ID_PROMPT,
            }
        }
    }
}
