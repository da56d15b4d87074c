//! Content and configuration surface.
//!
//! Everything user-facing is data: brand, greeting, directory, the
//! category/exception specs, and the stuck policy all load from an
//! optional JSON content file (`IVR_ASSIST_CONTENT`), with every field
//! defaulting to the shipped Acme content. Validation runs once at
//! startup and is fatal — no session is accepted with malformed
//! content.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::auth::{Credential, CredentialDirectory};
use crate::classifier::CalibrationExample;
use crate::controller::ControllerConfig;
use crate::directive::Directive;
use crate::error::ConfigError;
use crate::triage::{ActionMode, CategorySpec, ExceptionSpec, IntentRouter, StuckPolicy};

/// Environment variable naming the content file.
pub const CONTENT_ENV_VAR: &str = "IVR_ASSIST_CONTENT";

/// Brand identity, used for the CLI banner and renderer guidance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandContent {
    pub organization_name: String,
    pub agent_name: String,
}

impl Default for BrandContent {
    fn default() -> Self {
        Self {
            organization_name: "Acme Corp".into(),
            agent_name: "Acme Assistant".into(),
        }
    }
}

/// Voice-channel content and settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceContent {
    /// Channel flag: greeting and inactivity check-ins fire only for
    /// voice sessions.
    pub enabled: bool,
    pub greeting: String,
    pub inactivity_checkin: String,
    pub inactivity_timeout_secs: u64,
}

impl Default for VoiceContent {
    fn default() -> Self {
        Self {
            enabled: false,
            greeting: "Hello! You've reached Acme Corp Virtual Assistant. \
                       How can I help you today?"
                .into(),
            inactivity_checkin: "Are you still there? Let me know how I can help.".into(),
            inactivity_timeout_secs: 15,
        }
    }
}

/// Authentication content: the directory plus the verification line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthContent {
    pub directory: Vec<Credential>,
    pub verified_ack: String,
}

impl Default for AuthContent {
    fn default() -> Self {
        Self {
            directory: vec![
                Credential::new("123456", "01/01/1980"),
                Credential::new("654321", "12/31/1975"),
                Credential::new("ABCDEF", "07/04/1990"),
                Credential::new("XYZ123", "10/10/1985"),
            ],
            verified_ack: "Thanks, you're verified. How can I help you today?".into(),
        }
    }
}

/// Triage content: the routed intent space.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageContent {
    pub categories: Vec<CategorySpec>,
    pub exceptions: Vec<ExceptionSpec>,
    pub calibration: Vec<CalibrationExample>,
    /// Keep exception exemplars out of the category vocabulary.
    pub exclude_exceptions: bool,
    pub fallback: String,
    pub stuck: StuckPolicy,
}

impl Default for TriageContent {
    fn default() -> Self {
        let categories = vec![
            CategorySpec {
                id: "benefit-inquiry".into(),
                descriptions: vec![
                    "Ask about benefit details".into(),
                    "benefit inquiry".into(),
                    "coverage details".into(),
                ],
                handler: Directive::respond_paraphrase(
                    "It looks like you're asking about benefit details. \
                     How can I assist you further?",
                ),
            },
            CategorySpec {
                id: "claims-status".into(),
                descriptions: vec![
                    "Check claim status".into(),
                    "claim status".into(),
                    "status of my claim".into(),
                ],
                handler: Directive::respond_paraphrase(
                    "You'd like to check your claim status. \
                     Can you provide your claim number?",
                ),
            },
            CategorySpec {
                id: "prior-authorization".into(),
                descriptions: vec![
                    "Prior authorization inquiry".into(),
                    "prior auth".into(),
                    "authorization status".into(),
                ],
                handler: Directive::respond_paraphrase(
                    "Let's talk about prior authorization. \
                     What's the authorization reference?",
                ),
            },
            CategorySpec {
                id: "appointment-scheduling".into(),
                descriptions: vec![
                    "Schedule an appointment".into(),
                    "book appointment".into(),
                    "appointment scheduling".into(),
                ],
                handler: Directive::respond_paraphrase(
                    "I can help schedule an appointment. When would you like to meet?",
                ),
            },
        ];

        let exceptions = vec![ExceptionSpec {
            id: "transfer".into(),
            descriptions: vec![
                "I want to speak to a representative".into(),
                "live agent".into(),
                "customer service".into(),
            ],
            action_mode: ActionMode::Reset,
            handler: Directive::redirect("General Assistance"),
        }];

        let calibration = vec![
            CalibrationExample {
                input: "What's covered by my benefits?".into(),
                label: "benefit-inquiry".into(),
            },
            CalibrationExample {
                input: "Where is my claim?".into(),
                label: "claims-status".into(),
            },
            CalibrationExample {
                input: "Do I need prior authorization?".into(),
                label: "prior-authorization".into(),
            },
            CalibrationExample {
                input: "I want to book an appointment".into(),
                label: "appointment-scheduling".into(),
            },
        ];

        Self {
            categories,
            exceptions,
            calibration,
            exclude_exceptions: false,
            fallback: "I'm sorry, I didn't quite catch that. Could you please rephrase?".into(),
            stuck: StuckPolicy {
                max_attempts: 2,
                handler: Directive::respond_paraphrase(
                    "It seems we're not making progress. Let me connect you to an agent.",
                ),
            },
        }
    }
}

/// Session housekeeping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionContent {
    /// Sessions idle longer than this are dropped, completed or not.
    pub idle_timeout_secs: u64,
    /// How often the pruning task wakes up.
    pub prune_interval_secs: u64,
}

impl Default for SessionContent {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 1800,
            prune_interval_secs: 600,
        }
    }
}

/// Error-path content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorContent {
    pub generic_failure: String,
}

impl Default for ErrorContent {
    fn default() -> Self {
        Self {
            generic_failure: "Oops, something went wrong. Transferring you to an agent now."
                .into(),
        }
    }
}

/// The whole configuration surface, consumed once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Content {
    pub brand: BrandContent,
    pub voice: VoiceContent,
    pub auth: AuthContent,
    pub triage: TriageContent,
    pub session: SessionContent,
    pub errors: ErrorContent,
}

impl Content {
    /// Load from `IVR_ASSIST_CONTENT` if set, otherwise shipped defaults.
    /// Always validated.
    pub fn load() -> Result<Self, ConfigError> {
        let content = match std::env::var(CONTENT_ENV_VAR) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        content.validate()?;
        Ok(content)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Startup validation. Any failure here is fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.directory.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "auth.directory".into(),
                message: "directory must contain at least one credential".into(),
            });
        }
        if self.triage.stuck.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "triage.stuck.max_attempts".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.triage.fallback.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "triage.fallback".into(),
                message: "fallback text must not be blank".into(),
            });
        }
        if self.voice.greeting.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "voice.greeting".into(),
                message: "greeting must not be blank".into(),
            });
        }
        if self.session.idle_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "session.idle_timeout_secs".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.session.prune_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "session.prune_interval_secs".into(),
                message: "must be at least 1".into(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for category in &self.triage.categories {
            Self::validate_spec("category", &category.id, &category.descriptions)?;
            if !seen.insert(category.id.clone()) {
                return Err(ConfigError::DuplicateId {
                    kind: "category".into(),
                    id: category.id.clone(),
                });
            }
        }
        for exception in &self.triage.exceptions {
            Self::validate_spec("exception", &exception.id, &exception.descriptions)?;
            if !seen.insert(exception.id.clone()) {
                return Err(ConfigError::DuplicateId {
                    kind: "exception".into(),
                    id: exception.id.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_spec(kind: &str, id: &str, descriptions: &[String]) -> Result<(), ConfigError> {
        if id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: format!("triage.{kind}.id"),
                message: "id must not be blank".into(),
            });
        }
        if descriptions.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: format!("triage.{kind}[{id}].descriptions"),
                message: "at least one exemplar description is required".into(),
            });
        }
        Ok(())
    }

    // ── Component builders ──────────────────────────────────────────

    pub fn directory(&self) -> CredentialDirectory {
        CredentialDirectory::new(self.auth.directory.clone())
    }

    pub fn router(&self) -> IntentRouter {
        IntentRouter::new(
            self.triage.categories.clone(),
            self.triage.exceptions.clone(),
            self.triage.stuck.clone(),
            Directive::respond_paraphrase(&self.triage.fallback),
            self.triage.exclude_exceptions,
            self.triage.calibration.clone(),
        )
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            greeting: self.voice.greeting.clone(),
            inactivity_checkin: self.voice.inactivity_checkin.clone(),
            verified_ack: self.auth.verified_ack.clone(),
            generic_failure: self.errors.generic_failure.clone(),
            is_voice: self.voice.enabled,
        }
    }
}
