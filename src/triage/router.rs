//! Intent router — resolves one utterance to exactly one outcome.
//!
//! Exceptions are checked first and win outright over any category
//! match. An inconclusive turn (no confident label, a tie, or a
//! classifier failure) takes the fallback path until the stuck
//! threshold is exceeded, then escalates. The router never guesses:
//! anything the classifier is unsure about degrades toward fallback,
//! never toward silently picking a category.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classifier::{CalibrationExample, Classifier, LabeledExemplars};
use crate::directive::Directive;
use crate::triage::specs::{ActionMode, CategorySpec, ExceptionSpec, StuckPolicy};

/// Per-conversation triage state.
///
/// The counter increments only when a turn ends on the fallback path
/// and resets to zero whenever a category, exception, or the stuck
/// handler fires.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageSession {
    pub consecutive_unresolved: u32,
}

/// Which path a routed turn took — for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Category { id: String },
    Exception { id: String },
    Fallback,
    Stuck,
}

impl RouteOutcome {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Category { .. } => "category",
            Self::Exception { .. } => "exception",
            Self::Fallback => "fallback",
            Self::Stuck => "stuck",
        }
    }
}

/// Result of routing one utterance.
#[derive(Debug, Clone)]
pub struct RoutedTurn {
    pub directive: Directive,
    pub outcome: RouteOutcome,
    /// A reset-mode exception fired: the caller must discard any
    /// in-flight downstream context before acting on the directive.
    pub reset_context: bool,
}

/// Wraps the classifier with exception interception, the fallback path,
/// and the bounded-retry stuck escalation.
pub struct IntentRouter {
    categories: Vec<CategorySpec>,
    exceptions: Vec<ExceptionSpec>,
    stuck: StuckPolicy,
    fallback: Directive,
    /// When true, exception exemplars are kept out of the category
    /// vocabulary so an exception and a superficially similar category
    /// cannot shadow each other.
    exclude_exceptions: bool,
    calibration: Vec<CalibrationExample>,
}

impl IntentRouter {
    pub fn new(
        categories: Vec<CategorySpec>,
        exceptions: Vec<ExceptionSpec>,
        stuck: StuckPolicy,
        fallback: Directive,
        exclude_exceptions: bool,
        calibration: Vec<CalibrationExample>,
    ) -> Self {
        Self {
            categories,
            exceptions,
            stuck,
            fallback,
            exclude_exceptions,
            calibration,
        }
    }

    fn exception_vocabulary(&self) -> Vec<LabeledExemplars> {
        self.exceptions
            .iter()
            .map(|e| LabeledExemplars::new(&e.id, e.descriptions.clone()))
            .collect()
    }

    fn category_vocabulary(&self) -> Vec<LabeledExemplars> {
        let mut vocabulary: Vec<LabeledExemplars> = self
            .categories
            .iter()
            .map(|c| LabeledExemplars::new(&c.id, c.descriptions.clone()))
            .collect();
        if !self.exclude_exceptions {
            vocabulary.extend(self.exception_vocabulary());
        }
        vocabulary
    }

    /// Classify, absorbing classifier failures as "no confident match".
    async fn classify_safe(
        &self,
        classifier: &dyn Classifier,
        utterance: &str,
        vocabulary: &[LabeledExemplars],
        calibration: &[CalibrationExample],
    ) -> Option<String> {
        match classifier.classify(utterance, vocabulary, calibration).await {
            Ok(label) => label,
            Err(e) => {
                warn!(error = %e, "Classifier failed, treating as inconclusive");
                None
            }
        }
    }

    /// Route one utterance to exactly one outcome.
    pub async fn route(
        &self,
        classifier: &dyn Classifier,
        utterance: &str,
        session: &mut TriageSession,
    ) -> RoutedTurn {
        // Exception pass always runs first, regardless of the
        // vocabulary flag, and an exception match wins outright.
        if !self.exceptions.is_empty() {
            let label = self
                .classify_safe(classifier, utterance, &self.exception_vocabulary(), &[])
                .await;
            if let Some(exception) = label
                .as_deref()
                .and_then(|id| self.exceptions.iter().find(|e| e.id == id))
            {
                info!(exception = %exception.id, "Exception intercepted utterance");
                session.consecutive_unresolved = 0;
                return RoutedTurn {
                    directive: exception.handler.clone(),
                    outcome: RouteOutcome::Exception {
                        id: exception.id.clone(),
                    },
                    reset_context: exception.action_mode == ActionMode::Reset,
                };
            }
        }

        let label = self
            .classify_safe(
                classifier,
                utterance,
                &self.category_vocabulary(),
                &self.calibration,
            )
            .await;
        // A label that names no category (an exception id reachable via
        // double-membership, or classifier drift) is inconclusive.
        if let Some(category) = label
            .as_deref()
            .and_then(|id| self.categories.iter().find(|c| c.id == id))
        {
            info!(category = %category.id, "Category matched");
            session.consecutive_unresolved = 0;
            return RoutedTurn {
                directive: category.handler.clone(),
                outcome: RouteOutcome::Category {
                    id: category.id.clone(),
                },
                reset_context: false,
            };
        }

        session.consecutive_unresolved += 1;
        if session.consecutive_unresolved > self.stuck.max_attempts {
            info!(
                attempts = session.consecutive_unresolved,
                max = self.stuck.max_attempts,
                "Stuck threshold exceeded, escalating"
            );
            session.consecutive_unresolved = 0;
            RoutedTurn {
                directive: self.stuck.handler.clone(),
                outcome: RouteOutcome::Stuck,
                reset_context: false,
            }
        } else {
            debug!(
                attempts = session.consecutive_unresolved,
                "No confident match, falling back"
            );
            RoutedTurn {
                directive: self.fallback.clone(),
                outcome: RouteOutcome::Fallback,
                reset_context: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::ClassifierError;

    /// Classifier stub that matches any exemplar description verbatim.
    struct VerbatimClassifier;

    #[async_trait]
    impl Classifier for VerbatimClassifier {
        async fn classify(
            &self,
            utterance: &str,
            exemplars: &[LabeledExemplars],
            _calibration: &[CalibrationExample],
        ) -> Result<Option<String>, ClassifierError> {
            Ok(exemplars
                .iter()
                .find(|g| g.descriptions.iter().any(|d| d == utterance))
                .map(|g| g.label.clone()))
        }
    }

    /// Classifier stub that always fails.
    struct FailingClassifier;

    #[async_trait]
    impl Classifier for FailingClassifier {
        async fn classify(
            &self,
            _utterance: &str,
            _exemplars: &[LabeledExemplars],
            _calibration: &[CalibrationExample],
        ) -> Result<Option<String>, ClassifierError> {
            Err(ClassifierError::RequestFailed {
                reason: "boom".into(),
            })
        }
    }

    fn router(max_attempts: u32) -> IntentRouter {
        IntentRouter::new(
            vec![
                CategorySpec {
                    id: "claims-status".into(),
                    descriptions: vec!["claim status".into()],
                    handler: Directive::respond_paraphrase("claims handler"),
                },
                CategorySpec {
                    id: "benefit-inquiry".into(),
                    descriptions: vec!["benefit inquiry".into()],
                    handler: Directive::respond_paraphrase("benefits handler"),
                },
            ],
            vec![ExceptionSpec {
                id: "transfer".into(),
                // Deliberately shares a description with no category
                descriptions: vec!["live agent".into(), "benefit inquiry".into()],
                action_mode: ActionMode::Reset,
                handler: Directive::redirect("General Assistance"),
            }],
            StuckPolicy {
                max_attempts,
                handler: Directive::respond_paraphrase("stuck handler"),
            },
            Directive::respond_paraphrase("fallback"),
            false,
            vec![],
        )
    }

    #[tokio::test]
    async fn category_match_resets_counter() {
        let router = router(2);
        let mut session = TriageSession {
            consecutive_unresolved: 1,
        };
        let turn = router
            .route(&VerbatimClassifier, "claim status", &mut session)
            .await;
        assert_eq!(
            turn.outcome,
            RouteOutcome::Category {
                id: "claims-status".into()
            }
        );
        assert_eq!(session.consecutive_unresolved, 0);
        assert!(!turn.reset_context);
    }

    #[tokio::test]
    async fn exception_dominates_category() {
        let router = router(2);
        let mut session = TriageSession::default();
        // Matches both the transfer exception and the benefit category
        let turn = router
            .route(&VerbatimClassifier, "benefit inquiry", &mut session)
            .await;
        assert_eq!(
            turn.outcome,
            RouteOutcome::Exception {
                id: "transfer".into()
            }
        );
        assert!(turn.reset_context);
        assert_eq!(session.consecutive_unresolved, 0);
    }

    #[tokio::test]
    async fn fallback_then_stuck_at_boundary() {
        let router = router(2);
        let mut session = TriageSession::default();

        let turn = router
            .route(&VerbatimClassifier, "gibberish one", &mut session)
            .await;
        assert_eq!(turn.outcome, RouteOutcome::Fallback);
        assert_eq!(session.consecutive_unresolved, 1);

        let turn = router
            .route(&VerbatimClassifier, "gibberish two", &mut session)
            .await;
        assert_eq!(turn.outcome, RouteOutcome::Fallback);
        assert_eq!(session.consecutive_unresolved, 2);

        let turn = router
            .route(&VerbatimClassifier, "gibberish three", &mut session)
            .await;
        assert_eq!(turn.outcome, RouteOutcome::Stuck);
        assert_eq!(session.consecutive_unresolved, 0, "Stuck resets the counter");
    }

    #[tokio::test]
    async fn counter_cycles_through_repeated_inconclusive_turns() {
        let router = router(2);
        let mut session = TriageSession::default();
        for n in 1..=9u32 {
            router
                .route(&VerbatimClassifier, "gibberish", &mut session)
                .await;
            // Post-turn values cycle 1, 2, 0, 1, 2, 0, ...
            assert_eq!(session.consecutive_unresolved, n % 3);
        }
    }

    #[tokio::test]
    async fn classifier_failure_is_inconclusive() {
        let router = router(2);
        let mut session = TriageSession::default();
        let turn = router
            .route(&FailingClassifier, "claim status", &mut session)
            .await;
        assert_eq!(turn.outcome, RouteOutcome::Fallback);
        assert_eq!(session.consecutive_unresolved, 1);
    }

    #[tokio::test]
    async fn exception_label_from_category_pass_is_inconclusive() {
        // excludeExceptions = false puts exception exemplars in the
        // category vocabulary; a match there must not pick a handler.
        let router = router(2);
        let mut session = TriageSession::default();
        let turn = router
            .route(&VerbatimClassifier, "live agent", &mut session)
            .await;
        // The exception pass catches it first anyway
        assert_eq!(
            turn.outcome,
            RouteOutcome::Exception {
                id: "transfer".into()
            }
        );
    }
}
