//! Turn controller — session lifecycle and per-event dispatch.
//!
//! One inbound event is processed to completion before the next event
//! for the same session; every turn runs against a staged copy of the
//! session that is committed only on success. Anything that escapes a
//! turn is converted to a single generic apology directive at this
//! boundary — nothing throws past it, and the failed turn leaves no
//! state behind.

pub mod session;

pub use session::{ConversationPhase, ConversationSession, SessionEvent, SessionManager};

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::auth::{AuthOutcome, CredentialDirectory};
use crate::classifier::Classifier;
use crate::directive::{Directive, TurnOutput};
use crate::error::Result;
use crate::triage::{IntentRouter, TriageSession};

/// Controller-level content and channel settings.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Greeting spoken on voice session start.
    pub greeting: String,
    /// Voice check-in after user silence.
    pub inactivity_checkin: String,
    /// Acknowledgement once the gate verifies the member.
    pub verified_ack: String,
    /// The one generic apology for internal failures.
    pub generic_failure: String,
    /// Voice channel flag: enables greeting and inactivity check-ins.
    pub is_voice: bool,
}

/// Top-level dispatcher owning session lifecycle.
pub struct TurnController {
    config: ControllerConfig,
    directory: CredentialDirectory,
    router: IntentRouter,
    classifier: Arc<dyn Classifier>,
    sessions: SessionManager,
}

impl TurnController {
    pub fn new(
        config: ControllerConfig,
        directory: CredentialDirectory,
        router: IntentRouter,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            config,
            directory,
            router,
            classifier,
            sessions: SessionManager::new(),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Dispatch one inbound event for a session.
    ///
    /// Returns `None` when the event produces no output (closed session,
    /// text-channel start/inactivity). Never returns an error: internal
    /// failures become the generic apology and the session keeps its
    /// pre-turn state, so the same turn may be retried.
    pub async fn handle_event(&self, session_id: &str, event: SessionEvent) -> Option<TurnOutput> {
        let mut session = self.sessions.snapshot(session_id).await;
        if session.phase.is_terminal() {
            debug!(session_id, "Event for completed session ignored");
            return None;
        }

        let result = self.turn(&mut session, event).await;
        self.finish_turn(session, result).await
    }

    /// Settle one turn: commit the staged session on success; on failure
    /// discard it and emit the one generic apology, leaving the session
    /// at its pre-turn state so the same turn may be retried.
    async fn finish_turn(
        &self,
        mut session: ConversationSession,
        result: Result<Option<TurnOutput>>,
    ) -> Option<TurnOutput> {
        match result {
            Ok(output) => {
                session.touch();
                self.sessions.commit(session).await;
                output
            }
            Err(e) => {
                error!(session_id = %session.id, error = %e, "Turn failed, state not advanced");
                Some(TurnOutput::new(Directive::respond_verbatim(
                    &self.config.generic_failure,
                )))
            }
        }
    }

    async fn turn(
        &self,
        session: &mut ConversationSession,
        event: SessionEvent,
    ) -> Result<Option<TurnOutput>> {
        match event {
            SessionEvent::Start => {
                if self.config.is_voice {
                    Ok(Some(TurnOutput::new(Directive::respond_verbatim(
                        &self.config.greeting,
                    ))))
                } else {
                    Ok(None)
                }
            }
            // Inactivity is orthogonal to triage: the check-in neither
            // advances the phase nor touches the attempt counter.
            SessionEvent::Inactivity => {
                if self.config.is_voice {
                    Ok(Some(TurnOutput::new(Directive::respond_paraphrase(
                        &self.config.inactivity_checkin,
                    ))))
                } else {
                    Ok(None)
                }
            }
            SessionEvent::RequestComplete => {
                info!(session_id = %session.id, "Session completed on request");
                session.phase = ConversationPhase::Completed;
                Ok(Some(TurnOutput::new(Directive::terminate("Requested"))))
            }
            SessionEvent::Message { content } => {
                let content = content.trim().to_string();
                self.message_turn(session, &content).await.map(Some)
            }
        }
    }

    async fn message_turn(
        &self,
        session: &mut ConversationSession,
        content: &str,
    ) -> Result<TurnOutput> {
        match session.phase {
            ConversationPhase::Authenticating => {
                match session.auth.advance(Some(content), &self.directory) {
                    AuthOutcome::Prompt { error, question } => {
                        let directive = Directive::prompt(question);
                        Ok(match error {
                            Some(notice) => TurnOutput::with_notice(notice, directive),
                            None => TurnOutput::new(directive),
                        })
                    }
                    AuthOutcome::Authenticated { leftover } => {
                        info!(session_id = %session.id, "Gate released, routing intents");
                        session.phase = ConversationPhase::Routing;
                        match leftover {
                            // The utterance was not consumed as a
                            // credential; route it in the same turn.
                            Some(utterance) => Ok(self.route_utterance(session, &utterance).await),
                            None => Ok(TurnOutput::new(Directive::respond_paraphrase(
                                &self.config.verified_ack,
                            ))),
                        }
                    }
                }
            }
            ConversationPhase::Routing => Ok(self.route_utterance(session, content).await),
            // The dispatch boundary filters terminal sessions; a direct
            // caller still gets an answer, never a panic.
            ConversationPhase::Completed => {
                debug!(session_id = %session.id, "Message for a closed session");
                Ok(TurnOutput::new(Directive::respond_verbatim(
                    &self.config.generic_failure,
                )))
            }
        }
    }

    async fn route_utterance(&self, session: &mut ConversationSession, utterance: &str) -> TurnOutput {
        let routed = self
            .router
            .route(self.classifier.as_ref(), utterance, &mut session.triage)
            .await;
        if routed.reset_context {
            // Reset-mode exception: discard in-flight triage context.
            session.triage = TriageSession::default();
        }
        debug!(
            session_id = %session.id,
            outcome = routed.outcome.label(),
            directive = routed.directive.label(),
            "Turn routed"
        );
        TurnOutput::new(routed.directive)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::auth::Credential;
    use crate::auth::gate::{DATE_OF_BIRTH_PROMPT, MEMBER_ID_PROMPT};
    use crate::classifier::{CalibrationExample, LabeledExemplars};
    use crate::error::{ClassifierError, Error};
    use crate::triage::{ActionMode, CategorySpec, ExceptionSpec, StuckPolicy};

    /// Matches any exemplar description verbatim.
    struct VerbatimClassifier;

    #[async_trait]
    impl Classifier for VerbatimClassifier {
        async fn classify(
            &self,
            utterance: &str,
            exemplars: &[LabeledExemplars],
            _calibration: &[CalibrationExample],
        ) -> std::result::Result<Option<String>, ClassifierError> {
            Ok(exemplars
                .iter()
                .find(|g| g.descriptions.iter().any(|d| d == utterance))
                .map(|g| g.label.clone()))
        }
    }

    fn controller(is_voice: bool) -> TurnController {
        let config = ControllerConfig {
            greeting: "Hello! How can I help?".into(),
            inactivity_checkin: "Are you still there?".into(),
            verified_ack: "You're verified.".into(),
            generic_failure: "Oops, something went wrong.".into(),
            is_voice,
        };
        let directory = CredentialDirectory::new(vec![Credential::new("123456", "01/01/1980")]);
        let router = IntentRouter::new(
            vec![CategorySpec {
                id: "claims-status".into(),
                descriptions: vec!["claim status".into()],
                handler: Directive::respond_paraphrase("claims handler"),
            }],
            vec![ExceptionSpec {
                id: "transfer".into(),
                descriptions: vec!["live agent".into()],
                action_mode: ActionMode::Reset,
                handler: Directive::redirect("General Assistance"),
            }],
            StuckPolicy {
                max_attempts: 2,
                handler: Directive::respond_paraphrase("stuck handler"),
            },
            Directive::respond_paraphrase("fallback"),
            false,
            vec![],
        );
        TurnController::new(config, directory, router, Arc::new(VerbatimClassifier))
    }

    async fn say(controller: &TurnController, text: &str) -> TurnOutput {
        controller
            .handle_event(
                "s-1",
                SessionEvent::Message {
                    content: text.into(),
                },
            )
            .await
            .expect("message turn should produce output")
    }

    async fn authenticate(controller: &TurnController) {
        say(controller, "hello").await;
        say(controller, "123456").await;
        let out = say(controller, "01/01/1980").await;
        assert_eq!(
            out.directive,
            Directive::respond_paraphrase("You're verified.")
        );
    }

    #[tokio::test]
    async fn voice_session_greets_on_start() {
        let controller = controller(true);
        let out = controller.handle_event("s-1", SessionEvent::Start).await;
        assert_eq!(
            out.unwrap().directive,
            Directive::respond_verbatim("Hello! How can I help?")
        );
    }

    #[tokio::test]
    async fn text_session_start_is_silent() {
        let controller = controller(false);
        assert!(
            controller
                .handle_event("s-1", SessionEvent::Start)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn gate_runs_before_routing() {
        let controller = controller(false);
        let out = say(&controller, "claim status").await;
        // The utterance reaches the gate, not the router
        assert_eq!(out.directive, Directive::prompt(MEMBER_ID_PROMPT));
    }

    #[tokio::test]
    async fn full_flow_gate_then_route() {
        let controller = controller(false);
        authenticate(&controller).await;

        let out = say(&controller, "claim status").await;
        assert_eq!(out.directive, Directive::respond_paraphrase("claims handler"));
    }

    #[tokio::test]
    async fn failed_validation_prompts_member_id_with_notice() {
        let controller = controller(false);
        say(&controller, "hello").await;
        say(&controller, "000000").await;
        let out = say(&controller, "01/01/1900").await;
        assert!(out.notice.is_some());
        assert_eq!(out.directive, Directive::prompt(MEMBER_ID_PROMPT));

        // Re-collection starts from the member ID, then DOB
        let out = say(&controller, "123456").await;
        assert_eq!(out.notice, None);
        assert_eq!(out.directive, Directive::prompt(DATE_OF_BIRTH_PROMPT));
    }

    #[tokio::test]
    async fn inactivity_checks_in_without_touching_state() {
        let controller = controller(true);
        authenticate(&controller).await;
        say(&controller, "gibberish").await; // counter = 1

        let out = controller
            .handle_event("s-1", SessionEvent::Inactivity)
            .await
            .unwrap();
        assert_eq!(
            out.directive,
            Directive::respond_paraphrase("Are you still there?")
        );

        let session = controller.sessions().snapshot("s-1").await;
        assert_eq!(session.phase, ConversationPhase::Routing);
        assert_eq!(session.triage.consecutive_unresolved, 1);
    }

    #[tokio::test]
    async fn completion_terminates_and_ignores_later_events() {
        let controller = controller(false);
        let out = controller
            .handle_event("s-1", SessionEvent::RequestComplete)
            .await
            .unwrap();
        assert_eq!(out.directive, Directive::terminate("Requested"));

        assert!(say_opt(&controller, "hello").await.is_none());
    }

    async fn say_opt(controller: &TurnController, text: &str) -> Option<TurnOutput> {
        controller
            .handle_event(
                "s-1",
                SessionEvent::Message {
                    content: text.into(),
                },
            )
            .await
    }

    #[tokio::test]
    async fn reset_exception_discards_triage_context() {
        let controller = controller(false);
        authenticate(&controller).await;
        say(&controller, "gibberish").await; // counter = 1

        let out = say(&controller, "live agent").await;
        assert_eq!(out.directive, Directive::redirect("General Assistance"));

        let session = controller.sessions().snapshot("s-1").await;
        assert_eq!(session.triage.consecutive_unresolved, 0);
    }

    #[tokio::test]
    async fn failed_turn_emits_apology_and_keeps_prior_state() {
        let controller = controller(false);
        authenticate(&controller).await;
        say(&controller, "gibberish").await; // counter = 1

        // Stage a mutated session and settle it with an upstream error:
        // the apology comes back and nothing is committed.
        let mut staged = controller.sessions().snapshot("s-1").await;
        staged.triage.consecutive_unresolved = 99;
        let err = Error::Classifier(ClassifierError::RequestFailed {
            reason: "upstream outage".into(),
        });
        let out = controller.finish_turn(staged, Err(err)).await.unwrap();
        assert_eq!(
            out.directive,
            Directive::respond_verbatim("Oops, something went wrong.")
        );
        assert_eq!(out.notice, None);

        let session = controller.sessions().snapshot("s-1").await;
        assert_eq!(session.triage.consecutive_unresolved, 1);
        assert_eq!(session.phase, ConversationPhase::Routing);
    }

    #[tokio::test]
    async fn stray_message_for_a_closed_session_never_panics() {
        let controller = controller(false);
        let mut session = ConversationSession::new("s-1");
        session.phase = ConversationPhase::Completed;

        let out = controller
            .message_turn(&mut session, "hello")
            .await
            .unwrap();
        assert_eq!(
            out.directive,
            Directive::respond_verbatim("Oops, something went wrong.")
        );
        assert!(session.phase.is_terminal());
    }

    #[tokio::test]
    async fn completed_sessions_are_reclaimed_by_pruning() {
        let controller = controller(false);
        controller
            .handle_event("s-1", SessionEvent::RequestComplete)
            .await;
        assert_eq!(controller.sessions().count().await, 1);

        let mut session = controller.sessions().snapshot("s-1").await;
        session.last_active = Utc::now() - chrono::Duration::hours(2);
        controller.sessions().commit(session).await;

        controller
            .sessions()
            .prune_stale(Duration::from_secs(1800))
            .await;
        assert_eq!(controller.sessions().count().await, 0);

        // The reclaimed id starts over at the gate
        let out = say(&controller, "hello").await;
        assert_eq!(out.directive, Directive::prompt(MEMBER_ID_PROMPT));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let controller = controller(false);
        authenticate(&controller).await;

        // A second session still faces the gate
        let out = controller
            .handle_event(
                "s-2",
                SessionEvent::Message {
                    content: "claim status".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(out.directive, Directive::prompt(MEMBER_ID_PROMPT));
    }
}
