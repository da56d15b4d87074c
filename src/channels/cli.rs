//! CLI channel — stdin/stdout REPL for local testing.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::channels::{Channel, EventStream, IncomingEvent};
use crate::controller::SessionEvent;
use crate::directive::{Directive, TurnOutput};
use crate::error::ChannelError;

/// A simple CLI channel: one session per process, one event per line.
///
/// `/bye` requests completion; everything else is a message event.
pub struct CliChannel {
    session_id: String,
}

impl CliChannel {
    pub fn new() -> Self {
        Self {
            session_id: format!("cli-{}", Uuid::new_v4()),
        }
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let session_id = self.session_id.clone();

        tokio::spawn(async move {
            // The session-start event precedes any user input
            if tx
                .send(IncomingEvent::new("cli", &session_id, SessionEvent::Start))
                .is_err()
            {
                return;
            }

            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprint!("> ");
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let event = if line == "/bye" || line == "/quit" {
                            SessionEvent::RequestComplete
                        } else {
                            SessionEvent::Message { content: line }
                        };
                        if tx
                            .send(IncomingEvent::new("cli", &session_id, event))
                            .is_err()
                        {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    async fn respond(
        &self,
        _event: &IncomingEvent,
        output: &TurnOutput,
    ) -> Result<(), ChannelError> {
        if let Some(notice) = &output.notice {
            println!("\n{notice}");
        }
        match &output.directive {
            Directive::Prompt { question } => println!("\n{question}"),
            Directive::Respond { text, .. } => println!("\n{text}"),
            Directive::Redirect { topic } => println!("\n[transferring you to: {topic}]"),
            Directive::Terminate { reason } => println!("\n[session closed: {reason}]"),
        }
        println!();
        eprint!("> ");
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
