//! The channel seam — pure event I/O, no dialogue logic.
//!
//! Adapters turn their native transport into a stream of
//! [`IncomingEvent`]s and render [`TurnOutput`]s back out. Gate,
//! triage, and lifecycle decisions all live in the controller.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::controller::SessionEvent;
use crate::directive::TurnOutput;
use crate::error::ChannelError;

/// One session event as delivered by a channel.
#[derive(Debug, Clone)]
pub struct IncomingEvent {
    /// Channel name (e.g. "cli").
    pub channel: String,
    /// Session the event belongs to.
    pub session_id: String,
    /// The event itself.
    pub event: SessionEvent,
}

impl IncomingEvent {
    pub fn new(channel: &str, session_id: &str, event: SessionEvent) -> Self {
        Self {
            channel: channel.to_string(),
            session_id: session_id.to_string(),
            event,
        }
    }
}

/// Stream of incoming events, in arrival order per session.
pub type EventStream = Pin<Box<dyn Stream<Item = IncomingEvent> + Send>>;

/// A transport adapter.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name for logging.
    fn name(&self) -> &str;

    /// Start the channel and hand back its event stream.
    async fn start(&self) -> Result<EventStream, ChannelError>;

    /// Render a turn's output back to the user.
    async fn respond(&self, event: &IncomingEvent, output: &TurnOutput)
    -> Result<(), ChannelError>;

    /// Release transport resources.
    async fn shutdown(&self) -> Result<(), ChannelError>;
}
