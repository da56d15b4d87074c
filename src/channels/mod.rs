//! Channel abstraction for session event I/O.

pub mod channel;
pub mod cli;

pub use channel::{Channel, EventStream, IncomingEvent};
pub use cli::CliChannel;
