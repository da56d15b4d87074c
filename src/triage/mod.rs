//! Intent triage — declarative specs plus the routing algorithm.

pub mod router;
pub mod specs;

pub use router::{IntentRouter, RouteOutcome, RoutedTurn, TriageSession};
pub use specs::{ActionMode, CategorySpec, ExceptionSpec, StuckPolicy};
