//! Member authentication — credential directory and the collection gate.

pub mod directory;
pub mod gate;

pub use directory::{Credential, CredentialDirectory};
pub use gate::{AuthOutcome, AuthState};
