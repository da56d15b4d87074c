//! IVR Assist — dialogue controller core.

pub mod auth;
pub mod channels;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod directive;
pub mod error;
pub mod triage;
