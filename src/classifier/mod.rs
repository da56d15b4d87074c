//! Classifier seam — semantic matching of an utterance to a label.
//!
//! The controller never decides *how* an utterance maps to a label; it
//! hands the utterance and the labeled exemplar groups to whatever
//! implements [`Classifier`]. Ships with a deterministic lexical
//! implementation; tests inject scripted stubs.

pub mod lexical;

pub use lexical::LexicalClassifier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;

/// One label and the exemplar descriptions that calibrate toward it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledExemplars {
    pub label: String,
    pub descriptions: Vec<String>,
}

impl LabeledExemplars {
    pub fn new(label: impl Into<String>, descriptions: Vec<String>) -> Self {
        Self {
            label: label.into(),
            descriptions,
        }
    }
}

/// A pre-labeled example used to calibrate the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationExample {
    /// Example utterance.
    pub input: String,
    /// The label it should resolve to.
    pub label: String,
}

/// Semantic matching capability.
///
/// Returns `Ok(Some(label))` only on a confident match; a tie between
/// equally plausible labels is `Ok(None)` — the caller never receives a
/// guess. Errors are recoverable: the router treats them as `Ok(None)`.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        utterance: &str,
        exemplars: &[LabeledExemplars],
        calibration: &[CalibrationExample],
    ) -> Result<Option<String>, ClassifierError>;
}
