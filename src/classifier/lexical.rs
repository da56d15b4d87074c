//! Deterministic lexical classifier.
//!
//! Token-overlap scoring against the exemplar descriptions. Good enough
//! to drive the shipped intents without a remote model, and fully
//! deterministic, which keeps conversations reproducible.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::classifier::{CalibrationExample, Classifier, LabeledExemplars};
use crate::error::ClassifierError;

/// Tokens shorter than this are treated as noise ("I", "to", "my").
const MIN_TOKEN_LEN: usize = 3;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[a-z0-9]+").unwrap())
}

/// Lowercase, split into content tokens, fold trivial plurals.
fn tokenize(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .map(|t| {
            // Both sides of a comparison pass through here, so trimming a
            // trailing "s" stays consistent (benefits ~ benefit).
            match t.strip_suffix('s') {
                Some(stem) if t.len() > MIN_TOKEN_LEN => stem.to_string(),
                _ => t.to_string(),
            }
        })
        .collect()
}

/// Token-overlap classifier.
///
/// Each label scores the largest token intersection between the
/// utterance and any of its exemplars (calibration examples count as
/// extra exemplars). A label wins only with a score at or above
/// `min_score` and no other label tied with it.
pub struct LexicalClassifier {
    min_score: usize,
}

impl LexicalClassifier {
    pub fn new() -> Self {
        Self { min_score: 1 }
    }

    /// Require at least `min_score` shared tokens for a confident match.
    pub fn with_min_score(min_score: usize) -> Self {
        Self { min_score }
    }

    fn score_label(&self, utterance: &HashSet<String>, descriptions: &[&str]) -> usize {
        descriptions
            .iter()
            .map(|d| tokenize(d).intersection(utterance).count())
            .max()
            .unwrap_or(0)
    }
}

impl Default for LexicalClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for LexicalClassifier {
    async fn classify(
        &self,
        utterance: &str,
        exemplars: &[LabeledExemplars],
        calibration: &[CalibrationExample],
    ) -> Result<Option<String>, ClassifierError> {
        let tokens = tokenize(utterance);
        if tokens.is_empty() {
            return Ok(None);
        }

        // Fold calibration examples into each label's exemplar pool.
        let mut extra: HashMap<&str, Vec<&str>> = HashMap::new();
        for example in calibration {
            extra
                .entry(example.label.as_str())
                .or_default()
                .push(example.input.as_str());
        }

        let mut best: Option<(&str, usize)> = None;
        let mut tied = false;
        for group in exemplars {
            let mut descriptions: Vec<&str> =
                group.descriptions.iter().map(String::as_str).collect();
            if let Some(inputs) = extra.get(group.label.as_str()) {
                descriptions.extend(inputs);
            }
            let score = self.score_label(&tokens, &descriptions);
            match best {
                Some((_, top)) if score > top => {
                    best = Some((group.label.as_str(), score));
                    tied = false;
                }
                Some((_, top)) if score == top => tied = true,
                None => best = Some((group.label.as_str(), score)),
                _ => {}
            }
        }

        match best {
            // A tie is never resolved by guessing.
            Some((label, score)) if score >= self.min_score && !tied => {
                debug!(label, score, "Lexical classifier matched");
                Ok(Some(label.to_string()))
            }
            _ => Ok(None),
        }
    }
}
