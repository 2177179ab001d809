//! Multi-pass text matching
//!
//! Given the detections of every recognizer pass, pick one point for a target
//! phrase. Stages run in order and the first stage with a hit wins:
//!
//! 1. exact: first detection (pass order, then detection order) whose text
//!    contains the whole target, case-insensitively
//! 2. fuzzy: per pass, the detection covering the largest share of the
//!    target's words; the first pass whose best share exceeds
//!    `FUZZY_MIN_COVERAGE` wins
//! 3. fallback: first detection containing any target word longer than
//!    `FALLBACK_MIN_WORD_LEN` characters
//!
//! Identical recognizer output always yields the identical point.

use super::preprocess::Variant;
use crate::models::{Detection, MatchResult, MatchSource};

/// A fuzzy candidate must cover strictly more than this share of words
pub const FUZZY_MIN_COVERAGE: f64 = 0.7;

/// Fallback only considers words strictly longer than this
pub const FALLBACK_MIN_WORD_LEN: usize = 3;

/// Detections of one recognizer pass
#[derive(Debug, Clone)]
pub struct Pass {
    pub variant: Variant,
    pub detections: Vec<Detection>,
}

impl Pass {
    pub fn new(variant: Variant, detections: Vec<Detection>) -> Self {
        Self { variant, detections }
    }
}

/// Locate `target` across `passes`, which must be in pass order
pub fn locate_text(target: &str, passes: &[Pass]) -> Option<MatchResult> {
    let target = target.to_lowercase();
    let words: Vec<&str> = target.split_whitespace().collect();

    exact_match(&target, passes)
        .or_else(|| fuzzy_match(&words, passes))
        .or_else(|| fallback_match(&words, passes))
}

fn exact_match(target: &str, passes: &[Pass]) -> Option<MatchResult> {
    passes.iter().find_map(|pass| {
        pass.detections
            .iter()
            .find(|d| d.text.to_lowercase().contains(target))
            .map(|d| {
                tracing::debug!(variant = %pass.variant, text = %d.text, "Exact text match");
                MatchResult::new(d.center(), MatchSource::Exact)
            })
    })
}

/// Share of `words` found as substrings of `text`
pub fn coverage(words: &[&str], text: &str) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let text = text.to_lowercase();
    let found = words.iter().filter(|w| text.contains(*w)).count();
    found as f64 / words.len() as f64
}

fn fuzzy_match(words: &[&str], passes: &[Pass]) -> Option<MatchResult> {
    if words.is_empty() {
        return None;
    }

    for pass in passes {
        let mut best: Option<(&Detection, f64)> = None;
        for detection in &pass.detections {
            let score = coverage(words, &detection.text);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((detection, score));
            }
        }

        if let Some((detection, score)) = best {
            tracing::debug!(
                variant = %pass.variant,
                text = %detection.text,
                score,
                "Best fuzzy candidate"
            );
            if score > FUZZY_MIN_COVERAGE {
                return Some(MatchResult::new(detection.center(), MatchSource::Fuzzy));
            }
        }
    }

    None
}

fn fallback_match(words: &[&str], passes: &[Pass]) -> Option<MatchResult> {
    let long_words: Vec<&str> = words
        .iter()
        .copied()
        .filter(|w| w.chars().count() > FALLBACK_MIN_WORD_LEN)
        .collect();
    if long_words.is_empty() {
        return None;
    }

    passes.iter().find_map(|pass| {
        pass.detections.iter().find_map(|d| {
            let text = d.text.to_lowercase();
            long_words.iter().find(|w| text.contains(*w)).map(|w| {
                tracing::debug!(variant = %pass.variant, text = %d.text, word = %w, "Fallback text match");
                MatchResult::new(d.center(), MatchSource::Fallback)
            })
        })
    })
}
