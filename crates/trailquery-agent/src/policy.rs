// ABOUTME: Tunable thresholds steering the orchestration loop and the prompts it sends.
// ABOUTME: These are advisory heuristics for the model, not exact computations.

use serde::{Deserialize, Serialize};

/// Display colors assigned to persons when an answer involves several of them.
pub const PERSON_COLORS: [&str; 5] = ["#3B82F6", "#EF4444", "#10B981", "#F59E0B", "#8B5CF6"];

/// Thresholds and sampling parameters for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativePolicy {
    /// A fragment must be longer than this (in characters, after trimming)
    /// to count as real narrative.
    pub min_narrative_chars: usize,
    /// Persons with more records than this are sampled in the fallback digest.
    pub digest_sample_threshold: usize,
    /// Records taken from the start, middle, and end when sampling.
    pub digest_sample_edge: usize,
    /// Distance under which the prompt suggests two people were together.
    pub proximity_threshold_meters: f64,
    pub primary_temperature: f64,
    pub fallback_temperature: f64,
}

impl Default for NarrativePolicy {
    fn default() -> Self {
        Self {
            min_narrative_chars: 10,
            digest_sample_threshold: 10,
            digest_sample_edge: 3,
            proximity_threshold_meters: 100.0,
            primary_temperature: 0.1,
            fallback_temperature: 0.2,
        }
    }
}

impl NarrativePolicy {
    /// True if any fragment is long enough to be taken as the model's own answer.
    pub fn has_real_narrative<S: AsRef<str>>(&self, fragments: &[S]) -> bool {
        fragments
            .iter()
            .any(|f| f.as_ref().trim().chars().count() > self.min_narrative_chars)
    }
}
