//! Search responses with per-field explanations.

use crate::weights::{FieldBreakdown, FieldWeights};
use dnematch_core::{AddressQuery, AddressRecord, RowId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final score at or above which a match is labeled high confidence
pub const HIGH_CONFIDENCE_THRESHOLD: f32 = 0.8;

/// Final score at or above which a match is labeled medium confidence
pub const MEDIUM_CONFIDENCE_THRESHOLD: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn from_score(score: f32) -> Self {
        if score >= HIGH_CONFIDENCE_THRESHOLD {
            Confidence::High
        } else if score >= MEDIUM_CONFIDENCE_THRESHOLD {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked catalog row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAddress {
    pub row_id: RowId,
    pub address: AddressRecord,
    /// Weighted sum over the fields in `field_scores`
    pub score: f32,
    pub confidence: Confidence,
    /// Raw (unweighted) similarity of each field that contributed
    pub field_scores: FieldBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub results: Vec<RankedAddress>,
    pub query: AddressQuery,
    /// Number of entries in `results`
    pub total_found: usize,
    /// Candidate rows merged across all fields, before truncation
    pub candidates_considered: usize,
    pub weights_used: FieldWeights,
}

impl SearchResult {
    pub fn empty(query: AddressQuery, weights_used: FieldWeights) -> Self {
        Self {
            results: Vec::new(),
            query,
            total_found: 0,
            candidates_considered: 0,
            weights_used,
        }
    }

    pub fn best(&self) -> Option<&RankedAddress> {
        self.results.first()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
