//! Retrieval and score fusion
//!
//! One nearest-neighbor lookup per supplied text field, then the hits are
//! merged into a single candidate set scored by the dynamic field weights,
//! with the CEP match blended in and the UF filter applied before anything
//! accumulates.

use crate::config::EngineConfig;
use crate::context::SearchContext;
use crate::distance::{match_postal_code, similarity_from_l2};
use crate::explain::{Confidence, RankedAddress, SearchResult};
use crate::weights::{compute_weights, FieldBreakdown, FieldWeights};
use ahash::AHashMap;
use dnematch_core::{AddressQuery, Error, Field, RecordFilter, RegionFilter, Result, RowId};
use ordered_float::OrderedFloat;
use std::sync::Arc;
use tracing::debug;

/// Accumulated score of one catalog row during a single search
#[derive(Debug, Clone, Default)]
struct CandidateScore {
    score: f32,
    breakdown: FieldBreakdown,
}

#[derive(Debug, Clone)]
pub struct AddressSearchEngine {
    context: Arc<SearchContext>,
    config: EngineConfig,
}

impl AddressSearchEngine {
    pub fn new(context: Arc<SearchContext>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { context, config })
    }

    pub fn context(&self) -> &SearchContext {
        &self.context
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Weights this engine would use for `query`
    pub fn compute_weights(&self, query: &AddressQuery) -> FieldWeights {
        compute_weights(
            query,
            &self.config.weights_with_cep,
            &self.config.weights_without_cep,
        )
    }

    /// Search with the configured `top_k` and `search_k`
    pub fn search_default(&self, query: &AddressQuery) -> Result<SearchResult> {
        self.search(query, self.config.top_k, self.config.search_k)
    }

    /// Rank catalog rows for `query`.
    ///
    /// A query with no usable text field gives an empty result, not an
    /// error; the CEP alone never produces candidates. A text field that
    /// normalizes to nothing (`"..."`, `"-"`) counts as not supplied.
    pub fn search(&self, query: &AddressQuery, top_k: usize, search_k: usize) -> Result<SearchResult> {
        if top_k == 0 || search_k == 0 {
            return Err(Error::InvalidConfig(
                "top_k and search_k must be greater than zero".to_string(),
            ));
        }

        let weights = self.compute_weights(query);
        let catalog = self.context.catalog();
        let region = if self.config.use_uf_filter {
            query.uf().and_then(RegionFilter::new)
        } else {
            None
        };

        let embedded = self.context.embedder().embed_query_fields(query)?;
        let mut candidates: AHashMap<RowId, CandidateScore> = AHashMap::new();

        for (field, vector) in &embedded {
            if vector.is_zero() {
                continue;
            }
            let index = match self.context.indices().get(*field) {
                Some(index) => index,
                None => continue,
            };
            let weight = weights.get(*field).unwrap_or(0.0);

            // Over-fetch by the sentinel count so `search_k` real rows
            // survive the sentinel skip.
            let fetch = search_k.saturating_add(index.sentinel_count());
            let hits = index
                .search(vector, fetch)?
                .into_iter()
                .filter(|hit| !index.is_sentinel(hit.row_id))
                .take(search_k);

            for hit in hits {
                if let Some(region) = &region {
                    match catalog.get(hit.row_id) {
                        Some(record) if region.matches(record) => {}
                        _ => continue,
                    }
                }

                let similarity = similarity_from_l2(hit.distance);
                let candidate = candidates.entry(hit.row_id).or_default();
                candidate.score += weight * similarity;
                candidate.breakdown.set(*field, similarity);
            }
        }

        if let Some(query_cep) = query.cep() {
            let cep_weight = weights.get(Field::Cep).unwrap_or(0.0);
            for (row_id, candidate) in candidates.iter_mut() {
                let row_cep = catalog.get(*row_id).map(|r| r.cep.as_str()).unwrap_or("");
                let cep_score = match_postal_code(query_cep, row_cep);
                candidate.score += cep_weight * cep_score;
                candidate.breakdown.set(Field::Cep, cep_score);
            }
        }

        let candidates_considered = candidates.len();
        let mut ranked: Vec<(RowId, CandidateScore)> = candidates.into_iter().collect();
        ranked.sort_by(|(a_id, a), (b_id, b)| {
            OrderedFloat(b.score)
                .cmp(&OrderedFloat(a.score))
                .then(a_id.cmp(b_id))
        });
        ranked.truncate(top_k);

        let results: Vec<RankedAddress> = ranked
            .into_iter()
            .filter_map(|(row_id, candidate)| {
                catalog.get(row_id).map(|record| RankedAddress {
                    row_id,
                    address: record.clone(),
                    score: candidate.score,
                    confidence: Confidence::from_score(candidate.score),
                    field_scores: candidate.breakdown,
                })
            })
            .collect();

        debug!(
            fields = embedded.len(),
            candidates = candidates_considered,
            returned = results.len(),
            top_score = results.first().map(|r| r.score),
            "address search"
        );

        Ok(SearchResult {
            total_found: results.len(),
            results,
            query: query.clone(),
            candidates_considered,
            weights_used: weights,
        })
    }
}
