//! # dnematch Similarity
//!
//! Field embedding, dynamic weighting and score fusion for Brazilian
//! address search.
//!
//! ## Features
//!
//! - **Normalization**: accent stripping, abbreviation expansion (`R.` → `rua`)
//! - **Field Embedding**: pluggable [`TextEncoder`], batched, empty fields map
//!   to a zero sentinel
//! - **Dynamic Weights**: per-query weights depending on which fields were given
//! - **Fusion**: per-field retrieval merged into one ranking, CEP matching,
//!   UF filtering and confidence tiers
//!
//! ## Example
//!
//! ```rust
//! use dnematch_core::{AddressCatalog, AddressQuery, AddressRecord, Field, FlatL2Index, VectorIndex};
//! use dnematch_similarity::{AddressSearchEngine, EngineConfig, FieldEmbedder, FieldIndices, SearchContext};
//! use std::sync::Arc;
//!
//! let embedder = FieldEmbedder::hashed(64).unwrap();
//! let catalog = AddressCatalog::new(vec![
//!     AddressRecord::new("Rua das Flores", "Centro", "São Paulo", "SP", "01310-100"),
//! ]);
//!
//! let mut indices = Vec::new();
//! for field in Field::TEXT {
//!     let texts: Vec<&str> = catalog.column(field).collect();
//!     let mut index = FlatL2Index::new(embedder.dim()).unwrap();
//!     index.add(&embedder.embed_batch(&texts).unwrap()).unwrap();
//!     indices.push(Box::new(index) as Box<dyn VectorIndex>);
//! }
//! let cidade = indices.pop().unwrap();
//! let bairro = indices.pop().unwrap();
//! let logradouro = indices.pop().unwrap();
//!
//! let context = SearchContext::new(
//!     embedder,
//!     FieldIndices::new(logradouro, bairro, cidade),
//!     Arc::new(catalog),
//! )
//! .unwrap();
//! let engine = AddressSearchEngine::new(Arc::new(context), EngineConfig::default()).unwrap();
//!
//! let query = AddressQuery::new().with_logradouro("R. das Flores").with_uf("SP");
//! let result = engine.search_default(&query).unwrap();
//! assert_eq!(result.results[0].address.cep, "01310-100");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Query    │────>│  Embedder   │────>│ Field index │ x3
//! │  (fields)   │     │ (normalize) │     │  (flat L2)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!       │                                        │
//!       │              ┌─────────────┐           │
//!       └─────────────>│   Fusion    │<──────────┘
//!          weights     │ (UF, CEP)   │
//!                      └─────────────┘
//!                             │
//!                      ┌─────────────┐
//!                      │  Explain    │
//!                      │  (results)  │
//!                      └─────────────┘
//! ```

pub mod config;
pub mod context;
pub mod distance;
pub mod embedder;
pub mod explain;
pub mod fusion;
pub mod normalize;
pub mod weights;

// Re-export main types for convenience
pub use config::{EngineConfig, DEFAULT_SEARCH_K, DEFAULT_TOP_K};
pub use context::{FieldIndices, SearchContext};
pub use distance::{clean_postal_code, match_postal_code, similarity_from_l2};
pub use embedder::{
    FieldEmbedder, HashedNgramEncoder, TextEncoder, DEFAULT_BATCH_SIZE, DEFAULT_EMBEDDING_DIM,
};
pub use explain::{
    Confidence, RankedAddress, SearchResult, HIGH_CONFIDENCE_THRESHOLD,
    MEDIUM_CONFIDENCE_THRESHOLD,
};
pub use fusion::AddressSearchEngine;
pub use normalize::normalize_text;
pub use weights::{compute_weights, FieldBreakdown, FieldScores, FieldWeights};
