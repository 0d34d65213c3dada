//! # dnematch
//!
//! Resolve loosely written Brazilian postal addresses against a reference
//! catalog.
//!
//! Each text field of the query (`logradouro`, `bairro`, `cidade`) is
//! normalized, embedded and looked up in its own exact L2 index. Hits are
//! merged with weights that depend on which fields were supplied, the CEP
//! is blended in by exact/prefix match, and the UF acts as a hard filter.
//! Every ranked address carries a confidence tier and a per-field breakdown.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! dnematch build --corpus enderecos.jsonl --out data/index
//! dnematch search --index data/index --logradouro "R. das Flores" --uf SP --cep 01310-100
//! dnematch serve --index data/index --port 8080
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use dnematch::prelude::*;
//! use std::sync::Arc;
//!
//! let embedder = FieldEmbedder::hashed(DEFAULT_EMBEDDING_DIM)?;
//! let context = open_context("data/index", embedder)?;
//! let engine = AddressSearchEngine::new(Arc::new(context), EngineConfig::default())?;
//!
//! let query = AddressQuery::new()
//!     .with_logradouro("Av. Paulista")
//!     .with_cidade("São Paulo")
//!     .with_uf("SP");
//! for ranked in engine.search_default(&query)?.results {
//!     println!("{} {:.3} {}", ranked.confidence, ranked.score, ranked.address);
//! }
//! # Ok::<(), dnematch::Error>(())
//! ```
//!
//! ## Crate Structure
//!
//! - [`dnematch-core`](https://docs.rs/dnematch-core) - Address types, catalog, flat L2 index
//! - [`dnematch-similarity`](https://docs.rs/dnematch-similarity) - Normalizer, embedder, weights, fusion
//! - [`dnematch-storage`](https://docs.rs/dnematch-storage) - Index building and build directories
//! - [`dnematch-api`](https://docs.rs/dnematch-api) - REST API

// Re-export core types
pub use dnematch_core::{
    AddressCatalog, AddressQuery, AddressRecord, Error, Field, FlatL2Index, Neighbor,
    RecordFilter, RegionFilter, Result, RowId, Vector, VectorIndex,
};

// Re-export search
pub use dnematch_similarity::{
    compute_weights, match_postal_code, normalize_text, AddressSearchEngine, Confidence,
    EngineConfig, FieldBreakdown, FieldEmbedder, FieldIndices, FieldWeights,
    HashedNgramEncoder, RankedAddress, SearchContext, SearchResult, TextEncoder,
    DEFAULT_BATCH_SIZE, DEFAULT_EMBEDDING_DIM,
};

// Re-export storage
pub use dnematch_storage::{load_corpus, open_context, BuildMetadata, BuiltIndex, IndexBuilder};

// Re-export API
pub use dnematch_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AddressCatalog, AddressQuery, AddressRecord, AddressSearchEngine, BuiltIndex,
        Confidence, EngineConfig, Error, Field, FieldEmbedder, IndexBuilder, Result,
        SearchContext, SearchResult, DEFAULT_EMBEDDING_DIM,
        load_corpus, open_context,
    };
}

/// SIMD-optimized distance kernels
pub mod simd {
    pub use dnematch_core::simd::{dot_product_simd, norm_simd, squared_l2_simd};
}
