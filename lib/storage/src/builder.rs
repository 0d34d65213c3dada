// Builds the per-field indices and catalog from a corpus
use chrono::{DateTime, Utc};
use dnematch_core::{
    AddressCatalog, AddressRecord, Error, Field, FlatL2Index, Result, VectorIndex,
};
use dnematch_similarity::{FieldEmbedder, FieldIndices, SearchContext};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Embeds every indexed field of a corpus and fills one flat index per field
pub struct IndexBuilder {
    embedder: FieldEmbedder,
}

impl IndexBuilder {
    pub fn new(embedder: FieldEmbedder) -> Self {
        Self { embedder }
    }

    pub fn embedder(&self) -> &FieldEmbedder {
        &self.embedder
    }

    pub fn build(&self, records: Vec<AddressRecord>) -> Result<BuiltIndex> {
        let started = Instant::now();
        let catalog = AddressCatalog::new(records);
        info!(
            records = catalog.len(),
            dim = self.embedder.dim(),
            encoder = %self.embedder.encoder_id(),
            "building field indices"
        );

        let mut logradouro = None;
        let mut bairro = None;
        let mut cidade = None;

        for field in Field::TEXT {
            let texts: Vec<&str> = catalog.column(field).collect();
            let vectors = self.embedder.embed_batch(&texts)?;

            let mut index = FlatL2Index::new(self.embedder.dim())?;
            index.add(&vectors)?;
            let empty = vectors.iter().filter(|v| v.is_zero()).count();
            debug!(field = %field, vectors = index.len(), empty, "field index built");

            match field {
                Field::Logradouro => logradouro = Some(index),
                Field::Bairro => bairro = Some(index),
                Field::Cidade => cidade = Some(index),
                Field::Cep => {}
            }
        }

        let missing = |field: Field| Error::Persistence(format!("no index built for {}", field));
        let built = BuiltIndex {
            logradouro: logradouro.ok_or_else(|| missing(Field::Logradouro))?,
            bairro: bairro.ok_or_else(|| missing(Field::Bairro))?,
            cidade: cidade.ok_or_else(|| missing(Field::Cidade))?,
            catalog,
            encoder_id: self.embedder.encoder_id(),
            embedding_dim: self.embedder.dim(),
            created_at: Utc::now(),
        };

        info!(
            records = built.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "build complete"
        );
        Ok(built)
    }
}

/// A complete build: catalog plus the three row-aligned field indices
#[derive(Debug, Clone)]
pub struct BuiltIndex {
    pub(crate) catalog: AddressCatalog,
    pub(crate) logradouro: FlatL2Index,
    pub(crate) bairro: FlatL2Index,
    pub(crate) cidade: FlatL2Index,
    pub(crate) encoder_id: String,
    pub(crate) embedding_dim: usize,
    pub(crate) created_at: DateTime<Utc>,
}

impl BuiltIndex {
    pub fn catalog(&self) -> &AddressCatalog {
        &self.catalog
    }

    pub fn index(&self, field: Field) -> Option<&FlatL2Index> {
        match field {
            Field::Logradouro => Some(&self.logradouro),
            Field::Bairro => Some(&self.bairro),
            Field::Cidade => Some(&self.cidade),
            Field::Cep => None,
        }
    }

    pub fn encoder_id(&self) -> &str {
        &self.encoder_id
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// Hand the build to a search context. The embedder must be the one the
    /// build was made with (same encoder id and dimension).
    pub fn into_context(self, embedder: FieldEmbedder) -> Result<SearchContext> {
        if embedder.encoder_id() != self.encoder_id {
            return Err(Error::IncompatibleBuild(format!(
                "built with encoder '{}', searching with '{}'",
                self.encoder_id,
                embedder.encoder_id()
            )));
        }
        if embedder.dim() != self.embedding_dim {
            return Err(Error::InvalidDimension {
                expected: self.embedding_dim,
                actual: embedder.dim(),
            });
        }

        let indices = FieldIndices::new(
            Box::new(self.logradouro),
            Box::new(self.bairro),
            Box::new(self.cidade),
        );
        SearchContext::new(embedder, indices, Arc::new(self.catalog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnematch_core::RowId;

    fn records() -> Vec<AddressRecord> {
        vec![
            AddressRecord::new("Rua das Flores", "Centro", "São Paulo", "SP", "01310-100"),
            AddressRecord::new("Avenida Brasil", "", "Rio de Janeiro", "RJ", "20040-002"),
        ]
    }

    #[test]
    fn test_build_aligns_indices_with_catalog() {
        let built = IndexBuilder::new(FieldEmbedder::hashed(32).unwrap())
            .build(records())
            .unwrap();

        assert_eq!(built.len(), 2);
        for field in Field::TEXT {
            let index = built.index(field).unwrap();
            assert_eq!(index.len(), 2);
            assert_eq!(index.dim(), 32);
        }
        assert!(built.index(Field::Bairro).unwrap().is_sentinel(RowId(1)));
        assert!(!built.index(Field::Bairro).unwrap().is_sentinel(RowId(0)));
        assert_eq!(built.encoder_id(), "hashed-ngram-xxh64:d32");
    }

    #[test]
    fn test_into_context_checks_encoder() {
        let built = IndexBuilder::new(FieldEmbedder::hashed(32).unwrap())
            .build(records())
            .unwrap();

        assert!(matches!(
            built.clone().into_context(FieldEmbedder::hashed(64).unwrap()),
            Err(Error::IncompatibleBuild(_))
        ));
        let context = built.into_context(FieldEmbedder::hashed(32).unwrap()).unwrap();
        assert_eq!(context.len(), 2);
    }

    #[test]
    fn test_build_empty_corpus() {
        let built = IndexBuilder::new(FieldEmbedder::hashed(8).unwrap())
            .build(Vec::new())
            .unwrap();
        assert!(built.is_empty());
        assert!(built.index(Field::Cidade).unwrap().is_empty());
    }
}
