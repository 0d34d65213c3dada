//! The loaded search state: embedder, one index per text field, catalog.
//!
//! Built once per process and shared behind `Arc`; nothing here is mutated
//! by a search.

use crate::embedder::FieldEmbedder;
use dnematch_core::{AddressCatalog, Error, Field, Result, VectorIndex};
use std::fmt;
use std::sync::Arc;

/// One vector index per text field
pub struct FieldIndices {
    logradouro: Box<dyn VectorIndex>,
    bairro: Box<dyn VectorIndex>,
    cidade: Box<dyn VectorIndex>,
}

impl FieldIndices {
    pub fn new(
        logradouro: Box<dyn VectorIndex>,
        bairro: Box<dyn VectorIndex>,
        cidade: Box<dyn VectorIndex>,
    ) -> Self {
        Self {
            logradouro,
            bairro,
            cidade,
        }
    }

    /// `None` for fields without an index (CEP)
    pub fn get(&self, field: Field) -> Option<&dyn VectorIndex> {
        match field {
            Field::Logradouro => Some(self.logradouro.as_ref()),
            Field::Bairro => Some(self.bairro.as_ref()),
            Field::Cidade => Some(self.cidade.as_ref()),
            Field::Cep => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &dyn VectorIndex)> + '_ {
        Field::TEXT
            .into_iter()
            .filter_map(move |field| self.get(field).map(|index| (field, index)))
    }
}

impl fmt::Debug for FieldIndices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("FieldIndices");
        for (field, index) in self.iter() {
            s.field(field.as_str(), &(index.len(), index.dim()));
        }
        s.finish()
    }
}

#[derive(Debug)]
pub struct SearchContext {
    embedder: FieldEmbedder,
    indices: FieldIndices,
    catalog: Arc<AddressCatalog>,
}

impl SearchContext {
    /// Every index must hold exactly one vector per catalog row, with the
    /// embedder's dimension.
    pub fn new(
        embedder: FieldEmbedder,
        indices: FieldIndices,
        catalog: Arc<AddressCatalog>,
    ) -> Result<Self> {
        for (field, index) in indices.iter() {
            if index.len() != catalog.len() {
                return Err(Error::IndexMismatch {
                    field: field.to_string(),
                    expected: catalog.len(),
                    actual: index.len(),
                });
            }
            if index.dim() != embedder.dim() {
                return Err(Error::InvalidDimension {
                    expected: embedder.dim(),
                    actual: index.dim(),
                });
            }
        }

        Ok(Self {
            embedder,
            indices,
            catalog,
        })
    }

    pub fn embedder(&self) -> &FieldEmbedder {
        &self.embedder
    }

    pub fn indices(&self) -> &FieldIndices {
        &self.indices
    }

    pub fn catalog(&self) -> &AddressCatalog {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }
}
