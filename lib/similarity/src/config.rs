use crate::embedder::{DEFAULT_BATCH_SIZE, DEFAULT_EMBEDDING_DIM};
use crate::weights::FieldWeights;
use dnematch_core::{Error, Field, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TOP_K: usize = 5;

/// Candidates requested from each field index per search
pub const DEFAULT_SEARCH_K: usize = 100;

/// Search and build parameters.
///
/// Every key is optional in the JSON form; missing keys take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub top_k: usize,
    pub search_k: usize,
    /// Drop candidates from other states when the query names a UF
    pub use_uf_filter: bool,
    pub weights_with_cep: FieldWeights,
    pub weights_without_cep: FieldWeights,
    pub embedding_dim: usize,
    pub batch_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            search_k: DEFAULT_SEARCH_K,
            use_uf_filter: true,
            weights_with_cep: FieldWeights {
                logradouro: Some(0.40),
                bairro: Some(0.20),
                cidade: Some(0.10),
                cep: Some(0.30),
            },
            weights_without_cep: FieldWeights {
                logradouro: Some(0.55),
                bairro: Some(0.25),
                cidade: Some(0.20),
                cep: None,
            },
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file and validate
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&raw).map_err(|e| {
            Error::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("top_k", self.top_k),
            ("search_k", self.search_k),
            ("embedding_dim", self.embedding_dim),
            ("batch_size", self.batch_size),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }

        for (table, weights) in [
            ("weights_with_cep", &self.weights_with_cep),
            ("weights_without_cep", &self.weights_without_cep),
        ] {
            for (field, weight) in weights.iter() {
                if !weight.is_finite() || weight < 0.0 {
                    return Err(Error::InvalidConfig(format!(
                        "{}.{} must be a finite, non-negative number (got {})",
                        table, field, weight
                    )));
                }
            }
            if weights.sum() <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must give some field a positive weight",
                    table
                )));
            }
        }

        if self.weights_without_cep.get(Field::Cep).is_some() {
            return Err(Error::InvalidConfig(
                "weights_without_cep cannot weight the cep field".to_string(),
            ));
        }
        Ok(())
    }
}
