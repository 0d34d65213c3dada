//! Dynamic field weighting.
//!
//! The weight of each field depends on which fields the caller actually
//! supplied: a base table is picked by CEP presence, fields the query lacks
//! are dropped and the rest renormalized to sum to 1.0.

use crate::normalize::normalize_text;
use dnematch_core::{AddressQuery, Field};
use serde::{Deserialize, Serialize};

/// One optional `f32` per scored field.
///
/// Used both for the weights of a search and for the per-field similarity
/// breakdown of a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldScores {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logradouro: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bairro: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidade: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cep: Option<f32>,
}

/// Weight per field; present weights sum to 1.0 unless empty
pub type FieldWeights = FieldScores;

/// Raw similarity in [0, 1] per field that contributed to a candidate
pub type FieldBreakdown = FieldScores;

impl FieldScores {
    pub fn get(&self, field: Field) -> Option<f32> {
        match field {
            Field::Logradouro => self.logradouro,
            Field::Bairro => self.bairro,
            Field::Cidade => self.cidade,
            Field::Cep => self.cep,
        }
    }

    pub fn set(&mut self, field: Field, value: f32) {
        *self.slot(field) = Some(value);
    }

    pub fn remove(&mut self, field: Field) -> Option<f32> {
        self.slot(field).take()
    }

    fn slot(&mut self, field: Field) -> &mut Option<f32> {
        match field {
            Field::Logradouro => &mut self.logradouro,
            Field::Bairro => &mut self.bairro,
            Field::Cidade => &mut self.cidade,
            Field::Cep => &mut self.cep,
        }
    }

    /// Present entries in field order
    pub fn iter(&self) -> impl Iterator<Item = (Field, f32)> + '_ {
        Field::ALL
            .into_iter()
            .filter_map(move |field| self.get(field).map(|v| (field, v)))
    }

    pub fn sum(&self) -> f32 {
        self.iter().map(|(_, v)| v).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Scale present entries so they sum to 1.0. A zero total leaves the
    /// entries untouched.
    pub fn renormalized(mut self) -> Self {
        let total = self.sum();
        if total > 0.0 {
            for field in Field::ALL {
                if let Some(v) = self.slot(field).as_mut() {
                    *v /= total;
                }
            }
        }
        self
    }
}

/// Weights for `query` given the two base tables.
///
/// `cep` is kept whenever the query carries a CEP and the selected table
/// weights it; text fields are kept only when supplied and non-empty after
/// normalization. A zero total returns the kept entries unscaled.
pub fn compute_weights(
    query: &AddressQuery,
    with_cep: &FieldWeights,
    without_cep: &FieldWeights,
) -> FieldWeights {
    let has_cep = query.has_cep();
    let base = if has_cep { with_cep } else { without_cep };

    let mut weights = FieldWeights::default();
    for (field, weight) in base.iter() {
        let keep = match field {
            Field::Cep => has_cep,
            text => query
                .get(text)
                .is_some_and(|value| !normalize_text(value).is_empty()),
        };
        if keep {
            weights.set(field, weight);
        }
    }

    weights.renormalized()
}
