//! Address query and record types.
//!
//! The field set is closed: three text fields that get a vector index each,
//! plus the postal code (CEP), which is scored by prefix rule instead.
//! The state code (UF) is never scored; it only drives the regional filter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A scored address field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Street name
    Logradouro,
    /// Neighborhood
    Bairro,
    /// City
    Cidade,
    /// Postal code
    Cep,
}

impl Field {
    /// Fields backed by a vector index, in retrieval order
    pub const TEXT: [Field; 3] = [Field::Logradouro, Field::Bairro, Field::Cidade];

    /// Every scored field
    pub const ALL: [Field; 4] = [Field::Logradouro, Field::Bairro, Field::Cidade, Field::Cep];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Logradouro => "logradouro",
            Field::Bairro => "bairro",
            Field::Cidade => "cidade",
            Field::Cep => "cep",
        }
    }

    pub fn is_text(&self) -> bool {
        !matches!(self, Field::Cep)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logradouro" => Ok(Field::Logradouro),
            "bairro" => Ok(Field::Bairro),
            "cidade" => Ok(Field::Cidade),
            "cep" => Ok(Field::Cep),
            other => Err(format!("unknown address field '{}'", other)),
        }
    }
}

/// Position of a record in the catalog. Vector index hits are row ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub usize);

impl RowId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for RowId {
    fn from(i: usize) -> Self {
        RowId(i)
    }
}

/// A search request. Every field is optional; a blank string means the
/// same as an absent one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    logradouro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bairro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cidade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cep: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn owned(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl AddressQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_logradouro(mut self, value: impl Into<String>) -> Self {
        self.logradouro = owned(value);
        self
    }

    #[must_use]
    pub fn with_bairro(mut self, value: impl Into<String>) -> Self {
        self.bairro = owned(value);
        self
    }

    #[must_use]
    pub fn with_cidade(mut self, value: impl Into<String>) -> Self {
        self.cidade = owned(value);
        self
    }

    #[must_use]
    pub fn with_uf(mut self, value: impl Into<String>) -> Self {
        self.uf = owned(value);
        self
    }

    #[must_use]
    pub fn with_cep(mut self, value: impl Into<String>) -> Self {
        self.cep = owned(value);
        self
    }

    /// Value supplied for a scored field, trimmed; `None` when blank or absent
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Logradouro => non_blank(&self.logradouro),
            Field::Bairro => non_blank(&self.bairro),
            Field::Cidade => non_blank(&self.cidade),
            Field::Cep => non_blank(&self.cep),
        }
    }

    pub fn uf(&self) -> Option<&str> {
        non_blank(&self.uf)
    }

    pub fn cep(&self) -> Option<&str> {
        self.get(Field::Cep)
    }

    pub fn has_cep(&self) -> bool {
        self.cep().is_some()
    }

    /// Text fields the caller actually supplied, in retrieval order
    pub fn text_fields(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        Field::TEXT
            .into_iter()
            .filter_map(move |field| self.get(field).map(|value| (field, value)))
    }

    /// True when no scored field is present
    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|field| self.get(*field).is_none())
    }
}

/// One catalog row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressRecord {
    pub logradouro: String,
    pub bairro: String,
    pub cidade: String,
    pub uf: String,
    pub cep: String,
}

impl AddressRecord {
    pub fn new(
        logradouro: impl Into<String>,
        bairro: impl Into<String>,
        cidade: impl Into<String>,
        uf: impl Into<String>,
        cep: impl Into<String>,
    ) -> Self {
        Self {
            logradouro: logradouro.into(),
            bairro: bairro.into(),
            cidade: cidade.into(),
            uf: uf.into(),
            cep: cep.into(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Logradouro => &self.logradouro,
            Field::Bairro => &self.bairro,
            Field::Cidade => &self.cidade,
            Field::Cep => &self.cep,
        }
    }
}

impl fmt::Display for AddressRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {} - {}, {}",
            self.logradouro, self.bairro, self.cidade, self.uf, self.cep
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_fields_are_absent() {
        let query = AddressQuery::new()
            .with_logradouro("Rua das Flores")
            .with_bairro("   ")
            .with_cep("");

        assert_eq!(query.get(Field::Logradouro), Some("Rua das Flores"));
        assert_eq!(query.get(Field::Bairro), None);
        assert!(!query.has_cep());
        assert!(!query.is_empty());
        assert!(AddressQuery::new().is_empty());
    }

    #[test]
    fn test_text_fields_order() {
        let query = AddressQuery::new()
            .with_cidade("São Paulo")
            .with_logradouro("Av. Paulista");

        let fields: Vec<Field> = query.text_fields().map(|(f, _)| f).collect();
        assert_eq!(fields, vec![Field::Logradouro, Field::Cidade]);
    }

    #[test]
    fn test_query_deserialize_partial() {
        let query: AddressQuery = serde_json::from_value(json!({
            "logradouro": "Rua Augusta",
            "uf": "SP",
            "cep": "",
            "numero": "100"
        }))
        .unwrap();

        assert_eq!(query.get(Field::Logradouro), Some("Rua Augusta"));
        assert_eq!(query.uf(), Some("SP"));
        assert!(!query.has_cep());
    }

    #[test]
    fn test_record_missing_keys_default_to_empty() {
        let record: AddressRecord = serde_json::from_value(json!({
            "logradouro": "Rua A",
            "cidade": "Recife",
            "uf": "PE",
            "cep": "50000-000"
        }))
        .unwrap();

        assert_eq!(record.bairro, "");
        assert_eq!(record.get(Field::Cidade), "Recife");
    }

    #[test]
    fn test_field_parse_and_display() {
        assert_eq!("Bairro".parse::<Field>().unwrap(), Field::Bairro);
        assert!("numero".parse::<Field>().is_err());
        assert_eq!(Field::Cep.to_string(), "cep");
        assert!(!Field::Cep.is_text());
    }
}
