use crate::address::{AddressRecord, Field, RowId};
use serde::{Deserialize, Serialize};

/// Row-aligned, read-only table of address records.
///
/// Row `i` of every field index refers to `records[i]`; the catalog and the
/// indices must come from the same build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressCatalog {
    records: Vec<AddressRecord>,
}

impl AddressCatalog {
    pub fn new(records: Vec<AddressRecord>) -> Self {
        Self { records }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn get(&self, row_id: RowId) -> Option<&AddressRecord> {
        self.records.get(row_id.index())
    }

    pub fn records(&self) -> &[AddressRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = (RowId, &AddressRecord)> + '_ {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| (RowId(i), record))
    }

    /// All values of one field, in row order
    pub fn column(&self, field: Field) -> impl Iterator<Item = &str> + '_ {
        self.records.iter().map(move |record| record.get(field))
    }

    pub fn into_records(self) -> Vec<AddressRecord> {
        self.records
    }
}

impl FromIterator<AddressRecord> for AddressCatalog {
    fn from_iter<I: IntoIterator<Item = AddressRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AddressCatalog {
        vec![
            AddressRecord::new("Rua das Flores", "Centro", "São Paulo", "SP", "01310-100"),
            AddressRecord::new("Avenida Brasil", "", "Rio de Janeiro", "RJ", "20000-000"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_row_lookup() {
        let catalog = sample();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(RowId(1)).unwrap().uf, "RJ");
        assert!(catalog.get(RowId(2)).is_none());
    }

    #[test]
    fn test_column_keeps_row_order() {
        let catalog = sample();
        let bairros: Vec<&str> = catalog.column(Field::Bairro).collect();
        assert_eq!(bairros, vec!["Centro", ""]);

        let ids: Vec<RowId> = catalog.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![RowId(0), RowId(1)]);
    }
}
