// Hard candidate filters applied before score accumulation
use crate::AddressRecord;

pub trait RecordFilter {
    fn matches(&self, record: &AddressRecord) -> bool;
}

/// Keeps only rows from one state (UF). Comparison ignores surrounding
/// whitespace and ASCII case, so `" sp "` selects rows stored as `SP`;
/// an exact comparison would drop them for a formatting difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionFilter {
    uf: String,
}

impl RegionFilter {
    /// `None` for a blank state code: no filtering applies.
    pub fn new(uf: &str) -> Option<Self> {
        let uf = uf.trim();
        if uf.is_empty() {
            None
        } else {
            Some(Self {
                uf: uf.to_ascii_uppercase(),
            })
        }
    }

    pub fn uf(&self) -> &str {
        &self.uf
    }
}

impl RecordFilter for RegionFilter {
    fn matches(&self, record: &AddressRecord) -> bool {
        record.uf.trim().eq_ignore_ascii_case(&self.uf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(uf: &str) -> AddressRecord {
        AddressRecord::new("Rua A", "Centro", "Cidade", uf, "00000-000")
    }

    #[test]
    fn test_region_filter() {
        let filter = RegionFilter::new("SP").unwrap();
        assert!(filter.matches(&record("SP")));
        assert!(filter.matches(&record(" sp ")));
        assert!(!filter.matches(&record("RJ")));
        assert!(!filter.matches(&record("")));
    }

    #[test]
    fn test_blank_region_disables_filter() {
        assert!(RegionFilter::new("  ").is_none());
        assert_eq!(RegionFilter::new("mg").unwrap().uf(), "MG");
    }
}
