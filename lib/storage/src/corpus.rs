// Corpus input: JSON Lines or a single JSON array of address records
use dnematch_core::{AddressRecord, Error, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Read address records from `path`.
///
/// A file whose first non-blank character is `[` is parsed as one JSON
/// array; anything else as JSON Lines (blank lines skipped). Keys missing
/// from a record become empty strings.
pub fn load_corpus(path: impl AsRef<Path>) -> Result<Vec<AddressRecord>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let records = parse_corpus(&raw)
        .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e)))?;
    info!(path = %path.display(), records = records.len(), "corpus loaded");
    Ok(records)
}

fn parse_corpus(raw: &str) -> std::result::Result<Vec<AddressRecord>, String> {
    if raw.trim_start().starts_with('[') {
        return serde_json::from_str(raw).map_err(|e| e.to_string());
    }

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<AddressRecord>(line)
                .map_err(|e| format!("line {}: {}", i + 1, e))
        })
        .collect()
}
