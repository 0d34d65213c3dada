//! Build directory persistence.
//!
//! Layout of a build directory:
//!
//! ```text
//! metadata.json            format version, counts, encoder, sha256 per artifact
//! addresses.bin.gz         catalog (bincode, gzip)
//! logradouro_index.bin.gz  field vectors (bincode, gzip)
//! bairro_index.bin.gz
//! cidade_index.bin.gz
//! ```
//!
//! Every file is replaced atomically. `metadata.json` is written last, so a
//! directory whose metadata checksums match its artifacts is a complete build.

use crate::builder::BuiltIndex;
use chrono::{DateTime, Utc};
use dnematch_core::{AddressCatalog, Error, Field, FlatL2Index, Result, VectorIndex};
use dnematch_similarity::{FieldEmbedder, SearchContext};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const FORMAT_VERSION: u32 = 1;
pub const METADATA_FILE: &str = "metadata.json";
pub const CATALOG_FILE: &str = "addresses.bin.gz";

/// File name of the vector artifact of `field`
pub fn index_file_name(field: Field) -> String {
    format!("{}_index.bin.gz", field)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildMetadata {
    pub format_version: u32,
    pub fields: Vec<Field>,
    pub n_records: usize,
    pub embedding_dim: usize,
    pub encoder_id: String,
    pub created_at: DateTime<Utc>,
    /// Artifact file name → hex sha256 of its bytes on disk
    pub checksums: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize)]
struct IndexArtifact {
    field: Field,
    dim: usize,
    data: Vec<f32>,
}

fn encode_artifact<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let raw = bincode::serialize(value).map_err(|e| Error::Serialization(e.to_string()))?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    Ok(encoder.finish()?)
}

fn decode_artifact<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut raw = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut raw)?;
    bincode::deserialize(&raw).map_err(|e| Error::Serialization(e.to_string()))
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    use atomicwrites::{AllowOverwrite, AtomicFile};

    AtomicFile::new(path, AllowOverwrite)
        .write(|f| f.write_all(bytes))
        .map_err(|e| Error::Persistence(format!("{}: {}", path.display(), e)))
}

fn read_artifact(dir: &Path, name: &str, checksums: &BTreeMap<String, String>) -> Result<Vec<u8>> {
    let path = dir.join(name);
    if !path.is_file() {
        return Err(Error::MissingArtifact(path));
    }
    let expected = checksums.get(name).ok_or_else(|| {
        Error::IncompatibleBuild(format!("metadata has no checksum for {}", name))
    })?;

    let bytes = fs::read(&path)?;
    if &sha256_hex(&bytes) != expected {
        return Err(Error::ChecksumMismatch(name.to_string()));
    }
    Ok(bytes)
}

impl BuildMetadata {
    pub fn read(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(METADATA_FILE);
        if !path.is_file() {
            return Err(Error::MissingArtifact(path));
        }
        let raw = fs::read_to_string(&path)?;
        let metadata: BuildMetadata = serde_json::from_str(&raw).map_err(|e| {
            Error::IncompatibleBuild(format!("unreadable {}: {}", METADATA_FILE, e))
        })?;

        if metadata.format_version != FORMAT_VERSION {
            return Err(Error::IncompatibleBuild(format!(
                "format version {} (supported: {})",
                metadata.format_version, FORMAT_VERSION
            )));
        }
        if metadata.fields != Field::TEXT {
            return Err(Error::IncompatibleBuild(format!(
                "unexpected indexed fields {:?}",
                metadata.fields
            )));
        }
        Ok(metadata)
    }

    /// Every artifact file this build consists of
    pub fn artifact_names(&self) -> Vec<String> {
        std::iter::once(CATALOG_FILE.to_string())
            .chain(self.fields.iter().map(|f| index_file_name(*f)))
            .collect()
    }
}

impl BuiltIndex {
    /// Write the build into `dir`, creating it if needed
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<BuildMetadata> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut checksums = BTreeMap::new();

        let catalog_bytes = encode_artifact(&self.catalog)?;
        write_atomic(&dir.join(CATALOG_FILE), &catalog_bytes)?;
        checksums.insert(CATALOG_FILE.to_string(), sha256_hex(&catalog_bytes));

        for field in Field::TEXT {
            let Some(index) = self.index(field) else {
                continue;
            };
            let artifact = IndexArtifact {
                field,
                dim: index.dim(),
                data: index.raw().to_vec(),
            };
            let bytes = encode_artifact(&artifact)?;
            let name = index_file_name(field);
            write_atomic(&dir.join(&name), &bytes)?;
            debug!(file = %name, bytes = bytes.len(), "artifact written");
            checksums.insert(name, sha256_hex(&bytes));
        }

        let metadata = BuildMetadata {
            format_version: FORMAT_VERSION,
            fields: Field::TEXT.to_vec(),
            n_records: self.catalog.len(),
            embedding_dim: self.embedding_dim,
            encoder_id: self.encoder_id.clone(),
            created_at: self.created_at,
            checksums,
        };
        let json = serde_json::to_vec_pretty(&metadata)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        write_atomic(&dir.join(METADATA_FILE), &json)?;

        info!(
            dir = %dir.display(),
            records = metadata.n_records,
            "build saved"
        );
        Ok(metadata)
    }

    /// Load and validate a build directory.
    ///
    /// Any missing file, checksum failure, count or dimension mismatch is a
    /// configuration error.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let metadata = BuildMetadata::read(dir)?;

        let catalog: AddressCatalog =
            decode_artifact(&read_artifact(dir, CATALOG_FILE, &metadata.checksums)?)?;
        if catalog.len() != metadata.n_records {
            return Err(Error::IndexMismatch {
                field: "catalog".to_string(),
                expected: metadata.n_records,
                actual: catalog.len(),
            });
        }

        let mut indices: Vec<FlatL2Index> = Vec::with_capacity(Field::TEXT.len());
        for field in Field::TEXT {
            let name = index_file_name(field);
            let artifact: IndexArtifact =
                decode_artifact(&read_artifact(dir, &name, &metadata.checksums)?)?;

            if artifact.field != field {
                return Err(Error::IncompatibleBuild(format!(
                    "{} holds vectors for {}",
                    name, artifact.field
                )));
            }
            if artifact.dim != metadata.embedding_dim {
                return Err(Error::InvalidDimension {
                    expected: metadata.embedding_dim,
                    actual: artifact.dim,
                });
            }

            let index = FlatL2Index::from_raw(artifact.dim, artifact.data)?;
            if index.len() != metadata.n_records {
                return Err(Error::IndexMismatch {
                    field: field.to_string(),
                    expected: metadata.n_records,
                    actual: index.len(),
                });
            }
            indices.push(index);
        }

        let mut indices = indices.into_iter();
        let mut next = || {
            indices
                .next()
                .ok_or_else(|| Error::Persistence("field index missing after load".to_string()))
        };
        let built = BuiltIndex {
            logradouro: next()?,
            bairro: next()?,
            cidade: next()?,
            catalog,
            encoder_id: metadata.encoder_id,
            embedding_dim: metadata.embedding_dim,
            created_at: metadata.created_at,
        };

        info!(
            dir = %dir.display(),
            records = built.len(),
            dim = built.embedding_dim,
            encoder = %built.encoder_id,
            "build loaded"
        );
        Ok(built)
    }
}

/// Load a build directory and wrap it in a search context
pub fn open_context(dir: impl AsRef<Path>, embedder: FieldEmbedder) -> Result<SearchContext> {
    BuiltIndex::load(dir)?.into_context(embedder)
}

/// Paths of every file a saved build consists of
pub fn build_files(dir: impl AsRef<Path>) -> Vec<PathBuf> {
    let dir = dir.as_ref();
    std::iter::once(METADATA_FILE.to_string())
        .chain(std::iter::once(CATALOG_FILE.to_string()))
        .chain(Field::TEXT.iter().map(|f| index_file_name(*f)))
        .map(|name| dir.join(name))
        .collect()
}
