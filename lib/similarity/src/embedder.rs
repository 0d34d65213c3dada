//! Field embedding.
//!
//! A [`TextEncoder`] is the model: it turns non-empty canonical text into a
//! fixed-size vector. [`FieldEmbedder`] wraps one, normalizes input first,
//! batches requests and maps empty fields to the zero sentinel.

use crate::normalize::normalize_text;
use dnematch_core::{AddressQuery, Error, Field, Result, Vector};
use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;
use twox_hash::XxHash64;

/// Default output dimension of [`HashedNgramEncoder`]
pub const DEFAULT_EMBEDDING_DIM: usize = 256;

/// Default number of texts sent to the encoder per call
pub const DEFAULT_BATCH_SIZE: usize = 32;

pub trait TextEncoder: Send + Sync {
    /// Stable identifier stored with a build; a build can only be searched
    /// with an encoder reporting the same id.
    fn encoder_id(&self) -> String;

    fn dim(&self) -> usize;

    /// Encode canonical, non-empty texts. Must return exactly one vector of
    /// `dim()` per input, in order.
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vector>>;
}

/// Model-free encoder: character trigrams plus whole words, hashed into
/// `dim` buckets with XxHash64 and L2-normalized.
///
/// Texts sharing most of their trigrams land close together, which is what
/// absorbs typos and partial street names.
#[derive(Debug, Clone, Copy)]
pub struct HashedNgramEncoder {
    dim: usize,
}

const TRIGRAM_WEIGHT: f32 = 1.0;
const WORD_WEIGHT: f32 = 2.0;

impl HashedNgramEncoder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self { dim })
    }

    #[inline]
    fn bucket(&self, token: &str) -> usize {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(token.as_bytes());
        (hasher.finish() % self.dim as u64) as usize
    }

    fn encode_one(&self, text: &str) -> Vector {
        let mut data = vec![0.0f32; self.dim];

        let padded: Vec<char> = format!("  {}  ", text).chars().collect();
        let mut gram = String::with_capacity(12);
        for window in padded.windows(3) {
            gram.clear();
            gram.extend(window);
            data[self.bucket(&gram)] += TRIGRAM_WEIGHT;
        }

        for word in text.split_whitespace() {
            data[self.bucket(word)] += WORD_WEIGHT;
        }

        let mut vector = Vector::new(data);
        vector.normalize();
        vector
    }
}

impl Default for HashedNgramEncoder {
    fn default() -> Self {
        Self {
            dim: DEFAULT_EMBEDDING_DIM,
        }
    }
}

impl TextEncoder for HashedNgramEncoder {
    fn encoder_id(&self) -> String {
        format!("hashed-ngram-xxh64:d{}", self.dim)
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
        Ok(texts.iter().map(|text| self.encode_one(text)).collect())
    }
}

/// Normalizing, batching front end over a [`TextEncoder`]
#[derive(Clone)]
pub struct FieldEmbedder {
    encoder: Arc<dyn TextEncoder>,
    batch_size: usize,
}

impl fmt::Debug for FieldEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldEmbedder")
            .field("encoder", &self.encoder.encoder_id())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl FieldEmbedder {
    pub fn new(encoder: Arc<dyn TextEncoder>) -> Self {
        Self {
            encoder,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Embedder over a [`HashedNgramEncoder`] of the given dimension
    pub fn hashed(dim: usize) -> Result<Self> {
        Ok(Self::new(Arc::new(HashedNgramEncoder::new(dim)?)))
    }

    /// Zero is treated as 1
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn dim(&self) -> usize {
        self.encoder.dim()
    }

    pub fn encoder_id(&self) -> String {
        self.encoder.encoder_id()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embed one field value. Text that normalizes to nothing gives the
    /// zero sentinel without calling the encoder.
    pub fn embed(&self, text: &str) -> Result<Vector> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Ok(Vector::zeros(self.dim()));
        }
        let mut out = self.encode_checked(&[normalized.as_str()])?;
        out.pop()
            .ok_or_else(|| Error::Embedding("encoder returned no vector".to_string()))
    }

    /// Embed many values, in order. Empty values become zero sentinels and
    /// are never sent to the encoder; the rest go out in `batch_size` chunks.
    pub fn embed_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Vector>> {
        let normalized: Vec<String> = texts.iter().map(|t| normalize_text(t.as_ref())).collect();

        let pending: Vec<usize> = normalized
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.is_empty())
            .map(|(i, _)| i)
            .collect();

        let mut vectors: Vec<Option<Vector>> = vec![None; normalized.len()];
        for chunk in pending.chunks(self.batch_size) {
            let batch: Vec<&str> = chunk.iter().map(|&i| normalized[i].as_str()).collect();
            let encoded = self.encode_checked(&batch)?;
            for (&i, vector) in chunk.iter().zip(encoded) {
                vectors[i] = Some(vector);
            }
        }

        let dim = self.dim();
        Ok(vectors
            .into_iter()
            .map(|v| v.unwrap_or_else(|| Vector::zeros(dim)))
            .collect())
    }

    /// Vectors for the text fields the query supplies, in retrieval order.
    /// Fields that normalize to nothing are left out.
    pub fn embed_query_fields(&self, query: &AddressQuery) -> Result<Vec<(Field, Vector)>> {
        let fields: Vec<(Field, String)> = query
            .text_fields()
            .map(|(field, text)| (field, normalize_text(text)))
            .filter(|(_, text)| !text.is_empty())
            .collect();
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(fields.len());
        for chunk in fields.chunks(self.batch_size) {
            let batch: Vec<&str> = chunk.iter().map(|(_, text)| text.as_str()).collect();
            vectors.extend(self.encode_checked(&batch)?);
        }
        Ok(fields
            .into_iter()
            .map(|(field, _)| field)
            .zip(vectors)
            .collect())
    }

    fn encode_checked(&self, batch: &[&str]) -> Result<Vec<Vector>> {
        let encoded = self.encoder.encode_batch(batch)?;
        if encoded.len() != batch.len() {
            return Err(Error::Embedding(format!(
                "encoder returned {} vectors for {} texts",
                encoded.len(),
                batch.len()
            )));
        }
        let dim = self.dim();
        if let Some(bad) = encoded.iter().find(|v| v.dim() != dim) {
            return Err(Error::InvalidDimension {
                expected: dim,
                actual: bad.dim(),
            });
        }
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records every batch it receives
    struct RecordingEncoder {
        inner: HashedNgramEncoder,
        calls: AtomicUsize,
        seen: Mutex<Vec<Vec<String>>>,
    }

    impl RecordingEncoder {
        fn new(dim: usize) -> Self {
            Self {
                inner: HashedNgramEncoder::new(dim).unwrap(),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextEncoder for RecordingEncoder {
        fn encoder_id(&self) -> String {
            "recording".to_string()
        }

        fn dim(&self) -> usize {
            self.inner.dim()
        }

        fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push(texts.iter().map(|t| t.to_string()).collect());
            self.inner.encode_batch(texts)
        }
    }

    struct ShortEncoder;

    impl TextEncoder for ShortEncoder {
        fn encoder_id(&self) -> String {
            "short".to_string()
        }

        fn dim(&self) -> usize {
            4
        }

        fn encode_batch(&self, _texts: &[&str]) -> Result<Vec<Vector>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_hashed_encoder_unit_norm_and_deterministic() {
        let encoder = HashedNgramEncoder::new(64).unwrap();
        let a = encoder.encode_batch(&["rua das flores"]).unwrap();
        let b = encoder.encode_batch(&["rua das flores"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].dim(), 64);

        let norm: f32 = a[0].as_slice().iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert_eq!(encoder.encoder_id(), "hashed-ngram-xxh64:d64");
    }

    #[test]
    fn test_similar_text_is_closer() {
        let embedder = FieldEmbedder::hashed(256).unwrap();
        let target = embedder.embed("Rua das Flores").unwrap();
        let typo = embedder.embed("Rua das Flroes").unwrap();
        let other = embedder.embed("Avenida Getulio Vargas").unwrap();

        assert!(target.squared_l2(&typo) < target.squared_l2(&other));
    }

    #[test]
    fn test_empty_text_is_zero_sentinel() {
        let embedder = FieldEmbedder::hashed(32).unwrap();
        let v = embedder.embed("  ").unwrap();
        assert_eq!(v.dim(), 32);
        assert!(v.is_zero());

        let batch = embedder.embed_batch(&[""]).unwrap();
        assert_eq!(batch[0], embedder.embed("").unwrap());
    }

    #[test]
    fn test_abbreviations_embed_identically() {
        let embedder = FieldEmbedder::hashed(128).unwrap();
        assert_eq!(
            embedder.embed("Av. Paulista").unwrap(),
            embedder.embed("avenida paulista").unwrap()
        );
    }

    #[test]
    fn test_batch_skips_empty_and_chunks() {
        let encoder = Arc::new(RecordingEncoder::new(16));
        let embedder = FieldEmbedder::new(encoder.clone()).with_batch_size(2);

        let texts = ["Rua A", "", "Rua B", "Rua C", "...", "Rua D", "Rua E"];
        let vectors = embedder.embed_batch(&texts).unwrap();

        assert_eq!(vectors.len(), texts.len());
        assert!(vectors[1].is_zero());
        assert!(vectors[4].is_zero());
        assert!(!vectors[0].is_zero());
        assert_eq!(vectors[5], embedder.embed("Rua D").unwrap());

        // 5 non-empty texts in chunks of 2, plus the single embed() above
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 4);
        let seen = encoder.seen.lock().unwrap();
        assert_eq!(seen[0], vec!["rua a", "rua b"]);
        assert_eq!(seen[2], vec!["rua e"]);
        assert!(seen.iter().flatten().all(|t| !t.is_empty()));
    }

    #[test]
    fn test_encoder_count_mismatch_is_error() {
        let embedder = FieldEmbedder::new(Arc::new(ShortEncoder));
        assert!(matches!(embedder.embed("Rua A"), Err(Error::Embedding(_))));
        // Nothing to encode, so the broken encoder is never consulted
        assert!(embedder.embed_batch(&["", " "]).is_ok());
    }

    #[test]
    fn test_embed_query_fields() {
        let embedder = FieldEmbedder::hashed(32).unwrap();
        let query = AddressQuery::new()
            .with_cidade("Campinas")
            .with_logradouro("R. Barão")
            .with_cep("13000-000");

        let fields = embedder.embed_query_fields(&query).unwrap();
        let names: Vec<Field> = fields.iter().map(|(f, _)| *f).collect();
        assert_eq!(names, vec![Field::Logradouro, Field::Cidade]);
        assert_eq!(fields[1].1, embedder.embed("Campinas").unwrap());
    }

    #[test]
    fn test_embed_query_fields_skips_punctuation_only() {
        let embedder = FieldEmbedder::hashed(32).unwrap();
        let query = AddressQuery::new()
            .with_logradouro("...")
            .with_bairro("Centro")
            .with_cidade("-");

        let fields = embedder.embed_query_fields(&query).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, Field::Bairro);
        assert!(!fields[0].1.is_zero());

        let blank = AddressQuery::new().with_logradouro("-").with_cep("01310-100");
        assert!(embedder.embed_query_fields(&blank).unwrap().is_empty());
    }
}
