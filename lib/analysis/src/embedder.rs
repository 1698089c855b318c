//! Embedding method
//!
//! The embedding model is an opaque capability behind [`EmbeddingModel`].
//! [`EmbeddingIndexer`] truncates each text to a token budget, embeds batches
//! in parallel and reassembles vectors by input index. Any failed or malformed
//! embedding aborts the whole batch so rows stay aligned with the records.

use ahash::RandomState;
use grantlens_core::{Error, Result, Vector};
use rayon::prelude::*;
use std::collections::HashSet;
use std::hash::BuildHasher;
use std::sync::Arc;

/// Default output width of [`HashingEmbedder`]
pub const DEFAULT_EMBEDDING_DIM: usize = 256;

/// Default token budget per text
pub const DEFAULT_MAX_TOKENS: usize = 512;

/// Default number of texts per parallel batch
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// A text embedding model producing fixed-width vectors
pub trait EmbeddingModel: Send + Sync {
    /// Width of every vector this model returns
    fn dim(&self) -> usize;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Lower-cased tokens split on whitespace and ASCII punctuation
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Deterministic local model: character trigrams and words hashed into a
/// fixed number of buckets, then L2-normalized.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
    hasher: RandomState,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim: dim.max(1),
            hasher: RandomState::with_seeds(
                0x243f_6a88_85a3_08d3,
                0x1319_8a2e_0370_7344,
                0xa409_3822_299f_31d0,
                0x082e_fa98_ec4e_6c89,
            ),
        }
    }

    #[inline]
    fn bucket(&self, feature: &str) -> usize {
        (self.hasher.hash_one(feature) % self.dim as u64) as usize
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

impl EmbeddingModel for HashingEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dim];
        let normalized = text.to_lowercase();

        let padded: Vec<char> = format!("  {}  ", normalized).chars().collect();
        let trigrams: HashSet<String> = padded.windows(3).map(|w| w.iter().collect()).collect();
        for trigram in &trigrams {
            vector[self.bucket(trigram)] += 1.0;
        }

        // Words contribute more than trigrams
        for word in normalized.split_whitespace() {
            vector[self.bucket(word)] += 2.0;
        }

        let mut vector = Vector::new(vector);
        vector.normalize();
        Ok(vector.into_inner())
    }
}

/// Indexer tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexerConfig {
    pub max_tokens: usize,
    pub batch_size: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Produces one embedding per input text, in input order
#[derive(Clone)]
pub struct EmbeddingIndexer {
    model: Arc<dyn EmbeddingModel>,
    config: IndexerConfig,
}

impl std::fmt::Debug for EmbeddingIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingIndexer")
            .field("dim", &self.model.dim())
            .field("config", &self.config)
            .finish()
    }
}

impl EmbeddingIndexer {
    pub fn new(model: Arc<dyn EmbeddingModel>, config: IndexerConfig) -> Self {
        Self { model, config }
    }

    pub fn with_model(model: Arc<dyn EmbeddingModel>) -> Self {
        Self::new(model, IndexerConfig::default())
    }

    pub fn dim(&self) -> usize {
        self.model.dim()
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Text as handed to the model: tokenized and cut to the token budget
    pub fn prepare(&self, text: &str) -> String {
        let mut tokens = tokenize(text);
        tokens.truncate(self.config.max_tokens);
        tokens.join(" ")
    }

    /// Embed a single text; `index` is reported in errors
    pub fn embed_one(&self, index: usize, text: &str) -> Result<Vector> {
        let values = self
            .model
            .embed(&self.prepare(text))
            .map_err(|e| Error::Embedding {
                index,
                reason: format!("{:#}", e),
            })?;

        let expected = self.model.dim();
        if values.len() != expected {
            return Err(Error::Embedding {
                index,
                reason: format!("expected {} values, model returned {}", expected, values.len()),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::Embedding {
                index,
                reason: "model returned non-finite values".to_string(),
            });
        }

        Ok(Vector::new(values))
    }

    /// Embed every text. Batches run in parallel; on failure the error for the
    /// lowest failing index is returned and no vectors are produced.
    pub fn embed_all<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Result<Vec<Vector>> {
        let batch_size = self.config.batch_size.max(1);
        tracing::info!(texts = texts.len(), batch_size, "generating embeddings");

        let batches: Vec<Result<Vec<Vector>>> = texts
            .par_chunks(batch_size)
            .enumerate()
            .map(|(batch, chunk)| {
                let base = batch * batch_size;
                let vectors = chunk
                    .iter()
                    .enumerate()
                    .map(|(offset, text)| self.embed_one(base + offset, text.as_ref()))
                    .collect::<Result<Vec<_>>>();
                tracing::debug!(batch, size = chunk.len(), ok = vectors.is_ok(), "embedding batch done");
                vectors
            })
            .collect();

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in batches {
            vectors.extend(batch?);
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encodes the first three bytes of the prepared text
    struct ByteStub;

    impl EmbeddingModel for ByteStub {
        fn dim(&self) -> usize {
            3
        }

        fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            let mut v = vec![0.0; 3];
            for (slot, b) in v.iter_mut().zip(text.bytes()) {
                *slot = b as f32;
            }
            Ok(v)
        }
    }

    struct FailOn(&'static str);

    impl EmbeddingModel for FailOn {
        fn dim(&self) -> usize {
            2
        }

        fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            if text.contains(self.0) {
                anyhow::bail!("model rejected input");
            }
            Ok(vec![1.0, 0.0])
        }
    }

    struct WrongWidth;

    impl EmbeddingModel for WrongWidth {
        fn dim(&self) -> usize {
            4
        }

        fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            Ok(vec![1.0, 2.0])
        }
    }

    fn indexer(model: Arc<dyn EmbeddingModel>, batch_size: usize) -> EmbeddingIndexer {
        EmbeddingIndexer::new(
            model,
            IndexerConfig {
                max_tokens: 8,
                batch_size,
            },
        )
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Gene-Editing, in  CRISPR!"), vec!["gene", "editing", "in", "crispr"]);
        assert!(tokenize("  ...  ").is_empty());
    }

    #[test]
    fn test_prepare_truncates() {
        let idx = indexer(Arc::new(ByteStub), 2);
        let text = "one two three four five six seven eight nine ten";
        assert_eq!(idx.prepare(text), "one two three four five six seven eight");
    }

    #[test]
    fn test_embed_all_preserves_order() {
        let idx = indexer(Arc::new(ByteStub), 2);
        let texts = vec!["abc", "xyz", "mno", "def", "ghi"];
        let vectors = idx.embed_all(&texts).unwrap();
        assert_eq!(vectors.len(), 5);
        for (text, vector) in texts.iter().zip(&vectors) {
            assert_eq!(vector.as_slice()[0], text.as_bytes()[0] as f32);
        }

        let mut reversed = texts.clone();
        reversed.reverse();
        let reversed_vectors = idx.embed_all(&reversed).unwrap();
        for (i, v) in reversed_vectors.iter().enumerate() {
            assert_eq!(v, &vectors[texts.len() - 1 - i]);
        }
    }

    #[test]
    fn test_failure_aborts_batch_with_index() {
        let idx = indexer(Arc::new(FailOn("bad")), 2);
        let texts = ["fine", "fine", "fine", "bad input", "fine", "bad again"];
        match idx.embed_all(&texts) {
            Err(Error::Embedding { index, reason }) => {
                assert_eq!(index, 3);
                assert!(reason.contains("rejected"));
            }
            other => panic!("expected embedding error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_vector_rejected() {
        let idx = indexer(Arc::new(WrongWidth), 4);
        let err = idx.embed_all(&["a"]).unwrap_err();
        assert!(matches!(err, Error::Embedding { index: 0, .. }));
    }

    #[test]
    fn test_empty_input() {
        let idx = indexer(Arc::new(ByteStub), 4);
        let texts: Vec<String> = Vec::new();
        assert!(idx.embed_all(&texts).unwrap().is_empty());
    }

    #[test]
    fn test_hashing_embedder_deterministic_and_normalized() {
        let model = HashingEmbedder::new(64);
        let v1 = model.embed("targeted gene therapy for rare disease").unwrap();
        let v2 = model.embed("targeted gene therapy for rare disease").unwrap();
        assert_eq!(v1, v2);
        assert_eq!(v1.len(), 64);
        let magnitude: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_hashing_embedder_similarity_ordering() {
        let model = HashingEmbedder::default();
        let a = Vector::new(model.embed("crispr gene editing in mouse models").unwrap());
        let b = Vector::new(model.embed("crispr gene editing in zebrafish models").unwrap());
        let c = Vector::new(model.embed("survey of rural hospital staffing").unwrap());
        assert!(a.cosine_similarity(&b) > a.cosine_similarity(&c));
    }

    #[test]
    fn test_hashing_embedder_empty_text() {
        let v = HashingEmbedder::new(16).embed("").unwrap();
        assert_eq!(v.len(), 16);
    }
}
