//! # GrantLens Analysis
//!
//! Embedding method, method comparison and regional rollups.
//!
//! - [`EmbeddingIndexer`]: one vector per abstract through an injected [`EmbeddingModel`]
//! - [`MethodComparator`]: keyword table vs. embedding similarity
//! - [`GeoAggregator`]: per-region funding and research-area counts
//! - [`CategorySummary`] / [`OverallSummary`]: portfolio statistics
//!
//! ```rust
//! use grantlens_analysis::{EmbeddingIndexer, HashingEmbedder};
//! use grantlens_core::SimilarityEngine;
//! use std::sync::Arc;
//!
//! let indexer = EmbeddingIndexer::with_model(Arc::new(HashingEmbedder::new(64)));
//! let vectors = indexer.embed_all(&["gene therapy", "gene editing"]).unwrap();
//! let matrix = SimilarityEngine::new().pairwise(&vectors).unwrap();
//! assert_eq!(matrix.rows(), 2);
//! assert!((matrix.get(0, 0) - 1.0).abs() < 1e-6);
//! ```

pub mod compare;
pub mod config;
pub mod embedder;
pub mod geo;
pub mod summary;

pub use compare::{
    ComparisonSummary, MethodComparator, MethodRow, SimilarityBands,
    DEFAULT_HIGH_SIMILARITY_THRESHOLD,
};
pub use config::AnalysisConfig;
pub use embedder::{
    tokenize, EmbeddingIndexer, EmbeddingModel, HashingEmbedder, IndexerConfig,
    DEFAULT_BATCH_SIZE, DEFAULT_EMBEDDING_DIM, DEFAULT_MAX_TOKENS,
};
pub use geo::{GeoAggregator, GeoSummary, RegionSummary, UNKNOWN_REGION};
pub use summary::{CategoryRow, CategorySummary, OrganizationCount, OverallSummary};
