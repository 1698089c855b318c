//! # GrantLens
//!
//! Dual-method categorization of research grants.
//!
//! Every grant is classified two ways: by keyword matching against a
//! configurable research taxonomy, and by cosine similarity over text
//! embeddings of its abstract. The two methods are compared and funding is
//! rolled up by region.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! grantlens --taxonomy config/biomedical.json --input projects.json --output-dir ./output
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use grantlens::prelude::*;
//! use std::sync::Arc;
//!
//! let config = TaxonomyConfig::from_json_str(r#"{
//!     "Research_Areas": {
//!         "Genetics": {"keywords": ["gene"], "subtypes": {"Gene_Therapy": ["crispr"]}}
//!     },
//!     "Award_Size": {"Small": {"max_amount": 250000}},
//!     "Technology_Platform": {},
//!     "Study_Design": {}
//! }"#).unwrap();
//! let taxonomy = Arc::new(TaxonomyModel::new(config).unwrap());
//!
//! let pipeline = Pipeline::new(
//!     taxonomy,
//!     Arc::new(HashingEmbedder::default()),
//!     AnalysisConfig::default(),
//! );
//! let outcome = pipeline
//!     .run(vec![GrantRecord::new("Gene editing study", "uses crispr technology")])
//!     .unwrap();
//! assert_eq!(outcome.classification.value(0, "is_Genetics"), Some(true));
//! ```
//!
//! ## Crate Structure
//!
//! - `grantlens-core` - Grant records, vectors, cosine similarity matrices, errors
//! - `grantlens-taxonomy` - Taxonomy configuration and the keyword classifier
//! - `grantlens-analysis` - Embedding indexer, method comparison, regional rollups
//! - `grantlens-storage` - RePORTER fetch client and report writer

pub mod pipeline;

pub use grantlens_core::{
    Error, GrantRecord, RecordId, Result, SimilarityEngine, SimilarityMatrix, Vector,
};

pub use grantlens_taxonomy::{
    ClassificationTable, KeywordClassifier, TaxonomyConfig, TaxonomyModel,
};

pub use grantlens_analysis::{
    AnalysisConfig, ComparisonSummary, EmbeddingIndexer, EmbeddingModel, GeoAggregator,
    GeoSummary, HashingEmbedder, MethodComparator,
};

pub use grantlens_storage::{ReportWriter, ReporterClient, SearchCriteria};

pub use pipeline::{AnalysisOutcome, Pipeline};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AnalysisConfig, ClassificationTable, EmbeddingModel, Error, GrantRecord,
        HashingEmbedder, KeywordClassifier, Pipeline, Result, SimilarityEngine, TaxonomyConfig,
        TaxonomyModel, Vector,
    };
}
