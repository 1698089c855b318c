//! # GrantLens Taxonomy
//!
//! Config-driven research taxonomy and the keyword classification method.
//!
//! ## Overview
//!
//! A [`TaxonomyConfig`] declares four sections: research areas (with
//! subtypes), award-size buckets, technology platforms and study designs.
//! [`TaxonomyModel`] validates it eagerly and derives one boolean column per
//! category. [`KeywordClassifier`] then flags every grant record against every
//! column by case-insensitive substring matching.
//!
//! ## Example
//!
//! ```rust
//! use grantlens_core::GrantRecord;
//! use grantlens_taxonomy::{KeywordClassifier, TaxonomyConfig, TaxonomyModel};
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
//!
//! let model = Arc::new(TaxonomyModel::new(config).unwrap());
//! let classifier = KeywordClassifier::new(model.clone());
//! let table = classifier.classify(&[
//!     GrantRecord::new("Gene editing study", "uses crispr technology"),
//! ]);
//! assert_eq!(table.value(0, "is_Genetics_Gene_Therapy"), Some(true));
//! assert_eq!(model.bucket_for(Some(100000.0)), "Small");
//! ```
//!
//! ## Column naming
//!
//! ```text
//! Research_Areas      -> is_<area>, is_<area>_<subtype>   (title + abstract)
//! Technology_Platform -> uses_<platform>                  (abstract)
//! Study_Design        -> study_design_<type>_<subtype>    (abstract)
//! ```

pub mod classifier;
pub mod model;
pub mod schema;

pub use classifier::{matches_any, ClassificationRow, ClassificationTable, KeywordClassifier};
pub use model::{
    bucket_for, display_name, AreaStructure, CategoryColumn, CompiledColumn, TaxonomyModel,
    TaxonomyStructure, TextScope, FALLBACK_BUCKET, UNKNOWN_BUCKET,
};
pub use schema::{AreaDefinition, BucketDefinition, PlatformDefinition, SubtypeMap, TaxonomyConfig};
