//! # GrantLens Core
//!
//! Core building blocks shared by every GrantLens crate:
//!
//! - [`GrantRecord`] - one research grant as delivered by the fetch layer
//! - [`Vector`] - dense `f32` vector with SIMD-backed norms and dot products
//! - [`SimilarityEngine`] - dense pairwise cosine similarity
//! - [`SimilarityMatrix`] - the row-major matrix it produces
//!
//! ## Example
//!
//! ```rust
//! use grantlens_core::{SimilarityEngine, Vector};
//!
//! let vectors = vec![
//!     Vector::from_flags(&[true, true]),
//!     Vector::from_flags(&[false, false]),
//! ];
//! let matrix = SimilarityEngine::new().pairwise(&vectors).unwrap();
//! assert_eq!(matrix.get(0, 0), 1.0);
//! assert_eq!(matrix.get(1, 1), 0.0); // zero vectors never match
//! ```

pub mod error;
pub mod record;
pub mod similarity;
pub mod vector;

/// SIMD dot product and norm kernels
///
/// - AVX2/FMA on x86_64
/// - NEON on ARM64/Apple Silicon
pub mod simd;

pub use error::{Error, Result};
pub use record::{GrantRecord, RecordId};
pub use similarity::{SimilarityEngine, SimilarityMatrix};
pub use vector::Vector;
