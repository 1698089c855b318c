//! Dense pairwise cosine similarity.
//!
//! Each vector is rescaled by its largest magnitude and its norm computed once,
//! then every row of the upper triangle is filled in parallel and mirrored into
//! the lower triangle.

use crate::{simd, Error, Result, Vector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Row-major dense similarity matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct SimilarityMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

/// Unchecked wire form; deserialization goes through [`SimilarityMatrix::from_raw`]
#[derive(Deserialize)]
struct RawMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl TryFrom<RawMatrix> for SimilarityMatrix {
    type Error = Error;

    fn try_from(raw: RawMatrix) -> Result<Self> {
        Self::from_raw(raw.rows, raw.cols, raw.data)
    }
}

impl SimilarityMatrix {
    /// Wrap raw row-major values; `data.len()` must equal `rows * cols`
    pub fn from_raw(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(Error::DimensionMismatch {
                index: 0,
                expected: rows.saturating_mul(cols),
                actual: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    #[inline]
    pub fn empty() -> Self {
        Self {
            rows: 0,
            cols: 0,
            data: Vec::new(),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Side length of a square matrix (row count)
    #[inline]
    pub fn len(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.cols + j]
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mean over every entry, diagonal included; 0.0 when empty
    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.data.iter().map(|&v| v as f64).sum();
        (sum / self.data.len() as f64) as f32
    }

    /// Largest entry; 0.0 when empty
    pub fn max(&self) -> f32 {
        self.data.iter().copied().reduce(f32::max).unwrap_or(0.0)
    }

    /// Number of entries strictly greater than `threshold`
    pub fn count_above(&self, threshold: f32) -> usize {
        self.data.iter().filter(|&&v| v > threshold).count()
    }

    pub fn is_symmetric(&self, tolerance: f32) -> bool {
        if !self.is_square() {
            return false;
        }
        (0..self.rows).all(|i| {
            (i + 1..self.cols).all(|j| (self.get(i, j) - self.get(j, i)).abs() <= tolerance)
        })
    }
}

/// Computes cosine similarity matrices over vector collections
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityEngine;

impl SimilarityEngine {
    pub fn new() -> Self {
        Self
    }

    /// Square matrix of every vector against every other.
    ///
    /// A zero-norm vector scores 0.0 against everything, itself included.
    /// Non-zero vectors get an exact 1.0 on the diagonal.
    pub fn pairwise(&self, vectors: &[Vector]) -> Result<SimilarityMatrix> {
        let n = vectors.len();
        if n == 0 {
            return Ok(SimilarityMatrix::empty());
        }
        check_dimensions(vectors, vectors[0].dim(), 0)?;

        let scaled: Vec<Vector> = vectors.par_iter().map(Vector::rescaled).collect();
        let norms: Vec<f32> = scaled.par_iter().map(Vector::norm).collect();

        // Row i holds columns i..n
        let upper: Vec<Vec<f32>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (i..n)
                    .map(|j| {
                        if i == j {
                            if norms[i] > 0.0 { 1.0 } else { 0.0 }
                        } else {
                            cosine(&scaled[i], norms[i], &scaled[j], norms[j])
                        }
                    })
                    .collect()
            })
            .collect();

        let mut data = vec![0.0f32; n * n];
        for (i, row) in upper.iter().enumerate() {
            for (offset, &value) in row.iter().enumerate() {
                let j = i + offset;
                data[i * n + j] = value;
                data[j * n + i] = value;
            }
        }

        tracing::debug!(vectors = n, dim = vectors[0].dim(), "pairwise similarity computed");
        Ok(SimilarityMatrix { rows: n, cols: n, data })
    }

    /// Rectangular matrix of `rows` against `cols`
    pub fn cross(&self, rows: &[Vector], cols: &[Vector]) -> Result<SimilarityMatrix> {
        if rows.is_empty() || cols.is_empty() {
            return Ok(SimilarityMatrix {
                rows: rows.len(),
                cols: cols.len(),
                data: Vec::new(),
            });
        }
        let dim = rows[0].dim();
        check_dimensions(rows, dim, 0)?;
        check_dimensions(cols, dim, rows.len())?;

        let cols: Vec<Vector> = cols.par_iter().map(Vector::rescaled).collect();
        let col_norms: Vec<f32> = cols.par_iter().map(Vector::norm).collect();
        let data: Vec<f32> = rows
            .par_iter()
            .flat_map_iter(|a| {
                let a = a.rescaled();
                let norm_a = a.norm();
                cols.iter()
                    .zip(&col_norms)
                    .map(|(b, &norm_b)| cosine(&a, norm_a, b, norm_b))
                    .collect::<Vec<_>>()
            })
            .collect();

        Ok(SimilarityMatrix {
            rows: rows.len(),
            cols: col_norms.len(),
            data,
        })
    }
}

/// Errors point at the first offending vector; `base` offsets the reported index
fn check_dimensions(vectors: &[Vector], expected: usize, base: usize) -> Result<()> {
    match vectors.iter().position(|v| v.dim() != expected) {
        Some(index) => Err(Error::DimensionMismatch {
            index: base + index,
            expected,
            actual: vectors[index].dim(),
        }),
        None => Ok(()),
    }
}

// Inputs are rescaled; a NaN from non-finite components scores 0.0
#[inline]
fn cosine(a: &Vector, norm_a: f32, b: &Vector, norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot = simd::dot_product_simd(a.as_slice(), b.as_slice());
    let value = dot / (norm_a * norm_b);
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(-1.0, 1.0)
}
