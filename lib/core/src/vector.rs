use serde::{Deserialize, Serialize};

/// A dense vector of floating point numbers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    /// Build a 0/1 vector from boolean flags
    #[must_use]
    pub fn from_flags(flags: &[bool]) -> Self {
        Self {
            data: flags.iter().map(|&f| if f { 1.0 } else { 0.0 }).collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        crate::simd::norm_simd(&self.data)
    }

    /// Largest absolute component; 0.0 when empty or all zero
    #[inline]
    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0f32, |m, &x| m.max(x.abs()))
    }

    /// Copy divided by [`Vector::max_abs`], so every component lies in [-1, 1].
    /// Direction is unchanged; f32 norms of the result neither overflow nor underflow.
    #[must_use]
    pub fn rescaled(&self) -> Self {
        let scale = self.max_abs();
        if scale == 0.0 || !scale.is_finite() {
            return self.clone();
        }
        Self {
            data: self.data.iter().map(|&x| x / scale).collect(),
        }
    }

    /// Compute cosine similarity with another vector.
    /// A zero-norm side, a dimension mismatch or a non-finite result scores 0.0.
    pub fn cosine_similarity(&self, other: &Vector) -> f32 {
        if self.dim() != other.dim() {
            return 0.0;
        }

        let a = self.rescaled();
        let b = other.rescaled();
        let norm_a = a.norm();
        let norm_b = b.norm();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        let dot_product = crate::simd::dot_product_simd(&a.data, &b.data);
        let cosine = dot_product / (norm_a * norm_b);
        if cosine.is_nan() {
            return 0.0;
        }
        cosine.clamp(-1.0, 1.0)
    }

    /// Normalize the vector to unit length
    #[inline]
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > f32::EPSILON {
            let inv_norm = 1.0 / norm;
            for x in &mut self.data {
                *x *= inv_norm;
            }
        }
    }

    /// Get normalized copy
    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut v = self.clone();
        v.normalize();
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let v1 = Vector::new(vec![1.0, 0.0]);
        let v2 = Vector::new(vec![1.0, 0.0]);
        assert!((v1.cosine_similarity(&v2) - 1.0).abs() < 1e-6);

        let v3 = Vector::new(vec![1.0, 0.0]);
        let v4 = Vector::new(vec![0.0, 1.0]);
        assert!((v3.cosine_similarity(&v4) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let zero = Vector::new(vec![0.0, 0.0, 0.0]);
        let v = Vector::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(zero.cosine_similarity(&v), 0.0);
        assert_eq!(zero.cosine_similarity(&zero), 0.0);
    }

    #[test]
    fn test_extreme_magnitudes() {
        let huge = Vector::new(vec![1e20; 32]);
        let tiny = Vector::new(vec![1e-30; 32]);
        assert!((huge.cosine_similarity(&huge) - 1.0).abs() < 1e-6);
        assert!((tiny.cosine_similarity(&tiny) - 1.0).abs() < 1e-6);
        assert!((huge.cosine_similarity(&tiny) - 1.0).abs() < 1e-6);
        assert_eq!(tiny.rescaled().as_slice(), &[1.0; 32]);
    }

    #[test]
    fn test_non_finite_scores_zero() {
        let v = Vector::new(vec![1.0, f32::NAN]);
        assert_eq!(v.cosine_similarity(&Vector::new(vec![1.0, 1.0])), 0.0);
    }

    #[test]
    fn test_from_flags() {
        let v = Vector::from_flags(&[true, false, true]);
        assert_eq!(v.as_slice(), &[1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_normalize() {
        let mut v = Vector::new(vec![3.0, 4.0]);
        v.normalize();
        assert!((v.norm() - 1.0).abs() < 1e-6);
    }
}
