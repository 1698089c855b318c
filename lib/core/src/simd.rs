// SIMD kernels for the dense similarity path.
// AVX2/FMA on x86_64, NEON on aarch64, two-accumulator scalar fallback elsewhere.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

// Below this width the dispatch overhead outweighs the wide loads
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
const MIN_DIM_SIZE_SIMD: usize = 16;

/// Dot product of two equal-length slices; mismatched lengths yield 0.0
#[inline]
pub fn dot_product_simd(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    #[cfg(target_arch = "x86_64")]
    {
        if a.len() >= MIN_DIM_SIZE_SIMD
            && is_x86_feature_detected!("avx2")
            && is_x86_feature_detected!("fma")
        {
            return unsafe { dot_product_avx2(a, b) };
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if a.len() >= MIN_DIM_SIZE_SIMD && std::arch::is_aarch64_feature_detected!("neon") {
            return unsafe { dot_product_neon(a, b) };
        }
    }

    dot_product_scalar(a, b)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
#[inline]
unsafe fn dot_product_avx2(a: &[f32], b: &[f32]) -> f32 {
    let dim = a.len();
    let mut i = 0;

    let mut sum1 = _mm256_setzero_ps();
    let mut sum2 = _mm256_setzero_ps();

    while i + 15 < dim {
        let vx1 = _mm256_loadu_ps(a.as_ptr().add(i));
        let vy1 = _mm256_loadu_ps(b.as_ptr().add(i));
        let vx2 = _mm256_loadu_ps(a.as_ptr().add(i + 8));
        let vy2 = _mm256_loadu_ps(b.as_ptr().add(i + 8));

        sum1 = _mm256_fmadd_ps(vx1, vy1, sum1);
        sum2 = _mm256_fmadd_ps(vx2, vy2, sum2);

        i += 16;
    }

    let combined = _mm256_add_ps(sum1, sum2);
    let sum_high = _mm256_extractf128_ps(combined, 1);
    let sum_low = _mm256_castps256_ps128(combined);
    let mut sum_128 = _mm_add_ps(sum_high, sum_low);
    sum_128 = _mm_hadd_ps(sum_128, sum_128);
    sum_128 = _mm_hadd_ps(sum_128, sum_128);

    let mut dot = _mm_cvtss_f32(sum_128);
    while i < dim {
        dot += a[i] * b[i];
        i += 1;
    }

    dot
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
#[inline]
unsafe fn dot_product_neon(a: &[f32], b: &[f32]) -> f32 {
    let dim = a.len();
    let mut i = 0;

    let mut sum1 = vdupq_n_f32(0.0);
    let mut sum2 = vdupq_n_f32(0.0);

    while i + 7 < dim {
        let va1 = vld1q_f32(a.as_ptr().add(i));
        let vb1 = vld1q_f32(b.as_ptr().add(i));
        let va2 = vld1q_f32(a.as_ptr().add(i + 4));
        let vb2 = vld1q_f32(b.as_ptr().add(i + 4));

        sum1 = vfmaq_f32(sum1, va1, vb1);
        sum2 = vfmaq_f32(sum2, va2, vb2);

        i += 8;
    }

    let mut dot = vaddvq_f32(vaddq_f32(sum1, sum2));
    while i < dim {
        dot += a[i] * b[i];
        i += 1;
    }

    dot
}

#[inline]
fn dot_product_scalar(a: &[f32], b: &[f32]) -> f32 {
    let mut dot0 = 0.0f32;
    let mut dot1 = 0.0f32;

    let chunks = a.chunks_exact(4);
    let remainder = chunks.remainder();

    for (a_chunk, b_chunk) in chunks.zip(b.chunks_exact(4)) {
        dot0 += a_chunk[0] * b_chunk[0] + a_chunk[1] * b_chunk[1];
        dot1 += a_chunk[2] * b_chunk[2] + a_chunk[3] * b_chunk[3];
    }

    let offset = a.len() - remainder.len();
    for (i, x) in remainder.iter().enumerate() {
        dot0 += x * b[offset + i];
    }

    dot0 + dot1
}

/// Euclidean length of a slice
#[inline]
pub fn norm_simd(v: &[f32]) -> f32 {
    dot_product_simd(v, v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_product_matches_scalar() {
        let a: Vec<f32> = (0..67).map(|i| (i as f32) * 0.5).collect();
        let b: Vec<f32> = (0..67).map(|i| 1.0 - (i as f32) * 0.01).collect();
        let expected: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        let got = dot_product_simd(&a, &b);
        assert!((got - expected).abs() / expected.abs() < 1e-4);
    }

    #[test]
    fn test_short_vectors() {
        assert_eq!(dot_product_simd(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_eq!(norm_simd(&[3.0, 4.0]), 5.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(dot_product_simd(&[1.0, 2.0], &[1.0]), 0.0);
    }
}
