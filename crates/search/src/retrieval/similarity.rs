//! Vector similarity

use factrag_common::errors::{AppError, Result};

/// Cosine similarity `dot(a, b) / (|a| |b|)`.
///
/// A zero-norm vector scores 0.0. Vectors of different length are an
/// embedding error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(AppError::EmbeddingError {
            message: format!("Vector length mismatch: {} vs {}", a.len(), b.len()),
        });
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_similarity_is_one() {
        let v = [0.3, -1.2, 4.5, 0.01];
        assert!((cosine_similarity(&v, &v).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_and_opposite() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 2.0]).unwrap(), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[-2.0, -2.0]).unwrap() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            cosine_similarity(&[1.0], &[1.0, 0.0]),
            Err(AppError::EmbeddingError { .. })
        ));
    }
}
