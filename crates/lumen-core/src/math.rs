//! Shared vector math.

/// Dot product of two equal-length slices.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean (L2) norm.
pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Cosine similarity in `[-1, 1]`.
///
/// Vectors of different length are not comparable and score 0, as does any
/// vector with zero norm.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let denom = l2_norm(a) * l2_norm(b);
    if denom == 0.0 {
        return 0.0;
    }
    // Rounding can push parallel vectors a hair past ±1
    (dot(a, b) / denom).clamp(-1.0, 1.0)
}
