use crate::embed::Embedding;

/// Cosine similarity between two vectors, accumulated in f64.
///
/// Degenerate pairs (length mismatch, empty, zero norm) score 0.0, which
/// reads as maximal drift downstream.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x = f64::from(x);
        let y = f64::from(y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    dot / denom
}

/// Running arithmetic-mean vector for the currently open segment.
///
/// A genuine running mean, not recomputed from scratch: after absorbing k
/// members the values equal the arithmetic mean of all k embeddings.
#[derive(Debug, Clone)]
struct Centroid {
    values: Vec<f64>,
    count: usize,
}

impl Centroid {
    fn seed(embedding: &[f32]) -> Self {
        Self {
            values: embedding.iter().map(|&v| f64::from(v)).collect(),
            count: 1,
        }
    }

    /// Number of members in the current run, the seed included.
    fn run_length(&self) -> usize {
        self.count
    }

    /// Incremental mean update: `c = (c*(n-1) + e) / n` after bumping n.
    fn absorb(&mut self, embedding: &[f32]) {
        self.count += 1;
        let n = self.count as f64;
        for (value, &incoming) in self.values.iter_mut().zip(embedding.iter()) {
            *value = (*value * (n - 1.0) + f64::from(incoming)) / n;
        }
    }

    fn similarity_to(&self, embedding: &[f32]) -> f64 {
        if self.values.len() != embedding.len() || self.values.is_empty() {
            return 0.0;
        }

        let mut dot = 0.0_f64;
        let mut norm_c = 0.0_f64;
        let mut norm_e = 0.0_f64;
        for (&c, &e) in self.values.iter().zip(embedding.iter()) {
            let e = f64::from(e);
            dot += c * e;
            norm_c += c * c;
            norm_e += e * e;
        }

        let denom = norm_c.sqrt() * norm_e.sqrt();
        if denom <= f64::EPSILON {
            return 0.0;
        }
        dot / denom
    }
}

/// Walk the embedding sequence and emit indices where the incoming block
/// diverges from the running centroid beyond `threshold`.
///
/// Output always begins with 0 and ends with `n-1`; indices are strictly
/// increasing. A run only breaks once it holds at least `min_run_len`
/// members. `n == 0` yields an empty list, `n == 1` the degenerate `[0, 0]`
/// marker.
pub fn detect_change_points(
    embeddings: &[Embedding],
    threshold: f64,
    min_run_len: usize,
) -> Vec<usize> {
    let n = embeddings.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![0, 0];
    }

    let mut change_points = vec![0];
    let mut centroid = Centroid::seed(&embeddings[0]);

    for (i, embedding) in embeddings.iter().enumerate().skip(1) {
        let sim = centroid.similarity_to(embedding);

        if sim < threshold && centroid.run_length() >= min_run_len {
            change_points.push(i);
            centroid = Centroid::seed(embedding);
        } else {
            centroid.absorb(embedding);
        }
    }

    if change_points.last() != Some(&(n - 1)) {
        change_points.push(n - 1);
    }

    change_points
}
