//! Text embeddings for destination retrieval

use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use wide::f32x8;

/// Maps text into a fixed-width vector space
pub trait Embedder: Send + Sync {
    /// Width of every vector this embedder produces
    fn dimensions(&self) -> usize;

    /// Embed one text; the result is L2-normalised or all zeros
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Signed feature hashing over word tokens.
///
/// Offline and deterministic: the same text always lands on the same vector,
/// on every platform, because buckets come from SHA-256 rather than the
/// process-seeded std hasher.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Embedder producing `dimensions`-wide vectors
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[\p{L}\p{N}]+").expect("token pattern is valid"))
}

/// Lower-cased word tokens with a naive plural fold ("museums" -> "museum")
pub fn tokenize(text: &str) -> Vec<String> {
    token_pattern()
        .find_iter(text)
        .map(|m| {
            let token = m.as_str().to_lowercase();
            match token.strip_suffix('s') {
                Some(stem) if stem.chars().count() > 3 && !stem.ends_with('s') => stem.to_string(),
                _ => token,
            }
        })
        .collect()
}

impl Embedder for HashingEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&digest[..8]);
            let hash = u64::from_le_bytes(bytes);

            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = dot(&vector, &vector).sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

/// Dot product, eight lanes at a time
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    let chunks_a = a[..len].chunks_exact(8);
    let chunks_b = b[..len].chunks_exact(8);
    let remainder_a = chunks_a.remainder();
    let remainder_b = chunks_b.remainder();

    let mut acc = f32x8::splat(0.0);
    for (chunk_a, chunk_b) in chunks_a.zip(chunks_b) {
        let mut lane_a = [0.0f32; 8];
        let mut lane_b = [0.0f32; 8];
        lane_a.copy_from_slice(chunk_a);
        lane_b.copy_from_slice(chunk_b);
        acc = acc + f32x8::from(lane_a) * f32x8::from(lane_b);
    }

    let simd_sum: f32 = acc.to_array().iter().sum();
    let scalar_sum: f32 = remainder_a
        .iter()
        .zip(remainder_b)
        .map(|(x, y)| x * y)
        .sum();

    simd_sum + scalar_sum
}

/// Cosine similarity; zero when either side is a zero vector
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm = (dot(a, a) * dot(b, b)).sqrt();
    if norm == 0.0 {
        0.0
    } else {
        dot(a, b) / norm
    }
}
