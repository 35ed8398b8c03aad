// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text vectorization
//!
//! The embedding provider is an opaque capability: the store computes named
//! vectors through a `Vectorizer`. `HashingVectorizer` is the deterministic,
//! dependency-free implementation used by the in-memory store.

/// Turns text into a fixed-length embedding
pub trait Vectorizer: Send + Sync {
    fn vectorize(&self, text: &str) -> Vec<f32>;

    /// Length of every vector this vectorizer produces
    fn dimensions(&self) -> usize;
}

/// Feature-hashing embedder over word tokens and character trigrams
///
/// Trigrams let morphological variants ("return" / "returns") land close
/// together; output is L2-normalised so cosine similarity is a dot product.
#[derive(Debug, Clone)]
pub struct HashingVectorizer {
    dimensions: usize,
}

impl HashingVectorizer {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn add_feature(&self, embedding: &mut [f32], feature: &str, weight: f32) {
        let hash = blake3::hash(feature.as_bytes());
        let bytes = hash.as_bytes();
        let mut idx_bytes = [0u8; 8];
        idx_bytes.copy_from_slice(&bytes[..8]);
        let idx = (u64::from_le_bytes(idx_bytes) % self.dimensions as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        embedding[idx] += sign * weight;
    }
}

impl Default for HashingVectorizer {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Vectorizer for HashingVectorizer {
    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        for token in tokenize(text) {
            self.add_feature(&mut embedding, &format!("w:{}", token), 1.0);

            let padded: Vec<char> = format!("^{}$", token).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.add_feature(&mut embedding, &format!("c:{}", trigram), 0.5);
            }
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }
        embedding
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Lowercased alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
