//! Text embedding collaborator
//!
//! The default model is a Harmonic Token Projection: every token is encoded
//! as an integer, reduced modulo a set of coprime moduli and projected onto
//! the unit circle. It needs no model file and is fully deterministic, which
//! keeps index building and tests reproducible. Any [`Embedder`] producing
//! vectors in the same space as the index can replace it.

use anyhow::Result;
use std::f64::consts::PI;

/// Output dimension (two coordinates per modulus)
pub const EMBEDDING_DIM: usize = 384;

const NUM_MODULI: usize = EMBEDDING_DIM / 2;

/// Longest token prefix (in chars) folded into the token integer
const MAX_TOKEN_CHARS: usize = 64;

/// Maps text into a fixed-dimensional vector space
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimension(&self) -> usize;
}

#[derive(Debug, Clone)]
pub struct HarmonicEmbedder {
    moduli: Vec<u64>,
}

impl HarmonicEmbedder {
    pub fn new() -> Self {
        Self {
            moduli: first_primes(NUM_MODULI),
        }
    }

    /// sin/cos of each token residue on its modulus circle
    fn embed_token(&self, token: &str, acc: &mut [f64]) {
        let n = token
            .chars()
            .take(MAX_TOKEN_CHARS)
            .fold(0u64, |n, c| n.wrapping_mul(1 << 16).wrapping_add(c as u64));

        for (i, &m) in self.moduli.iter().enumerate() {
            let theta = 2.0 * PI * ((n % m) as f64) / (m as f64);
            acc[2 * i] += theta.sin();
            acc[2 * i + 1] += theta.cos();
        }
    }
}

impl Default for HarmonicEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HarmonicEmbedder {
    /// Mean of token projections, L2 normalized. Empty text maps to the zero vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = tokenize(text);
        let mut sum = vec![0.0f64; EMBEDDING_DIM];
        if tokens.is_empty() {
            return Ok(vec![0.0; EMBEDDING_DIM]);
        }

        for token in &tokens {
            self.embed_token(token, &mut sum);
        }

        // Mean pooling is absorbed by the normalization below
        let norm = sum.iter().map(|x| x * x).sum::<f64>().sqrt();
        Ok(sum
            .iter()
            .map(|x| if norm > 0.0 { (x / norm) as f32 } else { *x as f32 })
            .collect())
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

fn first_primes(count: usize) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::with_capacity(count);
    let mut candidate = 2u64;
    while primes.len() < count {
        if primes
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}

/// `dot(a, b) / (|a| * |b|)`, or 0 for mismatched or zero-norm vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a.sqrt() * norm_b.sqrt())
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = HarmonicEmbedder::new();
        let b = HarmonicEmbedder::new();
        let text = "apartament 2 camere Titan";

        assert_eq!(a.embed(text).unwrap(), b.embed(text).unwrap());
        assert_ne!(a.embed(text).unwrap(), a.embed("vila Pipera").unwrap());
    }

    #[test]
    fn test_normalized() {
        let model = HarmonicEmbedder::new();
        let emb = model.embed("house in Pipera, Voluntari, 140 sqm").unwrap();
        assert_eq!(emb.len(), model.dimension());

        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);

        let empty = model.embed("  ,, ").unwrap();
        assert!(empty.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_shared_tokens_raise_similarity() {
        let model = HarmonicEmbedder::new();
        let query = model.embed("apartment Titan 2 rooms").unwrap();
        let close = model.embed("apartment 2 rooms in Titan, Bucharest").unwrap();
        let far = model.embed("land plot near the lake").unwrap();

        assert!(cosine_similarity(&query, &close) > cosine_similarity(&query, &far));
    }

    #[test]
    fn test_primes() {
        let primes = first_primes(NUM_MODULI);
        assert_eq!(&primes[..6], &[2, 3, 5, 7, 11, 13]);
        assert_eq!(primes.len(), NUM_MODULI);
        assert_eq!(*primes.last().unwrap(), 1163);
    }

    #[test]
    fn test_cosine_similarity() {
        let a = [1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[2.0, 0.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 1e-12);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }
}
