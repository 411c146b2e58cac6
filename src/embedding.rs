//! Embedding provider abstraction and implementations.
//!
//! Defines the [`Embedder`] trait and concrete implementations:
//! - **[`LocalEmbedder`]** — runs a sentence-embedding model locally via
//!   fastembed; the model is downloaded on first use and cached, after which
//!   embedding is fully offline.
//! - **[`HashEmbedder`]** — deterministic sha2 bag-of-words vectors. No model,
//!   no download; the test double used by the offline test suite.
//!
//! The model identity fixes the output dimension for the life of a bundle:
//! a bundle built with one model must be queried with the same model.
//!
//! Backend unavailability is a constructor-time failure ([`create_embedder`]
//! errors for the `disabled` provider and when fastembed cannot initialize),
//! never a silent degenerate vector, and never retried — embedding is
//! deterministic, so a retry would not change a structural failure.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};

use crate::config::EmbeddingConfig;

/// Maps text to fixed-dimension dense vectors. Stateless given a fixed model
/// identity: identical input and model yield identical output.
pub trait Embedder: Send + Sync {
    /// The model identifier (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;
    /// Output vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts, order-preserving, one vector per input.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    /// Embed a single query text.
    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(std::slice::from_ref(&text.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))
    }
}

/// Create the appropriate [`Embedder`] based on configuration.
///
/// | Config value | Implementation |
/// |--------------|----------------|
/// | `"local"`    | [`LocalEmbedder`] (fastembed, requires the `local-embeddings` feature) |
/// | `"hash"`     | [`HashEmbedder`] |
/// | `"disabled"` | constructor-time error |
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.provider.as_str() {
        #[cfg(feature = "local-embeddings")]
        "local" => Ok(Box::new(LocalEmbedder::new(config)?)),
        #[cfg(not(feature = "local-embeddings"))]
        "local" => bail!(
            "Local embedding provider requires building with --features local-embeddings"
        ),
        "hash" => Ok(Box::new(HashEmbedder::new(config))),
        "disabled" => bail!("Embedding provider is disabled"),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

// ============ Local provider (fastembed) ============

/// Embedding via a local fastembed model.
///
/// The model is initialized eagerly in the constructor so that a missing or
/// broken backend surfaces immediately rather than on the first query.
#[cfg(feature = "local-embeddings")]
pub struct LocalEmbedder {
    model_name: String,
    dims: usize,
    batch_size: usize,
    model: std::sync::Mutex<fastembed::TextEmbedding>,
}

#[cfg(feature = "local-embeddings")]
impl LocalEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let fastembed_model = fastembed_model_for(&config.model)?;
        let dims = config
            .dims
            .unwrap_or_else(|| default_dims_for(&config.model));

        let model = fastembed::TextEmbedding::try_new(
            fastembed::InitOptions::new(fastembed_model).with_show_download_progress(true),
        )
        .with_context(|| {
            format!(
                "embedding backend unavailable: failed to initialize local model '{}'",
                config.model
            )
        })?;

        Ok(Self {
            model_name: config.model.clone(),
            dims,
            batch_size: config.batch_size,
            model: std::sync::Mutex::new(model),
        })
    }
}

#[cfg(feature = "local-embeddings")]
impl Embedder for LocalEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut model = self
            .model
            .lock()
            .map_err(|_| anyhow::anyhow!("embedding backend poisoned by an earlier panic"))?;
        model
            .embed(texts.to_vec(), Some(self.batch_size))
            .map_err(|e| anyhow::anyhow!("Local embedding failed: {}", e))
    }
}

#[cfg(feature = "local-embeddings")]
fn fastembed_model_for(name: &str) -> Result<fastembed::EmbeddingModel> {
    match name {
        "all-minilm-l6-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        "nomic-embed-text-v1.5" => Ok(fastembed::EmbeddingModel::NomicEmbedTextV15),
        "multilingual-e5-small" => Ok(fastembed::EmbeddingModel::MultilingualE5Small),
        other => bail!(
            "Unknown local embedding model: '{}'. Supported models: \
             all-minilm-l6-v2, bge-small-en-v1.5, bge-base-en-v1.5, \
             nomic-embed-text-v1.5, multilingual-e5-small",
            other
        ),
    }
}

fn default_dims_for(model: &str) -> usize {
    match model {
        "all-minilm-l6-v2" => 384,
        "bge-small-en-v1.5" => 384,
        "bge-base-en-v1.5" => 768,
        "nomic-embed-text-v1.5" => 768,
        "multilingual-e5-small" => 384,
        _ => 384,
    }
}

// ============ Hash provider (test double) ============

/// Deterministic offline embedder: each alphanumeric token is hashed with
/// SHA-256 into a dimension bucket and the resulting count vector is
/// L2-normalized. Texts sharing tokens land near each other, which is all the
/// retrieval tests need; no semantic claim is made.
pub struct HashEmbedder {
    model_name: String,
    dims: usize,
}

impl HashEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            model_name: config.model.clone(),
            dims: config.dims.unwrap_or(64),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let bucket = u64::from_le_bytes(digest[..8].try_into().unwrap()) as usize % self.dims;
            v[bucket] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingConfig;

    fn hash_config(dims: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "hash".to_string(),
            model: "hash-test".to_string(),
            dims: Some(dims),
            batch_size: 64,
        }
    }

    #[test]
    fn test_hash_embedder_deterministic() {
        let e = HashEmbedder::new(&hash_config(32));
        let a = e.embed_one("the quick brown fox").unwrap();
        let b = e.embed_one("the quick brown fox").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_embedder_dims_and_order() {
        let e = HashEmbedder::new(&hash_config(32));
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let vecs = e.embed(&texts).unwrap();
        assert_eq!(vecs.len(), 2);
        assert!(vecs.iter().all(|v| v.len() == 32));
        assert_eq!(vecs[0], e.embed_one("alpha").unwrap());
        assert_eq!(vecs[1], e.embed_one("beta").unwrap());
    }

    #[test]
    fn test_hash_embedder_normalized() {
        let e = HashEmbedder::new(&hash_config(32));
        let v = e.embed_one("some words here").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_tokens_closer_than_disjoint() {
        let e = HashEmbedder::new(&hash_config(64));
        let q = e.embed_one("rust memory safety").unwrap();
        let near = e.embed_one("memory safety in rust programs").unwrap();
        let far = e.embed_one("baking sourdough bread overnight").unwrap();
        let d = |a: &[f32], b: &[f32]| -> f32 {
            a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
        };
        assert!(d(&q, &near) < d(&q, &far));
    }

    #[test]
    fn test_disabled_provider_fails_at_construction() {
        let config = EmbeddingConfig {
            provider: "disabled".to_string(),
            ..hash_config(32)
        };
        assert!(create_embedder(&config).is_err());
    }

    #[test]
    fn test_unknown_provider_fails() {
        let config = EmbeddingConfig {
            provider: "faiss".to_string(),
            ..hash_config(32)
        };
        assert!(create_embedder(&config).is_err());
    }

    #[test]
    fn test_empty_batch() {
        let e = HashEmbedder::new(&hash_config(32));
        assert!(e.embed(&[]).unwrap().is_empty());
    }
}
