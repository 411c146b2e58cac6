//! Query-time retrieval: free-text question → ranked, page-tagged evidence.
//!
//! [`retrieve`] is the retrieval core's front door: embed the query, search
//! the bundle's index, and map the returned ids through the parallel
//! `texts`/`meta` arrays. Embedder and index failures propagate verbatim —
//! the answer-generation caller owns any user-facing fallback, never this
//! layer.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::embedding::{self, Embedder};
use crate::models::Hit;
use crate::store::{self, IndexBundle};

/// Return the `k` chunks nearest to `query`, nearest-first.
///
/// The result is at most `min(k, bundle chunk count)` hits; an empty bundle
/// yields an empty vec, not an error.
pub fn retrieve(
    embedder: &dyn Embedder,
    bundle: &IndexBundle,
    query: &str,
    k: usize,
) -> Result<Vec<Hit>> {
    let query_vec = embedder.embed_one(query)?;
    let nearest = bundle.index.search(&query_vec, k)?;

    Ok(nearest
        .into_iter()
        .map(|(id, _distance)| Hit {
            page: bundle.meta[id].page,
            text: bundle.texts[id].clone(),
        })
        .collect())
}

/// Body of `docchat search`: print ranked hits without calling the answer model.
pub fn run_search(config: &Config, query: &str, top_k: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let embedder = embedding::create_embedder(&config.embedding)?;
    let bundle = store::load(&config.retrieval.bundle_dir).with_context(|| {
        format!(
            "no usable bundle under {} (run `docchat build` first)",
            config.retrieval.bundle_dir.display()
        )
    })?;

    let k = top_k.unwrap_or(config.retrieval.top_k);
    let hits = retrieve(embedder.as_ref(), &bundle, query, k)?;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        let excerpt: String = hit.text.chars().take(240).collect();
        println!("{}. [page {}] {}", i + 1, hit.page, excerpt);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::chunk_pages;
    use crate::config::EmbeddingConfig;
    use crate::embedding::HashEmbedder;
    use crate::index::FlatIndex;
    use crate::models::{ChunkMeta, Page};

    fn hash_embedder() -> HashEmbedder {
        HashEmbedder::new(&EmbeddingConfig {
            provider: "hash".to_string(),
            model: "hash-test".to_string(),
            dims: Some(64),
            batch_size: 64,
        })
    }

    fn build_bundle(pages: &[Page], chunk_size: usize) -> IndexBundle {
        let embedder = hash_embedder();
        let chunks = chunk_pages(pages, chunk_size);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let meta: Vec<ChunkMeta> = chunks.iter().map(|c| ChunkMeta { page: c.page }).collect();
        let vectors = embedder.embed(&texts).unwrap();
        let mut index = FlatIndex::new(embedder.dims());
        index.add(&vectors).unwrap();
        IndexBundle {
            embeddings: vectors.concat(),
            index,
            texts,
            meta,
        }
    }

    #[test]
    fn test_retrieve_ranks_matching_chunk_first() {
        let pages = vec![
            Page {
                page: 1,
                text: "rust ownership and borrowing rules".to_string(),
            },
            Page {
                page: 2,
                text: "baking sourdough bread at home".to_string(),
            },
        ];
        let bundle = build_bundle(&pages, 800);
        let embedder = hash_embedder();

        let hits = retrieve(&embedder, &bundle, "rust borrowing", 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].page, 1);
        assert!(hits[0].text.contains("ownership"));
    }

    #[test]
    fn test_retrieve_never_exceeds_chunk_count() {
        let pages = vec![Page {
            page: 1,
            text: "one short page".to_string(),
        }];
        let bundle = build_bundle(&pages, 800);
        let embedder = hash_embedder();

        let hits = retrieve(&embedder, &bundle, "sample question", 3).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_retrieve_empty_bundle_returns_no_hits() {
        let bundle = build_bundle(&[], 800);
        let embedder = hash_embedder();

        let hits = retrieve(&embedder, &bundle, "anything", 3).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_retrieve_propagates_dimension_mismatch() {
        let pages = vec![Page {
            page: 1,
            text: "some indexed text".to_string(),
        }];
        let bundle = build_bundle(&pages, 800);
        // Query with an embedder of a different dimension than the bundle.
        let wrong = HashEmbedder::new(&EmbeddingConfig {
            provider: "hash".to_string(),
            model: "hash-test".to_string(),
            dims: Some(16),
            batch_size: 64,
        });

        assert!(retrieve(&wrong, &bundle, "query", 3).is_err());
    }
}
