//! Build pipeline orchestration.
//!
//! Coordinates the full index build: page acquisition → chunking → embedding
//! → index → persisted bundle. A build always replaces the whole bundle;
//! there is no incremental update path.

use anyhow::{Context, Result};

use crate::chunker::chunk_pages;
use crate::config::Config;
use crate::embedding::{self, Embedder};
use crate::index::FlatIndex;
use crate::models::{Chunk, ChunkMeta};
use crate::pages;
use crate::progress::{BuildProgressEvent, BuildProgressReporter};
use crate::store::{self, IndexBundle};

/// Body of `docchat build`.
///
/// Reuses the page cache when present unless `force` is set; OCR output is
/// cached before chunking so a failed embed run does not re-OCR.
pub fn run_build(
    config: &Config,
    force: bool,
    progress: &dyn BuildProgressReporter,
) -> Result<()> {
    let cache = &config.document.pages_path;
    let page_list = if cache.exists() && !force {
        pages::load_cached_pages(cache)?
    } else {
        let extracted = pages::acquire_pages(&config.document, progress)?;
        pages::save_pages(cache, &extracted)?;
        extracted
    };

    let embedder = embedding::create_embedder(&config.embedding)?;
    let chunks = chunk_pages(&page_list, config.chunking.chunk_size);
    let bundle = build_bundle(
        embedder.as_ref(),
        &chunks,
        config.embedding.batch_size,
        progress,
    )?;

    store::save(&bundle, &config.retrieval.bundle_dir).with_context(|| {
        format!(
            "Failed to save bundle to {}",
            config.retrieval.bundle_dir.display()
        )
    })?;

    println!("build {}", config.document.pdf_path.display());
    println!("  pages: {}", page_list.len());
    println!("  chunks: {}", bundle.texts.len());
    println!("  model: {} ({} dims)", embedder.model_name(), embedder.dims());
    println!("  bundle: {}", config.retrieval.bundle_dir.display());
    println!("ok");

    Ok(())
}

/// Embed chunks and assemble an in-memory [`IndexBundle`].
///
/// Chunk order is identity: position in `chunks` becomes the id in the index
/// and in every parallel array of the bundle.
pub fn build_bundle(
    embedder: &dyn Embedder,
    chunks: &[Chunk],
    batch_size: usize,
    progress: &dyn BuildProgressReporter,
) -> Result<IndexBundle> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let meta: Vec<ChunkMeta> = chunks.iter().map(|c| ChunkMeta { page: c.page }).collect();

    let total = texts.len() as u64;
    let batch = batch_size.max(1);
    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
    for chunk_batch in texts.chunks(batch) {
        vectors.extend(embedder.embed(chunk_batch)?);
        progress.report(BuildProgressEvent::Embedding {
            done: vectors.len() as u64,
            total,
        });
    }

    let mut index = FlatIndex::new(embedder.dims());
    index.add(&vectors)?;

    Ok(IndexBundle {
        embeddings: vectors.concat(),
        index,
        texts,
        meta,
    })
}
