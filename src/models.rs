//! Core data models used throughout docchat.
//!
//! These types represent the pages, chunks, and retrieval results that flow
//! through the build and query pipeline.

use serde::{Deserialize, Serialize};

/// One physical PDF page's OCR (or text-layer) output.
///
/// Produced by the page-acquisition collaborator and never mutated afterward.
/// Serialized as the on-disk page cache (`[{"page": 1, "text": "..."}]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number.
    pub page: u32,
    pub text: String,
}

/// A bounded, page-tagged substring of page text — the atomic unit of retrieval.
///
/// Chunks carry no explicit id: a chunk's identifier is its position in the
/// flattened, page-ordered chunk sequence, and the bundle's `texts`, `meta`,
/// and embedding arrays are all indexed by that same position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Trimmed, non-empty window of the page's newline-flattened text.
    pub text: String,
    /// Source page number (1-based). A chunk never spans pages.
    pub page: u32,
}

/// Per-chunk metadata persisted alongside the chunk texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub page: u32,
}

/// A retrieval result: one chunk plus its source page, ranked nearest-first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub page: u32,
    pub text: String,
}
