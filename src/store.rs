//! Bundle persistence: the durable unit of the retrieval core.
//!
//! An [`IndexBundle`] is four co-located artifacts under one directory:
//!
//! | Artifact         | Content |
//! |------------------|---------|
//! | `flat.index`     | serialized [`FlatIndex`]: magic + dim + count header, f32-LE rows |
//! | `embeddings.bin` | raw embedding matrix, row-major f32-LE |
//! | `texts.json`     | JSON array of chunk texts, order = chunk id |
//! | `meta.json`      | JSON array of per-chunk metadata, same order |
//!
//! All four are written and read together; partial presence is an invalid
//! state and [`load`] reports it as [`StoreError::MissingBundle`]. Each
//! artifact is written to a `.tmp` sibling and renamed into place, with the
//! index file published last. That guarantee is per-artifact atomic, not
//! whole-bundle atomic: a crash mid-save can leave a stale-but-complete
//! bundle (the previous one) or a mixed one, and [`load`]'s consistency check
//! rejects the mixed case.

use std::io::Write;
use std::path::Path;

use crate::index::FlatIndex;
use crate::models::ChunkMeta;

pub const INDEX_FILE: &str = "flat.index";
pub const EMBEDDINGS_FILE: &str = "embeddings.bin";
pub const TEXTS_FILE: &str = "texts.json";
pub const META_FILE: &str = "meta.json";

const INDEX_MAGIC: &[u8; 4] = b"DCIX";

/// Bundle persistence error.
#[derive(Debug)]
pub enum StoreError {
    /// One of the four artifacts is absent; carries the artifact file name.
    MissingBundle(&'static str),
    /// Artifacts are present but inconsistent or unparseable.
    CorruptBundle(String),
    Io(std::io::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::MissingBundle(artifact) => {
                write!(f, "bundle artifact missing: {}", artifact)
            }
            StoreError::CorruptBundle(reason) => write!(f, "bundle corrupt: {}", reason),
            StoreError::Io(e) => write!(f, "bundle I/O error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

/// The co-located set of index, embedding matrix, chunk texts, and metadata.
///
/// Parallel-array invariant: `texts.len() == meta.len() == index.count()` and
/// the matrix holds exactly that many rows. Enforced on every [`load`];
/// read-only after load — retrieval never mutates a bundle.
#[derive(Debug)]
pub struct IndexBundle {
    pub index: FlatIndex,
    /// Raw embedding matrix, row-major, `index.dim()` floats per row.
    pub embeddings: Vec<f32>,
    pub texts: Vec<String>,
    pub meta: Vec<ChunkMeta>,
}

/// Write all four artifacts of `bundle` under `dir`, creating it if needed.
pub fn save(bundle: &IndexBundle, dir: &Path) -> Result<(), StoreError> {
    std::fs::create_dir_all(dir)?;

    let texts_json = serde_json::to_vec(&bundle.texts)
        .map_err(|e| StoreError::CorruptBundle(format!("texts not serializable: {}", e)))?;
    let meta_json = serde_json::to_vec(&bundle.meta)
        .map_err(|e| StoreError::CorruptBundle(format!("meta not serializable: {}", e)))?;

    // The index file goes last so a reader that sees it can expect the rest.
    write_atomic(dir, EMBEDDINGS_FILE, &floats_to_blob(&bundle.embeddings))?;
    write_atomic(dir, TEXTS_FILE, &texts_json)?;
    write_atomic(dir, META_FILE, &meta_json)?;
    write_atomic(dir, INDEX_FILE, &serialize_index(&bundle.index))?;

    Ok(())
}

/// Load and validate an [`IndexBundle`] from `dir`.
///
/// Fails with [`StoreError::MissingBundle`] if any artifact is absent and with
/// [`StoreError::CorruptBundle`] if the parallel-array lengths disagree — the
/// consistency check is a precondition of returning, not deferred to first use.
pub fn load(dir: &Path) -> Result<IndexBundle, StoreError> {
    for artifact in [INDEX_FILE, EMBEDDINGS_FILE, TEXTS_FILE, META_FILE] {
        if !dir.join(artifact).exists() {
            return Err(StoreError::MissingBundle(artifact));
        }
    }

    let index = deserialize_index(&std::fs::read(dir.join(INDEX_FILE))?)?;
    let embeddings = blob_to_floats(&std::fs::read(dir.join(EMBEDDINGS_FILE))?)
        .ok_or_else(|| StoreError::CorruptBundle("embedding matrix truncated".to_string()))?;
    let texts: Vec<String> = serde_json::from_slice(&std::fs::read(dir.join(TEXTS_FILE))?)
        .map_err(|e| StoreError::CorruptBundle(format!("texts.json: {}", e)))?;
    let meta: Vec<ChunkMeta> = serde_json::from_slice(&std::fs::read(dir.join(META_FILE))?)
        .map_err(|e| StoreError::CorruptBundle(format!("meta.json: {}", e)))?;

    let count = index.count();
    if embeddings.len() != count * index.dim() {
        return Err(StoreError::CorruptBundle(format!(
            "embedding matrix holds {} floats, index expects {} ({} x {})",
            embeddings.len(),
            count * index.dim(),
            count,
            index.dim()
        )));
    }
    if texts.len() != count || meta.len() != count {
        return Err(StoreError::CorruptBundle(format!(
            "parallel arrays disagree: {} texts, {} meta, index count {}",
            texts.len(),
            meta.len(),
            count
        )));
    }

    Ok(IndexBundle {
        index,
        embeddings,
        texts,
        meta,
    })
}

fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = dir.join(format!("{}.tmp", name));
    {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, dir.join(name))?;
    Ok(())
}

fn serialize_index(index: &FlatIndex) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(12 + index.raw().len() * 4);
    bytes.extend_from_slice(INDEX_MAGIC);
    bytes.extend_from_slice(&(index.dim() as u32).to_le_bytes());
    bytes.extend_from_slice(&(index.count() as u32).to_le_bytes());
    bytes.extend_from_slice(&floats_to_blob(index.raw()));
    bytes
}

fn deserialize_index(bytes: &[u8]) -> Result<FlatIndex, StoreError> {
    if bytes.len() < 12 || &bytes[0..4] != INDEX_MAGIC {
        return Err(StoreError::CorruptBundle(
            "index file header malformed".to_string(),
        ));
    }
    let dim = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
    let count = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
    let data = blob_to_floats(&bytes[12..])
        .ok_or_else(|| StoreError::CorruptBundle("index vector data truncated".to_string()))?;
    if data.len() != dim * count {
        return Err(StoreError::CorruptBundle(format!(
            "index holds {} floats, header declares {} x {}",
            data.len(),
            count,
            dim
        )));
    }
    FlatIndex::from_raw(dim, data)
        .ok_or_else(|| StoreError::CorruptBundle("index dimension is zero".to_string()))
}

/// Encode floats as little-endian f32 bytes, 4 bytes per value.
fn floats_to_blob(values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for &v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode little-endian f32 bytes. `None` if the length is not a multiple of 4.
fn blob_to_floats(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}
