//! Exact nearest-neighbor index over chunk embeddings.
//!
//! [`FlatIndex`] is a brute-force squared-Euclidean (L2) index: vectors are
//! stored row-major and every search scans all of them. Exactness is
//! deliberate — the corpus is one document's chunks (hundreds, not millions),
//! so an approximate structure would buy nothing and cost reproducibility.
//!
//! The index is append-only. Ids are assigned sequentially on add and match
//! the chunk's position in the bundle's parallel arrays; there is no delete
//! or update, the bundle is rebuilt wholesale instead.

/// Index operation error.
#[derive(Debug)]
pub enum IndexError {
    /// A vector's dimension disagrees with the index's fixed dimension.
    DimensionMismatch { expected: usize, got: usize },
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexError::DimensionMismatch { expected, got } => {
                write!(f, "vector dimension mismatch: expected {}, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for IndexError {}

/// Brute-force squared-L2 nearest-neighbor index.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    /// Row-major vector storage, `len() == count * dim`.
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index with a fixed vector dimension.
    pub fn new(dim: usize) -> Self {
        Self { dim, data: Vec::new() }
    }

    /// Rebuild an index from row-major raw storage (used on bundle load).
    /// Returns `None` if the data length is not a multiple of `dim`.
    pub fn from_raw(dim: usize, data: Vec<f32>) -> Option<Self> {
        if dim == 0 || data.len() % dim != 0 {
            return None;
        }
        Some(Self { dim, data })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored vectors.
    pub fn count(&self) -> usize {
        self.data.len() / self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw row-major storage, for persistence.
    pub fn raw(&self) -> &[f32] {
        &self.data
    }

    /// Append vectors; each receives the next sequential id starting at the
    /// current count. Fails on the first dimension mismatch without appending
    /// any vector from the batch.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        for v in vectors {
            if v.len() != self.dim {
                return Err(IndexError::DimensionMismatch {
                    expected: self.dim,
                    got: v.len(),
                });
            }
        }
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    /// Return the `min(k, count)` nearest vectors to `query` as
    /// `(id, squared distance)` pairs, sorted ascending by distance with ties
    /// broken by ascending id. An empty index or `k == 0` yields an empty vec.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, IndexError> {
        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                got: query.len(),
            });
        }

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(id, row)| (id, squared_l2(query, row)))
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
