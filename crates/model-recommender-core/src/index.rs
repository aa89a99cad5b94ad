//! Similarity index trait, the exact flat inner-product index, and vector
//! utilities.
//!
//! Vectors stored in an index are expected to be unit length, so the inner
//! product computed by [`FlatIpIndex`] equals cosine similarity.
//!
//! # Blob Format
//!
//! [`FlatIpIndex::to_bytes`] produces a self-describing little-endian blob:
//!
//! ```text
//! magic "MRIX" | version u32 | dims u32 | count u64 | count × dims × f32
//! ```

use crate::{Error, Result};

/// Label used for an empty result slot.
pub const NO_MATCH: i64 = -1;

const MAGIC: &[u8; 4] = b"MRIX";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// One slot of a top-k search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub score: f32,
    /// Position of the matched vector, or [`NO_MATCH`].
    pub label: i64,
}

impl Neighbor {
    pub const EMPTY: Neighbor = Neighbor {
        score: f32::NEG_INFINITY,
        label: NO_MATCH,
    };

    pub fn is_match(&self) -> bool {
        self.label != NO_MATCH
    }
}

/// A nearest-neighbour index over fixed-dimension vectors.
///
/// `search` always returns exactly `k` slots, best first. Slots beyond the
/// number of stored vectors are [`Neighbor::EMPTY`].
pub trait VectorIndex: Send + Sync {
    fn dims(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Append vectors; their positions continue from the current length.
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()>;
    fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor>;
}

/// Exact brute-force inner-product index.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIpIndex {
    dims: usize,
    data: Vec<f32>,
}

impl FlatIpIndex {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            data: Vec::new(),
        }
    }

    /// The stored vector at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dims)?;
        let end = start.checked_add(self.dims)?;
        self.data.get(start..end)
    }

    /// Iterate stored vectors in position order.
    pub fn vectors(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dims.max(1))
    }

    /// Encode the index as an opaque binary blob.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.data.len() * 4);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(self.dims as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&vec_to_blob(&self.data));
        bytes
    }

    /// Decode a blob written by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN || &bytes[0..4] != MAGIC {
            return Err(Error::Load("not a model index file".to_string()));
        }
        let version = read_u32(&bytes[4..8]);
        if version != FORMAT_VERSION {
            return Err(Error::Load(format!(
                "unsupported index format version {}",
                version
            )));
        }
        let dims = read_u32(&bytes[8..12]) as usize;
        let count = u64::from_le_bytes([
            bytes[12], bytes[13], bytes[14], bytes[15], bytes[16], bytes[17], bytes[18], bytes[19],
        ]) as usize;

        let body = &bytes[HEADER_LEN..];
        let expected = count
            .checked_mul(dims)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| Error::Load("index header overflows".to_string()))?;
        if body.len() != expected {
            return Err(Error::Load(format!(
                "index body is {} bytes, header declares {} vectors of {} dims",
                body.len(),
                count,
                dims
            )));
        }
        if dims == 0 && count > 0 {
            return Err(Error::Load("index declares zero dimensions".to_string()));
        }

        Ok(Self {
            dims,
            data: blob_to_vec(body),
        })
    }
}

impl VectorIndex for FlatIpIndex {
    fn dims(&self) -> usize {
        self.dims
    }

    fn len(&self) -> usize {
        if self.dims == 0 {
            0
        } else {
            self.data.len() / self.dims
        }
    }

    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dims) {
            return Err(Error::Build(format!(
                "vector has {} dims, index expects {}",
                bad.len(),
                self.dims
            )));
        }
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        let mut hits: Vec<Neighbor> = if query.len() == self.dims {
            self.vectors()
                .enumerate()
                .map(|(position, v)| Neighbor {
                    score: dot(query, v),
                    label: position as i64,
                })
                .collect()
        } else {
            Vec::new()
        };

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.label.cmp(&b.label))
        });
        hits.truncate(k);
        hits.resize(k, Neighbor::EMPTY);
        hits
    }
}

/// Inner product of two equal-length vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Euclidean length of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale `v` to unit length in place.
///
/// Returns `false` and leaves the vector untouched if its norm is zero (or
/// not finite); such a vector has no direction to compare.
pub fn normalize_l2(v: &mut [f32]) -> bool {
    let norm = l2_norm(v);
    if !norm.is_finite() || norm < f32::EPSILON {
        return false;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    true
}

/// Encode a float vector as little-endian f32 bytes.
///
/// ```rust
/// use model_recommender_core::index::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12); // 3 × 4 bytes
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode little-endian f32 bytes back into a vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
