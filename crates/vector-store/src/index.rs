use crate::error::{Result, VectorStoreError};
use crate::types::ChunkId;
use std::collections::BTreeMap;

const INDEX_MAGIC: &[u8; 4] = b"CVI1";
const HEADER_LEN: usize = 4 + 4 + 8;

/// Nearest-neighbour index keyed by chunk id
pub trait VectorIndex: Send + Sync {
    fn dimension(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, id: ChunkId) -> bool;

    /// Ids currently indexed, ascending
    fn ids(&self) -> Vec<ChunkId>;

    /// Insert `ids[i] -> vectors[i]`. All-or-nothing: a duplicate id or a
    /// dimension mismatch rejects the whole batch.
    fn add(&mut self, ids: &[ChunkId], vectors: &[Vec<f32>]) -> Result<()>;

    /// Remove ids that are present; absent ids are ignored. Returns how many
    /// were removed.
    fn remove(&mut self, ids: &[ChunkId]) -> usize;

    /// Up to `k` `(id, squared L2 distance)` pairs, ascending by distance.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(ChunkId, f32)>>;

    fn reset(&mut self);

    /// Native on-disk representation
    fn to_bytes(&self) -> Vec<u8>;

    fn from_bytes(bytes: &[u8]) -> Result<Self>
    where
        Self: Sized;
}

/// Exact brute-force index over squared Euclidean distance
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    vectors: BTreeMap<ChunkId, Vec<f32>>,
}

impl FlatIndex {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: BTreeMap::new(),
        }
    }

    const fn check_dimension(&self, actual: usize) -> Result<()> {
        if actual != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual,
            });
        }
        Ok(())
    }
}

impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn contains(&self, id: ChunkId) -> bool {
        self.vectors.contains_key(&id)
    }

    fn ids(&self) -> Vec<ChunkId> {
        self.vectors.keys().copied().collect()
    }

    fn add(&mut self, ids: &[ChunkId], vectors: &[Vec<f32>]) -> Result<()> {
        if ids.len() != vectors.len() {
            return Err(VectorStoreError::IndexError(format!(
                "{} ids but {} vectors",
                ids.len(),
                vectors.len()
            )));
        }
        let mut batch = std::collections::BTreeSet::new();
        for (id, vector) in ids.iter().zip(vectors) {
            self.check_dimension(vector.len())?;
            if self.vectors.contains_key(id) || !batch.insert(*id) {
                return Err(VectorStoreError::DuplicateId(*id));
            }
        }
        for (id, vector) in ids.iter().zip(vectors) {
            self.vectors.insert(*id, vector.clone());
        }
        Ok(())
    }

    fn remove(&mut self, ids: &[ChunkId]) -> usize {
        ids.iter()
            .filter(|id| self.vectors.remove(id).is_some())
            .count()
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(ChunkId, f32)>> {
        self.check_dimension(query.len())?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(ChunkId, f32)> = self
            .vectors
            .iter()
            .map(|(id, vector)| (*id, squared_l2(query, vector)))
            .collect();

        // Ties resolve by ascending id, which BTreeMap iteration already gives.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);
        Ok(scored)
    }

    fn reset(&mut self) {
        self.vectors.clear();
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.vectors.len() * (8 + self.dimension * 4));
        out.extend_from_slice(INDEX_MAGIC);
        #[allow(clippy::cast_possible_truncation)]
        let dim = self.dimension as u32;
        out.extend_from_slice(&dim.to_le_bytes());
        out.extend_from_slice(&(self.vectors.len() as u64).to_le_bytes());
        for (id, vector) in &self.vectors {
            out.extend_from_slice(&id.to_le_bytes());
            for v in vector {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        out
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN || &bytes[0..4] != INDEX_MAGIC {
            return Err(VectorStoreError::IndexError(
                "index file has no CVI1 header".to_string(),
            ));
        }
        let dimension = read_u32(bytes, 4)? as usize;
        let count = usize::try_from(read_u64(bytes, 8)?)
            .map_err(|_| VectorStoreError::IndexError("index count overflows".to_string()))?;

        let record_len = 8usize.saturating_add(dimension.saturating_mul(4));
        let expected_len = count
            .checked_mul(record_len)
            .and_then(|body| body.checked_add(HEADER_LEN))
            .ok_or_else(|| VectorStoreError::IndexError("index size overflows".to_string()))?;
        if bytes.len() != expected_len {
            return Err(VectorStoreError::IndexError(format!(
                "index file is {} bytes, expected {expected_len}",
                bytes.len()
            )));
        }

        let mut index = Self::new(dimension);
        for record in bytes[HEADER_LEN..].chunks_exact(record_len) {
            let id = read_u64(record, 0)?;
            let vector = record[8..]
                .chunks_exact(4)
                .map(|raw| f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
                .collect();
            if index.vectors.insert(id, vector).is_some() {
                return Err(VectorStoreError::DuplicateId(id));
            }
        }
        Ok(index)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32> {
    bytes
        .get(at..at + 4)
        .and_then(|raw| raw.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| VectorStoreError::IndexError("truncated index file".to_string()))
}

fn read_u64(bytes: &[u8], at: usize) -> Result<u64> {
    bytes
        .get(at..at + 8)
        .and_then(|raw| raw.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or_else(|| VectorStoreError::IndexError("truncated index file".to_string()))
}
