//! Dense vector index with exact brute-force nearest-neighbor search.
//!
//! Vectors live in one contiguous row-major `Vec<f32>`. Search compares
//! the query against every row, with no pruning structure and no
//! approximation.
//! That is a deliberate tradeoff: corpora in the low thousands fit easily,
//! and results are exact and deterministic.

use crate::vector::types::{Distance, Slot, VectorDimension, VectorError};

/// Read-only collection of equal-length embedding vectors, indexed by slot.
///
/// Built once per ingestion run; query operations never mutate it. A
/// rebuild replaces the whole index rather than updating it in place.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    /// Fixed dimension of every stored vector. None only while empty.
    dimension: Option<VectorDimension>,

    /// Row-major matrix, `count * dimension` values.
    data: Vec<f32>,

    /// Number of stored vectors.
    count: usize,
}

impl VectorIndex {
    /// Creates an empty index. Searching it returns no results.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            dimension: None,
            data: Vec::new(),
            count: 0,
        }
    }

    /// Builds an index from a sequence of vectors.
    ///
    /// The first vector fixes the dimension; any later vector of a
    /// different length fails the whole build with `DimensionMismatch`.
    /// An empty input yields a valid empty index.
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self, VectorError> {
        let mut iter = vectors.into_iter();
        let Some(first) = iter.next() else {
            return Ok(Self::empty());
        };

        let dimension = VectorDimension::new(first.len())?;
        let mut data = first;
        let mut count = 1;

        for vector in iter {
            dimension.validate_vector(&vector)?;
            data.extend_from_slice(&vector);
            count += 1;
        }

        Ok(Self {
            dimension: Some(dimension),
            data,
            count,
        })
    }

    /// Reassembles an index from its persisted parts.
    ///
    /// Used by the artifact reader; validates that the flat data length
    /// matches `count * dimension`.
    pub fn from_parts(
        dimension: VectorDimension,
        data: Vec<f32>,
        count: usize,
    ) -> Result<Self, VectorError> {
        if count == 0 {
            return Ok(Self::empty());
        }
        if data.len() != count * dimension.get() {
            return Err(VectorError::InvalidFormat(format!(
                "expected {} values for {} vectors of dimension {}, got {}",
                count * dimension.get(),
                count,
                dimension,
                data.len()
            )));
        }
        Ok(Self {
            dimension: Some(dimension),
            data,
            count,
        })
    }

    /// Returns the `min(k, n)` nearest vectors to `query`, ranked by
    /// ascending Euclidean distance; ties break toward the lower slot.
    ///
    /// An empty index returns an empty result set rather than an error;
    /// callers that need "no index yet" as a failure handle it a level up.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(Slot, Distance)>, VectorError> {
        let Some(dimension) = self.dimension else {
            return Ok(Vec::new());
        };
        dimension.validate_vector(query)?;

        let mut ranked = Vec::with_capacity(self.count);
        for slot in 0..self.count {
            let row = self.row_unchecked(slot);
            let distance = euclidean_distance(query, row);
            ranked.push((Slot::new(slot as u32), Distance::new(distance)?));
        }

        // Stable, deterministic order: distance first, then slot.
        ranked.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);
        Ok(ranked)
    }

    /// Borrow the vector stored at `slot`, or None past the end.
    #[must_use]
    pub fn row(&self, slot: Slot) -> Option<&[f32]> {
        if slot.as_index() >= self.count {
            return None;
        }
        Some(self.row_unchecked(slot.as_index()))
    }

    fn row_unchecked(&self, slot: usize) -> &[f32] {
        let d = self.dimension.expect("non-empty index has a dimension").get();
        &self.data[slot * d..(slot + 1) * d]
    }

    /// Number of stored vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The fixed vector dimension, or None while the index is empty.
    #[must_use]
    pub fn dimension(&self) -> Option<VectorDimension> {
        self.dimension
    }

    /// The raw row-major data, for the artifact writer.
    #[must_use]
    pub(crate) fn as_flat(&self) -> &[f32] {
        &self.data
    }
}

/// True Euclidean (L2) distance over the full vectors.
fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}
