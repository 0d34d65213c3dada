//! Per-field nearest-neighbor indices.
//!
//! One index exists per text field. It is filled once at build time and is
//! read-only afterwards, so searches take `&self` and can run concurrently.

use crate::{Error, Result, RowId, Vector};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use std::cmp::Ordering;

/// A nearest-neighbor hit: catalog row and squared L2 distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row_id: RowId,
    pub distance: f32,
}

fn nearest_first(a: &Neighbor, b: &Neighbor) -> Ordering {
    OrderedFloat(a.distance)
        .cmp(&OrderedFloat(b.distance))
        .then(a.row_id.cmp(&b.row_id))
}

pub trait VectorIndex: Send + Sync {
    /// Dimensionality of every stored vector
    fn dim(&self) -> usize;

    /// Number of stored vectors (one per catalog row)
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append vectors; row ids continue from the current length
    fn add(&mut self, vectors: &[Vector]) -> Result<()>;

    /// The `k` nearest rows by squared L2 distance, nearest first,
    /// ties broken by ascending row id
    fn search(&self, query: &Vector, k: usize) -> Result<Vec<Neighbor>>;

    /// True when the row was indexed from an empty field (zero sentinel)
    fn is_sentinel(&self, row_id: RowId) -> bool;

    /// Number of sentinel rows
    fn sentinel_count(&self) -> usize;
}

/// Exact brute-force L2 index over a contiguous buffer
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dim: usize,
    data: Vec<f32>,
    sentinels: Vec<bool>,
    n_sentinels: usize,
}

impl FlatL2Index {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig(
                "index dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            dim,
            data: Vec::new(),
            sentinels: Vec::new(),
            n_sentinels: 0,
        })
    }

    /// Rebuild an index from its raw row-major buffer
    pub fn from_raw(dim: usize, data: Vec<f32>) -> Result<Self> {
        let mut index = Self::new(dim)?;
        if data.len() % dim != 0 {
            return Err(Error::InvalidDimension {
                expected: dim,
                actual: data.len() % dim,
            });
        }
        index.sentinels = data
            .chunks_exact(dim)
            .map(|row| row.iter().all(|x| *x == 0.0))
            .collect();
        index.n_sentinels = index.sentinels.iter().filter(|s| **s).count();
        index.data = data;
        Ok(index)
    }

    /// Row-major vector buffer, `len() * dim()` floats
    pub fn raw(&self) -> &[f32] {
        &self.data
    }

    pub fn vector(&self, row_id: RowId) -> Option<&[f32]> {
        let start = row_id.index().checked_mul(self.dim)?;
        self.data.get(start..start + self.dim)
    }
}

impl VectorIndex for FlatL2Index {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.sentinels.len()
    }

    fn add(&mut self, vectors: &[Vector]) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|v| v.dim() != self.dim) {
            return Err(Error::InvalidDimension {
                expected: self.dim,
                actual: bad.dim(),
            });
        }

        self.data.reserve(vectors.len() * self.dim);
        for vector in vectors {
            self.data.extend_from_slice(vector.as_slice());
            let sentinel = vector.is_zero();
            self.n_sentinels += usize::from(sentinel);
            self.sentinels.push(sentinel);
        }
        Ok(())
    }

    fn search(&self, query: &Vector, k: usize) -> Result<Vec<Neighbor>> {
        if query.dim() != self.dim {
            return Err(Error::InvalidDimension {
                expected: self.dim,
                actual: query.dim(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let q = query.as_slice();
        let mut hits: Vec<Neighbor> = self
            .data
            .par_chunks_exact(self.dim)
            .enumerate()
            .map(|(row, v)| Neighbor {
                row_id: RowId(row),
                distance: crate::simd::squared_l2_simd(q, v),
            })
            .collect();

        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, nearest_first);
            hits.truncate(k);
        }
        hits.sort_unstable_by(nearest_first);
        Ok(hits)
    }

    fn is_sentinel(&self, row_id: RowId) -> bool {
        self.sentinels.get(row_id.index()).copied().unwrap_or(false)
    }

    fn sentinel_count(&self) -> usize {
        self.n_sentinels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(rows: &[[f32; 2]]) -> FlatL2Index {
        let mut index = FlatL2Index::new(2).unwrap();
        let vectors: Vec<Vector> = rows.iter().map(|r| Vector::from_slice(r)).collect();
        index.add(&vectors).unwrap();
        index
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = index_of(&[[0.0, 0.0], [3.0, 4.0], [1.0, 0.0], [0.0, 2.0]]);
        let hits = index.search(&Vector::new(vec![0.0, 0.0]), 3).unwrap();

        let ids: Vec<usize> = hits.iter().map(|h| h.row_id.index()).collect();
        assert_eq!(ids, vec![0, 2, 3]);
        assert_eq!(hits[0].distance, 0.0);
        assert!((hits[1].distance - 1.0).abs() < 1e-6);
        assert!((hits[2].distance - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_ties_break_by_row_id() {
        let index = index_of(&[[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0]]);
        let hits = index.search(&Vector::new(vec![0.0, 0.0]), 4).unwrap();
        let ids: Vec<usize> = hits.iter().map(|h| h.row_id.index()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);

        let hits = index.search(&Vector::new(vec![0.0, 0.0]), 2).unwrap();
        let ids: Vec<usize> = hits.iter().map(|h| h.row_id.index()).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_k_bounds() {
        let index = index_of(&[[1.0, 1.0], [2.0, 2.0]]);
        assert_eq!(index.search(&Vector::new(vec![0.0, 0.0]), 10).unwrap().len(), 2);
        assert!(index.search(&Vector::new(vec![0.0, 0.0]), 0).unwrap().is_empty());

        let empty = FlatL2Index::new(2).unwrap();
        assert!(empty.search(&Vector::new(vec![0.0, 0.0]), 5).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_checks() {
        let mut index = FlatL2Index::new(3).unwrap();
        assert!(matches!(
            index.add(&[Vector::new(vec![1.0, 2.0])]),
            Err(Error::InvalidDimension { expected: 3, actual: 2 })
        ));
        assert!(index.search(&Vector::new(vec![1.0]), 1).is_err());
        assert!(FlatL2Index::new(0).is_err());
    }

    #[test]
    fn test_sentinel_rows() {
        let index = index_of(&[[0.0, 0.0], [0.6, 0.8]]);
        assert!(index.is_sentinel(RowId(0)));
        assert!(!index.is_sentinel(RowId(1)));
        assert!(!index.is_sentinel(RowId(7)));
        assert_eq!(index.sentinel_count(), 1);
    }

    #[test]
    fn test_from_raw_roundtrip() {
        let index = index_of(&[[0.0, 0.0], [0.6, 0.8], [1.0, 0.0]]);
        let rebuilt = FlatL2Index::from_raw(2, index.raw().to_vec()).unwrap();
        assert_eq!(rebuilt, index);
        assert_eq!(rebuilt.sentinel_count(), 1);
        assert_eq!(rebuilt.vector(RowId(1)), Some(&[0.6f32, 0.8][..]));

        assert!(FlatL2Index::from_raw(2, vec![1.0, 2.0, 3.0]).is_err());
    }
}
