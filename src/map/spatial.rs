//! Uniform grid over map-local space for nearest-seat lookups.
//!
//! Buckets hold indices into the seat list the index was built from, so a
//! status change on a seat never invalidates the grid: only positions decide
//! bucket membership. The whole index is rebuilt when the seat list itself is
//! replaced.

use std::collections::HashMap;

/// Default grid cell side in map units.
pub const DEFAULT_CELL_SIZE: f64 = 48.0;

type CellKey = (i64, i64);

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f64,
    buckets: HashMap<CellKey, Vec<usize>>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl SpatialIndex {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            buckets: HashMap::new(),
        }
    }

    /// Builds an index over `(x, y)` positions; the n-th position is stored as `n`.
    pub fn build<I>(cell_size: f64, positions: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut index = Self::new(cell_size);
        for (i, (x, y)) in positions.into_iter().enumerate() {
            index.insert(i, x, y);
        }
        index
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn key(&self, x: f64, y: f64) -> CellKey {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }

    pub fn insert(&mut self, item: usize, x: f64, y: f64) {
        let key = self.key(x, y);
        self.buckets.entry(key).or_default().push(item);
    }

    /// Items in the 3x3 block of cells around the cell containing `(x, y)`.
    pub fn query(&self, x: f64, y: f64) -> impl Iterator<Item = usize> + '_ {
        let (cx, cy) = self.key(x, y);
        (-1..=1)
            .flat_map(move |dx| (-1..=1).map(move |dy| (cx + dx, cy + dy)))
            .filter_map(move |key| self.buckets.get(&key))
            .flat_map(|bucket| bucket.iter().copied())
    }
}
