//! Borrowed view of a single cell
//!
//! Cells are not stored as structs; a [`WorldSnapshot`](crate::WorldSnapshot)
//! keeps parallel arrays and hands out a `CellView` that gathers one index
//! across all of them.

use glam::Vec3;

use crate::generation::CellId;
use crate::geo;
use crate::terrain::Biome;

/// One cell of a world, borrowed from its snapshot
///
/// # Memory Usage
///
/// A snapshot stores roughly 80 bytes per cell (center, lat/lng, id, biome,
/// elevation, water flag and ~6 neighbor indices). A resolution 6 globe has
/// 40,962 cells, about 3.3 MB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellView<'a> {
    /// Local index (0 to cell_count-1)
    pub index: usize,
    /// Grid identifier, stable across regenerations with the same resolution
    pub id: CellId,
    /// Center on the sphere surface
    ///
    /// This is where cities and projectiles are anchored.
    pub center: Vec3,
    pub latitude: f32,
    pub longitude: f32,
    /// Indices of adjacent cells, sorted
    pub neighbors: &'a [usize],
    pub biome: Biome,
    /// Elevation in `[0, 1]`
    pub elevation: f32,
    pub is_water: bool,
}

impl CellView<'_> {
    /// Number of neighboring cells
    ///
    /// 6 for most cells, 5 for the twelve pentagons, fewer at the edge of a
    /// restricted sampling region.
    #[inline]
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Check if this cell is a neighbor of another cell
    #[inline]
    pub fn is_neighbor_of(&self, other: usize) -> bool {
        self.neighbors.binary_search(&other).is_ok()
    }

    /// Great-circle distance to another cell along the sphere surface
    pub fn distance_to(&self, other: &CellView<'_>) -> f32 {
        geo::angular_distance(self.center, other.center) * self.center.length()
    }
}
