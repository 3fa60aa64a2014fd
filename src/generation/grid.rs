//! Geodesic hexagonal grid indexing
//!
//! The grid is the dual of a recursively subdivided icosahedron: every vertex
//! of the subdivided mesh is the center of one cell, and the cell is the set of
//! sphere points closer to that vertex than to any other. This produces
//! hexagons everywhere except 12 pentagons at the original icosahedron corners.
//!
//! # Cell Count by Resolution
//!
//! | Resolution | Cells   |
//! |-----------:|--------:|
//! | 0          | 12      |
//! | 2          | 162     |
//! | 4          | 2,562   |
//! | 5          | 10,242  |
//! | 6          | 40,962  |
//! | 8          | 655,362 |
//!
//! Each cell carries a [`CellId`] that encodes the resolution and the vertex
//! index, so identifiers from different resolutions never collide.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::MAX_RESOLUTION;
use crate::error::{GenerationError, Result};
use crate::geo::{angular_distance, lat_lng_to_vector, vector_to_lat_lng};
use crate::spatial::SpatialIndex;

const MODE_BITS: u64 = 0x8 << 56;
const RESOLUTION_SHIFT: u32 = 48;
const INDEX_MASK: u64 = (1 << RESOLUTION_SHIFT) - 1;

/// Identifier of a grid cell
///
/// Rendered as a 15-digit lowercase hex string, e.g. `805000000000000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u64);

impl CellId {
    /// Build an identifier from a resolution and a grid vertex index
    pub fn new(resolution: u8, index: usize) -> Self {
        CellId(MODE_BITS | ((resolution as u64) << RESOLUTION_SHIFT) | (index as u64 & INDEX_MASK))
    }

    /// Resolution this cell belongs to
    #[inline]
    pub fn resolution(self) -> u8 {
        ((self.0 >> RESOLUTION_SHIFT) & 0xf) as u8
    }

    /// Vertex index inside the grid of that resolution
    #[inline]
    pub fn index(self) -> usize {
        (self.0 & INDEX_MASK) as usize
    }

    /// Raw 64-bit value
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:015x}", self.0)
    }
}

/// Error returned when a string is not a valid [`CellId`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed cell id `{0}`")]
pub struct ParseCellIdError(pub String);

impl FromStr for CellId {
    type Err = ParseCellIdError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let malformed = || ParseCellIdError(s.to_string());
        if s.len() != 15 {
            return Err(malformed());
        }
        let raw = u64::from_str_radix(s, 16).map_err(|_| malformed())?;
        if raw & !(INDEX_MASK | (0xf << RESOLUTION_SHIFT)) != MODE_BITS {
            return Err(malformed());
        }
        let id = CellId(raw);
        if id.resolution() > MAX_RESOLUTION {
            return Err(malformed());
        }
        Ok(id)
    }
}

impl Serialize for CellId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Hexagonal grid over the unit sphere at a fixed resolution
///
/// # Example
///
/// ```
/// use geodesic_conquest::GeodesicGrid;
///
/// let grid = GeodesicGrid::new(2).unwrap();
/// assert_eq!(grid.cell_count(), 162);
///
/// let id = grid.cell_at(48.85, 2.35);
/// let (lat, lng) = grid.cell_center(id).unwrap();
/// assert_eq!(grid.cell_at(lat, lng), id);
/// ```
#[derive(Clone)]
pub struct GeodesicGrid {
    resolution: u8,
    /// Unit-length cell centers, indexed by vertex index
    vertices: Vec<Vec3>,
    /// Sorted neighbor vertex indices
    adjacency: Vec<Vec<usize>>,
    index: SpatialIndex,
    /// Smallest angle between adjacent centers, radians
    min_spacing: f32,
}

impl GeodesicGrid {
    /// Build the grid for `resolution`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if resolution > `MAX_RESOLUTION`
    pub fn new(resolution: u8) -> Result<Self> {
        if resolution > MAX_RESOLUTION {
            return Err(GenerationError::InvalidConfiguration(format!(
                "resolution must be <= {} (got {})",
                MAX_RESOLUTION, resolution
            )));
        }

        let (vertices, faces) = subdivided_icosahedron(resolution);
        let adjacency = build_adjacency(vertices.len(), &faces);

        let mut min_spacing = f32::MAX;
        for (a, neighbors) in adjacency.iter().enumerate() {
            for &b in neighbors {
                min_spacing = min_spacing.min(angular_distance(vertices[a], vertices[b]));
            }
        }

        let index = SpatialIndex::new(&vertices);

        log::debug!(
            "built geodesic grid: resolution {}, {} cells, min spacing {:.4}°",
            resolution,
            vertices.len(),
            min_spacing.to_degrees()
        );

        Ok(Self {
            resolution,
            vertices,
            adjacency,
            index,
            min_spacing,
        })
    }

    /// Resolution of this grid
    #[inline]
    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    /// Total number of cells on the globe
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.vertices.len()
    }

    /// Smallest angular distance between two adjacent cell centers, in degrees
    #[inline]
    pub fn min_spacing_degrees(&self) -> f32 {
        self.min_spacing.to_degrees()
    }

    /// Whether `id` names a cell of this grid
    pub fn contains(&self, id: CellId) -> bool {
        id.resolution() == self.resolution && id.index() < self.vertices.len()
    }

    /// Cell enclosing the given latitude/longitude
    pub fn cell_at(&self, lat: f32, lng: f32) -> CellId {
        let direction = lat_lng_to_vector(lat, lng, 1.0);
        // The index is never empty: resolution 0 already has 12 cells
        let index = self.index.find_nearest(direction).unwrap_or(0);
        CellId::new(self.resolution, index)
    }

    /// Canonical centroid of a cell as latitude/longitude in degrees
    pub fn cell_center(&self, id: CellId) -> Option<(f32, f32)> {
        self.center_direction(id).map(vector_to_lat_lng)
    }

    /// Canonical centroid of a cell as a unit vector
    pub fn center_direction(&self, id: CellId) -> Option<Vec3> {
        if !self.contains(id) {
            return None;
        }
        Some(self.vertices[id.index()])
    }

    /// Immediate ring of cells around `id`
    ///
    /// Returns an empty list for identifiers outside this grid.
    pub fn grid_ring(&self, id: CellId) -> Vec<CellId> {
        if !self.contains(id) {
            return Vec::new();
        }
        self.adjacency[id.index()]
            .iter()
            .map(|&neighbor| CellId::new(self.resolution, neighbor))
            .collect()
    }
}

/// Fixed tilt applied to the base icosahedron
///
/// Keeps vertex coordinates off the axis planes so the KD-tree never sees
/// long runs of identical coordinates.
fn base_orientation() -> Quat {
    Quat::from_euler(EulerRot::YXZ, 0.1178, 0.2931, 0.0513)
}

/// Generate a subdivided icosahedron on the unit sphere
fn subdivided_icosahedron(subdivisions: u8) -> (Vec<Vec3>, Vec<[usize; 3]>) {
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let orientation = base_orientation();

    // 12 icosahedron vertices
    let mut vertices: Vec<Vec3> = [
        Vec3::new(-1.0, phi, 0.0),
        Vec3::new(1.0, phi, 0.0),
        Vec3::new(-1.0, -phi, 0.0),
        Vec3::new(1.0, -phi, 0.0),
        Vec3::new(0.0, -1.0, phi),
        Vec3::new(0.0, 1.0, phi),
        Vec3::new(0.0, -1.0, -phi),
        Vec3::new(0.0, 1.0, -phi),
        Vec3::new(phi, 0.0, -1.0),
        Vec3::new(phi, 0.0, 1.0),
        Vec3::new(-phi, 0.0, -1.0),
        Vec3::new(-phi, 0.0, 1.0),
    ]
    .iter()
    .map(|v| orientation * v.normalize())
    .collect();

    // 20 icosahedron faces
    let mut faces: Vec<[usize; 3]> = vec![
        [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
        [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
        [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
        [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut next_faces = Vec::with_capacity(faces.len() * 4);
        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::with_capacity(faces.len() * 3 / 2);

        for face in &faces {
            let [a, b, c] = *face;
            let ab = midpoint(&mut vertices, &mut midpoints, a, b);
            let bc = midpoint(&mut vertices, &mut midpoints, b, c);
            let ca = midpoint(&mut vertices, &mut midpoints, c, a);

            next_faces.push([a, ab, ca]);
            next_faces.push([b, bc, ab]);
            next_faces.push([c, ca, bc]);
            next_faces.push([ab, bc, ca]);
        }
        faces = next_faces;
    }

    (vertices, faces)
}

fn midpoint(
    vertices: &mut Vec<Vec3>,
    cache: &mut HashMap<(usize, usize), usize>,
    a: usize,
    b: usize,
) -> usize {
    let key = if a < b { (a, b) } else { (b, a) };
    if let Some(&index) = cache.get(&key) {
        return index;
    }

    let index = vertices.len();
    vertices.push(((vertices[a] + vertices[b]) * 0.5).normalize());
    cache.insert(key, index);
    index
}

/// Neighbor lists from triangle edges, sorted for deterministic ordering
fn build_adjacency(vertex_count: usize, faces: &[[usize; 3]]) -> Vec<Vec<usize>> {
    let mut adjacency = vec![Vec::with_capacity(6); vertex_count];
    for face in faces {
        for k in 0..3 {
            let a = face[k];
            let b = face[(k + 1) % 3];
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
    }
    for neighbors in &mut adjacency {
        neighbors.sort_unstable();
        neighbors.dedup();
    }
    adjacency
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_counts() {
        for resolution in 0..=4 {
            let grid = GeodesicGrid::new(resolution).unwrap();
            assert_eq!(grid.cell_count(), 10 * 4_usize.pow(resolution as u32) + 2);
        }
    }

    #[test]
    fn test_rejects_excessive_resolution() {
        assert!(matches!(
            GeodesicGrid::new(MAX_RESOLUTION + 1),
            Err(GenerationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_twelve_pentagons() {
        let grid = GeodesicGrid::new(3).unwrap();
        let mut pentagons = 0;
        for index in 0..grid.cell_count() {
            let ring = grid.grid_ring(CellId::new(3, index));
            match ring.len() {
                5 => pentagons += 1,
                6 => {}
                n => panic!("cell {} has {} neighbors", index, n),
            }
        }
        assert_eq!(pentagons, 12);
    }

    #[test]
    fn test_ring_symmetry() {
        let grid = GeodesicGrid::new(2).unwrap();
        for index in 0..grid.cell_count() {
            let id = CellId::new(2, index);
            for neighbor in grid.grid_ring(id) {
                assert!(grid.grid_ring(neighbor).contains(&id));
            }
        }
    }

    #[test]
    fn test_cell_at_own_center() {
        let grid = GeodesicGrid::new(3).unwrap();
        for index in (0..grid.cell_count()).step_by(7) {
            let id = CellId::new(3, index);
            let (lat, lng) = grid.cell_center(id).unwrap();
            assert_eq!(grid.cell_at(lat, lng), id);
        }
    }

    #[test]
    fn test_spacing_shrinks_with_resolution() {
        let coarse = GeodesicGrid::new(1).unwrap();
        let fine = GeodesicGrid::new(3).unwrap();
        assert!(fine.min_spacing_degrees() < coarse.min_spacing_degrees());
        assert!(fine.min_spacing_degrees() > 0.0);
    }

    #[test]
    fn test_foreign_ids() {
        let grid = GeodesicGrid::new(2).unwrap();
        assert!(grid.cell_center(CellId::new(3, 0)).is_none());
        assert!(grid.cell_center(CellId::new(2, 5000)).is_none());
        assert!(grid.grid_ring(CellId::new(1, 0)).is_empty());
    }

    #[test]
    fn test_cell_id_string_form() {
        let id = CellId::new(5, 1234);
        let text = id.to_string();
        assert_eq!(text.len(), 15);
        assert_eq!(text.parse::<CellId>().unwrap(), id);
        assert_eq!(id.resolution(), 5);
        assert_eq!(id.index(), 1234);

        assert!("xyz".parse::<CellId>().is_err());
        assert!("000000000000000".parse::<CellId>().is_err());
        assert!("8f0000000000000".parse::<CellId>().is_err());
    }

    #[test]
    fn test_cell_id_serde() {
        let id = CellId::new(4, 42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: CellId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
