//! World snapshot: the complete, validated output of generation
//!
//! A snapshot is a set of parallel per-cell arrays. It is either produced by
//! the generator or loaded from a store; in both cases it passes
//! [`WorldSnapshot::validate`] before anything else sees it.

pub mod store;

use std::collections::HashSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::cell::CellView;
use crate::error::SnapshotError;
use crate::generation::{CellId, Tessellation};
use crate::geo;
use crate::terrain::{Biome, Terrain};

/// Relative slack allowed between center lengths
const CENTER_RADIUS_TOLERANCE: f32 = 1e-3;

/// Complete generated world
///
/// Serializes to the JSON layout
/// `{ centers, centerNeighbors, centerWater, centerLat, centerLng, cellIds, biomes, elevations }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SnapshotData")]
pub struct WorldSnapshot {
    #[serde(with = "xyz")]
    centers: Vec<Vec3>,
    #[serde(rename = "centerNeighbors")]
    neighbors: Vec<Vec<usize>>,
    #[serde(rename = "centerWater")]
    is_water: Vec<bool>,
    #[serde(rename = "centerLat")]
    latitudes: Vec<f32>,
    #[serde(rename = "centerLng")]
    longitudes: Vec<f32>,
    cell_ids: Vec<CellId>,
    biomes: Vec<Biome>,
    elevations: Vec<f32>,
}

/// Unvalidated wire form of a snapshot
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotData {
    #[serde(with = "xyz")]
    centers: Vec<Vec3>,
    center_neighbors: Vec<Vec<usize>>,
    center_water: Vec<bool>,
    center_lat: Vec<f32>,
    center_lng: Vec<f32>,
    cell_ids: Vec<CellId>,
    biomes: Vec<Biome>,
    elevations: Vec<f32>,
}

impl TryFrom<SnapshotData> for WorldSnapshot {
    type Error = SnapshotError;

    fn try_from(data: SnapshotData) -> Result<Self, Self::Error> {
        let snapshot = WorldSnapshot {
            centers: data.centers,
            neighbors: data.center_neighbors,
            is_water: data.center_water,
            latitudes: data.center_lat,
            longitudes: data.center_lng,
            cell_ids: data.cell_ids,
            biomes: data.biomes,
            elevations: data.elevations,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }
}

impl WorldSnapshot {
    /// Assemble a snapshot from generator output and validate it
    pub fn from_parts(tessellation: Tessellation, terrain: Terrain) -> Result<Self, SnapshotError> {
        let snapshot = WorldSnapshot {
            centers: tessellation.centers,
            neighbors: tessellation.neighbors,
            is_water: terrain.is_water,
            latitudes: tessellation.latitudes,
            longitudes: tessellation.longitudes,
            cell_ids: tessellation.cell_ids,
            biomes: terrain.biomes,
            elevations: terrain.elevations,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check every structural invariant
    ///
    /// # Errors
    ///
    /// The first violation found, as a [`SnapshotError`].
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let count = self.centers.len();
        if count == 0 {
            return Err(SnapshotError::Empty);
        }

        let lengths = [
            ("centerNeighbors", self.neighbors.len()),
            ("centerWater", self.is_water.len()),
            ("centerLat", self.latitudes.len()),
            ("centerLng", self.longitudes.len()),
            ("cellIds", self.cell_ids.len()),
            ("biomes", self.biomes.len()),
            ("elevations", self.elevations.len()),
        ];
        for (field, actual) in lengths {
            if actual != count {
                return Err(SnapshotError::LengthMismatch {
                    field,
                    expected: count,
                    actual,
                });
            }
        }

        // Every center on one sphere, which gives the world its radius
        let radius = self.centers[0].length();
        let tolerance = radius * CENTER_RADIUS_TOLERANCE;
        for (cell, center) in self.centers.iter().enumerate() {
            let on_sphere = radius.is_finite()
                && radius > f32::EPSILON
                && center.is_finite()
                && (center.length() - radius).abs() <= tolerance;
            if !on_sphere {
                return Err(SnapshotError::InvalidCenter {
                    cell,
                    center: center.to_array(),
                    radius,
                });
            }
        }

        for (cell, (&lat, &lng)) in self.latitudes.iter().zip(&self.longitudes).enumerate() {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                return Err(SnapshotError::InvalidCoordinate { cell, lat, lng });
            }
        }

        for (cell, neighbors) in self.neighbors.iter().enumerate() {
            for &neighbor in neighbors {
                if neighbor >= count {
                    return Err(SnapshotError::NeighborOutOfBounds {
                        cell,
                        neighbor,
                        count,
                    });
                }
                if neighbor == cell {
                    return Err(SnapshotError::SelfNeighbor(cell));
                }
            }
        }

        for (cell, neighbors) in self.neighbors.iter().enumerate() {
            for &neighbor in neighbors {
                if !self.neighbors[neighbor].contains(&cell) {
                    return Err(SnapshotError::AsymmetricAdjacency { cell, neighbor });
                }
            }
        }

        for (cell, (biome, water)) in self.biomes.iter().zip(&self.is_water).enumerate() {
            if biome.is_water() != *water {
                return Err(SnapshotError::WaterMismatch(cell));
            }
        }

        for (cell, &value) in self.elevations.iter().enumerate() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(SnapshotError::InvalidElevation { cell, value });
            }
        }

        // One resolution for the whole world, no duplicates
        let resolution = self.cell_ids[0].resolution();
        let mut seen = HashSet::with_capacity(count);
        for (cell, id) in self.cell_ids.iter().enumerate() {
            if id.resolution() != resolution || !seen.insert(*id) {
                return Err(SnapshotError::InvalidCellId {
                    cell,
                    id: id.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Parse and validate a JSON snapshot
    ///
    /// # Errors
    ///
    /// `Parse` for malformed JSON or identifiers, otherwise the structural
    /// violation found by [`validate`](Self::validate).
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let data: SnapshotData =
            serde_json::from_str(text).map_err(|err| SnapshotError::Parse(err.to_string()))?;
        Self::try_from(data)
    }

    /// Encode as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Number of cells
    #[inline]
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    /// Always false for a validated snapshot
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Sphere radius, taken from the first center
    #[inline]
    pub fn radius(&self) -> f32 {
        self.centers.first().map_or(0.0, |c| c.length())
    }

    #[inline]
    pub fn centers(&self) -> &[Vec3] {
        &self.centers
    }

    #[inline]
    pub fn cell_ids(&self) -> &[CellId] {
        &self.cell_ids
    }

    #[inline]
    pub fn biomes(&self) -> &[Biome] {
        &self.biomes
    }

    #[inline]
    pub fn elevations(&self) -> &[f32] {
        &self.elevations
    }

    /// Neighbor indices of a cell, empty for an unknown index
    pub fn neighbors(&self, cell: usize) -> &[usize] {
        self.neighbors.get(cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a cell is water; unknown indices are not
    #[inline]
    pub fn is_water(&self, cell: usize) -> bool {
        self.is_water.get(cell).copied().unwrap_or(false)
    }

    #[inline]
    pub fn biome(&self, cell: usize) -> Option<Biome> {
        self.biomes.get(cell).copied()
    }

    #[inline]
    pub fn elevation(&self, cell: usize) -> Option<f32> {
        self.elevations.get(cell).copied()
    }

    /// Latitude and longitude of a cell center, degrees
    pub fn lat_lng(&self, cell: usize) -> Option<(f32, f32)> {
        Some((*self.latitudes.get(cell)?, *self.longitudes.get(cell)?))
    }

    /// Borrowed view of one cell
    ///
    /// # Example
    ///
    /// ```
    /// # use geodesic_conquest::*;
    /// # let config = WorldConfigBuilder::new().resolution(1).unwrap().build().unwrap();
    /// # let world = generate_world(&config, None).unwrap();
    /// if let Some(cell) = world.cell(0) {
    ///     println!("{} is {} with {} neighbors", cell.id, cell.biome, cell.neighbor_count());
    /// }
    /// ```
    pub fn cell(&self, index: usize) -> Option<CellView<'_>> {
        Some(CellView {
            index,
            id: *self.cell_ids.get(index)?,
            center: *self.centers.get(index)?,
            latitude: *self.latitudes.get(index)?,
            longitude: *self.longitudes.get(index)?,
            neighbors: self.neighbors.get(index)?,
            biome: *self.biomes.get(index)?,
            elevation: *self.elevations.get(index)?,
            is_water: *self.is_water.get(index)?,
        })
    }

    /// Iterate over every cell
    pub fn cells(&self) -> impl Iterator<Item = CellView<'_>> + '_ {
        (0..self.len()).filter_map(move |index| self.cell(index))
    }

    /// Number of cells per biome, in [`Biome::ALL`] order
    pub fn biome_counts(&self) -> Vec<(Biome, usize)> {
        Biome::ALL
            .iter()
            .map(|&biome| (biome, self.biomes.iter().filter(|&&b| b == biome).count()))
            .collect()
    }

    /// Cell nearest to a 3D point (linear scan, ties to the lowest index)
    pub fn nearest_cell(&self, point: Vec3) -> usize {
        geo::nearest_cell(&self.centers, point).unwrap_or(0)
    }

    /// Cells reachable within `hops` steps of `center`, including `center`
    ///
    /// Returns an empty vec for an unknown cell.
    pub fn cells_within_hops(&self, center: usize, hops: usize) -> Vec<usize> {
        if center >= self.len() {
            return vec![];
        }

        let mut visited = HashSet::new();
        let mut current = vec![center];
        visited.insert(center);

        for _ in 0..hops {
            let mut next = Vec::new();
            for &cell in &current {
                for &neighbor in self.neighbors(cell) {
                    if visited.insert(neighbor) {
                        next.push(neighbor);
                    }
                }
            }
            current = next;
        }

        let mut cells: Vec<usize> = visited.into_iter().collect();
        cells.sort_unstable();
        cells
    }
}

/// `Vec<Vec3>` as a list of `{x, y, z}` objects
mod xyz {
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Point {
        x: f32,
        y: f32,
        z: f32,
    }

    pub fn serialize<S: Serializer>(points: &[Vec3], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(points.iter().map(|p| Point {
            x: p.x,
            y: p.y,
            z: p.z,
        }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec3>, D::Error> {
        let points = Vec::<Point>::deserialize(deserializer)?;
        Ok(points.into_iter().map(|p| Vec3::new(p.x, p.y, p.z)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfigBuilder;
    use crate::generation::generate_world;

    fn world() -> WorldSnapshot {
        let config = WorldConfigBuilder::new().resolution(2).unwrap().build().unwrap();
        generate_world(&config, None).unwrap()
    }

    fn json_value(world: &WorldSnapshot) -> serde_json::Value {
        serde_json::from_str(&world.to_json().unwrap()).unwrap()
    }

    #[test]
    fn test_json_round_trip() {
        let world = world();
        let restored = WorldSnapshot::from_json(&world.to_json().unwrap()).unwrap();
        assert_eq!(restored, world);
    }

    #[test]
    fn test_json_layout() {
        let value = json_value(&world());
        for key in [
            "centers",
            "centerNeighbors",
            "centerWater",
            "centerLat",
            "centerLng",
            "cellIds",
            "biomes",
            "elevations",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert!(value["centers"][0].get("x").is_some());
        assert_eq!(value["cellIds"][0].as_str().unwrap().len(), 15);
        assert!(value["biomes"][0].is_string());
    }

    #[test]
    fn test_rejects_truncated_array() {
        let mut value = json_value(&world());
        value["elevations"].as_array_mut().unwrap().pop();
        let err = WorldSnapshot::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::LengthMismatch {
                field: "elevations",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_asymmetric_adjacency() {
        let mut value = json_value(&world());
        value["centerNeighbors"][0].as_array_mut().unwrap().pop();
        let err = WorldSnapshot::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, SnapshotError::AsymmetricAdjacency { .. }));
    }

    #[test]
    fn test_rejects_out_of_bounds_neighbor() {
        let world = world();
        let mut value = json_value(&world);
        value["centerNeighbors"][3][0] = serde_json::json!(world.len() + 10);
        let err = WorldSnapshot::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, SnapshotError::NeighborOutOfBounds { cell: 3, .. }));
    }

    #[test]
    fn test_rejects_water_mismatch() {
        let world = world();
        let mut value = json_value(&world);
        value["centerWater"][5] = serde_json::json!(!world.is_water(5));
        assert_eq!(
            WorldSnapshot::from_json(&value.to_string()),
            Err(SnapshotError::WaterMismatch(5))
        );
    }

    #[test]
    fn test_rejects_bad_elevation_and_ids() {
        let mut value = json_value(&world());
        value["elevations"][2] = serde_json::json!(1.5);
        assert!(matches!(
            WorldSnapshot::from_json(&value.to_string()),
            Err(SnapshotError::InvalidElevation { cell: 2, .. })
        ));

        let mut value = json_value(&world());
        value["cellIds"][1] = serde_json::json!("not-a-cell");
        assert!(matches!(
            WorldSnapshot::from_json(&value.to_string()),
            Err(SnapshotError::Parse(_))
        ));

        let mut value = json_value(&world());
        value["cellIds"][1] = value["cellIds"][0].clone();
        assert!(matches!(
            WorldSnapshot::from_json(&value.to_string()),
            Err(SnapshotError::InvalidCellId { cell: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_centers_off_the_sphere() {
        let mut value = json_value(&world());
        value["centers"][0] = serde_json::json!({"x": 0.0, "y": 0.0, "z": 0.0});
        assert!(matches!(
            WorldSnapshot::from_json(&value.to_string()),
            Err(SnapshotError::InvalidCenter { cell: 0, .. })
        ));

        let world = world();
        let mut value = json_value(&world);
        let stretched = world.centers()[4] * 2.0;
        value["centers"][4] = serde_json::json!({"x": stretched.x, "y": stretched.y, "z": stretched.z});
        assert!(matches!(
            WorldSnapshot::from_json(&value.to_string()),
            Err(SnapshotError::InvalidCenter { cell: 4, .. })
        ));

        let mut value = json_value(&world);
        value["centers"][6]["x"] = serde_json::json!(1e30);
        assert!(matches!(
            WorldSnapshot::from_json(&value.to_string()),
            Err(SnapshotError::InvalidCenter { cell: 6, .. })
        ));
    }

    #[test]
    fn test_rejects_coordinates_outside_globe() {
        let mut value = json_value(&world());
        value["centerLat"][0] = serde_json::json!(1e30);
        assert!(matches!(
            WorldSnapshot::from_json(&value.to_string()),
            Err(SnapshotError::InvalidCoordinate { cell: 0, .. })
        ));

        let mut value = json_value(&world());
        value["centerLat"][2] = serde_json::json!(-90.5);
        assert!(matches!(
            WorldSnapshot::from_json(&value.to_string()),
            Err(SnapshotError::InvalidCoordinate { cell: 2, .. })
        ));

        let mut value = json_value(&world());
        value["centerLng"][3] = serde_json::json!(200.0);
        assert!(matches!(
            WorldSnapshot::from_json(&value.to_string()),
            Err(SnapshotError::InvalidCoordinate { cell: 3, .. })
        ));
    }

    #[test]
    fn test_rejects_empty_and_garbage() {
        let empty = r#"{"centers":[],"centerNeighbors":[],"centerWater":[],"centerLat":[],
            "centerLng":[],"cellIds":[],"biomes":[],"elevations":[]}"#;
        assert_eq!(WorldSnapshot::from_json(empty), Err(SnapshotError::Empty));
        assert!(matches!(
            WorldSnapshot::from_json("{\"centers\": 4"),
            Err(SnapshotError::Parse(_))
        ));
    }

    #[test]
    fn test_serde_deserialize_validates() {
        let mut value = json_value(&world());
        value["centerNeighbors"][0].as_array_mut().unwrap().push(serde_json::json!(0));
        assert!(serde_json::from_value::<WorldSnapshot>(value).is_err());
    }

    #[test]
    fn test_accessors() {
        let world = world();
        assert_eq!(world.len(), 162);
        assert!((world.radius() - 1.0).abs() < 1e-4);

        let total: usize = world.biome_counts().iter().map(|(_, n)| n).sum();
        assert_eq!(total, world.len());

        assert_eq!(world.cells().count(), world.len());
        assert!(world.cell(world.len()).is_none());
        assert!(world.neighbors(world.len()).is_empty());

        for index in [0, 17, 100] {
            assert_eq!(world.nearest_cell(world.centers()[index]), index);
        }
    }

    #[test]
    fn test_cells_within_hops() {
        let world = world();
        assert_eq!(world.cells_within_hops(0, 0), vec![0]);

        let one_hop = world.cells_within_hops(0, 1);
        assert_eq!(one_hop.len(), world.neighbors(0).len() + 1);

        assert_eq!(world.cells_within_hops(0, 50).len(), world.len());
        assert!(world.cells_within_hops(world.len(), 1).is_empty());
    }
}
