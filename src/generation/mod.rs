//! World generation pipeline
//!
//! Builds the geodesic grid, samples it into a tessellation, classifies the
//! terrain and assembles a [`WorldSnapshot`]. Everything is computed into
//! local buffers first; the snapshot only exists once every stage succeeded.

mod grid;
mod lattice;
mod worker;

pub use grid::{CellId, GeodesicGrid, ParseCellIdError};
pub use lattice::sampling_step;
pub use worker::{spawn_generation, CancelToken, GenerationHandle};

use std::collections::HashMap;
use std::time::Instant;

use glam::Vec3;

use crate::config::WorldConfig;
use crate::error::{GenerationError, Result};
use crate::geo::lat_lng_to_vector;
use crate::snapshot::WorldSnapshot;
use crate::terrain::{BrightnessSampler, TerrainClassifier};

/// Cell geometry without terrain
///
/// Parallel arrays indexed by local cell index, in first-discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct Tessellation {
    pub cell_ids: Vec<CellId>,
    pub centers: Vec<Vec3>,
    pub latitudes: Vec<f32>,
    pub longitudes: Vec<f32>,
    pub neighbors: Vec<Vec<usize>>,
}

impl Tessellation {
    #[inline]
    pub fn len(&self) -> usize {
        self.cell_ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cell_ids.is_empty()
    }
}

/// Generate the tessellation for `config`
///
/// # Errors
///
/// Returns `InvalidConfiguration` when the resolution is out of range or the
/// sample region yields no cells.
pub fn generate_tessellation(config: &WorldConfig) -> Result<Tessellation> {
    generate_tessellation_cancellable(config, &CancelToken::new())
}

/// Generate the tessellation, checking `cancel` between lattice rows
pub fn generate_tessellation_cancellable(
    config: &WorldConfig,
    cancel: &CancelToken,
) -> Result<Tessellation> {
    let start = Instant::now();
    let grid = GeodesicGrid::new(config.resolution)?;
    let cell_ids = lattice::sample_cells(&grid, &config.region, cancel)?;

    if cell_ids.is_empty() {
        return Err(GenerationError::InvalidConfiguration(format!(
            "sample region {:?} contains no cells at resolution {}",
            config.region, config.resolution
        )));
    }

    let local: HashMap<CellId, usize> = cell_ids
        .iter()
        .enumerate()
        .map(|(index, &id)| (id, index))
        .collect();

    let mut centers = Vec::with_capacity(cell_ids.len());
    let mut latitudes = Vec::with_capacity(cell_ids.len());
    let mut longitudes = Vec::with_capacity(cell_ids.len());
    let mut neighbors = Vec::with_capacity(cell_ids.len());

    for &id in &cell_ids {
        let (lat, lng) = grid.cell_center(id).ok_or_else(|| {
            GenerationError::InvalidConfiguration(format!("cell {} missing from grid", id))
        })?;
        centers.push(lat_lng_to_vector(lat, lng, config.radius));
        latitudes.push(lat);
        longitudes.push(lng);

        // Ring members outside the sampled region are dropped
        let mut ring: Vec<usize> = grid
            .grid_ring(id)
            .into_iter()
            .filter_map(|neighbor| local.get(&neighbor).copied())
            .collect();
        ring.sort_unstable();
        neighbors.push(ring);
    }

    log::debug!(
        "tessellated {} cells at resolution {} in {:?}",
        cell_ids.len(),
        config.resolution,
        start.elapsed()
    );

    Ok(Tessellation {
        cell_ids,
        centers,
        latitudes,
        longitudes,
        neighbors,
    })
}

/// Generate a complete world: tessellation plus terrain
///
/// With a `reference` sampler the elevation comes from the image; otherwise
/// the procedural terrain function is used.
///
/// # Example
///
/// ```
/// use geodesic_conquest::*;
///
/// let config = WorldConfigBuilder::new().resolution(3).unwrap().build().unwrap();
/// let world = generate_world(&config, None).unwrap();
/// assert_eq!(world.len(), 642);
/// assert!(world.validate().is_ok());
/// ```
pub fn generate_world(
    config: &WorldConfig,
    reference: Option<&dyn BrightnessSampler>,
) -> Result<WorldSnapshot> {
    generate_world_cancellable(config, reference, &CancelToken::new())
}

/// Generate a complete world, honoring `cancel`
pub fn generate_world_cancellable(
    config: &WorldConfig,
    reference: Option<&dyn BrightnessSampler>,
    cancel: &CancelToken,
) -> Result<WorldSnapshot> {
    let start = Instant::now();
    let tessellation = generate_tessellation_cancellable(config, cancel)?;

    if cancel.is_cancelled() {
        return Err(GenerationError::Cancelled);
    }

    let classifier = TerrainClassifier::from_config(config);
    let terrain = classifier.classify(&tessellation.latitudes, &tessellation.longitudes, reference);

    if cancel.is_cancelled() {
        return Err(GenerationError::Cancelled);
    }

    let world = WorldSnapshot::from_parts(tessellation, terrain).map_err(|err| {
        GenerationError::InvalidConfiguration(format!("generated world failed validation: {}", err))
    })?;

    log::info!(
        "generated world with {} cells ({} terrain) in {:?}",
        world.len(),
        if reference.is_some() { "image" } else { "procedural" },
        start.elapsed()
    );

    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SampleRegion, WorldConfigBuilder};

    fn config(resolution: u8) -> WorldConfig {
        WorldConfigBuilder::new()
            .resolution(resolution)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_globe_tessellation() {
        let tessellation = generate_tessellation(&config(3)).unwrap();
        assert_eq!(tessellation.len(), 642);

        for (index, neighbors) in tessellation.neighbors.iter().enumerate() {
            assert!(neighbors.len() == 5 || neighbors.len() == 6);
            for &neighbor in neighbors {
                assert_ne!(neighbor, index);
                assert!(tessellation.neighbors[neighbor].contains(&index));
            }
        }

        for center in &tessellation.centers {
            assert!((center.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_tessellation_determinism() {
        let a = generate_tessellation(&config(3)).unwrap();
        let b = generate_tessellation(&config(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_radius_scales_centers() {
        let config = WorldConfigBuilder::new()
            .resolution(2)
            .unwrap()
            .radius(10.0)
            .unwrap()
            .build()
            .unwrap();
        let tessellation = generate_tessellation(&config).unwrap();
        for center in &tessellation.centers {
            assert!((center.length() - 10.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_region_drops_outside_neighbors() {
        let region = SampleRegion {
            min_lat: -20.0,
            max_lat: 20.0,
            min_lng: -30.0,
            max_lng: 30.0,
        };
        let config = WorldConfigBuilder::new()
            .resolution(3)
            .unwrap()
            .region(region)
            .unwrap()
            .build()
            .unwrap();
        let tessellation = generate_tessellation(&config).unwrap();

        assert!(!tessellation.is_empty());
        assert!(tessellation.len() < 642);

        let grid = GeodesicGrid::new(3).unwrap();
        let mut boundary_cells = 0;
        for (index, neighbors) in tessellation.neighbors.iter().enumerate() {
            if neighbors.len() < grid.grid_ring(tessellation.cell_ids[index]).len() {
                boundary_cells += 1;
            }
            for &neighbor in neighbors {
                assert!(neighbor < tessellation.len());
                assert!(tessellation.neighbors[neighbor].contains(&index));
            }
        }
        assert!(boundary_cells > 0);
    }

    #[test]
    fn test_empty_region_is_invalid() {
        let region = SampleRegion {
            min_lat: 10.0,
            max_lat: 10.0,
            min_lng: 0.0,
            max_lng: 40.0,
        };
        let config = WorldConfigBuilder::new()
            .resolution(2)
            .unwrap()
            .region(region)
            .unwrap()
            .build()
            .unwrap();
        assert!(matches!(
            generate_tessellation(&config),
            Err(GenerationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_generate_world_cancelled() {
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            generate_world_cancellable(&config(2), None, &cancel),
            Err(GenerationError::Cancelled)
        );
    }
}
