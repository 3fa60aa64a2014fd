//! Latitude/longitude lattice sampling
//!
//! Walks a regular lat/lng lattice over the sample region and records every
//! grid cell the samples land in, in order of first discovery.

use std::collections::HashSet;

use rayon::prelude::*;

use crate::config::SampleRegion;
use crate::error::{GenerationError, Result};

use super::grid::{CellId, GeodesicGrid};
use super::worker::CancelToken;

/// Angular lattice step for a grid, in degrees
///
/// Half the smallest center spacing. Every cell contains a disk of radius at
/// least half that spacing, and a square lattice of this step always puts a
/// sample inside such a disk.
pub fn sampling_step(grid: &GeodesicGrid) -> f32 {
    grid.min_spacing_degrees() * 0.5
}

/// Evenly spaced coordinates covering `min..=max` with spacing <= `step`
///
/// With `wraps` the upper endpoint is left out since it coincides with the
/// lower one.
fn axis_samples(min: f32, max: f32, step: f32, wraps: bool) -> Vec<f32> {
    let span = max - min;
    if span <= 0.0 {
        return Vec::new();
    }
    let intervals = (span / step).ceil().max(1.0) as usize;
    let spacing = span / intervals as f32;
    let count = if wraps { intervals } else { intervals + 1 };
    (0..count).map(|i| min + spacing * i as f32).collect()
}

/// Cells discovered by sampling `region`, in first-discovery order
///
/// Rows run south to north and columns west to east. Rows are resolved in
/// parallel, then merged sequentially so the order never depends on
/// scheduling.
pub fn sample_cells(
    grid: &GeodesicGrid,
    region: &SampleRegion,
    cancel: &CancelToken,
) -> Result<Vec<CellId>> {
    let step = sampling_step(grid);
    let latitudes = axis_samples(region.min_lat, region.max_lat, step, false);
    let longitudes = axis_samples(region.min_lng, region.max_lng, step, region.wraps_longitude());

    log::debug!(
        "sampling {} x {} lattice at {:.4}° step",
        latitudes.len(),
        longitudes.len(),
        step
    );

    let rows: Vec<Option<Vec<CellId>>> = latitudes
        .par_iter()
        .map(|&lat| {
            if cancel.is_cancelled() {
                return None;
            }
            let mut row: Vec<CellId> = Vec::new();
            for &lng in &longitudes {
                let id = grid.cell_at(lat, lng);
                if row.last() != Some(&id) {
                    row.push(id);
                }
            }
            Some(row)
        })
        .collect();

    let mut seen: HashSet<CellId> = HashSet::new();
    let mut ordered = Vec::new();
    for row in rows {
        let row = row.ok_or(GenerationError::Cancelled)?;
        for id in row {
            if seen.insert(id) {
                ordered.push(id);
            }
        }
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_samples() {
        let lat = axis_samples(-90.0, 90.0, 45.0, false);
        assert_eq!(lat, vec![-90.0, -45.0, 0.0, 45.0, 90.0]);

        let lng = axis_samples(-180.0, 180.0, 90.0, true);
        assert_eq!(lng, vec![-180.0, -90.0, 0.0, 90.0]);

        assert!(axis_samples(10.0, 10.0, 1.0, false).is_empty());
        assert!(axis_samples(10.0, -10.0, 1.0, false).is_empty());
    }

    #[test]
    fn test_full_globe_finds_every_cell() {
        for resolution in 0..=3 {
            let grid = GeodesicGrid::new(resolution).unwrap();
            let cells = sample_cells(&grid, &SampleRegion::GLOBE, &CancelToken::new()).unwrap();
            assert_eq!(cells.len(), grid.cell_count(), "resolution {}", resolution);
        }
    }

    #[test]
    fn test_discovery_order_is_stable() {
        let grid = GeodesicGrid::new(2).unwrap();
        let a = sample_cells(&grid, &SampleRegion::GLOBE, &CancelToken::new()).unwrap();
        let b = sample_cells(&grid, &SampleRegion::GLOBE, &CancelToken::new()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_cancelled_sampling() {
        let grid = GeodesicGrid::new(2).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            sample_cells(&grid, &SampleRegion::GLOBE, &cancel),
            Err(GenerationError::Cancelled)
        );
    }
}
