//! Terrain classification
//!
//! Assigns every cell an elevation in `[0, 1]` and a [`Biome`]. Elevation comes
//! either from a reference image (through a [`BrightnessSampler`]) or from the
//! procedural terrain function; the biome table is the same in both modes.

mod procedural;
mod reference;

pub use procedural::ProceduralTerrain;
pub use reference::{image_uv, BrightnessGrid, BrightnessSampler};

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{TerrainThresholds, WorldConfig};

/// Latitude bounding the tropics, degrees
const TROPIC_LATITUDE: f32 = 23.5;

/// Biome of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Biome {
    /// Open water, the only impassable biome
    Ocean,
    /// Low land bordering the sea
    Coast,
    /// Dry land
    Desert,
    /// General land (grassland, plains, forest)
    #[default]
    Land,
    /// High elevation
    Mountain,
    /// Polar ice above the pole latitude
    Pole,
}

impl Biome {
    /// Every biome, in declaration order
    pub const ALL: [Biome; 6] = [
        Biome::Ocean,
        Biome::Coast,
        Biome::Desert,
        Biome::Land,
        Biome::Mountain,
        Biome::Pole,
    ];

    /// Check if this biome is water
    #[inline]
    pub fn is_water(self) -> bool {
        matches!(self, Biome::Ocean)
    }

    /// Lowercase name, as used in snapshots
    pub fn name(self) -> &'static str {
        match self {
            Biome::Ocean => "ocean",
            Biome::Coast => "coast",
            Biome::Desert => "desert",
            Biome::Land => "land",
            Biome::Mountain => "mountain",
            Biome::Pole => "pole",
        }
    }
}

impl fmt::Display for Biome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Per-cell classification output, parallel to the input coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Terrain {
    pub elevations: Vec<f32>,
    pub biomes: Vec<Biome>,
    /// Cached `biome == Ocean`
    pub is_water: Vec<bool>,
}

/// Elevation and biome classifier
///
/// # Example
///
/// ```
/// use geodesic_conquest::*;
///
/// let classifier = TerrainClassifier::new(TerrainThresholds::default(), 42);
/// assert_eq!(classifier.biome_for(80.0, 10.0, 0.1), Biome::Pole);
/// assert_eq!(classifier.biome_for(10.0, 10.0, 0.1), Biome::Ocean);
/// assert_eq!(classifier.biome_for(10.0, 10.0, 0.9), Biome::Mountain);
/// ```
#[derive(Debug, Clone)]
pub struct TerrainClassifier {
    thresholds: TerrainThresholds,
    procedural: ProceduralTerrain,
}

impl TerrainClassifier {
    /// Create a classifier with explicit thresholds and seed
    pub fn new(thresholds: TerrainThresholds, seed: u32) -> Self {
        Self {
            thresholds,
            procedural: ProceduralTerrain::new(seed),
        }
    }

    /// Create a classifier from a world configuration
    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.thresholds, config.terrain_seed)
    }

    /// Thresholds in use
    #[inline]
    pub fn thresholds(&self) -> &TerrainThresholds {
        &self.thresholds
    }

    /// Elevation at a coordinate
    ///
    /// Samples `reference` when given, otherwise the procedural function.
    pub fn elevation_at(&self, lat: f32, lng: f32, reference: Option<&dyn BrightnessSampler>) -> f32 {
        match reference {
            Some(sampler) => {
                let (u, v) = image_uv(lat, lng);
                let brightness = sampler.sample_brightness(u, v);
                if brightness.is_nan() {
                    0.0
                } else {
                    brightness.clamp(0.0, 1.0)
                }
            }
            None => self.procedural.elevation(lat, lng),
        }
    }

    /// Biome decision table, first match wins
    pub fn biome_for(&self, lat: f32, lng: f32, elevation: f32) -> Biome {
        let t = &self.thresholds;
        if lat.abs() > t.pole_latitude {
            Biome::Pole
        } else if elevation < t.sea_level {
            Biome::Ocean
        } else if elevation < t.sea_level + t.coast_band {
            Biome::Coast
        } else if elevation > t.mountain_level {
            Biome::Mountain
        } else {
            let mut dryness = self.procedural.dryness(lat, lng);
            if lat.abs() > TROPIC_LATITUDE {
                dryness += t.extratropical_dryness_bias;
            }
            if dryness > t.dryness_threshold {
                Biome::Desert
            } else {
                Biome::Land
            }
        }
    }

    /// Classify every coordinate pair
    ///
    /// `lats` and `lngs` are parallel; extra entries in the longer slice are
    /// ignored.
    pub fn classify(
        &self,
        lats: &[f32],
        lngs: &[f32],
        reference: Option<&dyn BrightnessSampler>,
    ) -> Terrain {
        let (elevations, biomes): (Vec<f32>, Vec<Biome>) = lats
            .par_iter()
            .zip(lngs.par_iter())
            .map(|(&lat, &lng)| {
                let elevation = self.elevation_at(lat, lng, reference);
                (elevation, self.biome_for(lat, lng, elevation))
            })
            .unzip();

        let is_water = biomes.iter().map(|b| b.is_water()).collect();

        Terrain {
            elevations,
            biomes,
            is_water,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> TerrainClassifier {
        TerrainClassifier::new(TerrainThresholds::default(), 42)
    }

    #[test]
    fn test_decision_table_priority() {
        let c = classifier();
        // Pole wins even over deep water and high peaks
        assert_eq!(c.biome_for(75.0, 0.0, 0.0), Biome::Pole);
        assert_eq!(c.biome_for(-75.0, 0.0, 1.0), Biome::Pole);

        assert_eq!(c.biome_for(0.0, 0.0, 0.44), Biome::Ocean);
        assert_eq!(c.biome_for(0.0, 0.0, 0.46), Biome::Coast);
        assert_eq!(c.biome_for(0.0, 0.0, 0.80), Biome::Mountain);

        let mid = c.biome_for(0.0, 0.0, 0.6);
        assert!(mid == Biome::Land || mid == Biome::Desert);
    }

    #[test]
    fn test_dryness_bias_outside_tropics() {
        let always_dry = TerrainThresholds {
            dryness_threshold: 1.0,
            extratropical_dryness_bias: 1.5,
            ..Default::default()
        };
        let c = TerrainClassifier::new(always_dry, 1);
        assert_eq!(c.biome_for(45.0, 10.0, 0.6), Biome::Desert);
        assert_eq!(c.biome_for(5.0, 10.0, 0.6), Biome::Land);
    }

    #[test]
    fn test_water_flags_follow_biomes() {
        let lats: Vec<f32> = (-80..=80).step_by(4).map(|v| v as f32).collect();
        let lngs: Vec<f32> = lats.iter().map(|lat| lat * 2.0).collect();
        let terrain = classifier().classify(&lats, &lngs, None);

        assert_eq!(terrain.biomes.len(), lats.len());
        for (biome, water) in terrain.biomes.iter().zip(&terrain.is_water) {
            assert_eq!(*water, *biome == Biome::Ocean);
        }
        for elevation in &terrain.elevations {
            assert!((0.0..=1.0).contains(elevation));
        }
    }

    #[test]
    fn test_image_mode_uses_reference() {
        let dark = BrightnessGrid::new(4, 2, vec![0.1; 8]).unwrap();
        let bright = BrightnessGrid::new(4, 2, vec![0.9; 8]).unwrap();
        let c = classifier();

        assert!((c.elevation_at(10.0, 20.0, Some(&dark)) - 0.1).abs() < 1e-6);
        assert_eq!(c.biome_for(10.0, 20.0, c.elevation_at(10.0, 20.0, Some(&dark))), Biome::Ocean);
        assert_eq!(
            c.biome_for(10.0, 20.0, c.elevation_at(10.0, 20.0, Some(&bright))),
            Biome::Mountain
        );
    }

    #[test]
    fn test_biome_names() {
        for biome in Biome::ALL {
            let json = serde_json::to_string(&biome).unwrap();
            assert_eq!(json, format!("\"{}\"", biome.name()));
        }
        assert!(Biome::Ocean.is_water());
        assert!(!Biome::Coast.is_water());
    }
}
