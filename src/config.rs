//! World and territory configuration
//!
//! This module provides configuration types for deterministic world generation
//! and the rule set the territory engine enforces.

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

/// Finest supported grid resolution (655,362 cells)
pub const MAX_RESOLUTION: u8 = 8;

/// Latitude/longitude window the generator samples
///
/// The default covers the whole globe. Smaller windows produce a partial
/// world whose boundary cells simply have fewer neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRegion {
    pub min_lat: f32,
    pub max_lat: f32,
    pub min_lng: f32,
    pub max_lng: f32,
}

impl SampleRegion {
    /// The whole sphere
    pub const GLOBE: SampleRegion = SampleRegion {
        min_lat: -90.0,
        max_lat: 90.0,
        min_lng: -180.0,
        max_lng: 180.0,
    };

    /// Whether the region spans every longitude
    pub fn wraps_longitude(&self) -> bool {
        self.max_lng - self.min_lng >= 360.0
    }

    fn validate(&self) -> Result<()> {
        let finite = [self.min_lat, self.max_lat, self.min_lng, self.max_lng]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(GenerationError::InvalidConfiguration(
                "sample region bounds must be finite".into(),
            ));
        }
        if self.min_lat < -90.0 || self.max_lat > 90.0 {
            return Err(GenerationError::InvalidConfiguration(format!(
                "sample region latitude {}..{} exceeds -90..90",
                self.min_lat, self.max_lat
            )));
        }
        if self.min_lng < -180.0 || self.max_lng > 180.0 {
            return Err(GenerationError::InvalidConfiguration(format!(
                "sample region longitude {}..{} exceeds -180..180",
                self.min_lng, self.max_lng
            )));
        }
        Ok(())
    }
}

impl Default for SampleRegion {
    fn default() -> Self {
        Self::GLOBE
    }
}

/// Thresholds for the biome decision table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainThresholds {
    /// Absolute latitude (degrees) above which every cell is `Pole`
    pub pole_latitude: f32,
    /// Elevation below which a cell is `Ocean`
    pub sea_level: f32,
    /// Width of the `Coast` band above sea level
    pub coast_band: f32,
    /// Elevation above which a cell is `Mountain`
    pub mountain_level: f32,
    /// Dryness above which remaining land is `Desert`
    pub dryness_threshold: f32,
    /// Dryness added outside the tropics
    pub extratropical_dryness_bias: f32,
}

impl Default for TerrainThresholds {
    fn default() -> Self {
        Self {
            pole_latitude: 70.0,
            sea_level: 0.45,
            coast_band: 0.04,
            mountain_level: 0.78,
            dryness_threshold: 0.65,
            extratropical_dryness_bias: 0.1,
        }
    }
}

impl TerrainThresholds {
    fn validate(&self) -> Result<()> {
        let levels = [self.sea_level, self.coast_band, self.mountain_level, self.dryness_threshold];
        if levels.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(GenerationError::InvalidConfiguration(
                "terrain thresholds must be finite and non-negative".into(),
            ));
        }
        if self.sea_level + self.coast_band > self.mountain_level {
            return Err(GenerationError::InvalidConfiguration(format!(
                "coast band ends at {} above mountain level {}",
                self.sea_level + self.coast_band,
                self.mountain_level
            )));
        }
        if !(0.0..=90.0).contains(&self.pole_latitude) {
            return Err(GenerationError::InvalidConfiguration(format!(
                "pole latitude must be within 0..=90 (got {})",
                self.pole_latitude
            )));
        }
        Ok(())
    }
}

/// Configuration for deterministic world generation
///
/// The same configuration (and the same reference image, if any) always
/// produces the identical world, which is what makes snapshots cacheable.
///
/// # Example
///
/// ```rust
/// use geodesic_conquest::*;
///
/// let config = WorldConfigBuilder::new()
///     .resolution(3).unwrap()
///     .terrain_seed(7)
///     .build()
///     .unwrap();
///
/// let json = serde_json::to_string(&config).unwrap();
/// let restored: WorldConfig = serde_json::from_str(&json).unwrap();
/// assert_eq!(config, restored);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Grid resolution, `0..=MAX_RESOLUTION`
    ///
    /// Resolution r yields 10·4^r + 2 cells over the full globe.
    pub resolution: u8,

    /// Sphere radius cell centers are scaled to
    pub radius: f32,

    /// Seed for the procedural elevation and dryness hashes
    pub terrain_seed: u32,

    /// Window of the globe to sample
    pub region: SampleRegion,

    /// Biome decision thresholds
    pub thresholds: TerrainThresholds,
}

impl WorldConfig {
    /// Approximate cell count over the full globe at this resolution
    #[inline]
    pub fn globe_cell_count(&self) -> usize {
        10 * 4_usize.pow(self.resolution as u32) + 2
    }

    /// Stable key identifying the world this configuration generates
    ///
    /// Used as the storage key for cached snapshots, so any parameter change
    /// lands in a different slot instead of loading a stale world.
    pub fn cache_key(&self) -> String {
        let encoded = serde_json::to_string(self).unwrap_or_default();
        // FNV-1a; stable across builds unlike std's hasher
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in encoded.bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        format!("world-r{}-s{}-{:016x}", self.resolution, self.terrain_seed, hash)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            resolution: 5,
            radius: 1.0,
            terrain_seed: 0,
            region: SampleRegion::GLOBE,
            thresholds: TerrainThresholds::default(),
        }
    }
}

/// Builder for creating WorldConfig with validation
///
/// # Example
///
/// ```rust
/// use geodesic_conquest::*;
///
/// let config = WorldConfigBuilder::new()
///     .resolution(4).unwrap()
///     .radius(5.0).unwrap()
///     .build()
///     .unwrap();
/// assert_eq!(config.globe_cell_count(), 2562);
/// ```
#[derive(Debug, Clone)]
pub struct WorldConfigBuilder {
    config: WorldConfig,
}

impl WorldConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults: resolution 5 (~10k cells), radius 1.0, terrain seed 0,
    /// whole globe, default thresholds.
    pub fn new() -> Self {
        Self {
            config: WorldConfig::default(),
        }
    }

    /// Set the grid resolution
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if resolution > `MAX_RESOLUTION`
    pub fn resolution(mut self, resolution: u8) -> Result<Self> {
        if resolution > MAX_RESOLUTION {
            return Err(GenerationError::InvalidConfiguration(format!(
                "resolution must be <= {} (got {})",
                MAX_RESOLUTION, resolution
            )));
        }
        self.config.resolution = resolution;
        Ok(self)
    }

    /// Set the sphere radius
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if radius is not a positive finite number
    pub fn radius(mut self, radius: f32) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(GenerationError::InvalidConfiguration(format!(
                "radius must be positive (got {})",
                radius
            )));
        }
        self.config.radius = radius;
        Ok(self)
    }

    /// Set the terrain seed
    pub fn terrain_seed(mut self, seed: u32) -> Self {
        self.config.terrain_seed = seed;
        self
    }

    /// Restrict sampling to a latitude/longitude window
    ///
    /// An empty window is accepted here and rejected by the generator when it
    /// yields no cells.
    pub fn region(mut self, region: SampleRegion) -> Result<Self> {
        region.validate()?;
        self.config.region = region;
        Ok(self)
    }

    /// Replace the biome thresholds
    pub fn thresholds(mut self, thresholds: TerrainThresholds) -> Result<Self> {
        thresholds.validate()?;
        self.config.thresholds = thresholds;
        Ok(self)
    }

    /// Build the configuration
    pub fn build(self) -> Result<WorldConfig> {
        Ok(self.config)
    }
}

impl Default for WorldConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Timing parameters for time-gated capture
///
/// `required = base_time / min(max_bonus, force / force_norm)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConquestTiming {
    /// Seconds a capture takes at a force multiplier of 1
    pub base_time: f32,
    /// Force that counts as a multiplier of 1
    pub force_norm: f32,
    /// Cap on the force multiplier
    pub max_bonus: f32,
}

impl Default for ConquestTiming {
    fn default() -> Self {
        Self {
            base_time: 3.0,
            force_norm: 100.0,
            max_bonus: 2.0,
        }
    }
}

impl ConquestTiming {
    /// Check that every parameter is finite and positive
    pub fn validate(&self) -> Result<()> {
        let values = [self.base_time, self.force_norm, self.max_bonus];
        if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(GenerationError::InvalidConfiguration(format!(
                "conquest timing must be positive (got {:?})",
                self
            )));
        }
        Ok(())
    }

    /// Seconds required to capture a cell with `force` committed
    ///
    /// `force` must be positive; the engine rejects anything else first.
    pub fn required_time(&self, force: f32) -> f32 {
        let multiplier = (force / self.force_norm).min(self.max_bonus);
        self.base_time / multiplier
    }
}

/// How an accepted expansion turns into ownership
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CapturePolicy {
    /// The target is owned as soon as the request is accepted
    Instant,
    /// The target is claimed and becomes owned once enough ticks have elapsed
    TimeGated(ConquestTiming),
}

impl Default for CapturePolicy {
    fn default() -> Self {
        CapturePolicy::TimeGated(ConquestTiming::default())
    }
}

/// Rule set for the territory engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerritoryRules {
    pub capture: CapturePolicy,
    /// Reject a second capital placement
    pub single_capital: bool,
}

impl Default for TerritoryRules {
    fn default() -> Self {
        Self {
            capture: CapturePolicy::default(),
            single_capital: true,
        }
    }
}

impl TerritoryRules {
    /// Rules with instant capture and a single capital
    pub fn instant() -> Self {
        Self {
            capture: CapturePolicy::Instant,
            single_capital: true,
        }
    }

    /// Rules with time-gated capture using `timing`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if any timing parameter is not positive
    pub fn time_gated(timing: ConquestTiming) -> Result<Self> {
        timing.validate()?;
        Ok(Self {
            capture: CapturePolicy::TimeGated(timing),
            single_capital: true,
        })
    }

    /// Check rules that did not come through [`time_gated`](Self::time_gated),
    /// such as ones deserialized or built field by field
    pub fn validate(&self) -> Result<()> {
        match self.capture {
            CapturePolicy::Instant => Ok(()),
            CapturePolicy::TimeGated(timing) => timing.validate(),
        }
    }

    /// Toggle the one-capital guard
    pub fn with_single_capital(mut self, single_capital: bool) -> Self {
        self.single_capital = single_capital;
        self
    }
}
