//! Hexagonal geodesic planets with terrain and territorial conquest
//!
//! Generates a planet partitioned into roughly uniform hexagonal cells (plus
//! twelve pentagons), classifies every cell's terrain, and runs a territory
//! simulation over the resulting adjacency graph. Rendering, input and storage
//! media are left to the host: the crate works in terms of 3D points, cell
//! indices and serializable snapshots.
//!
//! # Quick Start
//!
//! ```rust
//! use geodesic_conquest::*;
//!
//! // Generate (or load) a world
//! let config = WorldConfigBuilder::new()
//!     .resolution(3).unwrap()
//!     .terrain_seed(42)
//!     .build().unwrap();
//! let world = generate_world(&config, None).unwrap();
//! println!("Generated {} cells", world.len());
//!
//! // Conquer it
//! let mut engine = TerritoryEngine::new(world, TerritoryRules::instant()).unwrap();
//! let world = engine.world();
//! let land = (0..world.len())
//!     .find(|&i| !world.is_water(i) && world.neighbors(i).iter().any(|&n| !world.is_water(n)))
//!     .unwrap();
//! engine.place_capital_at(land).unwrap();
//!
//! let next = engine.frontier()[0];
//! engine.request_expansion_at(next, 100.0).unwrap();
//! assert_eq!(engine.territory_size(), 2);
//! ```
//!
//! # Features
//!
//! - `image` (default): decode reference elevation pictures with the `image` crate

// Modules
pub mod error;
pub mod config;
pub mod geo;
pub mod spatial;
pub mod cell;
pub mod generation;
pub mod terrain;
pub mod snapshot;
pub mod territory;
pub mod session;

// Re-export core types for convenience
pub use error::{GenerationError, IllegalAction, PersistError, Result, SnapshotError};
pub use config::{
    CapturePolicy, ConquestTiming, SampleRegion, TerrainThresholds, TerritoryRules, WorldConfig,
    WorldConfigBuilder, MAX_RESOLUTION,
};
pub use geo::CellHit;
pub use spatial::SpatialIndex;
pub use cell::CellView;
pub use generation::{
    generate_tessellation, generate_world, spawn_generation, CancelToken, CellId, GenerationHandle,
    GeodesicGrid, Tessellation,
};
pub use terrain::{image_uv, Biome, BrightnessGrid, BrightnessSampler, Terrain, TerrainClassifier};
pub use snapshot::store::{
    load_or_generate, snapshot_key, CacheOutcome, JsonFileStore, MemoryStore, SnapshotStore,
};
pub use snapshot::WorldSnapshot;
pub use territory::{
    City, Claim, ExpansionOutcome, Projectile, SubscriptionId, TerritoryEngine, TerritoryEvent,
};
pub use session::{Session, SessionConfig};

// Re-export glam::Vec3 for convenience
pub use glam::Vec3;
