//! Error types for world generation, snapshot handling and territory rules

use thiserror::Error;

/// Errors that abort a generation call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// Degenerate or out-of-range generation parameters
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Generation was cancelled before it could commit a world
    #[error("generation cancelled")]
    Cancelled,
    /// The background generation thread panicked
    #[error("generation worker failed")]
    WorkerFailed,
}

/// Structural problems found while validating a [`WorldSnapshot`](crate::WorldSnapshot)
///
/// Any of these means the snapshot is corrupt. Callers loading from a cache
/// treat them as a cache miss and regenerate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    #[error("snapshot has no cells")]
    Empty,
    #[error("array `{field}` has length {actual}, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("cell {cell} lists neighbor {neighbor}, outside 0..{count}")]
    NeighborOutOfBounds {
        cell: usize,
        neighbor: usize,
        count: usize,
    },
    #[error("cell {0} lists itself as a neighbor")]
    SelfNeighbor(usize),
    #[error("cell {cell} lists {neighbor} as neighbor but not the reverse")]
    AsymmetricAdjacency { cell: usize, neighbor: usize },
    #[error("cell {0} water flag disagrees with its biome")]
    WaterMismatch(usize),
    #[error("cell {cell} has elevation {value} outside [0, 1]")]
    InvalidElevation { cell: usize, value: f32 },
    #[error("cell {cell} center {center:?} is not on a sphere of radius {radius}")]
    InvalidCenter {
        cell: usize,
        center: [f32; 3],
        radius: f32,
    },
    #[error("cell {cell} has coordinate ({lat}, {lng}) outside the globe")]
    InvalidCoordinate { cell: usize, lat: f32, lng: f32 },
    #[error("cell {cell} has malformed identifier `{id}`")]
    InvalidCellId { cell: usize, id: String },
    #[error("snapshot could not be parsed: {0}")]
    Parse(String),
}

/// Failures of a snapshot store backend
///
/// Never fatal to a running world: `load_or_generate` logs these and moves on.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored snapshot is corrupt: {0}")]
    Corrupt(#[from] SnapshotError),
}

/// Rule violations reported by the territory engine
///
/// These are ordinary outcomes of user input, returned as values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IllegalAction {
    #[error("cell {0} is water")]
    WaterCell(usize),
    #[error("cell {0} is already owned")]
    AlreadyOwned(usize),
    #[error("cell {0} does not border owned territory")]
    NotAdjacent(usize),
    #[error("committed force must be positive")]
    NonPositiveForce,
    #[error("committed force is too small to ever capture cell {0}")]
    ForceTooSmall(usize),
    #[error("a capital has already been placed")]
    CapitalAlreadyPlaced,
    #[error("cell {0} is already being conquered")]
    ClaimInProgress(usize),
    #[error("not enough troops: requested {requested}, available {available}")]
    InsufficientTroops { requested: u32, available: u32 },
    #[error("simulation is paused")]
    Paused,
    #[error("no cell with index {0}")]
    UnknownCell(usize),
}

/// Result type alias for generation calls
pub type Result<T> = std::result::Result<T, GenerationError>;
