//! Background world generation
//!
//! Generation is a one-shot computation that can take a while at high
//! resolutions. This runs it on its own thread so an interactive host can keep
//! drawing; the result is either a complete snapshot or an error, never a
//! partially built world.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::WorldConfig;
use crate::error::{GenerationError, Result};
use crate::snapshot::WorldSnapshot;
use crate::terrain::BrightnessSampler;

/// Shared flag asking an in-flight generation to stop
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Handle to a generation running on a background thread
pub struct GenerationHandle {
    cancel: CancelToken,
    thread: JoinHandle<Result<WorldSnapshot>>,
}

impl GenerationHandle {
    /// Ask the worker to stop; `join` will then report `Cancelled`
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the worker has finished (successfully or not)
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the worker and take its result
    pub fn join(self) -> Result<WorldSnapshot> {
        self.thread
            .join()
            .unwrap_or_else(|_| Err(GenerationError::WorkerFailed))
    }
}

/// Start generating a world on a background thread
///
/// # Example
///
/// ```
/// use geodesic_conquest::*;
///
/// let config = WorldConfigBuilder::new().resolution(2).unwrap().build().unwrap();
/// let handle = spawn_generation(config, None);
/// let world = handle.join().unwrap();
/// assert_eq!(world.len(), 162);
/// ```
pub fn spawn_generation(
    config: WorldConfig,
    reference: Option<Arc<dyn BrightnessSampler>>,
) -> GenerationHandle {
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let thread = thread::spawn(move || {
        super::generate_world_cancellable(&config, reference.as_deref(), &token)
    });
    GenerationHandle { cancel, thread }
}
