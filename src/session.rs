//! Game session
//!
//! Owns the territory engine together with the state a frontend toggles
//! around it: the pause flag and the troop and cash counters. Troops grow with
//! territory and are spent as the force committed to each expansion.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::{TerritoryRules, WorldConfig};
use crate::error::{GenerationError, IllegalAction, Result};
use crate::snapshot::store::{load_or_generate, CacheOutcome, SnapshotStore};
use crate::snapshot::WorldSnapshot;
use crate::territory::{ExpansionOutcome, Observer, SubscriptionId, TerritoryEngine};
use crate::terrain::BrightnessSampler;

/// Session parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub world: WorldConfig,
    pub rules: TerritoryRules,
    pub starting_troops: u32,
    pub starting_cash: u32,
    /// Troops gained per owned cell per second
    pub troop_growth_per_cell: f32,
    /// Cash gained per owned cell per second
    pub income_per_cell: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            rules: TerritoryRules::default(),
            starting_troops: 500,
            starting_cash: 0,
            troop_growth_per_cell: 0.5,
            income_per_cell: 1.0,
        }
    }
}

/// A running game on one world
#[derive(Debug)]
pub struct Session {
    engine: TerritoryEngine,
    config: SessionConfig,
    paused: bool,
    troops: f32,
    cash: f32,
}

impl SessionConfig {
    /// Check the rules and growth rates
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for unusable capture timing or a negative or
    /// non-finite rate.
    pub fn validate(&self) -> Result<()> {
        self.rules.validate()?;
        let rates = [self.troop_growth_per_cell, self.income_per_cell];
        if rates.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(GenerationError::InvalidConfiguration(format!(
                "growth rates must be finite and non-negative (got {:?})",
                rates
            )));
        }
        Ok(())
    }
}

impl Session {
    /// Start a session on an existing world
    ///
    /// # Errors
    ///
    /// See [`SessionConfig::validate`].
    pub fn new(world: WorldSnapshot, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: TerritoryEngine::new(world, config.rules)?,
            paused: false,
            troops: config.starting_troops as f32,
            cash: config.starting_cash as f32,
            config,
        })
    }

    /// Load the configured world from `store`, or generate it
    ///
    /// # Errors
    ///
    /// Configuration and generation errors; cache problems fall back to
    /// generation.
    pub fn start(
        config: SessionConfig,
        store: &dyn SnapshotStore,
        reference: Option<&dyn BrightnessSampler>,
    ) -> Result<(Self, CacheOutcome)> {
        config.validate()?;
        let (world, outcome) = load_or_generate(&config.world, store, reference)?;
        log::info!("session started on {} cells ({:?})", world.len(), outcome);
        Ok((Self::new(world, config)?, outcome))
    }

    #[inline]
    pub fn engine(&self) -> &TerritoryEngine {
        &self.engine
    }

    #[inline]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume; a paused session ignores ticks and actions
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            log::debug!("session {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
    }

    /// Whole troops available to commit
    #[inline]
    pub fn troops(&self) -> u32 {
        self.troops.max(0.0) as u32
    }

    #[inline]
    pub fn cash(&self) -> u32 {
        self.cash.max(0.0) as u32
    }

    pub fn subscribe(&mut self, observer: Observer) -> SubscriptionId {
        self.engine.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.engine.unsubscribe(id)
    }

    /// Found the capital on the cell nearest to `point`
    pub fn place_capital(&mut self, point: Vec3) -> std::result::Result<usize, IllegalAction> {
        if self.paused {
            return Err(IllegalAction::Paused);
        }
        self.engine.place_capital(point)
    }

    /// Send `troops` to conquer the cell nearest to `point`
    ///
    /// The troops are deducted only when the engine accepts the request.
    pub fn request_expansion(
        &mut self,
        point: Vec3,
        troops: u32,
    ) -> std::result::Result<ExpansionOutcome, IllegalAction> {
        if self.paused {
            return Err(IllegalAction::Paused);
        }
        let available = self.troops();
        if troops > available {
            return Err(IllegalAction::InsufficientTroops {
                requested: troops,
                available,
            });
        }

        let outcome = self.engine.request_expansion(point, troops as f32)?;
        self.troops -= troops as f32;
        Ok(outcome)
    }

    /// Advance the simulation; returns the cell captured this tick, if any
    pub fn tick(&mut self, dt: f32) -> Option<usize> {
        if self.paused || !dt.is_finite() || dt <= 0.0 {
            return None;
        }

        let territory = self.engine.territory_size() as f32;
        self.troops += territory * self.config.troop_growth_per_cell * dt;
        self.cash += territory * self.config.income_per_cell * dt;
        self.engine.tick(dt)
    }
}

/// Load a reference picture, falling back to procedural terrain on failure
///
/// Returns `None` (and logs a warning) when the file cannot be decoded.
#[cfg(feature = "image")]
pub fn load_reference(path: impl AsRef<std::path::Path>) -> Option<crate::terrain::BrightnessGrid> {
    let path = path.as_ref();
    match crate::terrain::BrightnessGrid::open(path) {
        Ok(grid) => {
            log::info!(
                "loaded reference image {} ({}x{})",
                path.display(),
                grid.width(),
                grid.height()
            );
            Some(grid)
        }
        Err(err) => {
            log::warn!(
                "reference image {} unavailable, using procedural terrain: {}",
                path.display(),
                err
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CapturePolicy, ConquestTiming, WorldConfigBuilder};
    use crate::snapshot::store::MemoryStore;

    fn session_config() -> SessionConfig {
        SessionConfig {
            world: WorldConfigBuilder::new().resolution(3).unwrap().build().unwrap(),
            rules: TerritoryRules::time_gated(ConquestTiming::default()).unwrap(),
            starting_troops: 300,
            ..Default::default()
        }
    }

    fn start() -> Session {
        let (session, _) = Session::start(session_config(), &MemoryStore::new(), None).unwrap();
        session
    }

    /// Center of a land cell with at least one land neighbor, and that neighbor
    fn land_pair(session: &Session) -> (Vec3, Vec3) {
        let world = session.engine().world();
        for cell in 0..world.len() {
            if world.is_water(cell) {
                continue;
            }
            if let Some(&n) = world.neighbors(cell).iter().find(|&&n| !world.is_water(n)) {
                return (world.centers()[cell], world.centers()[n]);
            }
        }
        panic!("world has no adjacent land cells");
    }

    #[test]
    fn test_troops_are_spent_on_acceptance() {
        let mut session = start();
        let (capital, target) = land_pair(&session);
        session.place_capital(capital).unwrap();

        assert_eq!(
            session.request_expansion(target, 400),
            Err(IllegalAction::InsufficientTroops {
                requested: 400,
                available: 300
            })
        );
        assert_eq!(session.troops(), 300);

        session.request_expansion(target, 200).unwrap();
        assert_eq!(session.troops(), 100);

        // Rejected by the engine: nothing is deducted
        assert!(session.request_expansion(target, 50).is_err());
        assert_eq!(session.troops(), 100);
    }

    #[test]
    fn test_pause_withholds_ticks_and_actions() {
        let mut session = start();
        let (capital, target) = land_pair(&session);
        session.place_capital(capital).unwrap();
        session.request_expansion(target, 200).unwrap();

        session.set_paused(true);
        assert_eq!(session.tick(5.0), None);
        assert_eq!(session.request_expansion(target, 1), Err(IllegalAction::Paused));
        assert_eq!(session.place_capital(capital), Err(IllegalAction::Paused));
        assert_eq!(session.engine().territory_size(), 1);

        session.set_paused(false);
        assert!(session.tick(1.5).is_some());
        assert_eq!(session.engine().territory_size(), 2);
    }

    #[test]
    fn test_troops_grow_with_territory() {
        let mut session = start();
        let (capital, _) = land_pair(&session);
        session.tick(10.0);
        assert_eq!(session.troops(), 300);

        session.place_capital(capital).unwrap();
        session.tick(10.0);
        assert_eq!(session.troops(), 305);
        assert_eq!(session.cash(), 10);
    }

    #[test]
    fn test_start_uses_cache() {
        let store = MemoryStore::new();
        let (_, first) = Session::start(session_config(), &store, None).unwrap();
        let (_, second) = Session::start(session_config(), &store, None).unwrap();
        assert!(matches!(first, CacheOutcome::Regenerated { .. }));
        assert_eq!(second, CacheOutcome::Hit);
    }

    #[test]
    fn test_rejects_unusable_config() {
        let bad_timing = SessionConfig {
            rules: TerritoryRules {
                capture: CapturePolicy::TimeGated(ConquestTiming {
                    max_bonus: 0.0,
                    ..Default::default()
                }),
                single_capital: true,
            },
            ..session_config()
        };
        let store = MemoryStore::new();
        assert!(matches!(
            Session::start(bad_timing, &store, None),
            Err(GenerationError::InvalidConfiguration(_))
        ));
        // Rejected before anything was generated or cached
        assert!(store.is_empty());

        let bad_rate = SessionConfig {
            income_per_cell: f32::NAN,
            ..session_config()
        };
        assert!(bad_rate.validate().is_err());
        assert!(session_config().validate().is_ok());
    }

    #[cfg(feature = "image")]
    #[test]
    fn test_missing_reference_falls_back() {
        assert!(load_reference("/definitely/not/a/real/image.png").is_none());
    }
}
