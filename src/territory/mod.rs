//! Territory conquest
//!
//! [`TerritoryEngine`] layers an ownership overlay on a [`WorldSnapshot`].
//! Territory starts from a capital and grows one adjacent cell at a time,
//! either instantly or through a timed claim advanced by [`TerritoryEngine::tick`].
//!
//! Each cell moves `Unclaimed -> (Claiming) -> Owned`; ownership is never lost.

mod city;
mod events;
mod projectile;

pub use city::{city_name, City, CITY_HEALTH};
pub use events::{Observer, SubscriptionId, TerritoryEvent};
pub use projectile::Projectile;

use glam::Vec3;

use crate::config::{CapturePolicy, TerritoryRules};
use crate::error::{IllegalAction, Result};
use crate::geo::{self, CellHit};
use crate::snapshot::WorldSnapshot;

use events::Observers;

/// Relative slack when comparing accumulated ticks with the required time
const CLAIM_TOLERANCE: f64 = 1e-6;

/// A time-gated capture in progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Claim {
    pub target: usize,
    pub committed_force: f32,
    /// Seconds ticked so far, accumulated in double precision
    pub elapsed: f64,
    /// Seconds needed to capture
    pub required: f32,
}

impl Claim {
    /// Fraction of the claim completed, in `[0, 1]`
    pub fn progress(&self) -> f32 {
        (self.elapsed / f64::from(self.required)).clamp(0.0, 1.0) as f32
    }

    /// Whether enough time has been ticked to capture the target
    pub fn is_complete(&self) -> bool {
        self.elapsed >= f64::from(self.required) * (1.0 - CLAIM_TOLERANCE)
    }
}

/// Result of an accepted expansion request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExpansionOutcome {
    /// The cell is owned now
    Captured { cell: usize },
    /// A claim was opened; the cell is owned after `required` seconds of ticks
    ClaimStarted { cell: usize, required: f32 },
}

/// Ownership overlay and conquest rules over a world
///
/// # Example
///
/// ```
/// use geodesic_conquest::*;
///
/// let config = WorldConfigBuilder::new().resolution(2).unwrap().build().unwrap();
/// let world = generate_world(&config, None).unwrap();
/// let mut engine = TerritoryEngine::new(world, TerritoryRules::instant()).unwrap();
///
/// let land = (0..engine.world().len()).find(|&i| !engine.world().is_water(i)).unwrap();
/// engine.place_capital_at(land).unwrap();
/// assert_eq!(engine.territory_size(), 1);
/// ```
#[derive(Debug)]
pub struct TerritoryEngine {
    world: WorldSnapshot,
    rules: TerritoryRules,
    owned: Vec<bool>,
    territory_size: usize,
    claim: Option<Claim>,
    cities: Vec<City>,
    projectiles: Vec<Projectile>,
    observers: Observers,
}

impl TerritoryEngine {
    /// Take ownership of a world with nothing owned yet
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` when the capture timing is not usable.
    pub fn new(world: WorldSnapshot, rules: TerritoryRules) -> Result<Self> {
        rules.validate()?;
        let owned = vec![false; world.len()];
        Ok(Self {
            world,
            rules,
            owned,
            territory_size: 0,
            claim: None,
            cities: Vec::new(),
            projectiles: Vec::new(),
            observers: Observers::default(),
        })
    }

    #[inline]
    pub fn world(&self) -> &WorldSnapshot {
        &self.world
    }

    #[inline]
    pub fn rules(&self) -> &TerritoryRules {
        &self.rules
    }

    /// Give the world back, dropping the overlay
    pub fn into_world(self) -> WorldSnapshot {
        self.world
    }

    // ---- point queries ----

    /// Cell nearest to a 3D point (squared distance, ties to the lowest index)
    #[inline]
    pub fn nearest_cell(&self, point: Vec3) -> usize {
        self.world.nearest_cell(point)
    }

    /// Whether the cell nearest to `point` is water
    pub fn is_sea(&self, point: Vec3) -> bool {
        self.world.is_water(self.nearest_cell(point))
    }

    /// Resolve an arbitrary point to a cell hit on the planet surface
    ///
    /// Always `Some` for a generated or loaded world.
    pub fn resolve_point(&self, point: Vec3) -> Option<CellHit> {
        CellHit::from_point(self.world.centers(), point, self.world.radius())
    }

    /// Resolve a pointing ray to the cell it hits first
    pub fn raycast(&self, origin: Vec3, direction: Vec3) -> Option<CellHit> {
        let point = geo::cast_ray_to_sphere(origin, direction, self.world.radius())?;
        self.resolve_point(point)
    }

    // ---- ownership state ----

    /// Number of owned cells; never decreases
    #[inline]
    pub fn territory_size(&self) -> usize {
        self.territory_size
    }

    #[inline]
    pub fn is_owned(&self, cell: usize) -> bool {
        self.owned.get(cell).copied().unwrap_or(false)
    }

    /// Ownership flags, parallel to the world's cells
    #[inline]
    pub fn owned(&self) -> &[bool] {
        &self.owned
    }

    #[inline]
    pub fn active_claim(&self) -> Option<&Claim> {
        self.claim.as_ref()
    }

    #[inline]
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    #[inline]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    fn has_owned_neighbor(&self, cell: usize) -> bool {
        self.world.neighbors(cell).iter().any(|&n| self.owned[n])
    }

    /// Unowned land cells bordering owned territory, sorted by index
    pub fn frontier(&self) -> Vec<usize> {
        (0..self.world.len())
            .filter(|&cell| {
                !self.owned[cell] && !self.world.is_water(cell) && self.has_owned_neighbor(cell)
            })
            .collect()
    }

    // ---- observers ----

    /// Register a callback for territory events
    pub fn subscribe(&mut self, observer: Observer) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    /// Remove a callback; false if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Number of registered observers
    #[inline]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // ---- actions ----

    /// Found a capital on the cell nearest to `point`
    pub fn place_capital(&mut self, point: Vec3) -> std::result::Result<usize, IllegalAction> {
        let cell = self.nearest_cell(point);
        self.place_capital_at(cell)
    }

    /// Found a capital on `cell`
    ///
    /// The capital is exempt from the adjacency rule.
    ///
    /// # Errors
    ///
    /// `WaterCell`, `CapitalAlreadyPlaced` when the rules allow one capital,
    /// `AlreadyOwned` when the cell already holds a city.
    pub fn place_capital_at(&mut self, cell: usize) -> std::result::Result<usize, IllegalAction> {
        if cell >= self.world.len() {
            return Err(IllegalAction::UnknownCell(cell));
        }
        if self.world.is_water(cell) {
            return Err(IllegalAction::WaterCell(cell));
        }
        if self.rules.single_capital && !self.cities.is_empty() {
            return Err(IllegalAction::CapitalAlreadyPlaced);
        }
        if self.cities.iter().any(|city| city.cell == cell) {
            return Err(IllegalAction::AlreadyOwned(cell));
        }

        let id = self.world.cell_ids()[cell];
        let city = City::found(cell, id);
        log::info!("capital {} founded on cell {} ({})", city.name, cell, id);

        let event = TerritoryEvent::CapitalPlaced {
            cell,
            name: city.name.clone(),
        };
        self.cities.push(city);
        self.observers.emit(&event);
        self.capture(cell);
        Ok(cell)
    }

    /// Request expansion onto the cell nearest to `point`
    pub fn request_expansion(
        &mut self,
        point: Vec3,
        force: f32,
    ) -> std::result::Result<ExpansionOutcome, IllegalAction> {
        let cell = self.nearest_cell(point);
        self.request_expansion_at(cell, force)
    }

    /// Request expansion onto `cell`, committing `force`
    ///
    /// While any cell is owned, the target must border owned territory. With
    /// time-gated capture only one claim may be in flight; a second request
    /// is rejected with `ClaimInProgress` until the first completes.
    ///
    /// A rejected request changes nothing. A force so small that the claim
    /// would never finish is rejected with `ForceTooSmall`.
    pub fn request_expansion_at(
        &mut self,
        cell: usize,
        force: f32,
    ) -> std::result::Result<ExpansionOutcome, IllegalAction> {
        if cell >= self.world.len() {
            return Err(IllegalAction::UnknownCell(cell));
        }
        if self.world.is_water(cell) {
            return Err(IllegalAction::WaterCell(cell));
        }
        if self.owned[cell] {
            return Err(IllegalAction::AlreadyOwned(cell));
        }
        // Also rejects NaN
        if !(force > 0.0) {
            return Err(IllegalAction::NonPositiveForce);
        }
        if self.territory_size > 0 && !self.has_owned_neighbor(cell) {
            return Err(IllegalAction::NotAdjacent(cell));
        }

        match self.rules.capture {
            CapturePolicy::Instant => {
                self.capture(cell);
                Ok(ExpansionOutcome::Captured { cell })
            }
            CapturePolicy::TimeGated(timing) => {
                if let Some(claim) = &self.claim {
                    return Err(IllegalAction::ClaimInProgress(claim.target));
                }

                let required = timing.required_time(force);
                if !required.is_finite() {
                    return Err(IllegalAction::ForceTooSmall(cell));
                }
                self.claim = Some(Claim {
                    target: cell,
                    committed_force: force,
                    elapsed: 0.0,
                    required,
                });
                self.launch_projectile(cell, required);

                log::debug!("claim on cell {} opened, {:.2}s required", cell, required);
                self.observers
                    .emit(&TerritoryEvent::ConquestStarted { cell, required });
                Ok(ExpansionOutcome::ClaimStarted { cell, required })
            }
        }
    }

    /// Advance time-based state by `dt` seconds
    ///
    /// Returns the cell whose claim completed during this tick, if any.
    /// Non-positive or non-finite `dt` is ignored.
    pub fn tick(&mut self, dt: f32) -> Option<usize> {
        if !dt.is_finite() || dt <= 0.0 {
            return None;
        }

        for projectile in &mut self.projectiles {
            projectile.advance(dt);
        }
        self.projectiles.retain(|p| !p.is_finished());

        let claim = self.claim.as_mut()?;
        claim.elapsed += f64::from(dt);
        if !claim.is_complete() {
            return None;
        }

        let Claim { target, elapsed, .. } = *claim;
        self.claim = None;
        self.capture(target);

        log::debug!("claim on cell {} completed after {:.2}s", target, elapsed);
        self.observers.emit(&TerritoryEvent::ConquestCompleted {
            cell: target,
            elapsed: elapsed as f32,
        });
        Some(target)
    }

    /// Mark `cell` owned, counting it once
    fn capture(&mut self, cell: usize) {
        if self.owned[cell] {
            return;
        }
        self.owned[cell] = true;
        self.territory_size += 1;
        self.observers.emit(&TerritoryEvent::CellCaptured {
            cell,
            territory_size: self.territory_size,
        });
    }

    /// Launch from the owned neighbor closest to `target`, if there is one
    fn launch_projectile(&mut self, target: usize, duration: f32) {
        let centers = self.world.centers();
        let end = centers[target];
        let source = self
            .world
            .neighbors(target)
            .iter()
            .copied()
            .filter(|&n| self.owned[n])
            .min_by(|&a, &b| {
                centers[a]
                    .distance_squared(end)
                    .total_cmp(&centers[b].distance_squared(end))
                    .then(a.cmp(&b))
            });

        if let Some(from) = source {
            self.projectiles
                .push(Projectile::new(from, target, centers[from], end, duration));
        }
    }
}
