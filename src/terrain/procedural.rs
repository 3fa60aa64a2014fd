//! Procedural elevation and dryness
//!
//! Elevation is a weighted sum of a continental-scale sinusoid, a
//! mountain-range sinusoid and hashed value noise for local detail. Every term
//! is a pure function of `(lat, lng)` and the seed, so classifying the same
//! coordinate twice always gives the same answer.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const CONTINENT_WEIGHT: f32 = 0.28;
const RIDGE_WEIGHT: f32 = 0.12;
const DETAIL_WEIGHT: f32 = 0.08;

/// Lattice size of the local detail noise, degrees
const DETAIL_CELL: f32 = 6.0;
/// Lattice size of the dryness noise, degrees
const DRYNESS_CELL: f32 = 10.0;

/// Seeded procedural terrain function
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProceduralTerrain {
    seed: u32,
    /// Phase offsets for the sinusoidal terms, radians
    phases: [f32; 4],
}

impl ProceduralTerrain {
    /// Create the terrain function for `seed`
    pub fn new(seed: u32) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
        let mut phases = [0.0; 4];
        for phase in &mut phases {
            *phase = rng.gen_range(0.0..std::f32::consts::TAU);
        }
        Self { seed, phases }
    }

    #[inline]
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Elevation in `[0, 1]` at a coordinate in degrees
    pub fn elevation(&self, lat: f32, lng: f32) -> f32 {
        let lat_r = lat.to_radians();
        let lng_r = lng.to_radians();
        let [p0, p1, p2, p3] = self.phases;

        let continental = (lng_r * 2.0 + p0).sin() * (lat_r * 1.5 + p1).cos();
        let ridge = (lng_r * 7.0 + lat_r * 5.0 + p2).sin() * (lat_r * 6.0 - lng_r * 3.0 + p3).sin();
        let detail = value_noise(lat, lng, DETAIL_CELL, self.seed) * 2.0 - 1.0;

        (0.5 + CONTINENT_WEIGHT * continental + RIDGE_WEIGHT * ridge + DETAIL_WEIGHT * detail)
            .clamp(0.0, 1.0)
    }

    /// Dryness in `[0, 1)` at a coordinate in degrees
    pub fn dryness(&self, lat: f32, lng: f32) -> f32 {
        value_noise(lat, lng, DRYNESS_CELL, self.seed ^ 0x9e37_79b9)
    }
}

/// Integer lattice hash mapped to `[0, 1)`
#[inline]
fn hash01(x: i32, y: i32, seed: u32) -> f32 {
    let mut h = (x as u32).wrapping_mul(0x8da6_b343)
        ^ (y as u32).wrapping_mul(0xd816_3841)
        ^ seed.wrapping_mul(0xcb1a_b31f);
    h ^= h >> 13;
    h = h.wrapping_mul(0x5bd1_e995);
    h ^= h >> 15;
    (h & 0x00ff_ffff) as f32 / 16_777_216.0
}

#[inline]
fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Smoothed value noise over a lat/lng lattice of `cell` degrees
///
/// Columns wrap at the antimeridian so the field is continuous there.
fn value_noise(lat: f32, lng: f32, cell: f32, seed: u32) -> f32 {
    let columns = (360.0 / cell).round() as i32;
    let gx = (lng + 180.0) / cell;
    let gy = (lat + 90.0) / cell;

    let x0 = gx.floor();
    let y0 = gy.floor();
    let fx = smoothstep(gx - x0);
    let fy = smoothstep(gy - y0);

    let x0 = (x0 as i32).rem_euclid(columns);
    let x1 = (x0 + 1).rem_euclid(columns);
    let y0 = y0 as i32;
    let y1 = y0 + 1;

    let top = hash01(x0, y0, seed) + (hash01(x1, y0, seed) - hash01(x0, y0, seed)) * fx;
    let bottom = hash01(x0, y1, seed) + (hash01(x1, y1, seed) - hash01(x0, y1, seed)) * fx;
    top + (bottom - top) * fy
}
