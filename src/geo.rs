//! Geographic math on the planet sphere
//!
//! Conversions between latitude/longitude (degrees) and 3D positions, the
//! nearest-cell scan used for every point query, and the ray-vs-planet cast
//! that turns a pointing gesture into a [`CellHit`].
//!
//! Axis convention: +Y is the north pole, the prime meridian at the equator
//! maps to +X and longitude 90°E maps to -Z.

use glam::Vec3;
use parry3d::math::{Point, Vector};
use parry3d::query::{Ray, RayCast};
use parry3d::shape::Ball;

/// Convert latitude/longitude in degrees to a point on a sphere of `radius`
///
/// # Example
///
/// ```
/// use geodesic_conquest::geo::lat_lng_to_vector;
///
/// let north = lat_lng_to_vector(90.0, 0.0, 2.0);
/// assert!((north.y - 2.0).abs() < 1e-5);
/// ```
pub fn lat_lng_to_vector(lat: f32, lng: f32, radius: f32) -> Vec3 {
    let phi = (90.0 - lat).to_radians();
    let theta = (lng + 180.0).to_radians();
    Vec3::new(
        -radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Convert a 3D position (any length) back to latitude/longitude in degrees
///
/// Longitude is returned in `[-180, 180)`. At the poles the longitude is
/// arbitrary but stable.
pub fn vector_to_lat_lng(position: Vec3) -> (f32, f32) {
    let length = position.length();
    if length <= f32::EPSILON {
        return (0.0, 0.0);
    }
    let lat = (position.y / length).clamp(-1.0, 1.0).asin().to_degrees();
    let theta = position.z.atan2(-position.x).to_degrees();
    (lat, wrap_longitude(theta - 180.0))
}

/// Wrap a longitude in degrees into `[-180, 180)`
#[inline]
pub fn wrap_longitude(lng: f32) -> f32 {
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Great-circle angle between two positions, in radians
pub fn angular_distance(a: Vec3, b: Vec3) -> f32 {
    let denom = a.length() * b.length();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// Index of the center nearest to `point`
///
/// Squared Euclidean distance over every center, smallest wins, ties go to
/// the lowest index. Returns `None` only for an empty slice.
pub fn nearest_cell(centers: &[Vec3], point: Vec3) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, center) in centers.iter().enumerate() {
        let distance = center.distance_squared(point);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}

/// A resolved pointing gesture: which cell was hit, where, and the surface normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellHit {
    /// Index of the cell nearest to the hit point
    pub cell_index: usize,
    /// Point on the planet surface
    pub world_point: Vec3,
    /// Outward unit normal at `world_point`
    pub normal: Vec3,
}

impl CellHit {
    /// Build a hit from an arbitrary point by projecting it onto the sphere
    pub fn from_point(centers: &[Vec3], point: Vec3, radius: f32) -> Option<Self> {
        let normal = point.try_normalize().unwrap_or(Vec3::Y);
        let world_point = normal * radius;
        let cell_index = nearest_cell(centers, world_point)?;
        Some(Self {
            cell_index,
            world_point,
            normal,
        })
    }
}

/// Cast a ray against the planet sphere centered at the origin
///
/// Returns the first surface point along the ray, or `None` on a miss or a
/// zero-length direction. A ray starting inside the planet reports its origin.
pub fn cast_ray_to_sphere(origin: Vec3, direction: Vec3, radius: f32) -> Option<Vec3> {
    let direction = direction.try_normalize()?;
    let ball = Ball::new(radius);
    let ray = Ray::new(
        Point::new(origin.x, origin.y, origin.z),
        Vector::new(direction.x, direction.y, direction.z),
    );
    let time_of_impact = ball.cast_local_ray(&ray, f32::MAX, true)?;
    Some(origin + direction * time_of_impact)
}
