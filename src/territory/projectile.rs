//! Projectile animations for in-flight claims

use glam::Vec3;

/// Visual effect travelling between two cell centers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    /// Cell the projectile was launched from
    pub from: usize,
    /// Cell being conquered
    pub to: usize,
    pub start: Vec3,
    pub end: Vec3,
    pub elapsed: f32,
    /// Seconds until arrival
    pub duration: f32,
}

impl Projectile {
    pub fn new(from: usize, to: usize, start: Vec3, end: Vec3, duration: f32) -> Self {
        Self {
            from,
            to,
            start,
            end,
            elapsed: 0.0,
            duration,
        }
    }

    /// Fraction of the flight completed, in `[0, 1]`
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    /// Current position, linearly interpolated between the two centers
    pub fn position(&self) -> Vec3 {
        self.start.lerp(self.end, self.progress())
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub(crate) fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projectile_interpolates() {
        let mut p = Projectile::new(0, 1, Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), 2.0);
        assert_eq!(p.position(), Vec3::ZERO);

        p.advance(1.0);
        assert!((p.position() - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
        assert!(!p.is_finished());

        p.advance(1.5);
        assert!(p.is_finished());
        assert_eq!(p.position(), Vec3::new(4.0, 0.0, 0.0));
    }
}
