//! Reference image sampling
//!
//! Image coordinates follow the equirectangular convention: `u` runs west to
//! east starting at the antimeridian, `v` runs north to south.

use std::hash::Hasher;

/// Source of elevation brightness in `[0, 1]` at image coordinates
pub trait BrightnessSampler: Send + Sync {
    /// Brightness at normalized coordinates `u, v` in `[0, 1)`
    fn sample_brightness(&self, u: f32, v: f32) -> f32;

    /// Stable digest of the sampled content
    ///
    /// Worlds are cached per fingerprint. Samplers returning `None` are never
    /// served from a cache.
    fn fingerprint(&self) -> Option<u64> {
        None
    }
}

/// Deterministic FNV-1a, stable across runs and platforms
struct FnvHasher {
    state: u64,
}

impl FnvHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= byte as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

/// Map a coordinate in degrees to image `(u, v)`
///
/// ```
/// use geodesic_conquest::image_uv;
///
/// assert_eq!(image_uv(0.0, 0.0), (0.5, 0.5));
/// assert_eq!(image_uv(90.0, -180.0), (0.0, 0.0));
/// ```
pub fn image_uv(lat: f32, lng: f32) -> (f32, f32) {
    let u = (lng / 360.0 + 0.5).rem_euclid(1.0);
    let v = 0.5 - lat / 180.0;
    (u, v)
}

/// Grayscale pixel grid with bilinear sampling
///
/// Pixels are stored row-major, top row first. Sampling wraps horizontally and
/// clamps vertically.
#[derive(Debug, Clone, PartialEq)]
pub struct BrightnessGrid {
    width: usize,
    height: usize,
    pixels: Vec<f32>,
}

impl BrightnessGrid {
    /// Wrap a pixel buffer; `None` if it is empty or not `width * height` long
    pub fn new(width: usize, height: usize, pixels: Vec<f32>) -> Option<Self> {
        if width == 0 || height == 0 || pixels.len() != width.checked_mul(height)? {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel at column `x`, row `y`
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    #[inline]
    fn wrapped(&self, x: i64, y: i64) -> f32 {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.pixels[y * self.width + x]
    }

    /// Decode a grayscale grid from an image
    #[cfg(feature = "image")]
    pub fn from_image(image: &image::DynamicImage) -> Option<Self> {
        let luma = image.to_luma32f();
        let (width, height) = luma.dimensions();
        Self::new(width as usize, height as usize, luma.into_raw())
    }

    /// Load a reference picture from disk
    ///
    /// # Errors
    ///
    /// Returns the decoder error when the file is missing or unreadable, and
    /// a dimension error for an empty image.
    #[cfg(feature = "image")]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, image::ImageError> {
        let decoded = image::open(path)?;
        Self::from_image(&decoded).ok_or_else(|| {
            image::ImageError::Parameter(image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ))
        })
    }
}

impl BrightnessSampler for BrightnessGrid {
    fn sample_brightness(&self, u: f32, v: f32) -> f32 {
        // Pixel centers sit at half-integer coordinates
        let px = u * self.width as f32 - 0.5;
        let py = v * self.height as f32 - 0.5;

        let x0 = px.floor();
        let y0 = py.floor();
        let tx = px - x0;
        let ty = py - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.wrapped(x0, y0) * (1.0 - tx) + self.wrapped(x0 + 1, y0) * tx;
        let bottom = self.wrapped(x0, y0 + 1) * (1.0 - tx) + self.wrapped(x0 + 1, y0 + 1) * tx;
        top * (1.0 - ty) + bottom * ty
    }

    fn fingerprint(&self) -> Option<u64> {
        let mut hasher = FnvHasher::new();
        hasher.write(&(self.width as u64).to_le_bytes());
        hasher.write(&(self.height as u64).to_le_bytes());
        for pixel in &self.pixels {
            hasher.write(&pixel.to_bits().to_le_bytes());
        }
        Some(hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_dimensions() {
        assert!(BrightnessGrid::new(0, 2, vec![]).is_none());
        assert!(BrightnessGrid::new(2, 2, vec![0.0; 3]).is_none());
        assert!(BrightnessGrid::new(2, 2, vec![0.0; 4]).is_some());
    }

    #[test]
    fn test_bilinear_midpoint() {
        let grid = BrightnessGrid::new(2, 1, vec![0.0, 1.0]).unwrap();
        // Halfway between the two pixel centers
        let value = grid.sample_brightness(0.5, 0.5);
        assert!((value - 0.5).abs() < 1e-6);
        // On a pixel center
        assert!((grid.sample_brightness(0.25, 0.5) - 0.0).abs() < 1e-6);
        assert!((grid.sample_brightness(0.75, 0.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_wraps_across_antimeridian() {
        let grid = BrightnessGrid::new(4, 1, vec![1.0, 0.0, 0.0, 0.0]).unwrap();
        // u = 0 is halfway between the last and first pixel centers
        let value = grid.sample_brightness(0.0, 0.5);
        assert!((value - 0.5).abs() < 1e-6);
        let near_end = grid.sample_brightness(0.999, 0.5);
        assert!((near_end - value).abs() < 0.01);
    }

    #[test]
    fn test_clamps_vertically() {
        let grid = BrightnessGrid::new(1, 2, vec![0.2, 0.8]).unwrap();
        assert!((grid.sample_brightness(0.5, 0.0) - 0.2).abs() < 1e-6);
        assert!((grid.sample_brightness(0.5, 1.0) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_image_uv_wraps() {
        let (u, _) = image_uv(0.0, 180.0);
        assert!(u.abs() < 1e-6);
        let (_, v) = image_uv(-90.0, 0.0);
        assert!((v - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let grid = BrightnessGrid::new(2, 2, vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let same = BrightnessGrid::new(2, 2, vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let changed = BrightnessGrid::new(2, 2, vec![0.1, 0.2, 0.3, 0.5]).unwrap();
        let reshaped = BrightnessGrid::new(4, 1, vec![0.1, 0.2, 0.3, 0.4]).unwrap();

        assert!(grid.fingerprint().is_some());
        assert_eq!(grid.fingerprint(), same.fingerprint());
        assert_ne!(grid.fingerprint(), changed.fingerprint());
        assert_ne!(grid.fingerprint(), reshaped.fingerprint());
    }

    #[test]
    fn test_fnv_reference_value() {
        let mut hasher = FnvHasher::new();
        hasher.write(b"a");
        assert_eq!(hasher.finish(), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn test_pixel_access() {
        let grid = BrightnessGrid::new(2, 2, vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(grid.pixel(1, 1), Some(0.4));
        assert_eq!(grid.pixel(2, 0), None);
    }
}
