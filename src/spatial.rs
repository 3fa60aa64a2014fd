//! Spatial indexing for fast point-to-cell lookups during generation
//!
//! The generator maps hundreds of thousands of lattice samples to grid cells,
//! so it uses a KD-tree instead of the linear nearest-cell scan the territory
//! engine uses for single clicks.

use glam::Vec3;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

/// Wrapper around KD-tree for spatial queries
///
/// # Performance
///
/// - Construction: O(n log n)
/// - Query: O(log n)
/// - Memory: ~24 bytes per point
#[derive(Clone)]
pub struct SpatialIndex {
    tree: Option<ImmutableKdTree<f32, usize, 3, 32>>,
    len: usize,
}

impl SpatialIndex {
    /// Build spatial index from point positions
    ///
    /// # Example
    ///
    /// ```
    /// use geodesic_conquest::SpatialIndex;
    /// use glam::Vec3;
    ///
    /// let points = vec![
    ///     Vec3::new(1.0, 0.0, 0.0),
    ///     Vec3::new(0.0, 1.0, 0.0),
    ///     Vec3::new(0.0, 0.0, 1.0),
    /// ];
    ///
    /// let index = SpatialIndex::new(&points);
    /// assert_eq!(index.find_nearest(Vec3::new(1.0, 0.1, 0.0)), Some(0));
    /// ```
    pub fn new(points: &[Vec3]) -> Self {
        let coords: Vec<[f32; 3]> = points.iter().map(|p| [p.x, p.y, p.z]).collect();

        let tree = if coords.is_empty() {
            None
        } else {
            Some(ImmutableKdTree::new_from_slice(&coords))
        };

        Self {
            tree,
            len: points.len(),
        }
    }

    /// Number of indexed points
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no points
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the point nearest to `position`, or `None` for an empty index
    pub fn find_nearest(&self, position: Vec3) -> Option<usize> {
        let tree = self.tree.as_ref()?;
        let query = [position.x, position.y, position.z];
        let result = tree.nearest_one::<SquaredEuclidean>(&query);
        Some(result.item as usize)
    }
}
