use super::{ApproxEq, Point2};
use crate::geometry::utils_2d;
use serde::{Deserialize, Serialize};

/// A planar area as a list of polygons. Each polygon is a list of rings;
/// the first ring is the outer boundary and any following rings are holes.
/// Rings are ordered `[x, y]` coordinates without a duplicated closing
/// vertex. This is the kernel-agnostic representation: records store it,
/// the export format serializes it, and the kernel converts it to and from
/// its native region type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionRings(pub Vec<Vec<Vec<[f64; 2]>>>);

impl RegionRings {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single polygon with one outer ring and no holes.
    pub fn single(ring: Vec<[f64; 2]>) -> Self {
        Self(vec![vec![ring]])
    }

    /// True if no polygon carries a usable outer ring.
    pub fn is_empty(&self) -> bool {
        self.0
            .iter()
            .all(|rings| rings.first().map_or(true, |outer| outer.len() < 3))
    }

    pub fn polygon_count(&self) -> usize {
        self.0.len()
    }

    /// All coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.0
            .iter()
            .flatten()
            .flatten()
            .all(|p| p[0].is_finite() && p[1].is_finite())
    }

    /// Total enclosed area (outer rings minus holes), by the shoelace sum.
    /// Intended for sanity checks; authoritative area queries go through
    /// the kernel.
    pub fn ring_area(&self) -> f64 {
        let mut total = 0.0;
        for rings in &self.0 {
            for (i, ring) in rings.iter().enumerate() {
                let a = utils_2d::polygon_area(ring).abs();
                if i == 0 {
                    total += a;
                } else {
                    total -= a;
                }
            }
        }
        total.max(0.0)
    }
}

/// Axis-aligned 2D bounding box.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Aabb2 {
    pub min: Point2,
    pub max: Point2,
}

impl Aabb2 {
    pub fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point2::new(f64::INFINITY, f64::INFINITY),
            max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points<I: IntoIterator<Item = [f64; 2]>>(points: I) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.extend(&Point2::new(p[0], p[1]));
        }
        aabb
    }

    pub fn extend(&mut self, p: &Point2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn merge(&self, other: &Aabb2) -> Aabb2 {
        let mut res = *self;
        res.min.x = res.min.x.min(other.min.x);
        res.min.y = res.min.y.min(other.min.y);
        res.max.x = res.max.x.max(other.max.x);
        res.max.y = res.max.y.max(other.max.y);
        res
    }

    pub fn contains(&self, p: &Point2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}
