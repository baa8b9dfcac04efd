//! geo-based implementation of the planar kernel.
//!
//! All boolean geometry and spatial predicates are delegated to the `geo`
//! crate. Conversions between the engine's nested-ring representation and
//! geo's types happen here and nowhere else.

use super::{KernelOpError, KernelResult, PlanarKernel};
use crate::geometry::{utils_2d, RegionRings};
use geo::{
    Area, BooleanOps, Contains, ConvexHull, Coord, Intersects, LineString, MultiPoint,
    MultiPolygon, Point, Polygon, Relate,
};
use std::f64::consts::TAU;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Number of samples per end-cap circle when buffering a stroke segment.
const ARC_SEGMENTS: usize = 16;

/// Regions whose total area falls below this are treated as empty.
const EMPTY_AREA_EPS: f64 = 1e-9;

/// geo-backed planar kernel.
pub struct GeoKernel;

impl GeoKernel {
    pub fn new() -> Self {
        Self
    }

    /// Run a boolean operation, catching library panics on pathological
    /// input and reporting them as recoverable kernel failures.
    fn guarded<F>(&self, op: &'static str, f: F) -> KernelResult<MultiPolygon<f64>>
    where
        F: FnOnce() -> MultiPolygon<f64>,
    {
        catch_unwind(AssertUnwindSafe(f))
            .map_err(|_| KernelOpError::OperationFailed(format!("{op} failed in polygon library")))
    }
}

impl Default for GeoKernel {
    fn default() -> Self {
        Self::new()
    }
}

/// Capsule around one stroke segment: the convex hull of the two sampled
/// end-cap circles.
fn segment_capsule(a: [f64; 2], b: [f64; 2], radius: f64) -> Polygon<f64> {
    let mut points: Vec<Point<f64>> = Vec::with_capacity(ARC_SEGMENTS * 2);
    for center in [a, b] {
        for i in 0..ARC_SEGMENTS {
            let theta = TAU * i as f64 / ARC_SEGMENTS as f64;
            points.push(Point::new(
                center[0] + radius * theta.cos(),
                center[1] + radius * theta.sin(),
            ));
        }
    }
    MultiPoint::from(points).convex_hull()
}

fn ring_to_line_string(ring: &[[f64; 2]]) -> LineString<f64> {
    LineString::from(
        ring.iter()
            .map(|p| Coord { x: p[0], y: p[1] })
            .collect::<Vec<_>>(),
    )
}

fn line_string_to_ring(ls: &LineString<f64>) -> Vec<[f64; 2]> {
    let mut ring: Vec<[f64; 2]> = ls.coords().map(|c| [c.x, c.y]).collect();
    utils_2d::normalize_ring(&mut ring);
    ring
}

impl PlanarKernel for GeoKernel {
    type Region = MultiPolygon<f64>;

    fn buffer(&self, path: &[[f64; 2]], distance: f64) -> KernelResult<Self::Region> {
        if !distance.is_finite() || distance <= 0.0 {
            return Err(KernelOpError::InvalidGeometry(format!(
                "buffer distance must be positive, got {distance}"
            )));
        }
        if path.is_empty() {
            return Err(KernelOpError::InvalidGeometry("empty stroke path".to_string()));
        }
        if !utils_2d::path_is_finite(path) {
            return Err(KernelOpError::InvalidGeometry(
                "stroke path contains non-finite coordinates".to_string(),
            ));
        }

        // Collapse consecutive duplicate samples; freehand input is noisy.
        let mut points: Vec<[f64; 2]> = Vec::with_capacity(path.len());
        for &p in path {
            if points.last().map_or(true, |&q| !utils_2d::points_equal(p, q)) {
                points.push(p);
            }
        }

        if points.len() == 1 {
            // Degenerate stroke: a single dab becomes a disc.
            let disc = segment_capsule(points[0], points[0], distance);
            return Ok(MultiPolygon::new(vec![disc]));
        }

        let mut acc = MultiPolygon::new(vec![segment_capsule(points[0], points[1], distance)]);
        for w in points.windows(2).skip(1) {
            let capsule = MultiPolygon::new(vec![segment_capsule(w[0], w[1], distance)]);
            acc = self.guarded("buffer union", || acc.union(&capsule))?;
        }
        Ok(acc)
    }

    fn region_from_rings(&self, rings: &RegionRings) -> KernelResult<Self::Region> {
        if !rings.is_finite() {
            return Err(KernelOpError::InvalidGeometry(
                "region contains non-finite coordinates".to_string(),
            ));
        }
        let mut polygons = Vec::with_capacity(rings.0.len());
        for polygon_rings in &rings.0 {
            let Some(outer) = polygon_rings.first() else {
                continue;
            };
            if outer.len() < 3 {
                continue;
            }
            let holes = polygon_rings[1..]
                .iter()
                .filter(|hole| hole.len() >= 3)
                .map(|hole| ring_to_line_string(hole))
                .collect();
            polygons.push(Polygon::new(ring_to_line_string(outer), holes));
        }
        Ok(MultiPolygon::new(polygons))
    }

    fn region_to_rings(&self, region: &Self::Region) -> RegionRings {
        let mut out = Vec::with_capacity(region.0.len());
        for polygon in region {
            let outer = line_string_to_ring(polygon.exterior());
            if outer.len() < 3 {
                continue;
            }
            let mut rings = vec![outer];
            for hole in polygon.interiors() {
                let ring = line_string_to_ring(hole);
                if ring.len() >= 3 {
                    rings.push(ring);
                }
            }
            out.push(rings);
        }
        RegionRings(out)
    }

    fn union(&self, a: &Self::Region, b: &Self::Region) -> KernelResult<Self::Region> {
        self.guarded("union", || a.union(b))
    }

    fn difference(&self, a: &Self::Region, b: &Self::Region) -> KernelResult<Self::Region> {
        self.guarded("difference", || a.difference(b))
    }

    fn intersects(&self, a: &Self::Region, b: &Self::Region) -> bool {
        a.intersects(b)
    }

    fn contains_region(&self, a: &Self::Region, b: &Self::Region) -> bool {
        a.contains(b)
    }

    fn contains_point(&self, region: &Self::Region, point: [f64; 2]) -> bool {
        region.contains(&Point::new(point[0], point[1]))
    }

    fn touches(&self, a: &Self::Region, b: &Self::Region) -> bool {
        a.relate(b).is_touches()
    }

    fn is_empty(&self, region: &Self::Region) -> bool {
        region.0.is_empty() || region.unsigned_area() < EMPTY_AREA_EPS
    }

    fn area(&self, region: &Self::Region) -> f64 {
        region.unsigned_area()
    }
}
