//! Kernel abstraction layer for planar region operations.
//!
//! This module provides a trait-based abstraction over the underlying 2D
//! polygon library, allowing for swapping implementations without changing
//! the rest of the engine. The resolver and query layers only ever talk to
//! this trait; they never touch the library's types directly.

pub mod geo_kernel;

#[cfg(test)]
mod tests_boolean;

pub use geo_kernel::GeoKernel;

use crate::geometry::RegionRings;
use thiserror::Error;

/// Errors that can occur during kernel operations.
#[derive(Debug, Error, Clone)]
pub enum KernelOpError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for kernel operations.
pub type KernelResult<T> = Result<T, KernelOpError>;

/// Abstract interface over a planar polygon library.
///
/// Contract notes:
/// - `difference(a, a)` yields an empty region.
/// - `union` is commutative and idempotent up to geometric equality.
/// - Degenerate inputs produce empty regions rather than errors wherever
///   the library allows it; hard library failures surface as
///   `KernelOpError::OperationFailed` and never panic through this trait.
pub trait PlanarKernel: Send + Sync {
    /// The library's native region representation (possibly multi-polygon,
    /// possibly with holes).
    type Region: Clone + Send + Sync;

    /// Thicken an ordered polyline into an area by offsetting its boundary
    /// by `distance` on every side.
    fn buffer(&self, path: &[[f64; 2]], distance: f64) -> KernelResult<Self::Region>;

    /// Build a native region from nested coordinate rings.
    fn region_from_rings(&self, rings: &RegionRings) -> KernelResult<Self::Region>;

    /// Convert a native region back into nested coordinate rings.
    fn region_to_rings(&self, region: &Self::Region) -> RegionRings;

    /// A ∪ B.
    fn union(&self, a: &Self::Region, b: &Self::Region) -> KernelResult<Self::Region>;

    /// A \ B.
    fn difference(&self, a: &Self::Region, b: &Self::Region) -> KernelResult<Self::Region>;

    /// Any point in common, boundaries included.
    fn intersects(&self, a: &Self::Region, b: &Self::Region) -> bool;

    /// B lies entirely within A.
    fn contains_region(&self, a: &Self::Region, b: &Self::Region) -> bool;

    /// The point lies in the interior of the region.
    fn contains_point(&self, region: &Self::Region, point: [f64; 2]) -> bool;

    /// Boundaries meet but interiors are disjoint.
    fn touches(&self, a: &Self::Region, b: &Self::Region) -> bool;

    /// The region encloses no area.
    fn is_empty(&self, region: &Self::Region) -> bool;

    /// Total enclosed area.
    fn area(&self, region: &Self::Region) -> f64;
}

/// Get the default kernel implementation.
pub fn default_kernel() -> GeoKernel {
    GeoKernel::new()
}
