// Contract tests for the planar kernel adapter. The resolver leans on
// these guarantees, so they are pinned here against the geo backend.

use super::{default_kernel, PlanarKernel};
use crate::geometry::RegionRings;
use geo::MultiPolygon;

fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> RegionRings {
    RegionRings::single(vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]])
}

fn region(kernel: &super::GeoKernel, rings: &RegionRings) -> MultiPolygon<f64> {
    kernel.region_from_rings(rings).expect("valid rings")
}

#[test]
fn test_union_commutative_and_idempotent() {
    let kernel = default_kernel();
    let a = region(&kernel, &square(0.0, 0.0, 10.0, 10.0));
    let b = region(&kernel, &square(5.0, 0.0, 15.0, 10.0));

    let ab = kernel.union(&a, &b).unwrap();
    let ba = kernel.union(&b, &a).unwrap();
    assert!((kernel.area(&ab) - kernel.area(&ba)).abs() < 1e-9);
    assert!((kernel.area(&ab) - 150.0).abs() < 1e-9);

    let aa = kernel.union(&a, &a).unwrap();
    assert!((kernel.area(&aa) - kernel.area(&a)).abs() < 1e-9);
}

#[test]
fn test_difference_by_self_is_empty() {
    let kernel = default_kernel();
    let a = region(&kernel, &square(0.0, 0.0, 10.0, 10.0));
    let diff = kernel.difference(&a, &a).unwrap();
    assert!(kernel.is_empty(&diff));
}

#[test]
fn test_difference_of_disjoint_regions_is_unchanged() {
    let kernel = default_kernel();
    let a = region(&kernel, &square(0.0, 0.0, 10.0, 10.0));
    let b = region(&kernel, &square(20.0, 20.0, 30.0, 30.0));
    let diff = kernel.difference(&a, &b).unwrap();
    assert!((kernel.area(&diff) - kernel.area(&a)).abs() < 1e-9);
}

#[test]
fn test_partial_difference_removes_overlap() {
    let kernel = default_kernel();
    let a = region(&kernel, &square(0.0, 0.0, 10.0, 10.0));
    let b = region(&kernel, &square(5.0, 0.0, 15.0, 10.0));
    let diff = kernel.difference(&a, &b).unwrap();
    assert!((kernel.area(&diff) - 50.0).abs() < 1e-9);
}

#[test]
fn test_spatial_predicates() {
    let kernel = default_kernel();
    let big = region(&kernel, &square(0.0, 0.0, 10.0, 10.0));
    let inner = region(&kernel, &square(2.0, 2.0, 4.0, 4.0));
    let beside = region(&kernel, &square(10.0, 0.0, 20.0, 10.0));
    let far = region(&kernel, &square(50.0, 50.0, 60.0, 60.0));

    assert!(kernel.intersects(&big, &inner));
    assert!(kernel.contains_region(&big, &inner));
    assert!(!kernel.contains_region(&inner, &big));

    // Shares an edge only: touching, intersecting, but no interior overlap.
    assert!(kernel.touches(&big, &beside));
    assert!(kernel.intersects(&big, &beside));

    assert!(!kernel.intersects(&big, &far));
    assert!(!kernel.touches(&big, &far));

    assert!(kernel.contains_point(&big, [5.0, 5.0]));
    assert!(!kernel.contains_point(&big, [15.0, 5.0]));
}

#[test]
fn test_buffer_covers_the_stroked_path() {
    let kernel = default_kernel();
    let path = [[0.0, 0.0], [10.0, 0.0]];
    let buffered = kernel.buffer(&path, 2.0).unwrap();

    // Rectangle 10 x 4 plus two sampled half-discs of radius 2.
    let expected = 10.0 * 4.0 + std::f64::consts::PI * 4.0;
    let area = kernel.area(&buffered);
    assert!(
        (area - expected).abs() / expected < 0.05,
        "buffered area {area} too far from {expected}"
    );

    assert!(kernel.contains_point(&buffered, [5.0, 0.0]));
    assert!(kernel.contains_point(&buffered, [5.0, 1.5]));
    assert!(!kernel.contains_point(&buffered, [5.0, 3.0]));
}

#[test]
fn test_buffer_single_point_becomes_disc() {
    let kernel = default_kernel();
    let buffered = kernel.buffer(&[[3.0, 3.0]], 1.0).unwrap();
    assert!(kernel.contains_point(&buffered, [3.0, 3.0]));
    let area = kernel.area(&buffered);
    assert!((area - std::f64::consts::PI).abs() / std::f64::consts::PI < 0.05);
}

#[test]
fn test_buffer_rejects_degenerate_input() {
    let kernel = default_kernel();
    assert!(kernel.buffer(&[], 1.0).is_err());
    assert!(kernel.buffer(&[[0.0, 0.0], [1.0, 0.0]], 0.0).is_err());
    assert!(kernel.buffer(&[[0.0, 0.0], [1.0, 0.0]], -2.0).is_err());
    assert!(kernel.buffer(&[[0.0, 0.0], [f64::NAN, 0.0]], 1.0).is_err());
}

#[test]
fn test_ring_roundtrip_preserves_holes() {
    let kernel = default_kernel();
    let outer = vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
    let hole = vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0]];
    let rings = RegionRings(vec![vec![outer, hole]]);

    let native = region(&kernel, &rings);
    assert!((kernel.area(&native) - 96.0).abs() < 1e-9);

    let back = kernel.region_to_rings(&native);
    assert_eq!(back.polygon_count(), 1);
    assert_eq!(back.0[0].len(), 2);
    assert!((back.ring_area() - 96.0).abs() < 1e-9);
}

#[test]
fn test_degenerate_rings_produce_empty_region() {
    let kernel = default_kernel();
    let rings = RegionRings::single(vec![[0.0, 0.0], [1.0, 1.0]]);
    let native = region(&kernel, &rings);
    assert!(kernel.is_empty(&native));
}
