use super::{hit_test, lasso_select, records_in_selected_area, SelectionState};
use crate::annotation::{AnnotationLog, AnnotationShape, InsertionMode};
use crate::geometry::RegionRings;
use crate::kernel::default_kernel;
use crate::resolver::resolve;

fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> RegionRings {
    RegionRings::single(vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]])
}

fn stroke(log: &mut AnnotationLog, label: &str, region: RegionRings) -> crate::annotation::AnnotationId {
    log.append(
        label.to_string(),
        AnnotationShape::Stroke {
            region,
            mode: InsertionMode::Add,
            stroke_width: 4.0,
        },
    )
}

#[test]
fn test_selection_basic() {
    let mut log = AnnotationLog::new();
    let id1 = stroke(&mut log, "a", square(0.0, 0.0, 1.0, 1.0));
    let id2 = stroke(&mut log, "b", square(2.0, 0.0, 3.0, 1.0));

    let mut state = SelectionState::new();
    state.select(id1, false);
    assert!(state.selected.contains(&id1));
    assert_eq!(state.len(), 1);

    // Replace
    state.select(id2, false);
    assert!(state.selected.contains(&id2));
    assert!(!state.selected.contains(&id1));
}

#[test]
fn test_selection_multi() {
    let mut log = AnnotationLog::new();
    let id1 = stroke(&mut log, "a", square(0.0, 0.0, 1.0, 1.0));
    let id2 = stroke(&mut log, "b", square(2.0, 0.0, 3.0, 1.0));

    let mut state = SelectionState::new();
    state.select(id1, false);
    state.select(id2, true); // Add

    assert!(state.selected.contains(&id1));
    assert!(state.selected.contains(&id2));
    assert_eq!(state.len(), 2);
}

#[test]
fn test_selection_validate_drops_stale_ids() {
    let mut log = AnnotationLog::new();
    let id1 = stroke(&mut log, "a", square(0.0, 0.0, 1.0, 1.0));
    let id2 = stroke(&mut log, "b", square(2.0, 0.0, 3.0, 1.0));

    let mut state = SelectionState::new();
    state.select(id1, false);
    state.select(id2, true);

    log.remove(&[id1]);
    assert_eq!(state.validate(&log), 1);
    assert!(!state.selected.contains(&id1));
    assert!(state.selected.contains(&id2));
}

#[test]
fn test_hit_test_prefers_topmost_marker() {
    let kernel = default_kernel();
    let mut log = AnnotationLog::new();
    let lower = log.append(
        "a".to_string(),
        AnnotationShape::Box {
            corners: [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
        },
    );
    let upper = log.append(
        "b".to_string(),
        AnnotationShape::Box {
            corners: [[5.0, 5.0], [15.0, 5.0], [15.0, 15.0], [5.0, 15.0]],
        },
    );
    let res = resolve(&kernel, &log);

    // Overlap region: the most recently drawn box wins.
    let hit = hit_test(&kernel, &log, &res, [7.0, 7.0], 0.0).unwrap();
    assert_eq!(hit.ids, vec![upper]);
    assert_eq!(hit.label, None);

    let hit = hit_test(&kernel, &log, &res, [2.0, 2.0], 0.0).unwrap();
    assert_eq!(hit.ids, vec![lower]);
}

#[test]
fn test_hit_test_point_marker_uses_tolerance() {
    let kernel = default_kernel();
    let mut log = AnnotationLog::new();
    let id = log.append("p".to_string(), AnnotationShape::Point { pos: [5.0, 5.0] });
    let res = resolve(&kernel, &log);

    assert!(hit_test(&kernel, &log, &res, [5.4, 5.0], 0.5).is_some());
    assert!(hit_test(&kernel, &log, &res, [6.0, 5.0], 0.5).is_none());

    let hit = hit_test(&kernel, &log, &res, [5.0, 5.0], 0.5).unwrap();
    assert_eq!(hit.ids, vec![id]);
}

#[test]
fn test_hit_on_merged_region_selects_all_contributors() {
    let kernel = default_kernel();
    let mut log = AnnotationLog::new();
    let s1 = stroke(&mut log, "road", square(0.0, 0.0, 10.0, 10.0));
    let s2 = stroke(&mut log, "road", square(8.0, 0.0, 18.0, 10.0));
    let other = stroke(&mut log, "river", square(30.0, 0.0, 40.0, 10.0));
    let res = resolve(&kernel, &log);

    let hit = hit_test(&kernel, &log, &res, [9.0, 5.0], 0.0).unwrap();
    assert_eq!(hit.label.as_deref(), Some("road"));
    assert!(hit.ids.contains(&s1));
    assert!(hit.ids.contains(&s2));
    assert!(!hit.ids.contains(&other));
}

#[test]
fn test_hit_test_misses_empty_space() {
    let kernel = default_kernel();
    let mut log = AnnotationLog::new();
    stroke(&mut log, "a", square(0.0, 0.0, 1.0, 1.0));
    let res = resolve(&kernel, &log);

    assert!(hit_test(&kernel, &log, &res, [50.0, 50.0], 1.0).is_none());
}

#[test]
fn test_lasso_selects_enclosed_and_touching_records() {
    let kernel = default_kernel();
    let mut log = AnnotationLog::new();
    let a = stroke(&mut log, "a", square(1.0, 1.0, 3.0, 3.0));
    let b = stroke(&mut log, "b", square(5.0, 1.0, 7.0, 3.0));
    let outside = stroke(&mut log, "c", square(50.0, 50.0, 60.0, 60.0));
    let marker = log.append("m".to_string(), AnnotationShape::Point { pos: [4.0, 2.0] });

    // Lasso enclosing both squares and the point marker.
    let ids = lasso_select(&kernel, &log, &[[0.0, 0.0], [8.0, 0.0], [8.0, 4.0], [0.0, 4.0]])
        .unwrap();
    assert!(ids.contains(&a));
    assert!(ids.contains(&b));
    assert!(ids.contains(&marker));
    assert!(!ids.contains(&outside));
}

#[test]
fn test_lasso_rejects_degenerate_polygon() {
    let kernel = default_kernel();
    let log = AnnotationLog::new();
    assert!(lasso_select(&kernel, &log, &[[0.0, 0.0], [1.0, 1.0]]).is_err());
}

#[test]
fn test_records_in_selected_area_expands_to_overlaps() {
    let kernel = default_kernel();
    let mut log = AnnotationLog::new();
    let a = stroke(&mut log, "a", square(0.0, 0.0, 10.0, 10.0));
    let b = stroke(&mut log, "b", square(8.0, 0.0, 18.0, 10.0));
    let far = stroke(&mut log, "c", square(50.0, 0.0, 60.0, 10.0));

    let mut state = SelectionState::new();
    state.select(a, false);

    let ids = records_in_selected_area(&kernel, &log, &state.selected);
    assert!(ids.contains(&a));
    assert!(ids.contains(&b)); // overlaps the selected area
    assert!(!ids.contains(&far));
}
