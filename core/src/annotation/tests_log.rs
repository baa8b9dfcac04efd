use crate::annotation::log::AnnotationLog;
use crate::annotation::types::{AnnotationShape, InsertionMode};
use crate::geometry::RegionRings;

fn stroke_shape(x0: f64, y0: f64, x1: f64, y1: f64) -> AnnotationShape {
    AnnotationShape::Stroke {
        region: RegionRings::single(vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]]),
        mode: InsertionMode::Add,
        stroke_width: 4.0,
    }
}

#[test]
fn test_append_assigns_monotonic_ids() {
    let mut log = AnnotationLog::new();
    let a = log.append("a".to_string(), stroke_shape(0.0, 0.0, 1.0, 1.0));
    let b = log.append("b".to_string(), stroke_shape(1.0, 0.0, 2.0, 1.0));
    let c = log.append("c".to_string(), AnnotationShape::Point { pos: [0.5, 0.5] });

    assert!(a < b && b < c);
    assert_eq!(log.len(), 3);
    assert_eq!(log.records()[0].id, a);
    assert!(log.contains(b));
}

#[test]
fn test_undo_drops_last_batch_only() {
    let mut log = AnnotationLog::new();
    let a = log.append("a".to_string(), stroke_shape(0.0, 0.0, 1.0, 1.0));
    let b = log.append("b".to_string(), stroke_shape(1.0, 0.0, 2.0, 1.0));

    assert!(log.undo());
    assert!(log.contains(a));
    assert!(!log.contains(b));
    assert_eq!(log.len(), 1);

    assert!(log.undo());
    assert!(log.is_empty());
    assert!(!log.undo());
}

#[test]
fn test_replace_label_keeps_replay_position() {
    let mut log = AnnotationLog::new();
    let a = log.append("a".to_string(), stroke_shape(0.0, 0.0, 1.0, 1.0));
    let b = log.append("b".to_string(), stroke_shape(1.0, 0.0, 2.0, 1.0));
    let c = log.append("c".to_string(), stroke_shape(2.0, 0.0, 3.0, 1.0));

    let replaced = log.replace_label(&[b], "renamed");
    assert_eq!(replaced.len(), 1);
    let new_id = replaced[0];

    // Fresh id, old id retired, position in the replay order unchanged.
    assert!(new_id > c);
    assert!(!log.contains(b));
    assert_eq!(log.records()[1].id, new_id);
    assert_eq!(log.records()[1].label, "renamed");
    assert_eq!(log.records()[0].id, a);
    assert_eq!(log.records()[2].id, c);
}

#[test]
fn test_replace_label_batch_is_one_undo_step() {
    let mut log = AnnotationLog::new();
    let a = log.append("a".to_string(), stroke_shape(0.0, 0.0, 1.0, 1.0));
    let b = log.append("b".to_string(), stroke_shape(1.0, 0.0, 2.0, 1.0));

    let replaced = log.replace_label(&[a, b], "both");
    assert_eq!(replaced.len(), 2);
    assert_eq!(log.len(), 2);

    // One undo removes the whole replacement batch.
    assert!(log.undo());
    assert!(log.is_empty());
}

#[test]
fn test_replace_label_ignores_unknown_ids() {
    let mut log = AnnotationLog::new();
    let a = log.append("a".to_string(), stroke_shape(0.0, 0.0, 1.0, 1.0));
    log.remove(&[a]);

    let replaced = log.replace_label(&[a], "ghost");
    assert!(replaced.is_empty());
    assert!(log.is_empty());
}

#[test]
fn test_remove_ignores_stale_ids_and_bumps_version() {
    let mut log = AnnotationLog::new();
    let a = log.append("a".to_string(), stroke_shape(0.0, 0.0, 1.0, 1.0));
    let v = log.version();

    assert_eq!(log.remove(&[a]), 1);
    assert!(log.version() > v);

    let v = log.version();
    assert_eq!(log.remove(&[a]), 0);
    assert_eq!(log.version(), v);
}

#[test]
fn test_clear_truncates_everything() {
    let mut log = AnnotationLog::new();
    log.append("a".to_string(), stroke_shape(0.0, 0.0, 1.0, 1.0));
    log.append("b".to_string(), AnnotationShape::Point { pos: [1.0, 1.0] });

    log.clear();
    assert!(log.is_empty());
    assert!(!log.undo());
}

#[test]
fn test_from_records_resumes_id_allocation() {
    let mut log = AnnotationLog::new();
    log.append("a".to_string(), stroke_shape(0.0, 0.0, 1.0, 1.0));
    let b = log.append("b".to_string(), stroke_shape(1.0, 0.0, 2.0, 1.0));

    let mut rebuilt = AnnotationLog::from_records(log.records().to_vec());
    let c = rebuilt.append("c".to_string(), stroke_shape(2.0, 0.0, 3.0, 1.0));
    assert!(c > b);
}
