//! Selection state and the spatial queries behind single and lasso select.

use crate::annotation::{AnnotationId, AnnotationKind, AnnotationLog, AnnotationShape};
use crate::geometry::{point2, utils_2d, Aabb2, RegionRings};
use crate::kernel::{KernelOpError, KernelResult, PlanarKernel};
use crate::resolver::Resolution;
use std::collections::HashSet;

#[cfg(test)]
mod tests_selection;

/// Transient set of selected annotation ids. Cleared on mode changes by
/// the host; re-validated against the live log before every edit.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    pub selected: HashSet<AnnotationId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, id: AnnotationId, multi_select: bool) {
        if !multi_select {
            self.selected.clear();
        }
        self.selected.insert(id);
    }

    pub fn select_many<I: IntoIterator<Item = AnnotationId>>(&mut self, ids: I, multi_select: bool) {
        if !multi_select {
            self.selected.clear();
        }
        self.selected.extend(ids);
    }

    pub fn deselect(&mut self, id: &AnnotationId) {
        self.selected.remove(id);
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Drop ids that no longer exist in the log (deleted while a query was
    /// in flight). Returns how many stale ids were removed.
    pub fn validate(&mut self, log: &AnnotationLog) -> usize {
        let before = self.selected.len();
        self.selected.retain(|id| log.contains(*id));
        before - self.selected.len()
    }
}

/// Result of a point hit-test.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Records mapped back from the visual hit. A merged pen region fans
    /// out to every stroke that contributed to it.
    pub ids: Vec<AnnotationId>,
    /// Set when the hit landed on a resolved label region rather than a
    /// box or point marker.
    pub label: Option<String>,
}

/// Find the topmost annotation at `point`.
///
/// Box and point markers are tested first, newest id first; point markers
/// match within `tolerance` (the host supplies it, knowing the zoom).
/// Failing that, the resolved partition is tested; among labels containing
/// the point, the one with the newest contributing stroke wins.
pub fn hit_test<K: PlanarKernel>(
    kernel: &K,
    log: &AnnotationLog,
    resolution: &Resolution<K::Region>,
    point: [f64; 2],
    tolerance: f64,
) -> Option<Hit> {
    for record in log.records().iter().rev() {
        match &record.shape {
            AnnotationShape::Box { corners } => {
                if Aabb2::from_points(corners.iter().copied()).contains(&point2(point)) {
                    return Some(Hit {
                        ids: vec![record.id],
                        label: None,
                    });
                }
            }
            AnnotationShape::Point { pos } => {
                if utils_2d::distance(*pos, point) <= tolerance {
                    return Some(Hit {
                        ids: vec![record.id],
                        label: None,
                    });
                }
            }
            AnnotationShape::Stroke { .. } => {}
        }
    }

    let mut best: Option<(AnnotationId, &String)> = None;
    for (label, region) in &resolution.regions {
        if !kernel.contains_point(region, point) {
            continue;
        }
        if let Some(newest) = newest_stroke_of_label(log, label) {
            if best.map_or(true, |(current, _)| newest > current) {
                best = Some((newest, label));
            }
        }
    }

    let (_, label) = best?;
    let region = &resolution.regions[label];
    Some(Hit {
        ids: contributing_strokes(kernel, log, label, region),
        label: Some(label.clone()),
    })
}

/// All annotations matched by a user-drawn lasso polygon.
///
/// The overlap predicate is deliberately permissive: touching the lasso
/// boundary or fully enclosing the lasso both count as a match.
pub fn lasso_select<K: PlanarKernel>(
    kernel: &K,
    log: &AnnotationLog,
    ring: &[[f64; 2]],
) -> KernelResult<Vec<AnnotationId>> {
    let lasso = kernel.region_from_rings(&RegionRings::single(ring.to_vec()))?;
    if kernel.is_empty(&lasso) {
        return Err(KernelOpError::InvalidGeometry(
            "degenerate lasso polygon".to_string(),
        ));
    }

    let mut ids = Vec::new();
    for record in log.records() {
        let matched = match &record.shape {
            AnnotationShape::Stroke { region, .. } => kernel
                .region_from_rings(region)
                .map(|r| region_matches(kernel, &lasso, &r))
                .unwrap_or(false),
            AnnotationShape::Box { corners } => kernel
                .region_from_rings(&RegionRings::single(corners.to_vec()))
                .map(|r| region_matches(kernel, &lasso, &r))
                .unwrap_or(false),
            AnnotationShape::Point { pos } => kernel.contains_point(&lasso, *pos),
        };
        if matched {
            ids.push(record.id);
        }
    }
    Ok(ids)
}

fn region_matches<K: PlanarKernel>(kernel: &K, lasso: &K::Region, region: &K::Region) -> bool {
    kernel.intersects(lasso, region)
        || kernel.contains_region(lasso, region)
        || kernel.contains_region(region, lasso)
        || kernel.touches(lasso, region)
}

fn newest_stroke_of_label(log: &AnnotationLog, label: &str) -> Option<AnnotationId> {
    log.records()
        .iter()
        .filter(|r| r.kind() == AnnotationKind::Stroke && r.label == label)
        .map(|r| r.id)
        .max()
}

/// Stroke records of `label` whose stored geometry still overlaps the
/// resolved region, i.e. the records a visual hit on that region stands for.
fn contributing_strokes<K: PlanarKernel>(
    kernel: &K,
    log: &AnnotationLog,
    label: &str,
    region: &K::Region,
) -> Vec<AnnotationId> {
    let mut ids = Vec::new();
    for record in log.records() {
        if record.label != label {
            continue;
        }
        let Some(rings) = record.stroke_region() else {
            continue;
        };
        if let Ok(native) = kernel.region_from_rings(rings) {
            if kernel.intersects(&native, region) {
                ids.push(record.id);
            }
        }
    }
    ids
}

/// Ids of all records whose geometry overlaps the area covered by the
/// currently selected records. Selected point markers contribute a
/// containment test instead of an area.
pub fn records_in_selected_area<K: PlanarKernel>(
    kernel: &K,
    log: &AnnotationLog,
    selected: &HashSet<AnnotationId>,
) -> Vec<AnnotationId> {
    let mut areas: Vec<K::Region> = Vec::new();
    let mut points: Vec<[f64; 2]> = Vec::new();
    for id in selected {
        let Some(record) = log.get(*id) else {
            continue; // stale id, silently ignored
        };
        match &record.shape {
            AnnotationShape::Stroke { region, .. } => {
                if let Ok(r) = kernel.region_from_rings(region) {
                    areas.push(r);
                }
            }
            AnnotationShape::Box { corners } => {
                if let Ok(r) = kernel.region_from_rings(&RegionRings::single(corners.to_vec())) {
                    areas.push(r);
                }
            }
            AnnotationShape::Point { pos } => points.push(*pos),
        }
    }

    let mut ids = Vec::new();
    for record in log.records() {
        let matched = match &record.shape {
            AnnotationShape::Stroke { region, .. } => kernel
                .region_from_rings(region)
                .map(|r| {
                    areas.iter().any(|a| kernel.intersects(a, &r))
                        || points.iter().any(|p| kernel.contains_point(&r, *p))
                })
                .unwrap_or(false),
            AnnotationShape::Box { corners } => kernel
                .region_from_rings(&RegionRings::single(corners.to_vec()))
                .map(|r| {
                    areas.iter().any(|a| kernel.intersects(a, &r))
                        || points.iter().any(|p| kernel.contains_point(&r, *p))
                })
                .unwrap_or(false),
            AnnotationShape::Point { pos } => {
                selected.contains(&record.id)
                    || areas.iter().any(|a| kernel.contains_point(a, *pos))
            }
        };
        if matched {
            ids.push(record.id);
        }
    }
    ids
}
