//! The annotation document: the mutation surface of the engine.
//!
//! Owns the kernel, the log, the current resolution and the selection.
//! Every mutation is synchronous mutate-then-re-resolve: it either commits
//! (log changed, partition recomputed) or fails without touching the log.
//! Hosts receive cloned, serializable views and never mutate engine state.

use crate::annotation::{
    io, label_color, AnnotationId, AnnotationKind, AnnotationLog, AnnotationRecord,
    AnnotationShape, StrokeInput,
};
use crate::geometry::{tessellation, utils_2d, MeshBuffers, RegionRings, EPSILON};
use crate::kernel::{default_kernel, GeoKernel, PlanarKernel};
use crate::resolver::{resolve, Resolution, ResolutionWarning};
use crate::selection::{self, Hit, SelectionState};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors surfaced to the host. Recoverable: the log is never left in a
/// partial state.
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// One resolved label region, ready for drawing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelRegionView {
    pub rings: RegionRings,
    pub color: [u8; 3],
}

/// Snapshot of the partition plus pass-through markers. Rebuilt from
/// scratch on request; the renderer owns whatever it derives from it.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionView {
    pub labels: BTreeMap<String, LabelRegionView>,
    /// Box and point records; attached to their label for coloring only,
    /// never clipped by the partition.
    pub markers: Vec<AnnotationRecord>,
    pub warnings: Vec<ResolutionWarning>,
}

pub struct AnnotationDocument<K: PlanarKernel = GeoKernel> {
    kernel: K,
    log: AnnotationLog,
    resolution: Resolution<K::Region>,
    selection: SelectionState,
}

impl AnnotationDocument<GeoKernel> {
    pub fn new() -> Self {
        Self::with_kernel(default_kernel())
    }
}

impl Default for AnnotationDocument<GeoKernel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PlanarKernel> AnnotationDocument<K> {
    pub fn with_kernel(kernel: K) -> Self {
        Self {
            kernel,
            log: AnnotationLog::new(),
            resolution: Resolution::empty(),
            selection: SelectionState::new(),
        }
    }

    fn resolve_now(&mut self) {
        self.resolution = resolve(&self.kernel, &self.log);
    }

    // === Drawing ===

    /// Buffer a raw pointer path into an area and append it as a stroke
    /// record. Malformed input is rejected before the log is touched.
    pub fn add_stroke(&mut self, input: StrokeInput) -> Result<AnnotationId, EngineError> {
        if input.path.is_empty() || utils_2d::path_length(&input.path) < EPSILON {
            return Err(EngineError::InvalidGeometry(
                "zero-length stroke".to_string(),
            ));
        }
        if !utils_2d::path_is_finite(&input.path) {
            return Err(EngineError::InvalidGeometry(
                "stroke path contains non-finite coordinates".to_string(),
            ));
        }
        if !input.stroke_width.is_finite() || input.stroke_width <= 0.0 {
            return Err(EngineError::InvalidGeometry(format!(
                "stroke width must be positive, got {}",
                input.stroke_width
            )));
        }

        let buffered = self
            .kernel
            .buffer(&input.path, input.buffer_distance())
            .map_err(|e| EngineError::InvalidGeometry(e.to_string()))?;
        let region = self.kernel.region_to_rings(&buffered);
        if region.is_empty() {
            return Err(EngineError::InvalidGeometry(
                "stroke buffered to an empty area".to_string(),
            ));
        }

        let id = self.log.append(
            input.label,
            AnnotationShape::Stroke {
                region,
                mode: input.mode,
                stroke_width: input.stroke_width,
            },
        );
        self.resolve_now();
        Ok(id)
    }

    pub fn add_box(
        &mut self,
        label: String,
        corners: [[f64; 2]; 4],
    ) -> Result<AnnotationId, EngineError> {
        if !utils_2d::path_is_finite(&corners) {
            return Err(EngineError::InvalidGeometry(
                "box corners contain non-finite coordinates".to_string(),
            ));
        }
        if utils_2d::polygon_area(&corners).abs() < EPSILON {
            return Err(EngineError::InvalidGeometry(
                "box encloses no area".to_string(),
            ));
        }
        let id = self.log.append(label, AnnotationShape::Box { corners });
        self.resolve_now();
        Ok(id)
    }

    pub fn add_point(&mut self, label: String, pos: [f64; 2]) -> Result<AnnotationId, EngineError> {
        if !pos[0].is_finite() || !pos[1].is_finite() {
            return Err(EngineError::InvalidGeometry(
                "point coordinate is not finite".to_string(),
            ));
        }
        let id = self.log.append(label, AnnotationShape::Point { pos });
        self.resolve_now();
        Ok(id)
    }

    // === Selection ===

    /// Single-select at a click coordinate. `tolerance` is the pick radius
    /// for point markers, in engine units. Clicking empty space clears the
    /// selection unless `additive` is set.
    pub fn select_at(&mut self, point: [f64; 2], tolerance: f64, additive: bool) -> Option<Hit> {
        let hit = selection::hit_test(&self.kernel, &self.log, &self.resolution, point, tolerance);
        match &hit {
            Some(h) => self.selection.select_many(h.ids.iter().copied(), additive),
            None => {
                if !additive {
                    self.selection.clear();
                }
            }
        }
        hit
    }

    /// Lasso-select with a user-drawn polygon. Returns how many records
    /// matched.
    pub fn lasso_select(
        &mut self,
        ring: &[[f64; 2]],
        additive: bool,
    ) -> Result<usize, EngineError> {
        let ids = selection::lasso_select(&self.kernel, &self.log, ring)
            .map_err(|e| EngineError::InvalidGeometry(e.to_string()))?;
        let count = ids.len();
        self.selection.select_many(ids, additive);
        Ok(count)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn deselect(&mut self, id: AnnotationId) {
        self.selection.deselect(&id);
    }

    // === Editing ===

    /// Remove every record whose geometry intersects the selected area.
    /// Clears the selection. Returns how many records were removed.
    pub fn delete_selected(&mut self) -> usize {
        self.selection.validate(&self.log);
        let doomed =
            selection::records_in_selected_area(&self.kernel, &self.log, &self.selection.selected);
        let removed = self.log.remove(&doomed);
        self.selection.clear();
        if removed > 0 {
            self.resolve_now();
        }
        removed
    }

    /// Re-label every record whose geometry intersects the selected area.
    /// Replacements keep their replay position; the selection moves to the
    /// replacement ids. Returns how many records were replaced.
    pub fn relabel_selected(&mut self, new_label: &str) -> usize {
        self.selection.validate(&self.log);
        let targets =
            selection::records_in_selected_area(&self.kernel, &self.log, &self.selection.selected);
        let replaced = self.log.replace_label(&targets, new_label);
        let count = replaced.len();
        if count > 0 {
            self.selection.select_many(replaced, false);
            self.resolve_now();
        }
        count
    }

    /// Remove every record carrying `label`. Returns how many records were
    /// removed.
    pub fn delete_label(&mut self, label: &str) -> usize {
        let doomed: Vec<AnnotationId> = self
            .log
            .records()
            .iter()
            .filter(|r| r.label == label)
            .map(|r| r.id)
            .collect();
        let removed = self.log.remove(&doomed);
        if removed > 0 {
            self.selection.validate(&self.log);
            self.resolve_now();
        }
        removed
    }

    /// Drop the most recently appended batch and re-resolve. Single-step;
    /// no redo.
    pub fn undo(&mut self) -> bool {
        if !self.log.undo() {
            return false;
        }
        self.selection.validate(&self.log);
        self.resolve_now();
        true
    }

    /// Truncate the log; the partition becomes empty.
    pub fn clear(&mut self) {
        self.log.clear();
        self.selection.clear();
        self.resolve_now();
    }

    // === Export / Import ===

    pub fn export_json(&self) -> Result<String, EngineError> {
        io::export_json(&self.log).map_err(|e| EngineError::Serialization(e.to_string()))
    }

    /// Replace the document content with an imported log and re-resolve.
    pub fn import_json(&mut self, text: &str) -> Result<(), EngineError> {
        let log = io::import_json(text).map_err(|e| EngineError::Serialization(e.to_string()))?;
        self.log = log;
        self.selection.clear();
        self.resolve_now();
        Ok(())
    }

    // === Views ===

    pub fn log(&self) -> &AnnotationLog {
        &self.log
    }

    pub fn resolution(&self) -> &Resolution<K::Region> {
        &self.resolution
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn warnings(&self) -> &[ResolutionWarning] {
        &self.resolution.warnings
    }

    /// Labels that currently own area, in sorted order.
    pub fn labels(&self) -> Vec<String> {
        self.resolution.regions.keys().cloned().collect()
    }

    pub fn partition_view(&self) -> PartitionView {
        let labels = self
            .resolution
            .regions
            .iter()
            .map(|(label, region)| {
                (
                    label.clone(),
                    LabelRegionView {
                        rings: self.kernel.region_to_rings(region),
                        color: label_color(label),
                    },
                )
            })
            .collect();
        let markers = self
            .log
            .records()
            .iter()
            .filter(|r| r.kind() != AnnotationKind::Stroke)
            .cloned()
            .collect();
        PartitionView {
            labels,
            markers,
            warnings: self.resolution.warnings.clone(),
        }
    }

    /// Triangulated region per label, for direct upload by the renderer.
    pub fn partition_meshes(&self) -> Result<BTreeMap<String, MeshBuffers>, EngineError> {
        let mut meshes = BTreeMap::new();
        for (label, region) in &self.resolution.regions {
            let rings = self.kernel.region_to_rings(region);
            let mesh = tessellation::tessellate_region(&rings)
                .map_err(|e| EngineError::InvalidGeometry(e.to_string()))?;
            meshes.insert(label.clone(), mesh);
        }
        Ok(meshes)
    }
}
