use crate::geometry::RegionRings;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for one annotation record. Ids are handed out in creation
/// order (monotonically increasing) and never reused within a document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct AnnotationId(pub u64);

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a stroke interacts with area already owned by other labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertionMode {
    /// Insert: the stroke yields contested area to existing labels.
    Add,
    /// Overwrite: the stroke takes contested area from other labels.
    Subtract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Stroke,
    Box,
    Point,
}

/// Geometry payload of a record, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnnotationShape {
    /// A pen stroke, already buffered into an area at creation time.
    /// `stroke_width` is kept for export fidelity only; resolution never
    /// reads it.
    Stroke {
        region: RegionRings,
        mode: InsertionMode,
        stroke_width: f64,
    },
    /// Axis-aligned or rotated quadrilateral. Never resolved.
    Box { corners: [[f64; 2]; 4] },
    /// A single coordinate marker. Never resolved.
    Point { pos: [f64; 2] },
}

impl AnnotationShape {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            AnnotationShape::Stroke { .. } => AnnotationKind::Stroke,
            AnnotationShape::Box { .. } => AnnotationKind::Box,
            AnnotationShape::Point { .. } => AnnotationKind::Point,
        }
    }
}

/// One immutable entry of the annotation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: AnnotationId,
    /// May be empty (unlabeled).
    pub label: String,
    pub shape: AnnotationShape,
}

impl AnnotationRecord {
    pub fn kind(&self) -> AnnotationKind {
        self.shape.kind()
    }

    /// Display color derived from the label; never stored.
    pub fn color(&self) -> [u8; 3] {
        label_color(&self.label)
    }

    pub fn stroke_region(&self) -> Option<&RegionRings> {
        match &self.shape {
            AnnotationShape::Stroke { region, .. } => Some(region),
            _ => None,
        }
    }

    pub fn mode(&self) -> Option<InsertionMode> {
        match &self.shape {
            AnnotationShape::Stroke { mode, .. } => Some(*mode),
            _ => None,
        }
    }
}

/// Half-width multiplier from stroke width to buffer distance.
pub const BUFFER_WIDTH_SCALE: f64 = 0.5;

/// Lower floor for the buffer distance, so a stroke drawn while zoomed far
/// out still produces a usable area.
pub const MIN_BUFFER_DISTANCE: f64 = 1e-3;

/// Raw stroke event from the host, before buffering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeInput {
    /// Ordered pointer path in engine coordinates.
    pub path: Vec<[f64; 2]>,
    pub label: String,
    pub mode: InsertionMode,
    pub stroke_width: f64,
    /// Current view zoom; stroke width is screen-space, the buffer is not.
    pub zoom_scale: f64,
}

impl StrokeInput {
    pub fn buffer_distance(&self) -> f64 {
        let zoom = if self.zoom_scale.is_finite() && self.zoom_scale > 0.0 {
            self.zoom_scale
        } else {
            1.0
        };
        (self.stroke_width * BUFFER_WIDTH_SCALE / zoom).max(MIN_BUFFER_DISTANCE)
    }
}

/// Deterministic label color: 31-multiplier hash over UTF-16 code units,
/// masked to 24 bits. Empty labels map to black.
pub fn label_color(label: &str) -> [u8; 3] {
    let mut hash: i32 = 0;
    for unit in label.encode_utf16() {
        hash = (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
    }
    let rgb = (hash & 0x00FF_FFFF) as u32;
    [(rgb >> 16) as u8, ((rgb >> 8) & 0xFF) as u8, (rgb & 0xFF) as u8]
}
