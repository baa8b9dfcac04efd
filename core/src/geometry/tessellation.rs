//! Triangulation of resolved regions into renderer-ready buffers.
//!
//! The engine hands the host flat vertex/index arrays so the renderer can
//! upload them directly; holes are handled by earcut's hole-index scheme.

use super::primitives::RegionRings;
use super::utils_2d;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum TessellationError {
    #[error("Tessellation failed: {0}")]
    TriangulationFailed(String),
}

/// Flat 2D mesh buffers for one region.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffers {
    /// Flattened x, y pairs.
    pub vertices: Vec<f32>,
    /// Triangle indices into `vertices`.
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 2
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Triangulate a (possibly multi, possibly holed) region.
///
/// Each polygon of the region is triangulated independently and merged into
/// one buffer. Degenerate rings (fewer than three distinct vertices) are
/// skipped rather than failing the whole region.
pub fn tessellate_region(region: &RegionRings) -> Result<MeshBuffers, TessellationError> {
    let mut mesh = MeshBuffers::new();

    for rings in &region.0 {
        let mut coords: Vec<f64> = Vec::new();
        let mut hole_starts: Vec<usize> = Vec::new();
        let mut ring_count = 0usize;

        for (i, ring) in rings.iter().enumerate() {
            let mut ring = ring.clone();
            utils_2d::normalize_ring(&mut ring);
            if ring.len() < 3 {
                if i == 0 {
                    break; // degenerate outer ring, skip the polygon
                }
                continue;
            }
            if i > 0 {
                hole_starts.push(coords.len() / 2);
            }
            for p in &ring {
                coords.push(p[0]);
                coords.push(p[1]);
            }
            ring_count += 1;
        }

        if ring_count == 0 {
            continue;
        }

        let indices = earcutr::earcut(&coords, &hole_starts, 2)
            .map_err(|e| TessellationError::TriangulationFailed(format!("{:?}", e)))?;
        if indices.len() % 3 != 0 {
            return Err(TessellationError::TriangulationFailed(
                "earcut returned a partial triangle".to_string(),
            ));
        }

        let base = mesh.vertex_count() as u32;
        for pair in coords.chunks(2) {
            mesh.vertices.push(pair[0] as f32);
            mesh.vertices.push(pair[1] as f32);
        }
        mesh.indices.extend(indices.iter().map(|&i| base + i as u32));
    }

    Ok(mesh)
}
