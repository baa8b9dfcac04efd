//! Deterministic replay of the annotation log into the label partition.
//!
//! `resolve` is a pure function of the ordered log: every stroke record is
//! applied in order under the insert/overwrite rules, and the same log
//! always produces the same partition. Box and point records are not
//! resolved; they ride along to the output untouched.

use crate::annotation::{AnnotationId, AnnotationLog, AnnotationShape, InsertionMode};
use crate::geometry::RegionRings;
use crate::kernel::{KernelResult, PlanarKernel};
use serde::Serialize;
use std::collections::BTreeMap;


/// A non-fatal failure while replaying one record. The record's
/// contribution is skipped; the rest of the log still resolves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionWarning {
    pub record: AnnotationId,
    pub message: String,
}

/// Result of one full replay.
#[derive(Debug, Clone)]
pub struct Resolution<R> {
    /// label -> owned region. A label with no area has no entry.
    pub regions: BTreeMap<String, R>,
    pub warnings: Vec<ResolutionWarning>,
    log_version: u64,
}

impl<R> Resolution<R> {
    pub fn empty() -> Self {
        Self {
            regions: BTreeMap::new(),
            warnings: Vec::new(),
            log_version: 0,
        }
    }

    /// True if this resolution was computed from the log's current state.
    /// Hosts that resolve on a worker thread use this to discard results
    /// that a newer mutation has superseded.
    pub fn is_current(&self, log: &AnnotationLog) -> bool {
        self.log_version == log.version()
    }

    pub fn log_version(&self) -> u64 {
        self.log_version
    }
}

/// Replay the whole log into a fresh partition.
pub fn resolve<K: PlanarKernel>(kernel: &K, log: &AnnotationLog) -> Resolution<K::Region> {
    let mut regions: BTreeMap<String, K::Region> = BTreeMap::new();
    let mut warnings = Vec::new();

    for record in log.records() {
        let AnnotationShape::Stroke { region, mode, .. } = &record.shape else {
            continue;
        };
        if let Err(e) = apply_stroke(kernel, &mut regions, &record.label, region, *mode) {
            warnings.push(ResolutionWarning {
                record: record.id,
                message: e.to_string(),
            });
        }
    }

    Resolution {
        regions,
        warnings,
        log_version: log.version(),
    }
}

/// Apply one stroke record to the working partition.
///
/// Every kernel call happens before the first map write, so a library
/// failure skips the record without leaving the partition half-updated.
fn apply_stroke<K: PlanarKernel>(
    kernel: &K,
    regions: &mut BTreeMap<String, K::Region>,
    label: &str,
    rings: &RegionRings,
    mode: InsertionMode,
) -> KernelResult<()> {
    let mut incoming = kernel.region_from_rings(rings)?;
    if kernel.is_empty(&incoming) {
        return Ok(());
    }

    // Staged cross-label updates: (label, shrunk region or clear).
    let mut shrunk: Vec<(String, Option<K::Region>)> = Vec::new();

    match mode {
        InsertionMode::Add => {
            // Insert never steals: clip the incoming area by every other
            // label it overlaps.
            for (other, other_region) in regions.iter() {
                if other == label {
                    continue;
                }
                if kernel.intersects(&incoming, other_region) {
                    incoming = kernel.difference(&incoming, other_region)?;
                    if kernel.is_empty(&incoming) {
                        break;
                    }
                }
            }
            if kernel.is_empty(&incoming) {
                // Fully inside other labels: contributes nothing here.
                return Ok(());
            }
        }
        InsertionMode::Subtract => {
            // Overwrite always wins: every overlapped label gives up the
            // contested area; labels left with nothing lose their entry.
            for (other, other_region) in regions.iter() {
                if other == label {
                    continue;
                }
                if kernel.intersects(&incoming, other_region) {
                    let remaining = kernel.difference(other_region, &incoming)?;
                    if kernel.is_empty(&remaining) {
                        shrunk.push((other.clone(), None));
                    } else {
                        shrunk.push((other.clone(), Some(remaining)));
                    }
                }
            }
        }
    }

    // Same label always unions.
    let merged = match regions.get(label) {
        Some(existing) => kernel.union(existing, &incoming)?,
        None => incoming,
    };

    for (other, entry) in shrunk {
        match entry {
            Some(region) => regions.insert(other, region),
            None => regions.remove(&other),
        };
    }
    regions.insert(label.to_string(), merged);
    Ok(())
}
