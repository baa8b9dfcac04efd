//! JSON export and import of the annotation log.
//!
//! The export serializes the log, not the derived partition: re-importing
//! and re-resolving reproduces the same partition. One entry per record
//! with `id`, `kind`, `label`, `mode?`, `strokeWidth?` and `geometry` as
//! nested coordinate rings; boxes and points are wrapped to the same ring
//! depth so the geometry field has a uniform shape.

use super::log::AnnotationLog;
use super::types::{
    AnnotationId, AnnotationKind, AnnotationRecord, AnnotationShape, InsertionMode,
};
use crate::geometry::RegionRings;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error, Clone)]
pub enum LogFormatError {
    #[error("Serialization failed: {0}")]
    Serialize(String),

    #[error("Malformed log document: {0}")]
    Parse(String),

    #[error("Unsupported log format version {0}")]
    UnsupportedVersion(u32),

    #[error("Record {id}: {message}")]
    BadRecord { id: u64, message: String },
}

#[derive(Serialize, Deserialize)]
struct LogDocument {
    version: u32,
    records: Vec<RecordEntry>,
}

#[derive(Serialize, Deserialize)]
struct RecordEntry {
    id: u64,
    kind: AnnotationKind,
    label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<InsertionMode>,
    #[serde(rename = "strokeWidth", default, skip_serializing_if = "Option::is_none")]
    stroke_width: Option<f64>,
    geometry: Vec<Vec<Vec<[f64; 2]>>>,
}

fn entry_from_record(record: &AnnotationRecord) -> RecordEntry {
    let (mode, stroke_width, geometry) = match &record.shape {
        AnnotationShape::Stroke {
            region,
            mode,
            stroke_width,
        } => (Some(*mode), Some(*stroke_width), region.0.clone()),
        AnnotationShape::Box { corners } => (None, None, vec![vec![corners.to_vec()]]),
        AnnotationShape::Point { pos } => (None, None, vec![vec![vec![*pos]]]),
    };
    RecordEntry {
        id: record.id.0,
        kind: record.kind(),
        label: record.label.clone(),
        mode,
        stroke_width,
        geometry,
    }
}

fn record_from_entry(entry: RecordEntry) -> Result<AnnotationRecord, LogFormatError> {
    let id = entry.id;
    let bad = |message: &str| LogFormatError::BadRecord {
        id,
        message: message.to_string(),
    };

    let shape = match entry.kind {
        AnnotationKind::Stroke => AnnotationShape::Stroke {
            region: RegionRings(entry.geometry),
            mode: entry.mode.ok_or_else(|| bad("stroke entry is missing its mode"))?,
            stroke_width: entry.stroke_width.unwrap_or(0.0),
        },
        AnnotationKind::Box => {
            let ring = entry
                .geometry
                .first()
                .and_then(|rings| rings.first())
                .ok_or_else(|| bad("box entry has no corner ring"))?;
            let corners: [[f64; 2]; 4] = ring
                .as_slice()
                .try_into()
                .map_err(|_| bad("box entry must have exactly four corners"))?;
            AnnotationShape::Box { corners }
        }
        AnnotationKind::Point => {
            let pos = entry
                .geometry
                .first()
                .and_then(|rings| rings.first())
                .and_then(|ring| ring.first())
                .ok_or_else(|| bad("point entry has no coordinate"))?;
            AnnotationShape::Point { pos: *pos }
        }
    };

    Ok(AnnotationRecord {
        id: AnnotationId(id),
        label: entry.label,
        shape,
    })
}

pub fn export_json(log: &AnnotationLog) -> Result<String, LogFormatError> {
    let doc = LogDocument {
        version: FORMAT_VERSION,
        records: log.records().iter().map(entry_from_record).collect(),
    };
    serde_json::to_string_pretty(&doc).map_err(|e| LogFormatError::Serialize(e.to_string()))
}

pub fn import_json(text: &str) -> Result<AnnotationLog, LogFormatError> {
    let doc: LogDocument =
        serde_json::from_str(text).map_err(|e| LogFormatError::Parse(e.to_string()))?;
    if doc.version != FORMAT_VERSION {
        return Err(LogFormatError::UnsupportedVersion(doc.version));
    }

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(doc.records.len());
    for entry in doc.records {
        if !seen.insert(entry.id) {
            return Err(LogFormatError::BadRecord {
                id: entry.id,
                message: "duplicate record id".to_string(),
            });
        }
        records.push(record_from_entry(entry)?);
    }
    Ok(AnnotationLog::from_records(records))
}
