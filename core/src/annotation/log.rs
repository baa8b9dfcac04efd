use super::types::{AnnotationId, AnnotationRecord, AnnotationShape};
use std::collections::HashSet;

/// The authoritative, ordered record of all drawing and editing events.
///
/// Records are immutable once appended; edits replace whole records, they
/// never mutate one in place. Each committed mutation registers the ids it
/// appended as one batch, which is the unit of undo. The version counter
/// bumps on every mutation so a resolution can be checked for staleness.
#[derive(Debug, Clone, Default)]
pub struct AnnotationLog {
    records: Vec<AnnotationRecord>,
    /// Ids appended per committed mutation, oldest batch first.
    batches: Vec<Vec<AnnotationId>>,
    next_id: u64,
    version: u64,
}

impl AnnotationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from imported records. Ids are preserved; the id
    /// allocator resumes past the highest one. Imported history carries no
    /// undo batches.
    pub fn from_records(records: Vec<AnnotationRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id.0 + 1).max().unwrap_or(0);
        Self {
            records,
            batches: Vec::new(),
            next_id,
            version: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, id: AnnotationId) -> Option<&AnnotationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.get(id).is_some()
    }

    fn allocate_id(&mut self) -> AnnotationId {
        let id = AnnotationId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append one record as its own undo batch. Returns the new id.
    pub fn append(&mut self, label: String, shape: AnnotationShape) -> AnnotationId {
        let id = self.allocate_id();
        self.records.push(AnnotationRecord { id, label, shape });
        self.batches.push(vec![id]);
        self.version += 1;
        id
    }

    /// Replace each target record with a copy carrying `label`. The
    /// replacement gets a fresh id but keeps the original's position in
    /// the replay order; the original id is retired for good. All
    /// replacements form one undo batch. Unknown ids are skipped.
    ///
    /// Returns the replacement ids, in target order.
    pub fn replace_label(&mut self, targets: &[AnnotationId], label: &str) -> Vec<AnnotationId> {
        let mut replaced = Vec::with_capacity(targets.len());
        for &target in targets {
            let Some(index) = self.records.iter().position(|r| r.id == target) else {
                continue;
            };
            let id = self.allocate_id();
            let shape = self.records[index].shape.clone();
            self.records[index] = AnnotationRecord {
                id,
                label: label.to_string(),
                shape,
            };
            replaced.push(id);
        }
        if !replaced.is_empty() {
            self.batches.push(replaced.clone());
            self.version += 1;
        }
        replaced
    }

    /// Remove the given records. Unknown ids are ignored. Returns how many
    /// records were actually removed.
    pub fn remove(&mut self, ids: &[AnnotationId]) -> usize {
        let doomed: HashSet<AnnotationId> = ids.iter().copied().collect();
        let before = self.records.len();
        self.records.retain(|r| !doomed.contains(&r.id));
        let removed = before - self.records.len();
        if removed > 0 {
            self.version += 1;
        }
        removed
    }

    /// Drop the most recently appended batch. Records of that batch that
    /// were already deleted are ignored. Returns false when there is
    /// nothing left to undo.
    pub fn undo(&mut self) -> bool {
        let Some(batch) = self.batches.pop() else {
            return false;
        };
        let doomed: HashSet<AnnotationId> = batch.into_iter().collect();
        self.records.retain(|r| !doomed.contains(&r.id));
        self.version += 1;
        true
    }

    /// Truncate everything.
    pub fn clear(&mut self) {
        self.records.clear();
        self.batches.clear();
        self.version += 1;
    }
}
