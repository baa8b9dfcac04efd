pub mod io;
pub mod log;
pub mod types;

pub use log::AnnotationLog;
pub use types::{
    label_color, AnnotationId, AnnotationKind, AnnotationRecord, AnnotationShape, InsertionMode,
    StrokeInput,
};

#[cfg(test)]
mod tests_log;
