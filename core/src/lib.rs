pub mod annotation;
pub mod document;
pub mod geometry;
pub mod kernel;
pub mod resolver;
pub mod selection;

pub use document::{AnnotationDocument, EngineError, PartitionView};

pub fn version() -> &'static str {
    "0.1.0"
}
