//! Offline evaluation of detections against ground truth.

mod annotations;
mod metrics;

pub use annotations::AnnotationSet;
pub use metrics::{evaluate, QualityMetrics};
