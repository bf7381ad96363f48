//! pedhog: pedestrian detection with gradient-histogram features and a linear SVM.
//!
//! The pipeline stages are:
//!
//! 1. **Cells** – per-pixel gradient directions quantized into 8 octants and
//!    accumulated into 8x8-pixel cell histograms.
//! 2. **Descriptor** – 2x2-cell blocks normalized per bin across an 80x200
//!    window, optionally expanded through a chi-squared kernel map.
//! 3. **Detection** – the window is slid horizontally, scored by the linear
//!    classifier and reduced to separated peaks by greedy suppression.
//! 4. **Training** – positive crops and random background windows fit the
//!    classifier; bootstrapping rounds add the model's own false detections.
//! 5. **Evaluation** – predicted windows are matched against ground truth
//!    within a positional tolerance to give precision, recall and F-score.
//!
//! # Public API
//! - [`Session`] and [`SessionConfig`] as primary entry points
//! - [`detect`], [`Trainer`] and [`evaluate`] for direct use of each stage
//! - [`LinearModel`] and the [`ClassifierEngine`] seam for custom solvers

mod classifier;
mod config;
mod detector;
mod draw;
mod error;
mod eval;
mod hog;
mod session;
#[cfg(test)]
pub(crate) mod test_utils;
mod training;
pub mod window;

pub use classifier::{
    ClassifierEngine, DualCoordinateDescent, Label, LinearModel, SolverParams, TrainingSet,
};
pub use config::{SessionConfig, SessionPaths};
pub use detector::{
    detect, detect_in_grid, score_windows, suppress_peaks, window_count, DetectConfig, Detection,
};
pub use draw::{draw_detections, DETECTION_COLOR};
pub use error::{Error, Result};
pub use eval::{evaluate, AnnotationSet, QualityMetrics};
pub use hog::{
    compute_cells, compute_descriptor, direction_bin, luminance, window_fits, CellGrid,
    FeatureMap, GradientKernel, HogConfig, KernelMap,
};
pub use session::{ScanResult, Session};
pub use training::{
    background_strips, is_image_file, list_images, load_dir, load_image, random_crop,
    sample_negatives, sample_positives, window_crop, window_descriptor, BootstrapConfig,
    BootstrapRound, CrossValidationReport, FoldReport, TrainConfig, TrainReport, Trainer,
    TrainingData, IMAGE_EXTENSIONS,
};
