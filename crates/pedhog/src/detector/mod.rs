//! Sliding-window pedestrian detection.
//!
//! A fixed `WIN_WIDTH x WIN_HEIGHT` window anchored at the top of the image is
//! slid horizontally one cell at a time. Windows scoring above the confidence
//! bound are kept and reduced to well-separated peaks by greedy suppression.

mod suppress;

use image::RgbImage;

use crate::classifier::LinearModel;
use crate::error::{Error, Result};
use crate::hog::{compute_descriptor, CellGrid, FeatureMap, HogConfig};
use crate::window::{suppression_radius_cells, CELL_SIZE, WIN_HEIGHT_CELL, WIN_WIDTH_CELL};

pub use suppress::suppress_peaks;

/// Detection settings.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// Windows whose decision value does not exceed this are discarded.
    pub bound: f64,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self { bound: 0.0 }
    }
}

/// One detected window.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Detection {
    /// Left edge of the window in pixels.
    pub x: u32,
    /// Decision value of the window.
    pub score: f64,
}

/// Number of horizontal window positions scored on `grid`.
pub fn window_count(grid: &CellGrid) -> usize {
    if grid.rows() < WIN_HEIGHT_CELL {
        return 0;
    }
    grid.cols().saturating_sub(WIN_WIDTH_CELL)
}

/// Score every window position; entries not above `bound` are left at zero.
pub fn score_windows(
    grid: &CellGrid,
    model: &LinearModel,
    features: &FeatureMap,
    bound: f64,
) -> Result<Vec<f64>> {
    let expected = features.descriptor_len();
    if model.dimension() != expected {
        return Err(Error::dimension_mismatch(model.dimension(), expected));
    }

    let mut scores = vec![0.0; window_count(grid)];
    for (offset, slot) in scores.iter_mut().enumerate() {
        let descriptor = compute_descriptor(grid, offset, features)?;
        let score = model.decision_value(&descriptor)?;
        if score > bound {
            *slot = score;
        }
    }
    Ok(scores)
}

/// Detect pedestrians in a precomputed cell grid.
pub fn detect_in_grid(
    grid: &CellGrid,
    model: &LinearModel,
    features: &FeatureMap,
    config: &DetectConfig,
) -> Result<Vec<Detection>> {
    let mut scores = score_windows(grid, model, features, config.bound)?;
    let raw = scores.clone();
    let detections = suppress_peaks(&mut scores, suppression_radius_cells())
        .into_iter()
        .map(|index| Detection {
            x: (index * CELL_SIZE) as u32,
            score: raw[index],
        })
        .collect();
    Ok(detections)
}

/// Detect pedestrians in `image`.
///
/// Detections are returned in suppression order (highest score first).
/// Images too small to hold one window produce no detections.
pub fn detect(
    image: &RgbImage,
    model: &LinearModel,
    hog: &HogConfig,
    features: &FeatureMap,
    config: &DetectConfig,
) -> Result<Vec<Detection>> {
    let grid = CellGrid::from_image(image, hog);
    let detections = detect_in_grid(&grid, model, features, config)?;
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        windows = window_count(&grid),
        detections = detections.len(),
        "scanned image"
    );
    Ok(detections)
}
