//! Fixed detection-window geometry.
//!
//! The classifier is dimension-positional, so these values define the
//! descriptor layout and must be identical between training and detection.

/// Number of orientation bins per cell histogram.
pub const CELL_NUM: usize = 8;
/// Side of a square cell in pixels.
pub const CELL_SIZE: usize = 8;
/// Side of a square normalization block in cells.
pub const BLOCK_SIZE: usize = 2;

/// Detection window width in pixels.
pub const WIN_WIDTH: usize = 80;
/// Detection window height in pixels.
pub const WIN_HEIGHT: usize = 200;
/// Detection window width in cells.
pub const WIN_WIDTH_CELL: usize = WIN_WIDTH / CELL_SIZE;
/// Detection window height in cells.
pub const WIN_HEIGHT_CELL: usize = WIN_HEIGHT / CELL_SIZE;

/// Negative examples drawn from each background image.
pub const BACKGROUND_PER_IMG: usize = 1;
/// Percentage of the window width used as suppression radius and match tolerance.
pub const CROSS_PROC: usize = 50;

/// Hard-negative bootstrapping rounds.
pub const BOOTSTRAP_TIME: usize = 25;
/// Background strips scanned per bootstrapping round.
pub const BOOTSTRAP_BACK_PER_STEP: usize = 100;
/// Vertical step between background strips in pixels.
pub const BACK_STEP: usize = 60;

/// Default number of cross-validation folds.
pub const CV_TIME: usize = 5;

/// Block positions along the window height.
pub const BLOCKS_HIGH: usize = WIN_HEIGHT_CELL - BLOCK_SIZE + 1;
/// Block positions along the window width.
pub const BLOCKS_WIDE: usize = WIN_WIDTH_CELL - BLOCK_SIZE + 1;

/// Length of a linear-mode descriptor.
pub const DESCRIPTOR_LEN: usize = BLOCKS_HIGH * BLOCKS_WIDE * BLOCK_SIZE * BLOCK_SIZE * CELL_NUM;

/// Non-maximum suppression half-width, in cells.
pub const fn suppression_radius_cells() -> usize {
    WIN_WIDTH_CELL * CROSS_PROC / 100
}

/// Positional tolerance used when matching predictions to ground truth, in pixels.
pub const fn match_tolerance_px() -> i64 {
    (WIN_WIDTH * CROSS_PROC / 100) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_geometry() {
        assert_eq!(WIN_WIDTH_CELL, 10);
        assert_eq!(WIN_HEIGHT_CELL, 25);
        assert_eq!(BLOCKS_HIGH, 24);
        assert_eq!(BLOCKS_WIDE, 9);
        assert_eq!(DESCRIPTOR_LEN, 6912);
        assert_eq!(suppression_radius_cells(), 5);
        assert_eq!(match_tolerance_px(), 40);
    }
}
