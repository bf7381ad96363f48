//! Per-cell histograms of quantized gradient directions.
//!
//! Every pixel votes exactly once, into the octant of its gradient direction.
//! Pixels without a full 3x3 neighbourhood have no gradient and vote for bin 0.

use std::f64::consts::{PI, TAU};

use image::RgbImage;

use crate::window::{CELL_NUM, CELL_SIZE};

/// 3x3 derivative filter used for the gradient.
///
/// Both variants differentiate with `[-1, 0, 1]` along one axis; they differ
/// in the smoothing weights applied along the other axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientKernel {
    /// Smoothing weights `[1, 1, 1]`.
    #[default]
    Prewitt,
    /// Smoothing weights `[1, 2, 1]`.
    Sobel,
}

impl GradientKernel {
    fn smoothing(self) -> [f64; 3] {
        match self {
            Self::Prewitt => [1.0, 1.0, 1.0],
            Self::Sobel => [1.0, 2.0, 1.0],
        }
    }
}

/// Cell-histogram settings.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HogConfig {
    /// Derivative filter.
    pub gradient_kernel: GradientKernel,
}

/// Grid of `CELL_NUM`-bin orientation histograms, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellGrid {
    rows: usize,
    cols: usize,
    counts: Vec<u32>,
}

impl CellGrid {
    /// Build the grid for `image`.
    pub fn from_image(image: &RgbImage, config: &HogConfig) -> Self {
        compute_cells(image, config.gradient_kernel)
    }

    /// Number of cell rows (`height / CELL_SIZE`).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of cell columns (`width / CELL_SIZE`).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Histogram of the cell at (`row`, `col`).
    ///
    /// Panics if the cell is outside the grid.
    pub fn histogram(&self, row: usize, col: usize) -> &[u32] {
        assert!(row < self.rows && col < self.cols, "cell ({row}, {col}) out of grid");
        let base = (row * self.cols + col) * CELL_NUM;
        &self.counts[base..base + CELL_NUM]
    }
}

/// Grey level of every pixel, row-major.
///
/// Uses the weights `0.2125 R + 0.7154 G + 0.0721 B`, truncated to an integer level.
pub fn luminance(image: &RgbImage) -> Vec<f64> {
    image
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            (0.2125 * r as f64 + 0.7154 * g as f64 + 0.0721 * b as f64).trunc()
        })
        .collect()
}

/// Octant index of the gradient `(dx, dy)`.
///
/// The direction is `atan2(dx, dy)` shifted into `[0, 2π)` for negative `dx`.
/// A zero gradient falls into bin 0.
pub fn direction_bin(dx: f64, dy: f64) -> usize {
    let mut direction = dx.atan2(dy);
    if dx < 0.0 {
        direction += TAU;
    }
    let bin = (direction * 4.0 / PI).floor();
    // Guard the 2π rounding edge.
    bin.clamp(0.0, (CELL_NUM - 1) as f64) as usize
}

/// Compute the cell grid of `image` with the given derivative filter.
///
/// Trailing pixels that do not fill a whole cell are dropped.
pub fn compute_cells(image: &RgbImage, kernel: GradientKernel) -> CellGrid {
    let (w, h) = image.dimensions();
    let (w, h) = (w as usize, h as usize);
    let luma = luminance(image);
    let smooth = kernel.smoothing();

    let mut bins = vec![0u8; w * h];
    if w >= 3 && h >= 3 {
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let mut dx = 0.0;
                let mut dy = 0.0;
                for k in 0..3 {
                    // Column difference for dx, row difference for dy.
                    let row = (y + k - 1) * w;
                    dx += smooth[k] * (luma[row + x + 1] - luma[row + x - 1]);
                    let col = x + k - 1;
                    dy += smooth[k] * (luma[(y + 1) * w + col] - luma[(y - 1) * w + col]);
                }
                bins[y * w + x] = direction_bin(dx, dy) as u8;
            }
        }
    }

    let rows = h / CELL_SIZE;
    let cols = w / CELL_SIZE;
    let mut counts = vec![0u32; rows * cols * CELL_NUM];
    for row in 0..rows {
        for col in 0..cols {
            let base = (row * cols + col) * CELL_NUM;
            for py in row * CELL_SIZE..(row + 1) * CELL_SIZE {
                for px in col * CELL_SIZE..(col + 1) * CELL_SIZE {
                    counts[base + bins[py * w + px] as usize] += 1;
                }
            }
        }
    }

    CellGrid { rows, cols, counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{noise_image, solid_image};
    use image::Rgb;

    fn vertical_edge(w: u32, h: u32, split: u32, left: u8, right: u8) -> RgbImage {
        RgbImage::from_fn(w, h, |x, _| {
            let v = if x < split { left } else { right };
            Rgb([v, v, v])
        })
    }

    #[test]
    fn grid_shape_and_cell_sums() {
        let img = noise_image(48, 32, 7);
        let grid = compute_cells(&img, GradientKernel::Prewitt);
        assert_eq!(grid.rows(), 4);
        assert_eq!(grid.cols(), 6);
        for r in 0..grid.rows() {
            for c in 0..grid.cols() {
                let sum: u32 = grid.histogram(r, c).iter().sum();
                assert_eq!(sum as usize, CELL_SIZE * CELL_SIZE);
            }
        }
    }

    #[test]
    fn partial_cells_are_truncated() {
        let img = noise_image(21, 19, 1);
        let grid = compute_cells(&img, GradientKernel::Prewitt);
        assert_eq!((grid.rows(), grid.cols()), (2, 2));
    }

    #[test]
    fn uniform_image_votes_bin_zero() {
        let img = solid_image(32, 24, [90, 120, 30]);
        let grid = compute_cells(&img, GradientKernel::Sobel);
        for r in 0..grid.rows() {
            for c in 0..grid.cols() {
                let hist = grid.histogram(r, c);
                assert_eq!(hist[0], 64);
                assert!(hist[1..].iter().all(|&v| v == 0));
            }
        }
    }

    #[test]
    fn direction_bins_cover_octants() {
        assert_eq!(direction_bin(0.0, 0.0), 0);
        assert_eq!(direction_bin(0.0, 1.0), 0);
        assert_eq!(direction_bin(2.0, 1.0), 1);
        assert_eq!(direction_bin(1.0, 0.0), 2);
        assert_eq!(direction_bin(0.0, -1.0), 4);
        assert_eq!(direction_bin(-1.0, 0.0), 6);
        assert_eq!(direction_bin(-1.0, 2.0), 7);
        assert_eq!(direction_bin(-1e-300, 1.0), 7);
    }

    #[test]
    fn vertical_edge_votes_horizontal_direction() {
        // Dark left half, bright right half: dx > 0, dy == 0.
        let img = vertical_edge(16, 16, 8, 10, 200);
        let grid = compute_cells(&img, GradientKernel::Prewitt);
        // Columns 7 and 8 straddle the edge; rows 1..15 are interior.
        assert_eq!(grid.histogram(0, 0)[2], 7);
        assert_eq!(grid.histogram(0, 1)[2], 7);

        let flipped = vertical_edge(16, 16, 8, 200, 10);
        let grid = compute_cells(&flipped, GradientKernel::Sobel);
        assert_eq!(grid.histogram(1, 0)[6], 7);
    }

    #[test]
    fn horizontal_edge_votes_vertical_direction() {
        let img = RgbImage::from_fn(16, 16, |_, y| {
            let v = if y < 8 { 220 } else { 20 };
            Rgb([v, v, v])
        });
        // Bright above dark: dy < 0, dx == 0 -> direction pi -> bin 4.
        let grid = compute_cells(&img, GradientKernel::Prewitt);
        assert_eq!(grid.histogram(0, 0)[4], 7);
        assert_eq!(grid.histogram(1, 1)[4], 7);
    }

    #[test]
    fn tiny_images_do_not_panic() {
        let grid = compute_cells(&solid_image(2, 2, [1, 2, 3]), GradientKernel::Prewitt);
        assert_eq!((grid.rows(), grid.cols()), (0, 0));
        let grid = compute_cells(&solid_image(0, 0, [0, 0, 0]), GradientKernel::Prewitt);
        assert_eq!((grid.rows(), grid.cols()), (0, 0));
    }

    #[test]
    fn luminance_weights_truncate() {
        let img = RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]));
        assert_eq!(luminance(&img), vec![54.0]);
        let img = RgbImage::from_pixel(1, 1, Rgb([0, 0, 100]));
        assert_eq!(luminance(&img), vec![7.0]);
    }
}
