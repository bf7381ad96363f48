//! Block-normalized window descriptor.
//!
//! Emission order is block row, block column, cell row within the block,
//! cell column within the block, then bin. The classifier weights are
//! positional, so training and detection must share this order.

use super::cells::CellGrid;
use super::kernel_map::KernelMap;
use crate::error::{Error, Result};
use crate::window::{
    BLOCKS_HIGH, BLOCKS_WIDE, BLOCK_SIZE, CELL_NUM, DESCRIPTOR_LEN, WIN_HEIGHT_CELL,
    WIN_WIDTH_CELL,
};

/// Feature space handed to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureMap {
    /// Raw normalized histogram values.
    #[default]
    Linear,
    /// Every value expanded through a chi-squared kernel map.
    Chi2(KernelMap),
}

impl FeatureMap {
    /// Kernel map with default parameters.
    pub fn chi2() -> Self {
        Self::Chi2(KernelMap::default())
    }

    /// Returns `true` for the plain linear feature space.
    pub fn is_linear(&self) -> bool {
        matches!(self, Self::Linear)
    }

    /// Components emitted per normalized histogram value.
    pub fn expansion(&self) -> usize {
        match self {
            Self::Linear => 1,
            Self::Chi2(map) => map.expansion(),
        }
    }

    /// Descriptor length in this feature space.
    pub fn descriptor_len(&self) -> usize {
        DESCRIPTOR_LEN * self.expansion()
    }

    fn push(&self, value: f64, out: &mut Vec<f64>) {
        match self {
            Self::Linear => out.push(value),
            Self::Chi2(map) => map.expand_into(value, out),
        }
    }
}

/// Check that a window starting at cell column `offset` fits in `grid`.
pub fn window_fits(grid: &CellGrid, offset: usize) -> bool {
    grid.rows() >= WIN_HEIGHT_CELL && offset + WIN_WIDTH_CELL <= grid.cols()
}

/// Descriptor of the window whose left edge is at cell column `offset`.
///
/// The window is anchored at the top cell row.
pub fn compute_descriptor(grid: &CellGrid, offset: usize, features: &FeatureMap) -> Result<Vec<f64>> {
    if !window_fits(grid, offset) {
        return Err(Error::WindowOutOfBounds {
            offset,
            needed_cols: WIN_WIDTH_CELL,
            needed_rows: WIN_HEIGHT_CELL,
            cols: grid.cols(),
            rows: grid.rows(),
        });
    }

    let mut descriptor = Vec::with_capacity(features.descriptor_len());
    for by in 0..BLOCKS_HIGH {
        for bx in 0..BLOCKS_WIDE {
            let mut block_sum = [0u32; CELL_NUM];
            for i in 0..BLOCK_SIZE {
                for j in 0..BLOCK_SIZE {
                    let hist = grid.histogram(by + i, offset + bx + j);
                    for (acc, &v) in block_sum.iter_mut().zip(hist) {
                        *acc += v;
                    }
                }
            }
            for i in 0..BLOCK_SIZE {
                for j in 0..BLOCK_SIZE {
                    let hist = grid.histogram(by + i, offset + bx + j);
                    for (&v, &sum) in hist.iter().zip(&block_sum) {
                        let value = if sum == 0 { 0.0 } else { v as f64 / sum as f64 };
                        features.push(value, &mut descriptor);
                    }
                }
            }
        }
    }

    debug_assert_eq!(descriptor.len(), features.descriptor_len());
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hog::cells::{compute_cells, GradientKernel};
    use crate::test_utils::{noise_image, pedestrian_image, solid_image};

    #[test]
    fn solid_window_descriptor() {
        let img = solid_image(80, 200, [128, 128, 128]);
        let grid = compute_cells(&img, GradientKernel::Prewitt);
        let d = compute_descriptor(&grid, 0, &FeatureMap::Linear).unwrap();
        assert_eq!(d.len(), 24 * 9 * 4 * 8);
        for (i, &v) in d.iter().enumerate() {
            // Every pixel votes bin 0: each cell holds a quarter of its block.
            let expected = if i % CELL_NUM == 0 { 0.25 } else { 0.0 };
            assert_eq!(v, expected, "component {i}");
        }
    }

    #[test]
    fn length_depends_only_on_geometry() {
        let a = compute_cells(&noise_image(120, 208, 3), GradientKernel::Prewitt);
        let b = compute_cells(&pedestrian_image(80, 200), GradientKernel::Sobel);
        for features in [FeatureMap::Linear, FeatureMap::chi2()] {
            let da = compute_descriptor(&a, 3, &features).unwrap();
            let db = compute_descriptor(&b, 0, &features).unwrap();
            assert_eq!(da.len(), features.descriptor_len());
            assert_eq!(db.len(), features.descriptor_len());
        }
        assert_eq!(FeatureMap::chi2().descriptor_len(), 6912 * 6);
    }

    #[test]
    fn descriptor_is_deterministic() {
        let grid = compute_cells(&noise_image(160, 200, 11), GradientKernel::Prewitt);
        let first = compute_descriptor(&grid, 5, &FeatureMap::chi2()).unwrap();
        let second = compute_descriptor(&grid, 5, &FeatureMap::chi2()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn block_values_are_shares_of_block_sum() {
        let grid = compute_cells(&noise_image(80, 200, 5), GradientKernel::Prewitt);
        let d = compute_descriptor(&grid, 0, &FeatureMap::Linear).unwrap();
        let block_len = BLOCK_SIZE * BLOCK_SIZE * CELL_NUM;
        for block in d.chunks(block_len) {
            for bin in 0..CELL_NUM {
                let total: f64 = (0..BLOCK_SIZE * BLOCK_SIZE)
                    .map(|cell| block[cell * CELL_NUM + bin])
                    .sum();
                assert!(total == 0.0 || (total - 1.0).abs() < 1e-12, "bin {bin}: {total}");
            }
        }
    }

    #[test]
    fn offset_selects_shifted_cells() {
        let grid = compute_cells(&noise_image(160, 200, 9), GradientKernel::Prewitt);
        let shifted = compute_descriptor(&grid, 2, &FeatureMap::Linear).unwrap();
        // First block of the shifted window equals the third block of the unshifted one.
        let base = compute_descriptor(&grid, 0, &FeatureMap::Linear).unwrap();
        let block_len = BLOCK_SIZE * BLOCK_SIZE * CELL_NUM;
        assert_eq!(shifted[..block_len], base[2 * block_len..3 * block_len]);
    }

    #[test]
    fn window_outside_grid_is_rejected() {
        let grid = compute_cells(&noise_image(96, 200, 2), GradientKernel::Prewitt);
        assert!(compute_descriptor(&grid, 2, &FeatureMap::Linear).is_ok());
        let err = compute_descriptor(&grid, 3, &FeatureMap::Linear).unwrap_err();
        assert!(matches!(err, Error::WindowOutOfBounds { offset: 3, .. }));

        let short = compute_cells(&noise_image(80, 192, 2), GradientKernel::Prewitt);
        assert!(compute_descriptor(&short, 0, &FeatureMap::Linear).is_err());
    }

    #[test]
    fn feature_map_serde_shape() {
        let json = serde_json::to_string(&FeatureMap::chi2()).unwrap();
        assert_eq!(json, r#"{"kind":"chi2","order":1,"period":0.27}"#);
        let parsed: FeatureMap = serde_json::from_str(r#"{"kind":"linear"}"#).unwrap();
        assert!(parsed.is_linear());
    }
}
