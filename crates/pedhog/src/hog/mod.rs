//! Histogram-of-oriented-gradients features.
//!
//! [`cells`] builds the per-cell orientation histograms of an image,
//! [`descriptor`] assembles the block-normalized window descriptor and
//! [`kernel_map`] optionally expands it into a chi-squared feature space.

pub(crate) mod cells;
pub(crate) mod descriptor;
pub(crate) mod kernel_map;

pub use cells::{compute_cells, direction_bin, luminance, CellGrid, GradientKernel, HogConfig};
pub use descriptor::{compute_descriptor, window_fits, FeatureMap};
pub use kernel_map::KernelMap;
