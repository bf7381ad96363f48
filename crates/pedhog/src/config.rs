//! Session configuration, loadable from JSON.
//!
//! Every section has defaults, so a JSON file only needs the fields it changes:
//!
//! ```json
//! {
//!   "features": { "kind": "chi2", "order": 1, "period": 0.27 },
//!   "detect": { "bound": 0.2 },
//!   "train": { "bootstrap": { "enable": true, "rounds": 10 } },
//!   "seed": 42
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::detector::DetectConfig;
use crate::error::{Error, Result};
use crate::hog::{FeatureMap, HogConfig};
use crate::training::TrainConfig;
use crate::window::CV_TIME;

/// File locations used by session operations.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SessionPaths {
    /// Training root (with `positive/` and `negative/`) or directory to classify.
    pub data_dir: PathBuf,
    /// Classifier model file.
    pub model: PathBuf,
    /// Predicted annotation file, written by classification.
    pub predictions: PathBuf,
    /// Ground-truth annotation file.
    pub truth: PathBuf,
}

impl Default for SessionPaths {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("train"),
            model: PathBuf::from("model.txt"),
            predictions: PathBuf::from("predicted.txt"),
            truth: PathBuf::from("truth.idl"),
        }
    }
}

/// Complete configuration of a [`crate::Session`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Cell-histogram settings.
    pub hog: HogConfig,
    /// Feature space of descriptors.
    pub features: FeatureMap,
    /// Sliding-window detection.
    pub detect: DetectConfig,
    /// Training and bootstrapping.
    pub train: TrainConfig,
    /// Number of cross-validation folds.
    pub cross_validation_folds: usize,
    /// Seed of the session random source; `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// File locations.
    pub paths: SessionPaths,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hog: HogConfig::default(),
            features: FeatureMap::default(),
            detect: DetectConfig::default(),
            train: TrainConfig::default(),
            cross_validation_folds: CV_TIME,
            seed: None,
            paths: SessionPaths::default(),
        }
    }
}

impl SessionConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_str(&data)
    }

    /// Parse and validate a configuration from JSON text.
    pub fn from_json_str(data: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        validate_config(self).map_err(Error::Config)
    }
}

fn validate_config(config: &SessionConfig) -> std::result::Result<(), String> {
    let solver = &config.train.solver;
    if !solver.c.is_finite() || solver.c <= 0.0 {
        return Err("train.solver.c must be finite and > 0".to_string());
    }
    if !solver.eps.is_finite() || solver.eps <= 0.0 {
        return Err("train.solver.eps must be finite and > 0".to_string());
    }

    if let FeatureMap::Chi2(map) = &config.features {
        if !map.period.is_finite() || map.period <= 0.0 {
            return Err("features.period must be finite and > 0".to_string());
        }
    }

    if !config.detect.bound.is_finite() {
        return Err("detect.bound must be finite".to_string());
    }

    let boot = &config.train.bootstrap;
    if boot.background_step_px == 0 {
        return Err("train.bootstrap.background_step_px must be >= 1".to_string());
    }
    if boot.enable && boot.backgrounds_per_round == 0 {
        return Err("train.bootstrap.backgrounds_per_round must be >= 1".to_string());
    }

    if config.cross_validation_folds < 2 {
        return Err(format!(
            "cross_validation_folds must be >= 2, got {}",
            config.cross_validation_folds
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hog::{GradientKernel, KernelMap};

    #[test]
    fn defaults_match_reference_constants() {
        let config = SessionConfig::default();
        assert_eq!(config.detect.bound, 0.0);
        assert_eq!(config.train.solver.c, 0.3);
        assert_eq!(config.train.solver.eps, 1e-4);
        assert_eq!(config.train.backgrounds_per_image, 1);
        assert_eq!(config.train.bootstrap.rounds, 25);
        assert_eq!(config.train.bootstrap.backgrounds_per_round, 100);
        assert_eq!(config.train.bootstrap.background_step_px, 60);
        assert_eq!(config.cross_validation_folds, 5);
        assert!(config.features.is_linear());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = SessionConfig::from_json_str(
            r#"{
                "hog": { "gradient_kernel": "sobel" },
                "features": { "kind": "chi2", "order": 2, "period": 0.5 },
                "train": { "bootstrap": { "enable": true, "rounds": 3 } },
                "seed": 7
            }"#,
        )
        .unwrap();
        assert_eq!(config.hog.gradient_kernel, GradientKernel::Sobel);
        assert_eq!(
            config.features,
            FeatureMap::Chi2(KernelMap {
                order: 2,
                period: 0.5
            })
        );
        assert!(config.train.bootstrap.enable);
        assert_eq!(config.train.bootstrap.rounds, 3);
        assert_eq!(config.train.bootstrap.backgrounds_per_round, 100);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.paths.model, PathBuf::from("model.txt"));
    }

    #[test]
    fn rejects_unknown_top_level_fields() {
        let err = SessionConfig::from_json_str(r#"{ "bound": 0.5 }"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = SessionConfig::from_json_str(r#"{ "train": { "solver": { "c": -1 } } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("train.solver.c"), "{err}");

        let err = SessionConfig::from_json_str(r#"{ "cross_validation_folds": 1 }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = SessionConfig::from_json_str(
            r#"{ "features": { "kind": "chi2", "order": 1, "period": 0 } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("features.period"));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{ "detect": { "bound": -0.25 } }"#).unwrap();
        let config = SessionConfig::from_json_file(&path).unwrap();
        assert_eq!(config.detect.bound, -0.25);

        let err = SessionConfig::from_json_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
