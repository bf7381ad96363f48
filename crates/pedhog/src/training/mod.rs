//! Offline training: sampling, fitting and hard-negative bootstrapping.
//!
//! A training root holds a `positive/` directory of pedestrian crops and a
//! `negative/` directory of pedestrian-free backgrounds. [`Trainer::train`]
//! samples one window per positive and random windows from every background,
//! fits the classifier, then optionally runs bootstrapping rounds that feed
//! the model's own false detections back as hard negatives.

mod bootstrap;
mod cross_validation;
mod sampling;

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::classifier::{ClassifierEngine, Label, LinearModel, SolverParams, TrainingSet};
use crate::detector::DetectConfig;
use crate::error::{Error, Result};
use crate::hog::{FeatureMap, HogConfig};
use crate::window::{BACKGROUND_PER_IMG, BACK_STEP, BOOTSTRAP_BACK_PER_STEP, BOOTSTRAP_TIME};

pub use bootstrap::BootstrapRound;
pub use cross_validation::{CrossValidationReport, FoldReport};
pub use sampling::{
    background_strips, is_image_file, list_images, load_dir, load_image, random_crop,
    sample_negatives, sample_positives, window_crop, window_descriptor, IMAGE_EXTENSIONS,
};

/// Hard-negative bootstrapping settings.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Run bootstrapping after the initial fit.
    pub enable: bool,
    /// Number of mine-and-retrain rounds.
    pub rounds: usize,
    /// Background strips scanned per round.
    pub backgrounds_per_round: usize,
    /// Vertical distance between background strips in pixels.
    pub background_step_px: usize,
    /// Directory receiving every mined example as PNG.
    pub dump_dir: Option<PathBuf>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            enable: false,
            rounds: BOOTSTRAP_TIME,
            backgrounds_per_round: BOOTSTRAP_BACK_PER_STEP,
            background_step_px: BACK_STEP,
            dump_dir: None,
        }
    }
}

/// Training settings.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Solver parameters passed to the engine.
    pub solver: SolverParams,
    /// Negative examples drawn from every background image.
    pub backgrounds_per_image: usize,
    /// Hard-negative bootstrapping.
    pub bootstrap: BootstrapConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            solver: SolverParams::default(),
            backgrounds_per_image: BACKGROUND_PER_IMG,
            bootstrap: BootstrapConfig::default(),
        }
    }
}

/// Decoded images of a training root.
#[derive(Debug, Clone, Default)]
pub struct TrainingData {
    /// Pedestrian crops.
    pub positives: Vec<RgbImage>,
    /// Background images.
    pub negatives: Vec<RgbImage>,
}

impl TrainingData {
    /// Load `root/positive` and `root/negative` recursively.
    ///
    /// Missing directories and undecodable files are skipped with a warning.
    pub fn load(root: &Path) -> Self {
        let positives = load_dir(&root.join("positive"));
        let negatives = load_dir(&root.join("negative"));
        tracing::info!(
            root = %root.display(),
            positives = positives.len(),
            negatives = negatives.len(),
            "loaded training images"
        );
        Self {
            positives,
            negatives,
        }
    }
}

/// Summary of one training run.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrainReport {
    /// Positive examples in the final training set.
    pub positives: usize,
    /// Negative examples in the final training set.
    pub negatives: usize,
    /// Per-round bootstrapping statistics.
    pub bootstrap_rounds: Vec<BootstrapRound>,
}

/// Training orchestrator over borrowed settings and an engine.
pub struct Trainer<'a> {
    hog: &'a HogConfig,
    features: &'a FeatureMap,
    detect: &'a DetectConfig,
    config: &'a TrainConfig,
    engine: &'a dyn ClassifierEngine,
}

impl<'a> Trainer<'a> {
    /// Create a trainer.
    pub fn new(
        hog: &'a HogConfig,
        features: &'a FeatureMap,
        detect: &'a DetectConfig,
        config: &'a TrainConfig,
        engine: &'a dyn ClassifierEngine,
    ) -> Self {
        Self {
            hog,
            features,
            detect,
            config,
            engine,
        }
    }

    /// Sample the initial training set.
    pub fn sample(&self, data: &TrainingData, rng: &mut impl rand::Rng) -> Result<TrainingSet> {
        let mut set = sample_positives(&data.positives, self.hog, self.features)?;
        let negatives = sample_negatives(
            &data.negatives,
            self.config.backgrounds_per_image,
            self.hog,
            self.features,
            rng,
        )?;
        set.extend(negatives);
        tracing::info!(
            positives = set.count(Label::Positive),
            negatives = set.count(Label::Negative),
            "sampled training set"
        );
        Ok(set)
    }

    /// Fit a model on `set`.
    pub fn fit(&self, set: &TrainingSet) -> Result<LinearModel> {
        if set.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }
        self.engine.train(set, &self.config.solver)
    }

    /// Sample, fit and optionally bootstrap.
    pub fn train(
        &self,
        data: &TrainingData,
        rng: &mut impl rand::Rng,
    ) -> Result<(LinearModel, TrainReport)> {
        let set = self.sample(data, rng)?;
        self.train_on(set, data, rng)
    }

    /// Fit on a prepared set, then bootstrap it with `data` if enabled.
    pub fn train_on(
        &self,
        mut set: TrainingSet,
        data: &TrainingData,
        rng: &mut impl rand::Rng,
    ) -> Result<(LinearModel, TrainReport)> {
        let mut model = self.fit(&set)?;
        let mut rounds = Vec::new();

        let boot = &self.config.bootstrap;
        if boot.enable {
            let strips = background_strips(&data.negatives, boot.background_step_px);
            if strips.is_empty() {
                tracing::warn!("no background strips available, skipping bootstrapping");
            } else {
                let miner = bootstrap::Miner::new(self, &strips, &data.positives, boot)?;
                for round in 0..boot.rounds {
                    let stats = miner.run_round(round, &model, &mut set, rng)?;
                    model = self.fit(&set)?;
                    rounds.push(stats);
                }
            }
        }

        let report = TrainReport {
            positives: set.count(Label::Positive),
            negatives: set.count(Label::Negative),
            bootstrap_rounds: rounds,
        };
        Ok((model, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::DualCoordinateDescent;
    use crate::test_utils::{background_image, scene_image, write_training_dir};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn data(positives: usize, negatives: usize) -> TrainingData {
        TrainingData {
            positives: (0..positives)
                .map(|i| scene_image(80, 200, &[0], 100 + i as u64))
                .collect(),
            negatives: (0..negatives)
                .map(|i| background_image(240, 320, 200 + i as u64))
                .collect(),
        }
    }

    #[test]
    fn same_seed_trains_identical_models() {
        let data = data(6, 6);
        let (hog, features, detect, config) = Default::default();
        let engine = DualCoordinateDescent::new(1);
        let trainer = Trainer::new(&hog, &features, &detect, &config, &engine);

        let (a, report) = trainer.train(&data, &mut StdRng::seed_from_u64(5)).unwrap();
        let (b, _) = trainer.train(&data, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
        assert_eq!(report.positives, 6);
        assert_eq!(report.negatives, 6);
        assert!(report.bootstrap_rounds.is_empty());
    }

    #[test]
    fn trained_model_separates_training_windows() {
        let data = data(8, 8);
        let (hog, features, detect, config) = Default::default();
        let engine = DualCoordinateDescent::new(2);
        let trainer = Trainer::new(&hog, &features, &detect, &config, &engine);
        let mut rng = StdRng::seed_from_u64(9);
        let set = trainer.sample(&data, &mut rng).unwrap();
        let model = trainer.fit(&set).unwrap();
        for (x, label) in set.iter() {
            assert_eq!(model.predict(x, 0.0).unwrap(), label);
        }
    }

    #[test]
    fn empty_root_is_an_empty_training_set() {
        let dir = tempfile::tempdir().unwrap();
        let data = TrainingData::load(dir.path());
        let (hog, features, detect, config) = Default::default();
        let engine = DualCoordinateDescent::default();
        let trainer = Trainer::new(&hog, &features, &detect, &config, &engine);
        let err = trainer
            .train(&data, &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, Error::EmptyTrainingSet));
    }

    #[test]
    fn loads_training_root_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        write_training_dir(dir.path(), 4, 3, 1);
        let data = TrainingData::load(dir.path());
        assert_eq!(data.positives.len(), 4);
        assert_eq!(data.negatives.len(), 3);
    }

    #[test]
    fn bootstrap_rounds_are_recorded() {
        let data = data(5, 4);
        let (hog, features, detect): (HogConfig, FeatureMap, DetectConfig) = Default::default();
        let config = TrainConfig {
            bootstrap: BootstrapConfig {
                enable: true,
                rounds: 2,
                backgrounds_per_round: 3,
                ..BootstrapConfig::default()
            },
            ..TrainConfig::default()
        };
        let engine = DualCoordinateDescent::new(4);
        let trainer = Trainer::new(&hog, &features, &detect, &config, &engine);
        let (_, report) = trainer.train(&data, &mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(report.bootstrap_rounds.len(), 2);
        let added: usize = report
            .bootstrap_rounds
            .iter()
            .map(|r| r.hard_negatives + r.confirmed_positives + r.balancing)
            .sum();
        assert_eq!(report.positives + report.negatives, 9 + added);
    }
}
