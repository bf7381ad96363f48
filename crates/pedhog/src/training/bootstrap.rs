//! Bootstrapping rounds: false detections become new training examples.

use std::path::{Path, PathBuf};

use image::RgbImage;

use super::sampling::{random_crop, window_crop, window_descriptor};
use super::{BootstrapConfig, Trainer};
use crate::classifier::{Label, LinearModel, TrainingSet};
use crate::detector::detect;
use crate::error::{Error, Result};

/// Statistics of one bootstrapping round.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BootstrapRound {
    /// 0-based round index.
    pub round: usize,
    /// False detections on background strips added as negatives.
    pub hard_negatives: usize,
    /// Positive images the model detected, added again as positives.
    pub confirmed_positives: usize,
    /// Examples added to even out the two counts above.
    pub balancing: usize,
    /// Class of the balancing examples.
    pub balancing_label: Option<Label>,
}

pub(super) struct Miner<'t, 'a> {
    trainer: &'t Trainer<'a>,
    strips: &'t [RgbImage],
    positives: &'t [RgbImage],
    backgrounds_per_round: usize,
    dump_dir: Option<&'t Path>,
}

impl<'t, 'a> Miner<'t, 'a> {
    pub(super) fn new(
        trainer: &'t Trainer<'a>,
        strips: &'t [RgbImage],
        positives: &'t [RgbImage],
        config: &'t BootstrapConfig,
    ) -> Result<Self> {
        let dump_dir = config.dump_dir.as_deref();
        if let Some(dir) = dump_dir {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        Ok(Self {
            trainer,
            strips,
            positives,
            backgrounds_per_round: config.backgrounds_per_round,
            dump_dir,
        })
    }

    fn dump(&self, image: &RgbImage, name: String) -> Result<()> {
        let Some(dir) = self.dump_dir else {
            return Ok(());
        };
        let path: PathBuf = dir.join(name);
        tracing::debug!(path = %path.display(), "saving mined example");
        image.save(&path).map_err(|e| Error::image(&path, e))
    }

    fn descriptor(&self, image: &RgbImage) -> Result<Option<Vec<f64>>> {
        window_descriptor(image, self.trainer.hog, self.trainer.features)
    }

    /// Mine examples with `model` and append them to `set`.
    pub(super) fn run_round(
        &self,
        round: usize,
        model: &LinearModel,
        set: &mut TrainingSet,
        rng: &mut impl rand::Rng,
    ) -> Result<BootstrapRound> {
        let t = self.trainer;
        let mut hard_negatives = 0;
        for draw in 0..self.backgrounds_per_round {
            let strip = &self.strips[rng.gen_range(0..self.strips.len())];
            let found = detect(strip, model, t.hog, t.features, t.detect)?;
            for (k, det) in found.iter().enumerate() {
                let crop = window_crop(strip, det.x);
                self.dump(&crop, format!("{round}_{draw}_{k}_back.png"))?;
                if let Some(d) = self.descriptor(&crop)? {
                    set.push(d, Label::Negative);
                    hard_negatives += 1;
                }
            }
        }

        let mut confirmed_positives = 0;
        for (index, image) in self.positives.iter().enumerate() {
            let found = detect(image, model, t.hog, t.features, t.detect)?;
            if found.is_empty() {
                continue;
            }
            if let Some(d) = self.descriptor(image)? {
                self.dump(image, format!("{round}_{index}_0_ped.png"))?;
                set.push(d, Label::Positive);
                confirmed_positives += 1;
            }
        }

        let (balancing_label, missing) = if confirmed_positives > hard_negatives {
            (Label::Negative, confirmed_positives - hard_negatives)
        } else {
            (Label::Positive, hard_negatives - confirmed_positives)
        };
        let mut balancing = 0;
        for _ in 0..missing {
            let example = match balancing_label {
                Label::Negative => {
                    let strip = &self.strips[rng.gen_range(0..self.strips.len())];
                    match random_crop(strip, rng) {
                        Some(crop) => self.descriptor(&crop)?,
                        None => None,
                    }
                }
                Label::Positive if !self.positives.is_empty() => {
                    let image = &self.positives[rng.gen_range(0..self.positives.len())];
                    self.descriptor(image)?
                }
                Label::Positive => None,
            };
            if let Some(d) = example {
                set.push(d, balancing_label);
                balancing += 1;
            }
        }
        if balancing < missing {
            tracing::warn!(round, missing, added = balancing, "could not fully balance classes");
        }

        tracing::info!(
            round,
            hard_negatives,
            confirmed_positives,
            balancing,
            "bootstrapping round"
        );
        Ok(BootstrapRound {
            round,
            hard_negatives,
            confirmed_positives,
            balancing,
            balancing_label: (balancing > 0).then_some(balancing_label),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::DualCoordinateDescent;
    use crate::detector::DetectConfig;
    use crate::hog::{FeatureMap, HogConfig};
    use crate::test_utils::{background_image, pedestrian_image, scene_image};
    use crate::training::TrainConfig;
    use crate::window::DESCRIPTOR_LEN;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn every_background_detection_becomes_a_dumped_negative() {
        let dir = tempfile::tempdir().unwrap();
        let config = BootstrapConfig {
            enable: true,
            rounds: 1,
            backgrounds_per_round: 2,
            dump_dir: Some(dir.path().join("mined")),
            ..BootstrapConfig::default()
        };
        let (hog, features, detect, train): (HogConfig, FeatureMap, DetectConfig, TrainConfig) =
            Default::default();
        let engine = DualCoordinateDescent::default();
        let trainer = Trainer::new(&hog, &features, &detect, &train, &engine);

        let strips = vec![background_image(400, 200, 1)];
        let positives = vec![pedestrian_image(80, 200), scene_image(200, 200, &[0], 3)];
        let miner = Miner::new(&trainer, &strips, &positives, &config).unwrap();

        // Accepts every window: each strip yields suppressed peaks.
        let model = LinearModel::from_weights(vec![1.0; DESCRIPTOR_LEN]);
        let mut set = TrainingSet::new();
        let stats = miner
            .run_round(0, &model, &mut set, &mut StdRng::seed_from_u64(1))
            .unwrap();

        assert!(stats.hard_negatives > 0);
        // Only the 200 px wide positive has windows to detect.
        assert_eq!(stats.confirmed_positives, 1);
        assert_eq!(stats.balancing, stats.hard_negatives - 1);
        assert_eq!(stats.balancing_label, Some(Label::Positive));
        assert_eq!(set.count(Label::Negative), stats.hard_negatives);
        assert_eq!(set.count(Label::Positive), stats.hard_negatives);

        let dumped = std::fs::read_dir(dir.path().join("mined")).unwrap().count();
        assert_eq!(dumped, stats.hard_negatives + 1);
        assert!(dir.path().join("mined/0_1_0_ped.png").exists());
        assert!(dir.path().join("mined/0_0_0_back.png").exists());
    }

    #[test]
    fn rejecting_model_mines_nothing() {
        let config = BootstrapConfig::default();
        let (hog, features, detect, train): (HogConfig, FeatureMap, DetectConfig, TrainConfig) =
            Default::default();
        let engine = DualCoordinateDescent::default();
        let trainer = Trainer::new(&hog, &features, &detect, &train, &engine);
        let strips = vec![background_image(300, 200, 2)];
        let miner = Miner::new(&trainer, &strips, &[], &config).unwrap();
        let model = LinearModel::from_weights(vec![-1.0; DESCRIPTOR_LEN]);
        let mut set = TrainingSet::new();
        let stats = miner
            .run_round(3, &model, &mut set, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(stats.round, 3);
        assert_eq!(stats.hard_negatives + stats.balancing, 0);
        assert!(set.is_empty());
    }
}
