//! High-level session API.
//!
//! [`Session`] owns the configuration, the single live classifier, the last
//! quality metrics and the random source. Every front end drives the crate
//! through it.

use std::path::Path;

use image::RgbImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::classifier::{ClassifierEngine, DualCoordinateDescent, LinearModel};
use crate::config::SessionConfig;
use crate::detector::{detect, Detection};
use crate::draw::draw_detections;
use crate::error::{Error, Result};
use crate::eval::{evaluate, AnnotationSet, QualityMetrics};
use crate::hog::FeatureMap;
use crate::training::{
    list_images, load_image, CrossValidationReport, TrainReport, Trainer, TrainingData,
};
use crate::window::match_tolerance_px;

/// Detections of one image together with the marked-up copy.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Input image with a green outline around every detection.
    pub image: RgbImage,
    /// Detections in suppression order.
    pub detections: Vec<Detection>,
}

/// Detection / training session.
///
/// # Examples
///
/// ```no_run
/// use pedhog::{Session, SessionConfig};
/// use std::path::Path;
///
/// let mut session = Session::new(SessionConfig::default());
/// session.set_model_path("model.txt");
/// session.load_model().unwrap();
/// let scan = session.scan_image(Path::new("street.png")).unwrap();
/// println!("found {} pedestrians", scan.detections.len());
/// ```
pub struct Session {
    config: SessionConfig,
    classifier: Option<LinearModel>,
    metrics: QualityMetrics,
    rng: StdRng,
    engine: Box<dyn ClassifierEngine>,
}

impl Session {
    /// Create a session with the default engine.
    ///
    /// The random source is seeded from `config.seed`, or from OS entropy when unset.
    pub fn new(config: SessionConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let engine = DualCoordinateDescent::new(rng.gen());
        Self::with_parts(config, rng, Box::new(engine))
    }

    /// Create a session with a custom classifier engine.
    pub fn with_engine(config: SessionConfig, engine: Box<dyn ClassifierEngine>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_parts(config, rng, engine)
    }

    fn with_parts(config: SessionConfig, rng: StdRng, engine: Box<dyn ClassifierEngine>) -> Self {
        Self {
            config,
            classifier: None,
            metrics: QualityMetrics::default(),
            rng,
            engine,
        }
    }

    /// Access the current configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Mutable access to configuration.
    pub fn config_mut(&mut self) -> &mut SessionConfig {
        &mut self.config
    }

    /// Set the training root / directory to classify.
    pub fn set_data_dir(&mut self, path: impl AsRef<Path>) {
        self.config.paths.data_dir = path.as_ref().to_path_buf();
    }

    /// Set the model file path.
    pub fn set_model_path(&mut self, path: impl AsRef<Path>) {
        self.config.paths.model = path.as_ref().to_path_buf();
    }

    /// Set the predicted annotation file path.
    pub fn set_predictions_path(&mut self, path: impl AsRef<Path>) {
        self.config.paths.predictions = path.as_ref().to_path_buf();
    }

    /// Set the ground-truth annotation file path.
    pub fn set_truth_path(&mut self, path: impl AsRef<Path>) {
        self.config.paths.truth = path.as_ref().to_path_buf();
    }

    /// Switch between linear features and the default chi-squared kernel map.
    pub fn set_use_kernel(&mut self, use_kernel: bool) {
        self.config.features = if use_kernel {
            FeatureMap::chi2()
        } else {
            FeatureMap::Linear
        };
    }

    /// Set the detection confidence bound.
    pub fn set_bound(&mut self, bound: f64) {
        self.config.detect.bound = bound;
    }

    /// Enable or disable hard-negative bootstrapping.
    pub fn set_bootstrap(&mut self, enable: bool) {
        self.config.train.bootstrap.enable = enable;
    }

    /// The live classifier, if any.
    pub fn classifier(&self) -> Option<&LinearModel> {
        self.classifier.as_ref()
    }

    /// Replace the live classifier.
    pub fn set_classifier(&mut self, model: LinearModel) {
        self.classifier = Some(model);
    }

    /// Metrics of the last successful [`Session::estimate_quality`].
    pub fn metrics(&self) -> &QualityMetrics {
        &self.metrics
    }

    /// Last precision.
    pub fn precision(&self) -> f64 {
        self.metrics.precision
    }

    /// Last recall.
    pub fn recall(&self) -> f64 {
        self.metrics.recall
    }

    /// Last F-score.
    pub fn f_score(&self) -> f64 {
        self.metrics.f_score
    }

    fn require_classifier(&self) -> Result<&LinearModel> {
        self.classifier.as_ref().ok_or(Error::NoClassifier)
    }

    /// Train a classifier from the data directory.
    ///
    /// On failure the previous classifier stays live.
    pub fn train(&mut self) -> Result<TrainReport> {
        let data = TrainingData::load(&self.config.paths.data_dir);
        let trainer = Trainer::new(
            &self.config.hog,
            &self.config.features,
            &self.config.detect,
            &self.config.train,
            self.engine.as_ref(),
        );
        let (model, report) = trainer.train(&data, &mut self.rng)?;
        self.classifier = Some(model);
        Ok(report)
    }

    /// Cross-validate on the data directory. The live classifier is untouched.
    pub fn cross_validate(&mut self) -> Result<CrossValidationReport> {
        let data = TrainingData::load(&self.config.paths.data_dir);
        let trainer = Trainer::new(
            &self.config.hog,
            &self.config.features,
            &self.config.detect,
            &self.config.train,
            self.engine.as_ref(),
        );
        trainer.cross_validate(&data, self.config.cross_validation_folds, &mut self.rng)
    }

    /// Save the live classifier to the model path.
    pub fn save_model(&self) -> Result<()> {
        let model = self.require_classifier()?;
        model.save(&self.config.paths.model)?;
        tracing::info!(path = %self.config.paths.model.display(), "saved model");
        Ok(())
    }

    /// Load the classifier from the model path, replacing the live one.
    pub fn load_model(&mut self) -> Result<()> {
        let model = LinearModel::load(&self.config.paths.model)?;
        let expected = self.config.features.descriptor_len();
        if model.dimension() != expected {
            tracing::warn!(
                model_features = model.dimension(),
                descriptor_len = expected,
                "model dimension does not match the configured feature map"
            );
        }
        tracing::info!(
            path = %self.config.paths.model.display(),
            features = model.dimension(),
            "loaded model"
        );
        self.classifier = Some(model);
        Ok(())
    }

    /// Detect pedestrians in a decoded image.
    pub fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>> {
        let model = self.require_classifier()?;
        detect(
            image,
            model,
            &self.config.hog,
            &self.config.features,
            &self.config.detect,
        )
    }

    /// Classify every image directly inside the data directory and write the
    /// predicted annotation file.
    ///
    /// Images are visited in file-name order; each detection becomes a
    /// `<stem> <x> 0 80 200` line. Undecodable images are skipped.
    pub fn classify_directory(&self) -> Result<AnnotationSet> {
        self.require_classifier()?;
        let dir = &self.config.paths.data_dir;
        let paths = list_images(dir, false)?;
        let mut predictions = AnnotationSet::new();
        for (i, path) in paths.iter().enumerate() {
            let image = match load_image(path) {
                Ok(image) => image,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping image");
                    continue;
                }
            };
            let key = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let detections = self.detect(&image)?;
            tracing::debug!(index = i, total = paths.len(), key = %key, found = detections.len(), "classified");
            for det in detections {
                predictions.insert(key.clone(), det.x as i64);
            }
        }
        predictions.write_file(&self.config.paths.predictions)?;
        tracing::info!(
            images = paths.len(),
            detections = predictions.total(),
            out = %self.config.paths.predictions.display(),
            "classified directory"
        );
        Ok(predictions)
    }

    /// Compare the predicted annotation file against the ground truth.
    ///
    /// Stored metrics are replaced only on success.
    pub fn estimate_quality(&mut self) -> Result<QualityMetrics> {
        let predicted = AnnotationSet::read_file(&self.config.paths.predictions)?;
        let truth = AnnotationSet::read_file(&self.config.paths.truth)?;
        let metrics = evaluate(&predicted, &truth, match_tolerance_px());
        tracing::info!(
            tp = metrics.tp,
            tp_distinct = metrics.tp_distinct,
            total_predicted = metrics.total_predicted,
            total_truth = metrics.total_truth,
            precision = metrics.precision,
            recall = metrics.recall,
            f_score = metrics.f_score,
            "estimated quality"
        );
        self.metrics = metrics;
        Ok(metrics)
    }

    /// Detect pedestrians in one image file and outline them.
    pub fn scan_image(&self, path: &Path) -> Result<ScanResult> {
        let mut image = load_image(path)?;
        let detections = self.detect(&image)?;
        draw_detections(&mut image, &detections);
        Ok(ScanResult { image, detections })
    }
}
