//! Linear classifier engine.
//!
//! Training goes through the [`ClassifierEngine`] trait; the default engine
//! is [`DualCoordinateDescent`], backed by liblinear. The trained [`LinearModel`] is persisted in
//! liblinear's text format (see [`LinearModel::save`]).

mod model_file;
mod solver;

use std::path::Path;

use crate::error::{Error, Result};

pub use solver::DualCoordinateDescent;

/// Class of a training example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Pedestrian, `+1`.
    Positive,
    /// Background, `-1`.
    Negative,
}

impl Label {
    /// `+1.0` or `-1.0`.
    pub fn sign(self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }

    /// Label assigned to a decision value compared against `bound`.
    pub fn from_score(score: f64, bound: f64) -> Self {
        if score > bound {
            Self::Positive
        } else {
            Self::Negative
        }
    }
}

/// Labeled descriptors handed to the engine.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    features: Vec<Vec<f64>>,
    labels: Vec<Label>,
}

impl TrainingSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one example.
    pub fn push(&mut self, features: Vec<f64>, label: Label) {
        self.features.push(features);
        self.labels.push(label);
    }

    /// Append every example of `other`.
    pub fn extend(&mut self, other: TrainingSet) {
        self.features.extend(other.features);
        self.labels.extend(other.labels);
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// `true` if the set holds no example.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of examples with `label`.
    pub fn count(&self, label: Label) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    /// Descriptor length of the first example.
    pub fn dimension(&self) -> Option<usize> {
        self.features.first().map(Vec::len)
    }

    /// Descriptor of example `index`.
    pub fn features(&self, index: usize) -> &[f64] {
        &self.features[index]
    }

    /// Label of example `index`.
    pub fn label(&self, index: usize) -> Label {
        self.labels[index]
    }

    /// Iterate over `(descriptor, label)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&[f64], Label)> + '_ {
        self.features
            .iter()
            .map(Vec::as_slice)
            .zip(self.labels.iter().copied())
    }

    /// Split into `(train, held_out)` where example `i` is held out when `i % folds == fold`.
    pub fn split_fold(&self, fold: usize, folds: usize) -> (TrainingSet, TrainingSet) {
        let mut train = TrainingSet::new();
        let mut held_out = TrainingSet::new();
        for (i, (x, label)) in self.iter().enumerate() {
            if i % folds == fold {
                held_out.push(x.to_vec(), label);
            } else {
                train.push(x.to_vec(), label);
            }
        }
        (train, held_out)
    }

    /// Check that every example has the same length; returns it.
    fn checked_dimension(&self) -> Result<usize> {
        let n = self.dimension().ok_or(Error::EmptyTrainingSet)?;
        match self.features.iter().find(|x| x.len() != n) {
            Some(x) => Err(Error::dimension_mismatch(n, x.len())),
            None => Ok(n),
        }
    }
}

/// Solver parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SolverParams {
    /// Regularization parameter `C`.
    pub c: f64,
    /// Stopping tolerance on the projected-gradient spread.
    pub eps: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            c: 0.3,
            eps: 1e-4,
        }
    }
}

/// Something that fits a [`LinearModel`] to a [`TrainingSet`].
pub trait ClassifierEngine {
    /// Fit a model. Fails with [`Error::EmptyTrainingSet`] on an empty set.
    fn train(&self, set: &TrainingSet, params: &SolverParams) -> Result<LinearModel>;
}

/// Trained linear decision function `w . x (+ bias weight)`.
///
/// Positive decision values mean [`Label::Positive`].
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    weights: Vec<f64>,
    bias: Option<Bias>,
}

/// Constant feature appended to every descriptor, as liblinear's `bias` option does.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bias {
    value: f64,
    weight: f64,
}

impl LinearModel {
    /// Model with the given weights and no bias term.
    pub fn from_weights(weights: Vec<f64>) -> Self {
        Self {
            weights,
            bias: None,
        }
    }

    /// Number of features the model expects.
    pub fn dimension(&self) -> usize {
        self.weights.len()
    }

    /// Weight vector.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Signed distance-like confidence for `features`.
    pub fn decision_value(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.weights.len() {
            return Err(Error::dimension_mismatch(self.weights.len(), features.len()));
        }
        let dot: f64 = self.weights.iter().zip(features).map(|(w, x)| w * x).sum();
        Ok(dot + self.bias.map_or(0.0, |b| b.value * b.weight))
    }

    /// Class predicted for `features` under threshold `bound`.
    pub fn predict(&self, features: &[f64], bound: f64) -> Result<Label> {
        Ok(Label::from_score(self.decision_value(features)?, bound))
    }

    /// Write the model to `path` in liblinear text format.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, model_file::render(self)).map_err(|e| Error::io(path, e))
    }

    /// Read a model written by [`LinearModel::save`] or by liblinear.
    pub fn load(path: &Path) -> Result<Self> {
        model_file::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn decision_value_checks_dimension() {
        let model = LinearModel::from_weights(vec![1.0, -2.0, 0.5]);
        assert_relative_eq!(model.decision_value(&[1.0, 1.0, 2.0]).unwrap(), 0.0);
        let err = model.decision_value(&[1.0, 1.0]).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn predict_uses_strict_bound() {
        let model = LinearModel::from_weights(vec![1.0]);
        assert_eq!(model.predict(&[0.5], 0.0).unwrap(), Label::Positive);
        assert_eq!(model.predict(&[0.5], 0.5).unwrap(), Label::Negative);
        assert_eq!(model.predict(&[-0.1], -0.5).unwrap(), Label::Positive);
    }

    #[test]
    fn training_set_counts_and_folds() {
        let mut set = TrainingSet::new();
        for i in 0..7 {
            let label = if i % 2 == 0 {
                Label::Positive
            } else {
                Label::Negative
            };
            set.push(vec![i as f64], label);
        }
        assert_eq!(set.len(), 7);
        assert_eq!(set.count(Label::Positive), 4);
        assert_eq!(set.count(Label::Negative), 3);

        let (train, held) = set.split_fold(1, 3);
        assert_eq!(held.len(), 2);
        assert_eq!(train.len(), 5);
        assert_eq!(held.features(0), &[1.0]);
        assert_eq!(held.features(1), &[4.0]);
    }

    #[test]
    fn ragged_set_is_rejected() {
        let mut set = TrainingSet::new();
        set.push(vec![1.0, 2.0], Label::Positive);
        set.push(vec![1.0], Label::Negative);
        assert!(matches!(
            set.checked_dimension(),
            Err(Error::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
        assert!(matches!(
            TrainingSet::new().checked_dimension(),
            Err(Error::EmptyTrainingSet)
        ));
    }
}
