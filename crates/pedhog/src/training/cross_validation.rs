//! K-fold cross-validation of the training pipeline.

use super::{Trainer, TrainingData};
use crate::error::{Error, Result};

/// Outcome of one held-out fold.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FoldReport {
    /// 0-based fold index.
    pub fold: usize,
    /// Examples the fold's model was fitted on, before bootstrapping.
    pub train_examples: usize,
    /// Examples held out.
    pub held_out: usize,
    /// Misclassified held-out examples.
    pub errors: usize,
}

/// Cross-validation summary.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CrossValidationReport {
    /// Per-fold results.
    pub folds: Vec<FoldReport>,
    /// Misclassified examples over all folds.
    pub errors: usize,
    /// Examples evaluated over all folds.
    pub total: usize,
    /// `1 - errors / total`.
    pub accuracy: f64,
}

impl Trainer<'_> {
    /// `k`-fold cross-validation over one sampling of `data`.
    ///
    /// Example `i` is held out in fold `i % k`. Each fold is fitted on the
    /// other folds (bootstrapped when enabled) and scored on its held-out
    /// examples with the detection bound.
    pub fn cross_validate(
        &self,
        data: &TrainingData,
        k: usize,
        rng: &mut impl rand::Rng,
    ) -> Result<CrossValidationReport> {
        if k < 2 {
            return Err(Error::Config(format!(
                "cross-validation needs at least 2 folds, got {k}"
            )));
        }
        let all = self.sample(data, rng)?;
        if all.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }

        let mut folds = Vec::with_capacity(k);
        for fold in 0..k {
            let (train, held_out) = all.split_fold(fold, k);
            let train_examples = train.len();
            let (model, _) = self.train_on(train, data, rng)?;
            let mut errors = 0;
            for (x, label) in held_out.iter() {
                if model.predict(x, self.detect.bound)? != label {
                    errors += 1;
                }
            }
            tracing::info!(fold, train_examples, held_out = held_out.len(), errors, "cross-validation fold");
            folds.push(FoldReport {
                fold,
                train_examples,
                held_out: held_out.len(),
                errors,
            });
        }

        let errors: usize = folds.iter().map(|f| f.errors).sum();
        let total: usize = folds.iter().map(|f| f.held_out).sum();
        let accuracy = if total == 0 {
            0.0
        } else {
            1.0 - errors as f64 / total as f64
        };
        tracing::info!(errors, total, accuracy, "cross-validation finished");
        Ok(CrossValidationReport {
            folds,
            errors,
            total,
            accuracy,
        })
    }
}
