//! liblinear-backed training engine.
//!
//! Fits liblinear's `L2R_L2LOSS_SVC_DUAL` solver (L2-regularized L2-loss SVC
//! solved in the dual by coordinate descent) without a bias term, then reads
//! the weight vector back out of the native model.

use std::sync::{Mutex, PoisonError};

use liblinear::util::TrainingInput;
use liblinear::{Builder, LibLinearModel, SolverType};

use super::{ClassifierEngine, LinearModel, SolverParams, TrainingSet};
use crate::error::{Error, Result};

/// liblinear shuffles coordinates with the process-wide C `rand()`; seeding
/// and training happen under this lock so a seed fixes the shuffle.
static SOLVER_LOCK: Mutex<()> = Mutex::new(());

/// Default training engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DualCoordinateDescent {
    seed: u64,
}

impl DualCoordinateDescent {
    /// Engine whose coordinate order is drawn from `seed`.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

fn validate(params: &SolverParams) -> Result<()> {
    if !(params.c > 0.0 && params.c.is_finite()) {
        return Err(Error::Config(format!("solver c must be positive, got {}", params.c)));
    }
    if !(params.eps > 0.0 && params.eps.is_finite()) {
        return Err(Error::Config(format!(
            "solver eps must be positive, got {}",
            params.eps
        )));
    }
    Ok(())
}

/// First `n` weights of a two-class native model, oriented so that positive
/// decision values mean label `+1`. Also returns the orientation sign.
pub(super) fn oriented_weights(native: &impl LibLinearModel, n: usize) -> Result<(Vec<f64>, f64)> {
    let sign = match native.labels().first() {
        Some(&label) if label < 0 => -1.0,
        _ => 1.0,
    };
    let last = i32::try_from(n)
        .map_err(|_| Error::Solver(format!("{n} features exceed liblinear's index range")))?;
    // liblinear feature indices are 1-based.
    let weights = (1..=last)
        .map(|index| sign * native.feature_coefficient(index, 0))
        .collect();
    Ok((weights, sign))
}

impl ClassifierEngine for DualCoordinateDescent {
    fn train(&self, set: &TrainingSet, params: &SolverParams) -> Result<LinearModel> {
        validate(params)?;
        let n = set.checked_dimension()?;

        let labels: Vec<f64> = set.iter().map(|(_, label)| label.sign()).collect();
        let features: Vec<Vec<f64>> = set.iter().map(|(x, _)| x.to_vec()).collect();
        let input = TrainingInput::from_dense_features(labels, features)
            .map_err(|e| Error::Solver(e.to_string()))?;

        let mut builder = Builder::new();
        builder.problem().input_data(input).bias(-1.0);
        builder
            .parameters()
            .solver_type(SolverType::L2R_L2LOSS_SVC_DUAL)
            .stopping_criterion(params.eps)
            .constraints_violation_cost(params.c);

        let native = {
            let _guard = SOLVER_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            // SAFETY: srand only writes libc's generator state; every liblinear
            // fit in this process holds SOLVER_LOCK while it uses that state.
            unsafe { libc::srand(self.seed as libc::c_uint) };
            builder.build_model().map_err(|e| Error::Solver(e.to_string()))?
        };

        let (weights, _) = oriented_weights(&native, n)?;
        tracing::info!(
            examples = set.len(),
            features = n,
            seed = self.seed,
            "trained linear classifier"
        );
        Ok(LinearModel::from_weights(weights))
    }
}
