//! liblinear text model format.
//!
//! Models are written here and read back through liblinear's own loader.
//!
//! ```text
//! solver_type L2R_L2LOSS_SVC_DUAL
//! nr_class 2
//! label 1 -1
//! nr_feature 6912
//! bias -1
//! w
//! 0.0123
//! ...
//! ```

use std::fmt::Write as _;
use std::path::Path;

use super::solver::oriented_weights;
use super::{Bias, LinearModel};
use crate::error::{Error, Result};

const SOLVER_TYPE: &str = "L2R_L2LOSS_SVC_DUAL";

pub(super) fn render(model: &LinearModel) -> String {
    let mut out = String::with_capacity(model.weights.len() * 24 + 96);
    let bias = model.bias.map_or(-1.0, |b| b.value);
    // Writing into a String is infallible.
    let _ = writeln!(out, "solver_type {SOLVER_TYPE}");
    let _ = writeln!(out, "nr_class 2");
    let _ = writeln!(out, "label 1 -1");
    let _ = writeln!(out, "nr_feature {}", model.weights.len());
    let _ = writeln!(out, "bias {bias}");
    out.push_str("w\n");
    for w in &model.weights {
        let _ = writeln!(out, "{w}");
    }
    if let Some(b) = model.bias {
        let _ = writeln!(out, "{}", b.weight);
    }
    out
}

/// Header values checked before the file is handed to liblinear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Header {
    pub(super) nr_feature: usize,
    /// Bias value and its raw weight, when the model has a bias term.
    pub(super) bias: Option<(f64, f64)>,
}

/// Validates the header and counts the weights without trusting `nr_feature`
/// for any allocation.
pub(super) fn scan(text: &str, path: &Path) -> Result<Header> {
    let mut lines = text.lines().enumerate();
    let mut nr_feature: Option<usize> = None;
    let mut bias = -1.0;
    let mut has_solver = false;
    let mut has_classes = false;
    let mut has_labels = false;
    let mut found_w = false;

    for (idx, line) in lines.by_ref() {
        let line_no = idx + 1;
        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else {
            continue;
        };
        match key {
            "w" => {
                found_w = true;
                break;
            }
            "nr_feature" => {
                let n = tokens
                    .next()
                    .and_then(|t| t.parse::<usize>().ok())
                    .ok_or_else(|| Error::format(path, line_no, "nr_feature is not a count"))?;
                if i32::try_from(n).is_err() {
                    return Err(Error::format(
                        path,
                        line_no,
                        format!("nr_feature {n} exceeds liblinear's feature index range"),
                    ));
                }
                nr_feature = Some(n);
            }
            "bias" => {
                bias = tokens
                    .next()
                    .and_then(|t| t.parse::<f64>().ok())
                    .ok_or_else(|| Error::format(path, line_no, "bias is not a number"))?;
            }
            "nr_class" => {
                if tokens.next() != Some("2") {
                    return Err(Error::format(path, line_no, "only two-class models are supported"));
                }
                has_classes = true;
            }
            "label" => {
                let labels: Vec<i64> = tokens.filter_map(|t| t.parse().ok()).collect();
                if !matches!(labels.as_slice(), [1, -1] | [-1, 1]) {
                    return Err(Error::format(path, line_no, "labels must be 1 and -1"));
                }
                has_labels = true;
            }
            "solver_type" => {
                if let Some(solver) = tokens.next() {
                    if solver != SOLVER_TYPE {
                        tracing::warn!(solver, path = %path.display(), "loading model trained by a different solver");
                    }
                    has_solver = true;
                }
            }
            other => {
                tracing::debug!(key = other, "ignoring unknown model header");
            }
        }
    }

    let n = nr_feature.ok_or_else(|| Error::format(path, 0, "missing nr_feature"))?;
    if !found_w {
        return Err(Error::format(path, 0, "missing weight marker 'w'"));
    }

    let expected = if bias >= 0.0 {
        n.checked_add(1)
            .ok_or_else(|| Error::format(path, 0, "nr_feature overflows with the bias term"))?
    } else {
        n
    };
    let mut found = 0usize;
    let mut last = 0.0;
    'weights: for (idx, line) in lines {
        for token in line.split_whitespace() {
            if found == expected {
                break 'weights;
            }
            last = token
                .parse::<f64>()
                .map_err(|_| Error::format(path, idx + 1, format!("weight '{token}' is not a number")))?;
            found += 1;
        }
    }
    if found < expected {
        return Err(Error::format(
            path,
            0,
            format!("expected {expected} weights, found {found}"),
        ));
    }

    if !has_solver {
        return Err(Error::format(path, 0, "missing solver_type"));
    }
    if !(has_classes && has_labels) {
        return Err(Error::format(path, 0, "missing nr_class or label"));
    }

    Ok(Header {
        nr_feature: n,
        bias: (bias >= 0.0).then_some((bias, last)),
    })
}

/// Reads a model through liblinear's loader once [`scan`] accepted the file.
pub(super) fn load(path: &Path) -> Result<LinearModel> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let header = scan(&text, path)?;
    let file = path
        .to_str()
        .ok_or_else(|| Error::format(path, 0, "model path is not valid UTF-8"))?;
    let native = liblinear::serde::load_model_from_disk(file)
        .map_err(|e| Error::format(path, 0, format!("liblinear rejected the model: {e}")))?;
    let (weights, sign) = oriented_weights(&native, header.nr_feature)?;
    let bias = header.bias.map(|(value, weight)| Bias {
        value,
        weight: sign * weight,
    });
    tracing::debug!(path = %path.display(), features = weights.len(), "loaded linear model");
    Ok(LinearModel { weights, bias })
}
