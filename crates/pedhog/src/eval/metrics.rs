//! Precision / recall / F-score of predicted windows against ground truth.

use std::cmp::Ordering;

use super::annotations::AnnotationSet;

/// Quality figures of one evaluation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QualityMetrics {
    /// `tp_distinct / total_predicted`.
    pub precision: f64,
    /// `tp / total_truth`.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f_score: f64,
    /// Matched (prediction, truth) pairs.
    pub tp: usize,
    /// Matches not within tolerance of the previous counted match of the same key.
    pub tp_distinct: usize,
    /// Number of predicted windows.
    pub total_predicted: usize,
    /// Number of ground-truth windows.
    pub total_truth: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// `|a - b| <= tolerance` without overflowing at the ends of the `i64` range.
fn within(a: i64, b: i64, tolerance: i64) -> bool {
    u64::try_from(tolerance).is_ok_and(|tol| a.abs_diff(b) <= tol)
}

#[derive(Default)]
struct MatchCounter<'a> {
    tp: usize,
    tp_distinct: usize,
    previous: Option<(&'a str, i64)>,
}

impl<'a> MatchCounter<'a> {
    fn record(&mut self, key: &'a str, predicted: i64, tolerance: i64) {
        self.tp += 1;
        let repeat = matches!(
            self.previous,
            Some((k, x)) if k == key && within(predicted, x, tolerance)
        );
        if !repeat {
            self.tp_distinct += 1;
            self.previous = Some((key, predicted));
        }
    }

    /// Merge-walk two ascending offset lists of the same key.
    fn walk(&mut self, key: &'a str, pred: &[i64], truth: &[i64], tolerance: i64) {
        let (mut i, mut j) = (0, 0);
        while i < pred.len() && j < truth.len() {
            while i < pred.len() && pred[i] < truth[j].saturating_sub(tolerance) {
                i += 1;
            }
            while i < pred.len() && j < truth.len() && within(pred[i], truth[j], tolerance) {
                self.record(key, pred[i], tolerance);
                i += 1;
                j += 1;
            }
            while i < pred.len() && j < truth.len() && pred[i] > truth[j].saturating_add(tolerance) {
                j += 1;
            }
        }
    }
}

/// Compare `predicted` against `truth`; offsets match within `tolerance` pixels.
///
/// Both sets are walked in key order. A truth window close to several
/// predictions may be counted once per prediction in `tp`; `tp_distinct`
/// drops a match lying within `tolerance` of the previous distinct match of
/// the same key. Empty denominators give `0` instead of NaN.
pub fn evaluate(predicted: &AnnotationSet, truth: &AnnotationSet, tolerance: i64) -> QualityMetrics {
    let mut counter = MatchCounter::default();
    let mut pred_iter = predicted.iter().peekable();
    let mut truth_iter = truth.iter().peekable();

    loop {
        let (Some(&(pk, pv)), Some(&(tk, tv))) = (pred_iter.peek(), truth_iter.peek()) else {
            break;
        };
        match pk.cmp(tk) {
            Ordering::Less => {
                pred_iter.next();
            }
            Ordering::Greater => {
                truth_iter.next();
            }
            Ordering::Equal => {
                let mut p = pv.to_vec();
                let mut t = tv.to_vec();
                p.sort_unstable();
                t.sort_unstable();
                counter.walk(pk, &p, &t, tolerance);
                pred_iter.next();
                truth_iter.next();
            }
        }
    }

    let total_predicted = predicted.total();
    let total_truth = truth.total();
    let precision = ratio(counter.tp_distinct, total_predicted);
    let recall = ratio(counter.tp, total_truth);
    let f_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    QualityMetrics {
        precision,
        recall,
        f_score,
        tp: counter.tp,
        tp_distinct: counter.tp_distinct,
        total_predicted,
        total_truth,
    }
}
