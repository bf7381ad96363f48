//! Peak suppression over per-offset detection scores.

/// Index of the first maximum of `scores`, or `None` if it is empty.
fn first_argmax(scores: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, &score) in scores.iter().enumerate() {
        match best {
            Some(b) if scores[b] >= score => {}
            _ => best = Some(index),
        }
    }
    best
}

/// Greedy non-maximum suppression over a 1-D score buffer.
///
/// Repeatedly takes the highest positive entry (first one on ties), records
/// its index and zeroes every entry within `radius` of it. Stops when no
/// positive entry is left. Indices are returned in selection order.
pub fn suppress_peaks(scores: &mut [f64], radius: usize) -> Vec<usize> {
    let mut peaks = Vec::new();
    while let Some(index) = first_argmax(scores) {
        if scores[index] <= 0.0 {
            break;
        }
        peaks.push(index);
        let lo = index.saturating_sub(radius);
        let hi = (index + radius + 1).min(scores.len());
        scores[lo..hi].fill(0.0);
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_peaks_in_score_order() {
        let mut scores = vec![0.0, 1.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.5];
        let peaks = suppress_peaks(&mut scores, 2);
        assert_eq!(peaks, vec![2, 8]);
        assert!(scores.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn first_maximum_wins_ties() {
        let mut scores = vec![0.0, 1.0, 1.0, 0.0];
        assert_eq!(suppress_peaks(&mut scores, 1), vec![1]);
    }

    #[test]
    fn index_zero_can_be_a_peak() {
        let mut scores = vec![4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        assert_eq!(suppress_peaks(&mut scores, 5), vec![0, 7]);
    }

    #[test]
    fn radius_is_clamped_to_buffer() {
        let mut scores = vec![0.2, 0.9, 0.3];
        assert_eq!(suppress_peaks(&mut scores, 5), vec![1]);
        assert!(suppress_peaks(&mut [], 5).is_empty());
    }

    #[test]
    fn non_positive_buffer_yields_nothing() {
        let mut scores = vec![0.0, -1.0, 0.0];
        assert!(suppress_peaks(&mut scores, 1).is_empty());
    }

    #[test]
    fn peaks_are_more_than_radius_apart() {
        let mut scores: Vec<f64> = (0..200).map(|i| ((i * 37) % 101) as f64 + 1.0).collect();
        let mut peaks = suppress_peaks(&mut scores, 5);
        peaks.sort_unstable();
        for pair in peaks.windows(2) {
            assert!(pair[1] - pair[0] > 5, "{pair:?}");
        }
    }
}
