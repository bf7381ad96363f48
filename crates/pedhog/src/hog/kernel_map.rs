//! Closed-form spectral feature map approximating the additive chi-squared kernel.
//!
//! A scalar `x > 0` is mapped to `2n + 1` complex samples of the kernel's
//! spectrum, `sqrt(x * sech(pi * lambda)) * exp(-i * lambda * ln x)` for
//! `lambda = k * L`, `k` in `[-n, n]`. Each sample is emitted as a
//! (real, imaginary) pair, so a linear classifier on the expanded vector
//! behaves like a chi-squared kernel machine on the original one. The
//! samples are not scaled by `sqrt(L)`; the constant factor is absorbed by
//! the classifier's regularization.

/// Hyperbolic secant.
fn sech(x: f64) -> f64 {
    // cosh saturates to infinity, giving 0 rather than inf / inf.
    1.0 / x.cosh()
}

/// Parameters of the homogeneous kernel map.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct KernelMap {
    /// Number of positive frequencies `n`; `2n + 1` samples are taken.
    pub order: usize,
    /// Sampling period `L` of the spectrum.
    pub period: f64,
}

impl Default for KernelMap {
    fn default() -> Self {
        Self {
            order: 1,
            period: 0.27,
        }
    }
}

impl KernelMap {
    /// Number of output components per input scalar: `2(2n + 1)`.
    pub fn expansion(&self) -> usize {
        2 * (2 * self.order + 1)
    }

    /// Append the expansion of `x` to `out`.
    ///
    /// Zero (and non-positive) input produces zero pairs, where the logarithm is undefined.
    pub fn expand_into(&self, x: f64, out: &mut Vec<f64>) {
        let n = self.order as i64;
        if x <= 0.0 {
            out.extend(std::iter::repeat(0.0).take(self.expansion()));
            return;
        }
        let ln_x = x.ln();
        for k in -n..=n {
            let lambda = k as f64 * self.period;
            let scale = (x * sech(std::f64::consts::PI * lambda)).sqrt();
            out.push((lambda * ln_x).cos() * scale);
            out.push(-(lambda * ln_x).sin() * scale);
        }
    }

    /// Expand every component of `features`.
    pub fn expand(&self, features: &[f64]) -> Vec<f64> {
        let mut out = Vec::with_capacity(features.len() * self.expansion());
        for &x in features {
            self.expand_into(x, &mut out);
        }
        out
    }
}
