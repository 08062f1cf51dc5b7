//! Per-component Gaussian-mixture classification

use crate::error::{CccError, CccResult};
use crate::feature::{EdgeFeature, FEATURE_BANDS};
use crate::signature::{SignatureClass, SignatureSet, Subclass};
use rayon::prelude::*;

impl Subclass {
    /// Gaussian log-density at `x`.
    ///
    /// `x` must have [`Subclass::nbands`] entries.
    pub fn log_density(&self, x: &[f64]) -> f64 {
        let n = self.nbands();
        let d: Vec<f64> = x.iter().zip(self.means.iter()).map(|(a, m)| a - m).collect();
        let mut q = 0.0;
        for i in 0..n {
            q += self.inverse[(i, i)] * d[i] * d[i];
            for j in i + 1..n {
                q += 2.0 * self.inverse[(i, j)] * d[i] * d[j];
            }
        }
        self.log_norm - 0.5 * q
    }
}

impl SignatureClass {
    /// Class log-likelihood at `x`.
    ///
    /// A single subclass is used as is; several are combined by a
    /// log-sum-exp weighted by their mixture weights.
    pub fn log_likelihood(&self, x: &[f64]) -> f64 {
        if let [only] = self.subclasses.as_slice() {
            return only.log_density(x);
        }
        let terms: Vec<f64> = self
            .subclasses
            .iter()
            .map(|s| s.pi.ln() + s.log_density(x))
            .collect();
        let max = terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return max;
        }
        max + terms.iter().map(|t| (t - max).exp()).sum::<f64>().ln()
    }
}

impl SignatureSet {
    /// Log-likelihood of `x` under every class, in class order.
    pub fn log_likelihoods(&self, x: &[f64]) -> Vec<f64> {
        self.classes.iter().map(|c| c.log_likelihood(x)).collect()
    }
}

/// Initial classification of one component
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Most likely class (ties go to the lower index)
    pub class: usize,
    /// Per-class log-likelihoods, text bias included
    pub log_likelihoods: Vec<f64>,
}

/// Index of the largest value; the first one wins ties.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Classify components by their edge features.
///
/// `text_cost` is added to the log-likelihood of class `text_class`.
///
/// # Errors
///
/// Returns [`CccError::BandMismatch`] if the model is not 4-band, or
/// [`CccError::InvalidParameters`] if `text_class` is not a model class.
pub fn classify(
    features: &[EdgeFeature],
    set: &SignatureSet,
    text_class: usize,
    text_cost: f64,
) -> CccResult<Vec<Classification>> {
    set.check_bands(FEATURE_BANDS)?;
    if text_class >= set.num_classes() {
        return Err(CccError::InvalidParameters(format!(
            "text class {} but model has {} classes",
            text_class,
            set.num_classes()
        )));
    }
    Ok(features
        .par_iter()
        .map(|f| {
            let mut log_likelihoods = set.log_likelihoods(&f.to_array());
            log_likelihoods[text_class] += text_cost;
            Classification {
                class: argmax(&log_likelihoods),
                log_likelihoods,
            }
        })
        .collect())
}
