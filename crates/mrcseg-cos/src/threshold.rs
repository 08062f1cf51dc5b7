//! Minimum within-class variance thresholding
//!
//! A block's samples are bucketed into a 256-bin histogram and every cut
//! point is scored by the pooled within-group variance
//!
//! ```text
//! gamma(t) = (N0 * var0 + N1 * var1) / (N0 + N1)
//! ```
//!
//! where group 0 holds the samples `<= t`. Cumulative counts, sums and
//! sums of squares make each cut O(1). Cuts that leave one group empty
//! are skipped.

/// Number of histogram bins for 8-bit samples
pub const NUM_BINS: usize = 256;

/// 256-bin histogram of 8-bit samples
#[derive(Debug, Clone)]
pub struct Histogram {
    bins: [u32; NUM_BINS],
    total: u64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            bins: [0; NUM_BINS],
            total: 0,
        }
    }
}

impl Histogram {
    /// Empty histogram
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one sample.
    #[inline]
    pub fn add(&mut self, v: u8) {
        self.bins[v as usize] += 1;
        self.total += 1;
    }

    /// Count `n` copies of a sample.
    #[inline]
    pub fn add_n(&mut self, v: u8, n: u32) {
        self.bins[v as usize] += n;
        self.total += n as u64;
    }

    /// Number of samples counted
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Samples with value `<= t`
    pub fn count_at_most(&self, t: u8) -> u64 {
        self.bins[..=t as usize].iter().map(|&c| c as u64).sum()
    }

    /// Population variance of the counted samples (0 when empty).
    pub fn variance(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let (s, q) = self.moments();
        let n = self.total as f64;
        let mean = s / n;
        (q / n - mean * mean).max(0.0)
    }

    fn moments(&self) -> (f64, f64) {
        let mut s = 0.0;
        let mut q = 0.0;
        for (v, &c) in self.bins.iter().enumerate() {
            let c = c as f64;
            let v = v as f64;
            s += c * v;
            q += c * v * v;
        }
        (s, q)
    }

    /// Best cut by minimum pooled within-group variance.
    ///
    /// Returns `None` when every cut leaves one group empty, i.e. all
    /// samples share one value. Ties go to the lowest threshold.
    pub fn min_variance_cut(&self) -> Option<ThresholdCut> {
        if self.total == 0 {
            return None;
        }
        let (s_all, q_all) = self.moments();
        let n_all = self.total as f64;

        let mut n0 = 0.0;
        let mut s0 = 0.0;
        let mut q0 = 0.0;
        let mut best: Option<ThresholdCut> = None;
        for t in 0..NUM_BINS - 1 {
            let c = self.bins[t] as f64;
            let v = t as f64;
            n0 += c;
            s0 += c * v;
            q0 += c * v * v;
            let n1 = n_all - n0;
            if n0 == 0.0 || n1 == 0.0 {
                continue;
            }
            let s1 = s_all - s0;
            let q1 = q_all - q0;
            // N0*var0 = q0 - s0^2/N0
            let within = (q0 - s0 * s0 / n0) + (q1 - s1 * s1 / n1);
            let gamma = (within / n_all).max(0.0);
            if best.is_none_or(|b| gamma < b.gamma) {
                best = Some(ThresholdCut {
                    threshold: t as u8,
                    gamma,
                    below: n0 as u64,
                });
            }
        }
        best
    }
}

/// A chosen threshold and its score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdCut {
    /// Samples `<= threshold` form the dark group
    pub threshold: u8,
    /// Pooled within-group variance at this cut
    pub gamma: f64,
    /// Number of samples in the dark group
    pub below: u64,
}
