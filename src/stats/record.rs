//! Running statistics for one tensor of one layer.

/// Initial minimum. Any real sample is smaller.
pub(crate) const MIN_SENTINEL: f32 = 1e20;
/// Initial maximum. Any real sample is larger.
pub(crate) const MAX_SENTINEL: f32 = -1e20;

/// Running statistics for a single (layer, role) pair.
///
/// Extrema start sentinel-reversed so the first sample sets both; sums are
/// accumulated in `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRecord {
    pub(crate) min: f32,
    pub(crate) max: f32,
    pub(crate) sum: f64,
    pub(crate) sum_sq: f64,
    pub(crate) sample_count: u64,
    pub(crate) name: String,
}

impl Default for StatsRecord {
    fn default() -> Self {
        Self {
            min: MIN_SENTINEL,
            max: MAX_SENTINEL,
            sum: 0.0,
            sum_sq: 0.0,
            sample_count: 0,
            name: String::new(),
        }
    }
}

impl StatsRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a batch of samples into the record.
    pub fn fold(&mut self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }

        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for &x in samples {
            let v = f64::from(x);
            sum += v;
            sum_sq += v * v;
            if x < self.min {
                self.min = x;
            }
            if x > self.max {
                self.max = x;
            }
        }
        self.sum += sum;
        self.sum_sq += sum_sq;
        self.sample_count += samples.len() as u64;
    }

    /// Stored extrema, sentinels included when nothing was folded.
    pub fn min_max(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    /// Mean and unbiased standard deviation.
    ///
    /// Zero samples report `(0, 0)`; a single sample reports `(sum, 0)`.
    pub fn mean_stddev(&self) -> (f32, f32) {
        match self.sample_count {
            0 => (0.0, 0.0),
            1 => (self.sum as f32, 0.0),
            n => {
                let n = n as f64;
                let mean = self.sum / n;
                let value = self.sum_sq - 2.0 * mean * self.sum + mean * mean * n;
                // round-off can leave a tiny negative residue
                let std_dev = if value < 0.0 { 0.0 } else { (value / (n - 1.0)).sqrt() };
                (mean as f32, std_dev as f32)
            }
        }
    }

    /// Whether the record holds a usable range (`max > min`).
    pub fn has_range(&self) -> bool {
        self.max > self.min
    }

    /// Largest magnitude seen, if a range is set.
    pub fn max_abs(&self) -> Option<f32> {
        self.has_range().then(|| self.max.abs().max(self.min.abs()))
    }

    /// Running sum.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Running sum of squares.
    pub fn sum_sq(&self) -> f64 {
        self.sum_sq
    }

    /// Number of scalar samples folded in.
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Layer name. Only populated in the output-role record.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if no samples were folded.
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}
