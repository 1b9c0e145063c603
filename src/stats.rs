use serde::{Deserialize, Serialize};

/// Running mean and variance of a stream of samples (Welford).
#[derive(Debug, Default)]
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    sq_dev_sum: f64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub n_vals: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;
        let delta = val - self.mean;
        self.mean += delta / self.n_vals as f64;
        self.sq_dev_sum += delta * (val - self.mean);
    }

    pub fn report(&self) -> AccumulatorReport {
        let std_dev = match self.n_vals {
            0 | 1 => f64::NAN,
            n => (self.sq_dev_sum / (n - 1) as f64).sqrt(),
        };
        AccumulatorReport {
            n_vals: self.n_vals,
            mean: if self.n_vals == 0 { f64::NAN } else { self.mean },
            std_dev,
        }
    }
}

/// Full series of a correlated observable.
///
/// The report discards an initial transient chosen by the marginal standard
/// error rule and estimates the error of the mean by blocking.
#[derive(Debug, Default)]
pub struct TimeSeries {
    vals: Vec<f64>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesReport {
    pub mean: f64,
    pub std_dev: f64,
    pub sem: f64,
    /// The transient cut was found before the midpoint of the series.
    pub is_equil: bool,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, val: f64) {
        self.vals.push(val);
    }

    pub fn report(&self) -> TimeSeriesReport {
        let i_equil = equilibration_index(&self.vals);
        let tail = &self.vals[i_equil..];
        TimeSeriesReport {
            mean: mean(tail),
            std_dev: variance(tail).sqrt(),
            sem: blocking_sem(tail),
            is_equil: i_equil < self.vals.len() / 2,
        }
    }
}

fn mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}

fn variance(vals: &[f64]) -> f64 {
    if vals.len() < 2 {
        return f64::NAN;
    }
    let avg = mean(vals);
    let sq_sum: f64 = vals.iter().map(|&val| (val - avg).powi(2)).sum();
    sq_sum / (vals.len() - 1) as f64
}

/// Standard error of the mean using the Flyvbjerg-Petersen blocking method.
fn blocking_sem(vals: &[f64]) -> f64 {
    let mut blocks = vals.to_vec();
    // (estimate, error) of the squared SEM at each blocking level
    let mut levels = Vec::new();
    while blocks.len() >= 2 {
        let n = blocks.len() as f64;
        let est = variance(&blocks) / n;
        levels.push((est, est * (2.0 / (n - 1.0)).sqrt()));
        blocks = blocks
            .chunks_exact(2)
            .map(|pair| 0.5 * (pair[0] + pair[1]))
            .collect();
    }

    // First level whose estimate exceeds the lower error bound of every later level.
    for (i_lvl, &(est, _)) in levels.iter().enumerate() {
        let max_low = levels[i_lvl..]
            .iter()
            .map(|(e, err)| e - err)
            .fold(f64::NEG_INFINITY, f64::max);
        if est > max_low {
            return est.sqrt();
        }
    }
    levels.last().map_or(f64::NAN, |&(est, _)| est.sqrt())
}

/// Start of the stationary part of a series (marginal standard error rule).
///
/// Candidate cuts are `len / 2^k`; defaults to the midpoint.
fn equilibration_index(vals: &[f64]) -> usize {
    let len = vals.len();
    if len < 2 {
        return 0;
    }
    let mut best = (f64::INFINITY, len / 2);
    let n_cuts = len.ilog2() + 1;
    for k in (1..=n_cuts).rev() {
        let cut = len >> k;
        let n_tail = len - cut;
        let mse = variance(&vals[cut..]) * (n_tail - 1) as f64 / (n_tail * n_tail) as f64;
        if mse < best.0 {
            best = (mse, cut);
        }
    }
    best.1
}
