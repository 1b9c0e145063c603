//! Tabular epsilon-greedy learner shared by the transmitter and the jammer.

use anyhow::{Context, Result, bail};
use rand::prelude::*;
use rand_distr::{Bernoulli, Uniform};

/// Bounds of the values drawn by [`perturb`].
const PERTURB_BOUND: f64 = 2.0;

/// Select an action index from a value table.
///
/// With probability `exploration_rate` a uniformly random index is returned,
/// otherwise the greedy index (see [`greedy_index`]).
pub fn select_action<R: Rng + ?Sized>(
    values: &[f64],
    exploration_rate: f64,
    rng: &mut R,
) -> Result<usize> {
    if values.is_empty() {
        bail!("value table must not be empty");
    }
    let explore_dist = Bernoulli::new(exploration_rate)?;
    if explore_dist.sample(rng) {
        let idx_dist = Uniform::new(0, values.len())?;
        return Ok(idx_dist.sample(rng));
    }
    Ok(greedy_index(values))
}

/// Index of the largest value; the first one wins ties.
pub fn greedy_index(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, &val) in values.iter().enumerate().skip(1) {
        if val > values[best] {
            best = idx;
        }
    }
    best
}

/// Move `values[idx]` towards `reward` by a fraction `learning_rate`.
pub fn update(values: &mut [f64], idx: usize, reward: f64, learning_rate: f64) {
    values[idx] += learning_rate * (reward - values[idx]);
}

/// Overwrite every value with a fresh draw from `[-2, 2]`.
pub fn perturb<R: Rng + ?Sized>(values: &mut [f64], rng: &mut R) -> Result<()> {
    let val_dist = Uniform::new_inclusive(-PERTURB_BOUND, PERTURB_BOUND)?;
    values.iter_mut().for_each(|val| *val = val_dist.sample(rng));
    Ok(())
}

/// Learning agent.
///
/// The value table length is fixed at construction to the size of the
/// agent's action space.
#[derive(Debug, Clone)]
pub struct Agent {
    values: Vec<f64>,
    exploration_rate: f64,
    learning_rate: f64,
    last_action: Option<usize>,
}

impl Agent {
    /// Create an agent with a zero-valued table of `n_actions` entries.
    pub fn new(n_actions: usize, exploration_rate: f64, learning_rate: f64) -> Self {
        Self {
            values: vec![0.0; n_actions],
            exploration_rate,
            learning_rate,
            last_action: None,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn set_rates(&mut self, exploration_rate: f64, learning_rate: f64) {
        self.exploration_rate = exploration_rate;
        self.learning_rate = learning_rate;
    }

    /// Choose an action; a frozen agent never explores.
    pub fn act<R: Rng + ?Sized>(&mut self, frozen: bool, rng: &mut R) -> Result<usize> {
        let rate = if frozen { 0.0 } else { self.exploration_rate };
        let idx = select_action(&self.values, rate, rng).context("failed to select action")?;
        self.last_action = Some(idx);
        Ok(idx)
    }

    /// Record an action chosen on the agent's behalf.
    pub fn force_action(&mut self, idx: usize) {
        self.last_action = Some(idx);
    }

    /// Update the value of the last action towards `reward`.
    pub fn learn(&mut self, reward: f64) -> Result<()> {
        let idx = self.last_action.context("no action to learn from")?;
        update(&mut self.values, idx, reward, self.learning_rate);
        Ok(())
    }

    pub fn reinitialize(&mut self) {
        self.values.iter_mut().for_each(|val| *val = 0.0);
        self.last_action = None;
    }

    pub fn perturb<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        perturb(&mut self.values, rng)
    }
}
