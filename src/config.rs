use crate::action::Modulation;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs,
    ops::{Bound, RangeBounds},
    path::Path,
};

/// Simulation configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub space: SpaceConfig,
    pub env: EnvConfig,
    pub run: RunConfig,
    /// Phases applied on top of `env` once their start tick is reached.
    #[serde(default)]
    pub schedule: Vec<Phase>,
}

/// Geometry of the channel and the values enumerated by the action spaces.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    /// Number of channel bins.
    pub n_bins: usize,
    /// Number of transmitter frequency slots.
    pub tx_slots: usize,
    /// Number of jammer frequency slots.
    pub jam_slots: usize,
    pub modulations: Vec<Modulation>,
    pub tx_power_levels: Vec<f64>,
    /// Jammer span choices in bins.
    pub jam_spans: Vec<usize>,
    pub jam_power_levels: Vec<f64>,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            n_bins: 48,
            tx_slots: 12,
            jam_slots: 12,
            modulations: vec![
                Modulation::Bpsk,
                Modulation::Qpsk,
                Modulation::Qam16,
                Modulation::Qam64,
            ],
            tx_power_levels: vec![0.25, 0.5, 0.75, 1.0],
            jam_spans: vec![1, 3, 5, 9],
            jam_power_levels: vec![0.25, 0.5, 0.75, 1.0],
        }
    }
}

/// Environment supplied to the engine on every tick.
///
/// Physical values are not range-checked: nonsensical values (such as a
/// negative bandwidth) yield degenerate but finite-or-infinite numeric results.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct EnvConfig {
    pub snr_db: f64,
    pub bandwidth_mhz: f64,
    /// Noise power per Hz of bandwidth.
    pub noise_density: f64,
    pub jam_max_power: f64,
    /// Upper bound on the jammer span in bins.
    pub jam_max_span: usize,
    pub tx_max_power: f64,
    pub learning_rate: f64,
    pub exploration_rate: f64,
    pub learning_frozen: bool,
    pub jammer_adaptive: bool,
}

impl EnvConfig {
    fn validate(&self) -> Result<()> {
        check_num(self.learning_rate, 0.0..=1.0).context("invalid learning rate")?;
        check_num(self.exploration_rate, 0.0..=1.0).context("invalid exploration rate")?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of ticks performed by each run.
    pub n_ticks: usize,
    /// Maximum number of outcomes kept in the engine history.
    pub history_capacity: usize,
    /// Number of outcomes written per trajectory file.
    pub ticks_per_file: usize,
    /// Seed of the random number generator (taken from the OS if absent).
    pub seed: Option<u64>,
    /// Ticks at which the jammer value table is re-randomized.
    #[serde(default)]
    pub mutate_ticks: Vec<usize>,
}

/// Partial environment override starting at a given tick.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub start_tick: usize,
    pub snr_db: Option<f64>,
    pub bandwidth_mhz: Option<f64>,
    pub noise_density: Option<f64>,
    pub jam_max_power: Option<f64>,
    pub jam_max_span: Option<usize>,
    pub tx_max_power: Option<f64>,
    pub learning_rate: Option<f64>,
    pub exploration_rate: Option<f64>,
    pub learning_frozen: Option<bool>,
    pub jammer_adaptive: Option<bool>,
}

impl Phase {
    fn apply(&self, env: &mut EnvConfig) {
        fn set<T: Copy>(dst: &mut T, src: Option<T>) {
            if let Some(val) = src {
                *dst = val;
            }
        }
        set(&mut env.snr_db, self.snr_db);
        set(&mut env.bandwidth_mhz, self.bandwidth_mhz);
        set(&mut env.noise_density, self.noise_density);
        set(&mut env.jam_max_power, self.jam_max_power);
        set(&mut env.jam_max_span, self.jam_max_span);
        set(&mut env.tx_max_power, self.tx_max_power);
        set(&mut env.learning_rate, self.learning_rate);
        set(&mut env.exploration_rate, self.exploration_rate);
        set(&mut env.learning_frozen, self.learning_frozen);
        set(&mut env.jammer_adaptive, self.jammer_adaptive);
    }
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Environment in force at `tick`: `env` with every reached phase applied in order.
    pub fn env_at(&self, tick: usize) -> EnvConfig {
        let mut env = self.env.clone();
        for phase in self.schedule.iter().take_while(|p| p.start_tick <= tick) {
            phase.apply(&mut env);
        }
        env
    }

    fn validate(&self) -> Result<()> {
        let space = &self.space;
        check_num(space.n_bins, 1..100_000).context("invalid number of bins")?;
        check_num(space.tx_slots, 1..=space.n_bins).context("invalid number of tx slots")?;
        check_num(space.jam_slots, 1..=space.n_bins).context("invalid number of jam slots")?;
        check_len(&space.modulations).context("invalid modulations")?;
        check_levels(&space.tx_power_levels).context("invalid tx power levels")?;
        check_len(&space.jam_spans).context("invalid jam spans")?;
        check_levels(&space.jam_power_levels).context("invalid jam power levels")?;

        self.env.validate().context("invalid environment")?;

        let run = &self.run;
        check_num(run.n_ticks, 1..100_000_000).context("invalid number of ticks")?;
        check_num(run.history_capacity, 1..1_000_000).context("invalid history capacity")?;
        check_num(run.ticks_per_file, 1..1_000_000).context("invalid number of ticks per file")?;

        let mut prev_start = 0;
        for (i_phase, phase) in self.schedule.iter().enumerate() {
            if phase.start_tick < prev_start {
                bail!("phase {i_phase} starts before the previous phase");
            }
            prev_start = phase.start_tick;
            // Every prefix of the schedule must produce a valid environment.
            self.env_at(phase.start_tick)
                .validate()
                .with_context(|| format!("invalid phase {i_phase}"))?;
        }

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_len<T>(vec: &[T]) -> Result<()> {
    if vec.is_empty() {
        bail!("list must not be empty");
    }
    Ok(())
}

fn check_levels(levels: &[f64]) -> Result<()> {
    check_len(levels)?;
    for (i_lvl, &lvl) in levels.iter().enumerate() {
        check_num(lvl, (Bound::Excluded(0.0), Bound::Included(1.0)))
            .with_context(|| format!("invalid level {i_lvl}"))?;
    }
    Ok(())
}
