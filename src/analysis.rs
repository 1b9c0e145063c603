use crate::config::Config;
use crate::engine::TickOutcome;
use crate::stats::{Accumulator, TimeSeries};
use anyhow::{Context, Result};
use rmp_serde::decode;
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

/// Observable computed from a stream of tick outcomes.
pub trait Obs {
    fn update(&mut self, outcome: &TickOutcome);
    fn report(&self) -> serde_json::Value;
}

/// Mean and error of a correlated per-tick quantity.
pub struct Series {
    name: &'static str,
    extract: fn(&TickOutcome) -> f64,
    time_series: TimeSeries,
}

impl Series {
    pub fn new(name: &'static str, extract: fn(&TickOutcome) -> f64) -> Self {
        Self {
            name,
            extract,
            time_series: TimeSeries::new(),
        }
    }
}

impl Obs for Series {
    fn update(&mut self, outcome: &TickOutcome) {
        self.time_series.push((self.extract)(outcome));
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ self.name: self.time_series.report() })
    }
}

/// Running mean and standard deviation of a per-tick quantity.
pub struct Average {
    name: &'static str,
    extract: fn(&TickOutcome) -> f64,
    acc: Accumulator,
}

impl Average {
    pub fn new(name: &'static str, extract: fn(&TickOutcome) -> f64) -> Self {
        Self {
            name,
            extract,
            acc: Accumulator::new(),
        }
    }
}

impl Obs for Average {
    fn update(&mut self, outcome: &TickOutcome) {
        self.acc.add((self.extract)(outcome));
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ self.name: self.acc.report() })
    }
}

/// Fraction of time the transmitter spends in each frequency slot.
pub struct TxSlotOccupancy {
    acc_vec: Vec<Accumulator>,
}

impl TxSlotOccupancy {
    pub fn new(cfg: &Config) -> Self {
        let mut acc_vec = Vec::new();
        acc_vec.resize_with(cfg.space.tx_slots, Accumulator::new);
        Self { acc_vec }
    }
}

impl Obs for TxSlotOccupancy {
    fn update(&mut self, outcome: &TickOutcome) {
        let slot = outcome.tx.action.slot;
        for (i_slot, acc) in self.acc_vec.iter_mut().enumerate() {
            acc.add(if i_slot == slot { 1.0 } else { 0.0 });
        }
    }

    fn report(&self) -> serde_json::Value {
        let reports: Vec<_> = self.acc_vec.iter().map(|acc| acc.report()).collect();
        serde_json::json!({ "tx_slot_occupancy": reports })
    }
}

/// Aggregates the observables of one run.
pub struct Analyzer {
    obs_ptr_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new(cfg: &Config) -> Self {
        let obs_ptr_vec: Vec<Box<dyn Obs>> = vec![
            Box::new(Series::new("throughput_mbps", |out| out.throughput_mbps)),
            Box::new(Series::new("jamming_intensity", |out| out.jamming_intensity)),
            Box::new(Average::new("sinr_db", |out| out.sinr_db)),
            Box::new(Average::new("overlap", |out| out.overlap)),
            Box::new(Average::new("jam_hit_rate", |out| {
                if out.overlap > 0.0 { 1.0 } else { 0.0 }
            })),
            Box::new(Average::new("tx_reward", |out| out.tx_reward)),
            Box::new(Average::new("jam_reward", |out| out.jam_reward)),
            Box::new(TxSlotOccupancy::new(cfg)),
        ];
        Self { obs_ptr_vec }
    }

    pub fn add_outcome(&mut self, outcome: &TickOutcome) {
        for obs in &mut self.obs_ptr_vec {
            obs.update(outcome);
        }
    }

    /// Read `n_outcomes` consecutive outcomes from a trajectory file.
    pub fn add_file<P: AsRef<Path>>(&mut self, file: P, n_outcomes: usize) -> Result<()> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        for _ in 0..n_outcomes {
            let outcome: TickOutcome =
                decode::from_read(&mut reader).context("failed to deserialize outcome")?;
            self.add_outcome(&outcome);
        }
        Ok(())
    }

    pub fn report(&self) -> Vec<serde_json::Value> {
        self.obs_ptr_vec.iter().map(|obs| obs.report()).collect()
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.report())
            .context("failed to serialize results")?;
        Ok(())
    }
}
