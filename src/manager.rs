use crate::action::ActionSpace;
use crate::agent::greedy_index;
use crate::analysis::Analyzer;
use crate::config::Config;
use crate::engine::Engine;
use anyhow::{Context, Result};
use glob::glob;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rmp_serde::encode;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Drives simulations stored under a simulation directory.
///
/// Acts as the scheduler of the engine: it resolves the environment of each
/// tick, fires mutation events and streams outcomes to trajectory files.
pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg = Config::from_file(sim_dir.join("config.toml")).context("failed to load cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    pub fn run_simulation(&self) -> Result<()> {
        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;
        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let rng = match self.cfg.run.seed {
            Some(seed) => {
                // Same seed, distinct stream per run.
                let mut rng = ChaCha12Rng::seed_from_u64(seed);
                rng.set_stream(run_idx as u64);
                rng
            }
            None => ChaCha12Rng::try_from_os_rng().context("failed to seed rng")?,
        };

        let space = ActionSpace::new(&self.cfg.space);
        let mut engine = Engine::new(space, self.cfg.run.history_capacity, rng);
        engine.reset(&self.cfg.env_at(0));

        let run = &self.cfg.run;
        let n_files = run.n_ticks.div_ceil(run.ticks_per_file);
        for file_idx in 0..n_files {
            let file = self.trajectory_file(run_idx, file_idx);
            let file = File::create(&file).with_context(|| format!("failed to create {file:?}"))?;
            let mut writer = BufWriter::new(file);

            let first = file_idx * run.ticks_per_file;
            for tick in first..first + self.n_outcomes(file_idx) {
                let env = self.cfg.env_at(tick);
                if run.mutate_ticks.contains(&tick) {
                    engine.mutate_jammer().context("failed to mutate jammer")?;
                    log::info!("mutated jammer at tick {tick}");
                }

                let outcome = engine
                    .tick(&env)
                    .with_context(|| format!("failed to perform tick {tick}"))?;

                encode::write(&mut writer, &outcome).context("failed to serialize outcome")?;
            }

            writer.flush().context("failed to flush writer stream")?;

            let progress = 100.0 * (file_idx + 1) as f64 / n_files as f64;
            log::info!("completed {progress:06.2}%");
        }

        if let Some(latest) = engine.latest() {
            let window = engine.history();
            let avg_throughput =
                window.iter().map(|out| out.throughput_mbps).sum::<f64>() / window.len() as f64;
            log::info!(
                "tick {}: throughput {:.2} Mbps (last {} avg {avg_throughput:.2}), jamming intensity {:.3}",
                latest.tick,
                latest.throughput_mbps,
                window.len(),
                latest.jamming_intensity
            );
        }
        if let (Some(tx), Some(jam)) = (engine.tx_agent(), engine.jam_agent()) {
            let space = engine.space();
            log::info!("greedy tx action {:?}", space.tx_actions()[greedy_index(tx.values())]);
            log::info!("greedy jam action {:?}", space.jam_actions()[greedy_index(jam.values())]);
        }

        Ok(())
    }

    pub fn run_analysis(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let mut analyzer = Analyzer::new(&self.cfg);

            let n_files = self
                .count_trajectory_files(run_idx)
                .context("failed to count trajectory files")?;
            for file_idx in 0..n_files {
                analyzer
                    .add_file(
                        self.trajectory_file(run_idx, file_idx),
                        self.n_outcomes(file_idx),
                    )
                    .context("failed to add file")?;
            }

            let results_file = self.results_file(run_idx);
            analyzer
                .save_results(&results_file)
                .context("failed to save results")?;
            log::info!("wrote {results_file:?}");
        }

        Ok(())
    }

    pub fn clean_sim(&self) -> Result<()> {
        for run_dir in self.run_dirs()? {
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }
        Ok(())
    }

    /// Number of outcomes stored in trajectory file `file_idx`.
    fn n_outcomes(&self, file_idx: usize) -> usize {
        let run = &self.cfg.run;
        let first = file_idx * run.ticks_per_file;
        run.ticks_per_file.min(run.n_ticks.saturating_sub(first))
    }

    fn run_dirs(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let dirs = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect();
        Ok(dirs)
    }

    fn count_run_dirs(&self) -> Result<usize> {
        Ok(self.run_dirs()?.len())
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn count_trajectory_files(&self, run_idx: usize) -> Result<usize> {
        let pattern = self.run_dir(run_idx).join("trajectory-*.msgpack");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let count = glob(pattern)
            .context("failed to glob trajectory files")?
            .filter_map(Result::ok)
            .count();
        Ok(count)
    }

    fn trajectory_file(&self, run_idx: usize, file_idx: usize) -> PathBuf {
        self.run_dir(run_idx)
            .join(format!("trajectory-{file_idx:04}.msgpack"))
    }

    fn results_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("results.json")
    }
}
