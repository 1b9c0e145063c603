use crate::action::{ActionSpace, JamAction, TxAction};
use crate::agent::Agent;
use crate::channel;
use crate::config::EnvConfig;
use crate::reward::{jam_reward, tx_reward};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const NOT_RESET: &str = "engine must be reset before use";

/// Transmitter action together with the bin it resolved to.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ResolvedTx {
    pub index: usize,
    pub action: TxAction,
    pub bin: usize,
}

/// Jammer action together with its resolved center bin and clamped span.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ResolvedJam {
    pub index: usize,
    pub action: JamAction,
    pub center_bin: usize,
    pub span: usize,
}

/// Record of a single tick.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TickOutcome {
    /// Tick index, counted from the last reset.
    pub tick: usize,

    pub throughput_mbps: f64,
    pub jamming_intensity: f64,
    pub sinr_db: f64,
    pub overlap: f64,

    pub tx_reward: f64,
    pub jam_reward: f64,

    pub tx: ResolvedTx,
    pub jam: ResolvedJam,
}

struct Agents {
    tx: Agent,
    jam: Agent,
}

/// Simulation engine.
///
/// Holds the action space, both agents, the bounded history and the random
/// number generator. Agents only exist after [`Engine::reset`]; every other
/// mutating operation fails until then.
pub struct Engine {
    space: ActionSpace,
    agents: Option<Agents>,
    history: VecDeque<TickOutcome>,
    capacity: usize,
    n_ticks: usize,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Create an engine keeping at most `capacity` outcomes.
    pub fn new(space: ActionSpace, capacity: usize, rng: ChaCha12Rng) -> Self {
        Self {
            space,
            agents: None,
            history: VecDeque::with_capacity(capacity),
            capacity,
            n_ticks: 0,
            rng,
        }
    }

    /// Zero both value tables, clear the history and restart the tick count.
    pub fn reset(&mut self, cfg: &EnvConfig) {
        match self.agents.as_mut() {
            Some(agents) => {
                for agent in [&mut agents.tx, &mut agents.jam] {
                    agent.reinitialize();
                    agent.set_rates(cfg.exploration_rate, cfg.learning_rate);
                }
            }
            None => {
                let tx = Agent::new(
                    self.space.tx_actions().len(),
                    cfg.exploration_rate,
                    cfg.learning_rate,
                );
                let jam = Agent::new(
                    self.space.jam_actions().len(),
                    cfg.exploration_rate,
                    cfg.learning_rate,
                );
                self.agents = Some(Agents { tx, jam });
            }
        }
        self.history.clear();
        self.n_ticks = 0;
        log::debug!("engine reset");
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self, cfg: &EnvConfig) -> Result<TickOutcome> {
        let agents = self.agents.as_mut().context(NOT_RESET)?;
        let frozen = cfg.learning_frozen;
        agents.tx.set_rates(cfg.exploration_rate, cfg.learning_rate);
        agents.jam.set_rates(cfg.exploration_rate, cfg.learning_rate);

        let i_tx = agents
            .tx
            .act(frozen, &mut self.rng)
            .context("failed to select tx action")?;

        // A non-adaptive jammer acts uniformly at random and never learns.
        let i_jam = if cfg.jammer_adaptive {
            agents
                .jam
                .act(frozen, &mut self.rng)
                .context("failed to select jam action")?
        } else {
            let idx_dist = Uniform::new(0, self.space.jam_actions().len())?;
            let idx = idx_dist.sample(&mut self.rng);
            agents.jam.force_action(idx);
            idx
        };

        let tx_action = self.space.tx_actions()[i_tx];
        let jam_action = self.space.jam_actions()[i_jam];
        let phys = channel::evaluate(&self.space, &tx_action, &jam_action, cfg);

        let tx_rew = tx_reward(&phys);
        let jam_rew = jam_reward(&phys);

        if !frozen {
            agents.tx.learn(tx_rew).context("failed to update tx values")?;
            if cfg.jammer_adaptive {
                agents
                    .jam
                    .learn(jam_rew)
                    .context("failed to update jam values")?;
            }
        }

        let outcome = TickOutcome {
            tick: self.n_ticks,
            throughput_mbps: phys.throughput_mbps,
            jamming_intensity: phys.jamming_intensity,
            sinr_db: phys.sinr_db(),
            overlap: phys.overlap,
            tx_reward: tx_rew,
            jam_reward: jam_rew,
            tx: ResolvedTx {
                index: i_tx,
                action: tx_action,
                bin: phys.tx_bin,
            },
            jam: ResolvedJam {
                index: i_jam,
                action: jam_action,
                center_bin: phys.jam_center_bin,
                span: phys.jam_span,
            },
        };
        log::trace!("{outcome:?}");

        self.history.push_back(outcome.clone());
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
        self.n_ticks += 1;

        Ok(outcome)
    }

    /// Re-randomize the jammer value table in place.
    pub fn mutate_jammer(&mut self) -> Result<()> {
        let agents = self.agents.as_mut().context(NOT_RESET)?;
        agents
            .jam
            .perturb(&mut self.rng)
            .context("failed to perturb jam values")?;
        log::debug!("jammer mutated at tick {}", self.n_ticks);
        Ok(())
    }

    /// Outcomes currently held, oldest first.
    pub fn history(&self) -> &VecDeque<TickOutcome> {
        &self.history
    }

    pub fn latest(&self) -> Option<&TickOutcome> {
        self.history.back()
    }

    pub fn space(&self) -> &ActionSpace {
        &self.space
    }

    pub fn tx_agent(&self) -> Option<&Agent> {
        self.agents.as_ref().map(|agents| &agents.tx)
    }

    pub fn jam_agent(&self) -> Option<&Agent> {
        self.agents.as_ref().map(|agents| &agents.jam)
    }
}
