//! Discrete action spaces of the transmitter and the jammer.

use crate::config::SpaceConfig;
use serde::{Deserialize, Serialize};

/// Modulation scheme of the transmitter.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modulation {
    Bpsk,
    Qpsk,
    Qam16,
    Qam64,
}

impl Modulation {
    /// Integer spectral-efficiency multiplier applied to the received signal.
    pub fn multiplier(self) -> u32 {
        match self {
            Modulation::Bpsk => 1,
            Modulation::Qpsk => 2,
            Modulation::Qam16 => 4,
            Modulation::Qam64 => 6,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct TxAction {
    pub slot: usize,
    pub modulation: Modulation,
    pub power_level: f64,
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct JamAction {
    pub slot: usize,
    /// Requested width in bins, before clamping to the configured maximum.
    pub span: usize,
    pub power_level: f64,
}

/// Enumerate every transmitter action.
///
/// Order is slot outer, modulation middle, power inner; an action is
/// identified by its position in the returned vector.
pub fn build_tx_actions(n_slots: usize, modulations: &[Modulation], powers: &[f64]) -> Vec<TxAction> {
    let mut actions = Vec::with_capacity(n_slots * modulations.len() * powers.len());
    for slot in 0..n_slots {
        for &modulation in modulations {
            for &power_level in powers {
                actions.push(TxAction {
                    slot,
                    modulation,
                    power_level,
                });
            }
        }
    }
    actions
}

/// Enumerate every jammer action (slot outer, span middle, power inner).
pub fn build_jam_actions(n_slots: usize, spans: &[usize], powers: &[f64]) -> Vec<JamAction> {
    let mut actions = Vec::with_capacity(n_slots * spans.len() * powers.len());
    for slot in 0..n_slots {
        for &span in spans {
            for &power_level in powers {
                actions.push(JamAction {
                    slot,
                    span,
                    power_level,
                });
            }
        }
    }
    actions
}

/// Both action sets together with the channel geometry they refer to.
///
/// Built once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ActionSpace {
    n_bins: usize,
    tx_slots: usize,
    jam_slots: usize,
    tx_actions: Vec<TxAction>,
    jam_actions: Vec<JamAction>,
}

impl ActionSpace {
    pub fn new(cfg: &SpaceConfig) -> Self {
        let tx_actions = build_tx_actions(cfg.tx_slots, &cfg.modulations, &cfg.tx_power_levels);
        let jam_actions = build_jam_actions(cfg.jam_slots, &cfg.jam_spans, &cfg.jam_power_levels);
        log::debug!(
            "built {} tx actions and {} jam actions",
            tx_actions.len(),
            jam_actions.len()
        );
        Self {
            n_bins: cfg.n_bins,
            tx_slots: cfg.tx_slots,
            jam_slots: cfg.jam_slots,
            tx_actions,
            jam_actions,
        }
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn tx_slots(&self) -> usize {
        self.tx_slots
    }

    pub fn jam_slots(&self) -> usize {
        self.jam_slots
    }

    pub fn tx_actions(&self) -> &[TxAction] {
        &self.tx_actions
    }

    pub fn jam_actions(&self) -> &[JamAction] {
        &self.jam_actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_actions_follow_slot_modulation_power_order() {
        let mods = [Modulation::Bpsk, Modulation::Qam16];
        let powers = [0.5, 1.0];
        let actions = build_tx_actions(3, &mods, &powers);

        assert_eq!(actions.len(), 3 * 2 * 2);
        assert_eq!(
            actions[0],
            TxAction {
                slot: 0,
                modulation: Modulation::Bpsk,
                power_level: 0.5
            }
        );
        assert_eq!(actions[1].power_level, 1.0);
        assert_eq!(actions[2].modulation, Modulation::Qam16);
        assert_eq!(actions[4].slot, 1);
        assert_eq!(actions.last().map(|act| act.slot), Some(2));
    }

    #[test]
    fn jam_actions_follow_slot_span_power_order() {
        let actions = build_jam_actions(2, &[1, 5, 9], &[1.0]);

        let spans: Vec<_> = actions.iter().map(|act| act.span).collect();
        assert_eq!(spans, vec![1, 5, 9, 1, 5, 9]);
        assert!(actions[..3].iter().all(|act| act.slot == 0));
        assert!(actions[3..].iter().all(|act| act.slot == 1));
    }

    #[test]
    fn action_space_uses_config_sizes() {
        let cfg = SpaceConfig::default();
        let space = ActionSpace::new(&cfg);

        assert_eq!(space.tx_actions().len(), 12 * 4 * 4);
        assert_eq!(space.jam_actions().len(), 12 * 4 * 4);
        assert_eq!(space.n_bins(), 48);
    }

    #[test]
    fn modulation_multipliers_increase() {
        let mults: Vec<_> = [
            Modulation::Bpsk,
            Modulation::Qpsk,
            Modulation::Qam16,
            Modulation::Qam64,
        ]
        .iter()
        .map(|m| m.multiplier())
        .collect();
        assert_eq!(mults, vec![1, 2, 4, 6]);
    }
}
