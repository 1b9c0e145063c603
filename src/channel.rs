//! Physical channel and interference model.
//!
//! Turns a pair of actions and an environment into link-level quantities.
//! Every function here is pure.

use crate::action::{ActionSpace, JamAction, TxAction};
use crate::config::EnvConfig;
use serde::{Deserialize, Serialize};

/// Physical quantities resulting from one transmitter/jammer encounter.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct PhysicalOutcome {
    pub tx_bin: usize,
    pub jam_center_bin: usize,
    /// Jammer span after clamping to the configured maximum.
    pub jam_span: usize,
    pub tx_power: f64,
    pub jam_power: f64,
    pub noise_power: f64,
    pub overlap: f64,
    pub interference: f64,
    pub sinr: f64,
    pub throughput_mbps: f64,
    pub jamming_intensity: f64,
}

impl PhysicalOutcome {
    pub fn sinr_db(&self) -> f64 {
        10.0 * self.sinr.log10()
    }
}

/// Map a frequency slot to the middle bin of its segment.
///
/// The bins are split evenly into `n_slots` segments (floor division), and
/// the result is clamped to the last bin.
pub fn resolve_frequency(slot: usize, n_slots: usize, n_bins: usize) -> usize {
    let bins_per_slot = n_bins / n_slots.max(1);
    let bin = slot * bins_per_slot + bins_per_slot / 2;
    bin.min(n_bins.saturating_sub(1))
}

/// Triangular overlap between a transmitter bin and a jammer footprint.
///
/// Zero outside `center ± span / 2`; inside it decays linearly from 1 at
/// the center to `1 / (span / 2 + 1)` at the edges.
pub fn compute_overlap(tx_bin: usize, jam_center_bin: usize, span: usize) -> f64 {
    let half = span / 2;
    let dist = tx_bin.abs_diff(jam_center_bin);
    if dist > half {
        return 0.0;
    }
    (1.0 - dist as f64 / (half + 1) as f64).max(0.0)
}

/// Evaluate the link for one pair of actions.
pub fn evaluate(
    space: &ActionSpace,
    tx: &TxAction,
    jam: &JamAction,
    cfg: &EnvConfig,
) -> PhysicalOutcome {
    let snr = 10f64.powf(cfg.snr_db / 10.0);
    let noise_power = cfg.noise_density * cfg.bandwidth_mhz * 1e6;

    let tx_power = cfg.tx_max_power * tx.power_level;
    let jam_power = cfg.jam_max_power * jam.power_level;

    let tx_bin = resolve_frequency(tx.slot, space.tx_slots(), space.n_bins());
    let jam_center_bin = resolve_frequency(jam.slot, space.jam_slots(), space.n_bins());
    let jam_span = jam.span.min(cfg.jam_max_span);

    let overlap = compute_overlap(tx_bin, jam_center_bin, jam_span);
    let interference = jam_power * overlap;

    // The unit floor keeps the ratio bounded when noise and interference vanish.
    let signal = tx_power * snr * tx.modulation.multiplier() as f64;
    let sinr = signal / (noise_power + interference + 1.0);

    let throughput_mbps = cfg.bandwidth_mhz * (1.0 + sinr).log2();
    let jamming_intensity = interference / (interference + noise_power + 1.0);

    PhysicalOutcome {
        tx_bin,
        jam_center_bin,
        jam_span,
        tx_power,
        jam_power,
        noise_power,
        overlap,
        interference,
        sinr,
        throughput_mbps,
        jamming_intensity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Modulation;
    use crate::config::{SpaceConfig, tests::base_env};

    #[test]
    fn slots_resolve_to_segment_midpoints() {
        assert_eq!(resolve_frequency(0, 12, 48), 2);
        assert_eq!(resolve_frequency(5, 12, 48), 22);
        assert_eq!(resolve_frequency(11, 12, 48), 46);
    }

    #[test]
    fn resolved_bin_is_clamped() {
        // 10 bins over 4 slots gives 2 bins per slot; slot 9 would land past the end.
        assert_eq!(resolve_frequency(9, 4, 10), 9);
        assert_eq!(resolve_frequency(0, 1, 1), 0);
    }

    #[test]
    fn overlap_is_bounded_and_peaks_at_center() {
        for span in 0..12 {
            for tx_bin in 0..30 {
                let overlap = compute_overlap(tx_bin, 15, span);
                assert!((0.0..=1.0).contains(&overlap));
                assert_eq!(overlap == 1.0, tx_bin == 15, "span {span}, bin {tx_bin}");
                if tx_bin.abs_diff(15) > span / 2 {
                    assert_eq!(overlap, 0.0);
                }
            }
        }
    }

    #[test]
    fn overlap_decays_linearly() {
        // span 5 -> half 2
        assert_eq!(compute_overlap(10, 10, 5), 1.0);
        assert!((compute_overlap(11, 10, 5) - 2.0 / 3.0).abs() < 1e-12);
        assert!((compute_overlap(8, 10, 5) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(compute_overlap(13, 10, 5), 0.0);
    }

    #[test]
    fn disjoint_frequencies_are_not_jammed() {
        let space = ActionSpace::new(&SpaceConfig::default());
        let cfg = base_env();
        let tx = TxAction {
            slot: 0,
            modulation: Modulation::Bpsk,
            power_level: 1.0,
        };
        let jam = JamAction {
            slot: 6,
            span: 9,
            power_level: 1.0,
        };

        let out = evaluate(&space, &tx, &jam, &cfg);

        assert_eq!(out.overlap, 0.0);
        assert_eq!(out.interference, 0.0);
        assert_eq!(out.jamming_intensity, 0.0);
        let snr = 10f64.powf(1.2);
        let expected_sinr = snr / (out.noise_power + 1.0);
        assert!((out.sinr - expected_sinr).abs() < 1e-9);
        assert!((out.throughput_mbps - 20.0 * (1.0 + expected_sinr).log2()).abs() < 1e-9);
    }

    #[test]
    fn co_channel_jamming_degrades_the_link() {
        let space = ActionSpace::new(&SpaceConfig::default());
        let cfg = base_env();
        let tx = TxAction {
            slot: 3,
            modulation: Modulation::Qam64,
            power_level: 1.0,
        };
        let clear = JamAction {
            slot: 9,
            span: 9,
            power_level: 1.0,
        };
        let hit = JamAction { slot: 3, ..clear };

        let clear = evaluate(&space, &tx, &clear, &cfg);
        let hit = evaluate(&space, &tx, &hit, &cfg);

        assert_eq!(hit.overlap, 1.0);
        assert_eq!(hit.interference, 30.0);
        assert!(hit.sinr > 0.0);
        assert!(hit.throughput_mbps < clear.throughput_mbps);
        assert!(hit.jamming_intensity > 0.9 && hit.jamming_intensity < 1.0);
    }

    #[test]
    fn span_is_clamped_to_configured_maximum() {
        let space = ActionSpace::new(&SpaceConfig::default());
        let mut cfg = base_env();
        cfg.jam_max_span = 1;
        let tx = TxAction {
            slot: 4,
            modulation: Modulation::Qpsk,
            power_level: 0.5,
        };
        // Adjacent slot centers are 4 bins apart, out of reach with a span of 1.
        let jam = JamAction {
            slot: 5,
            span: 9,
            power_level: 1.0,
        };

        let out = evaluate(&space, &tx, &jam, &cfg);

        assert_eq!(out.jam_span, 1);
        assert_eq!(out.overlap, 0.0);
        assert_eq!(out.tx_power, 0.5);
    }

    #[test]
    fn zero_bandwidth_gives_zero_throughput() {
        let space = ActionSpace::new(&SpaceConfig::default());
        let mut cfg = base_env();
        cfg.bandwidth_mhz = 0.0;
        let tx = space.tx_actions()[0];
        let jam = space.jam_actions()[0];

        let out = evaluate(&space, &tx, &jam, &cfg);

        assert_eq!(out.noise_power, 0.0);
        assert_eq!(out.throughput_mbps, 0.0);
        assert!(out.sinr.is_finite());
    }
}
