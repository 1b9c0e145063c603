//! Scalar rewards of both agents.

use crate::channel::PhysicalOutcome;

const TX_POWER_COST: f64 = 0.02;
const TX_OVERLAP_PENALTY: f64 = 6.0;
const JAM_THROUGHPUT_PENALTY: f64 = 0.08;

/// Reward throughput, penalize transmit power and spectral overlap with the jammer.
pub fn tx_reward(out: &PhysicalOutcome) -> f64 {
    out.throughput_mbps - TX_POWER_COST * out.tx_power - TX_OVERLAP_PENALTY * out.overlap
}

/// Reward denied link budget weighted by jammer power, penalize residual throughput.
pub fn jam_reward(out: &PhysicalOutcome) -> f64 {
    out.jamming_intensity * out.jam_power - JAM_THROUGHPUT_PENALTY * out.throughput_mbps
}
