// Temporal module - time-domain energy features of an impulse response
//
// Clarity compares energy before and after a split point; the early
// reflection profile bins the first 80 ms into 10 ms energy slices.

use super::types::NUM_EARLY_REFLECTION_BINS;
use crate::dsp::ENERGY_FLOOR;

/// Width of one early-reflection bin
const EARLY_BIN_MS: f32 = 10.0;

/// Time-domain feature computation functions
pub struct TemporalFeatures {
    sample_rate: u32,
}

impl TemporalFeatures {
    /// Create a new temporal features processor
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    fn ms_to_samples(&self, ms: f32) -> usize {
        ((ms / 1000.0) * self.sample_rate as f32).round() as usize
    }

    /// Clarity index in dB at a split time
    ///
    /// `10·log10(early / late)` with the split measured from the first sample.
    /// Returns `sentinel_db` when late energy is below 1e-10.
    pub fn compute_clarity(&self, ir: &[f32], split_ms: f32, sentinel_db: f32) -> f32 {
        let split = self.ms_to_samples(split_ms).min(ir.len());
        let (early, late) = ir.split_at(split);
        let early_energy = energy(early);
        let late_energy = energy(late);

        if late_energy < ENERGY_FLOOR {
            return sentinel_db;
        }
        10.0 * (early_energy.max(ENERGY_FLOOR) / late_energy).log10()
    }

    /// Energy of eight 10 ms bins over 0–80 ms, in dB relative to the first bin
    ///
    /// Bins past the end of the response hold no energy and sit at the floor.
    pub fn compute_early_reflections(&self, ir: &[f32]) -> Vec<f32> {
        let bin = self.ms_to_samples(EARLY_BIN_MS).max(1);
        let energies: Vec<f32> = (0..NUM_EARLY_REFLECTION_BINS)
            .map(|i| {
                let start = (i * bin).min(ir.len());
                let end = ((i + 1) * bin).min(ir.len());
                energy(&ir[start..end])
            })
            .collect();

        let reference = energies[0].max(ENERGY_FLOOR);
        energies
            .iter()
            .map(|&e| 10.0 * (e.max(ENERGY_FLOOR) / reference).log10())
            .collect()
    }
}

fn energy(samples: &[f32]) -> f32 {
    samples.iter().map(|x| x * x).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clarity_sentinel_when_no_late_energy() {
        let temporal = TemporalFeatures::new(48000);
        // All energy in the first 40 ms, exact zeros afterwards
        let mut ir = vec![0.0f32; 9600];
        for (i, x) in ir.iter_mut().take(1920).enumerate() {
            *x = (-(i as f32) / 200.0).exp();
        }
        assert_eq!(temporal.compute_clarity(&ir, 50.0, 20.0), 20.0);
    }

    #[test]
    fn test_clarity_balanced_energy_is_zero_db() {
        let temporal = TemporalFeatures::new(1000);
        let ir = vec![1.0f32; 100];
        let c50 = temporal.compute_clarity(&ir, 50.0, 20.0);
        assert!(c50.abs() < 1e-4, "c50 {}", c50);
    }

    #[test]
    fn test_clarity_grows_with_earlier_energy() {
        let temporal = TemporalFeatures::new(1000);
        let mut ir = vec![0.1f32; 200];
        ir[10] = 1.0;
        let c50 = temporal.compute_clarity(&ir, 50.0, 20.0);
        let c80 = temporal.compute_clarity(&ir, 80.0, 20.0);
        assert!(c80 > c50);
    }

    #[test]
    fn test_early_reflections_relative_to_first_bin() {
        let temporal = TemporalFeatures::new(1000);
        // 10-sample bins: bin 0 amplitude 1, bin 3 amplitude 0.1
        let mut ir = vec![0.0f32; 80];
        ir[0..10].fill(1.0);
        ir[30..40].fill(0.1);
        let bins = temporal.compute_early_reflections(&ir);
        assert_eq!(bins.len(), 8);
        assert_eq!(bins[0], 0.0);
        assert!((bins[3] + 20.0).abs() < 1e-3, "bin 3 {}", bins[3]);
        assert!(bins[1] < -90.0);
    }

    #[test]
    fn test_early_reflections_of_empty_response() {
        let temporal = TemporalFeatures::new(48000);
        assert_eq!(temporal.compute_early_reflections(&[]), vec![0.0; 8]);
    }
}
