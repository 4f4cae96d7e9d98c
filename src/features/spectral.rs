// Spectral module - Frequency-domain feature extraction
//
// This module computes spectral shape descriptors from one-sided power
// spectra (|X|²/N bins as produced by the DSP kernel).
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

use crate::dsp::ENERGY_FLOOR;

/// Spectral rolloff threshold (85% of spectral energy)
const ROLLOFF_THRESHOLD: f32 = 0.85;

/// Spectral feature computation functions
pub struct SpectralFeatures {
    sample_rate: u32,
    fft_size: usize,
}

impl SpectralFeatures {
    /// Create a new spectral features processor
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `fft_size` - FFT size the spectra were computed with
    pub fn new(sample_rate: u32, fft_size: usize) -> Self {
        Self {
            sample_rate,
            fft_size: fft_size.max(1),
        }
    }

    /// Width of one FFT bin in Hz
    pub fn bin_width(&self) -> f32 {
        self.sample_rate as f32 / self.fft_size as f32
    }

    /// Spectral centroid in Hz: Σ(f_i × P[i]) / ΣP[i]
    pub fn compute_centroid(&self, power: &[f32]) -> f32 {
        let bin_width = self.bin_width();
        let weighted_sum: f32 = power
            .iter()
            .enumerate()
            .map(|(i, &p)| i as f32 * bin_width * p)
            .sum();
        let total: f32 = power.iter().sum();

        if total > ENERGY_FLOOR {
            weighted_sum / total
        } else {
            0.0
        }
    }

    /// Frequency in Hz below which 85% of the spectral energy lies
    pub fn compute_rolloff(&self, power: &[f32]) -> f32 {
        let total: f32 = power.iter().sum();
        if total < ENERGY_FLOOR {
            return 0.0;
        }

        let threshold = ROLLOFF_THRESHOLD * total;
        let bin_width = self.bin_width();
        let mut cumulative = 0.0;
        for (i, &p) in power.iter().enumerate() {
            cumulative += p;
            if cumulative >= threshold {
                return i as f32 * bin_width;
            }
        }

        (power.len().saturating_sub(1)) as f32 * bin_width
    }

    /// Spectral flatness (0 = tonal, 1 = white)
    ///
    /// Geometric over arithmetic mean of the bins above 1e-10.
    pub fn compute_flatness(&self, power: &[f32]) -> f32 {
        let (count, log_sum, sum) = power
            .iter()
            .filter(|&&p| p > ENERGY_FLOOR)
            .fold((0usize, 0.0f64, 0.0f64), |(n, logs, total), &p| {
                (n + 1, logs + (p as f64).ln(), total + p as f64)
            });
        if count == 0 {
            return 0.0;
        }

        let geometric_mean = (log_sum / count as f64).exp();
        let arithmetic_mean = sum / count as f64;
        if arithmetic_mean > ENERGY_FLOOR as f64 {
            ((geometric_mean / arithmetic_mean) as f32).min(1.0)
        } else {
            0.0
        }
    }

    /// Total power in the bins whose center frequency lies in [low, high)
    pub fn band_energy(&self, power: &[f32], low_hz: f32, high_hz: f32) -> f32 {
        let bin_width = self.bin_width();
        power
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                let freq = *i as f32 * bin_width;
                freq >= low_hz && freq < high_hz
            })
            .map(|(_, &p)| p)
            .sum()
    }
}

/// Spectral flux between two power spectra
///
/// Euclidean distance between the unit-norm magnitude spectra, so it is
/// independent of level and lies in [0, √2]. Returns 0 if either is silent.
pub fn compute_flux(previous: &[f32], current: &[f32]) -> f32 {
    let magnitudes = |power: &[f32]| -> Vec<f32> { power.iter().map(|p| p.max(0.0).sqrt()).collect() };
    let prev = magnitudes(previous);
    let curr = magnitudes(current);

    let norm = |v: &[f32]| v.iter().map(|x| x * x).sum::<f32>().sqrt();
    let (prev_norm, curr_norm) = (norm(&prev), norm(&curr));
    if prev_norm < ENERGY_FLOOR || curr_norm < ENERGY_FLOOR {
        return 0.0;
    }

    prev.iter()
        .zip(curr.iter())
        .map(|(p, c)| {
            let diff = c / curr_norm - p / prev_norm;
            diff * diff
        })
        .sum::<f32>()
        .sqrt()
}
