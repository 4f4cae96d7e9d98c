// Bands module - octave-band energies and FFT band-pass filtering

use std::f32::consts::SQRT_2;

use crate::dsp::{irfft, power_to_db, rfft, Complex, ENERGY_FLOOR};

/// Octave centers for chirp (RIR) features, 125 Hz … 8 kHz
pub const CHIRP_OCTAVE_CENTERS: [f32; 7] = [125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0];

/// Octave centers for ambient features, 31.5 Hz … 16 kHz
pub const AMBIENT_OCTAVE_CENTERS: [f32; 10] = [
    31.5, 63.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// Band edges [center/√2, center·√2)
pub fn octave_band_edges(center_hz: f32) -> (f32, f32) {
    (center_hz / SQRT_2, center_hz * SQRT_2)
}

/// Energy of each octave band relative to the total, in dB
///
/// `power` is a one-sided spectrum computed with `fft_size`. A silent
/// spectrum gives the floor level (−100 dB) in every band.
pub fn octave_band_levels(power: &[f32], sample_rate: u32, fft_size: usize, centers: &[f32]) -> Vec<f32> {
    let bin_width = sample_rate as f32 / fft_size.max(1) as f32;
    let total: f32 = power.iter().sum();

    centers
        .iter()
        .map(|&center| {
            let (low, high) = octave_band_edges(center);
            let band: f32 = power
                .iter()
                .enumerate()
                .filter(|(i, _)| {
                    let freq = *i as f32 * bin_width;
                    freq >= low && freq < high
                })
                .map(|(_, &p)| p)
                .sum();
            if total > ENERGY_FLOOR {
                power_to_db(band / total)
            } else {
                power_to_db(0.0)
            }
        })
        .collect()
}

/// Zero every FFT bin outside [low_hz, high_hz) and transform back
///
/// Brick-wall filter on the zero-padded spectrum; the result has the input's
/// length.
pub fn bandpass(signal: &[f32], sample_rate: u32, low_hz: f32, high_hz: f32) -> Vec<f32> {
    if signal.is_empty() {
        return Vec::new();
    }
    let mut spectrum = rfft(signal);
    let n = spectrum.len();
    let bin_width = sample_rate as f32 / n as f32;

    for (k, bin) in spectrum.iter_mut().enumerate() {
        // Mirror bins above N/2 onto their positive frequency
        let freq = k.min(n - k) as f32 * bin_width;
        if freq < low_hz || freq >= high_hz {
            *bin = Complex::new(0.0, 0.0);
        }
    }

    match irfft(&spectrum) {
        Ok(mut filtered) => {
            filtered.truncate(signal.len());
            filtered
        }
        // rfft always returns a power-of-two length
        Err(_) => vec![0.0; signal.len()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{power_spectrum, rms};

    fn sine(sample_rate: u32, frequency: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_octave_edges() {
        let (low, high) = octave_band_edges(1000.0);
        assert!((low - 707.1).abs() < 0.1);
        assert!((high - 1414.2).abs() < 0.1);
    }

    #[test]
    fn test_sine_energy_lands_in_its_octave() {
        let signal = sine(48000, 1000.0, 8192);
        let levels = octave_band_levels(&power_spectrum(&signal), 48000, 8192, &CHIRP_OCTAVE_CENTERS);
        assert_eq!(levels.len(), 7);
        // 1 kHz band holds nearly everything
        assert!(levels[3] > -0.5, "1k band {}", levels[3]);
        assert!(levels[0] < -30.0, "125 Hz band {}", levels[0]);
    }

    #[test]
    fn test_silence_gives_floor_levels() {
        let levels = octave_band_levels(&[0.0; 513], 48000, 1024, &AMBIENT_OCTAVE_CENTERS);
        assert_eq!(levels.len(), 10);
        assert!(levels.iter().all(|&l| (l + 100.0).abs() < 1e-3));
    }

    #[test]
    fn test_bandpass_keeps_in_band_and_removes_out_of_band() {
        let sample_rate = 16000;
        let low: Vec<f32> = sine(sample_rate, 250.0, 4096);
        let high: Vec<f32> = sine(sample_rate, 4000.0, 4096);
        let mixed: Vec<f32> = low.iter().zip(&high).map(|(a, b)| a + b).collect();

        let (lo, hi) = octave_band_edges(4000.0);
        let filtered = bandpass(&mixed, sample_rate, lo, hi);
        assert_eq!(filtered.len(), mixed.len());
        let residual: Vec<f32> = filtered.iter().zip(&high).map(|(f, h)| f - h).collect();
        assert!(rms(&residual) < 0.05, "residual rms {}", rms(&residual));
    }
}
