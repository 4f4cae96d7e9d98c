// Feature extraction - acoustic fingerprint of a room impulse response
//
// Module organization:
// - types: FeatureVector and its fixed 60-slot layout
// - spectral: centroid, rolloff, flatness, flux
// - temporal: clarity (C50/C80) and early-reflection energy bins
// - mfcc: framed mel-cepstral analysis
// - bands: octave-band energies and FFT band-pass
// - mod.rs: FeatureExtractor coordinator

pub(crate) mod bands;
pub(crate) mod mfcc;
pub(crate) mod spectral;
pub(crate) mod temporal;
mod types;

pub use bands::{octave_band_levels, AMBIENT_OCTAVE_CENTERS, CHIRP_OCTAVE_CENTERS};
pub use mfcc::MfccExtractor;
pub use types::{
    fit_to_length, slots, FeatureVector, FEATURE_VECTOR_LEN, NUM_EARLY_REFLECTION_BINS, NUM_MFCC,
    NUM_OCTAVE_BANDS,
};

use crate::config::ChirpFeatureConfig;
use crate::dsp::{next_power_of_two, power_spectrum};
use crate::error::DspError;
use crate::impulse::{estimate_edt, estimate_rt60, ImpulseResponse};
use mfcc::coefficient_statistics;
use spectral::{compute_flux, SpectralFeatures};
use temporal::TemporalFeatures;

/// Rolloff normalization (Hz)
const ROLLOFF_SCALE_HZ: f32 = 20000.0;

/// Centroid normalization (Hz)
const CENTROID_SCALE_HZ: f32 = 10000.0;

/// Feature extractor coordinator
///
/// Computes every chirp feature from one impulse response in slot order:
/// decay times, clarity, spectral shape, MFCC statistics, early reflections
/// and octave bands.
pub struct FeatureExtractor {
    sample_rate: u32,
    config: ChirpFeatureConfig,
    mfcc: MfccExtractor,
    temporal: TemporalFeatures,
}

impl FeatureExtractor {
    /// Create a new feature extractor with default framing
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate of the impulse responses in Hz
    pub fn new(sample_rate: u32) -> Self {
        Self::with_config(sample_rate, ChirpFeatureConfig::default())
    }

    pub fn with_config(sample_rate: u32, config: ChirpFeatureConfig) -> Self {
        let mfcc = MfccExtractor::new(
            sample_rate,
            config.frame_ms,
            config.hop_ms,
            config.num_mel_filters,
            config.mel_low_hz,
            NUM_MFCC,
        );
        Self {
            sample_rate,
            config,
            mfcc,
            temporal: TemporalFeatures::new(sample_rate),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Extract the feature vector of an impulse response
    ///
    /// # Errors
    /// `SampleRateMismatch` if the response was recorded at another rate.
    pub fn extract(&self, ir: &ImpulseResponse) -> Result<FeatureVector, DspError> {
        if ir.sample_rate != self.sample_rate {
            return Err(DspError::SampleRateMismatch {
                expected: self.sample_rate,
                actual: ir.sample_rate,
            });
        }
        Ok(self.extract_samples(&ir.data))
    }

    /// Extract features from raw impulse-response samples at this rate
    ///
    /// Never fails: degenerate input yields floor or sentinel values and an
    /// all-zero MFCC block when shorter than one frame.
    pub fn extract_samples(&self, ir: &[f32]) -> FeatureVector {
        let rt60 = estimate_rt60(ir, self.sample_rate);
        let edt = estimate_edt(ir, self.sample_rate);
        let sentinel = self.config.clarity_sentinel_db;
        let c50 = self.temporal.compute_clarity(ir, 50.0, sentinel);
        let c80 = self.temporal.compute_clarity(ir, 80.0, sentinel);

        // Whole-response spectrum for shape descriptors and octave bands
        let fft_size = next_power_of_two(ir.len());
        let power = power_spectrum(ir);
        let spectral = SpectralFeatures::new(self.sample_rate, fft_size);

        let frame_powers: Vec<Vec<f32>> = self
            .mfcc
            .frames(ir)
            .map(|frame| self.mfcc.frame_power(frame))
            .collect();
        let flux = mean_flux(&frame_powers);
        let coefficients: Vec<Vec<f32>> = frame_powers
            .iter()
            .map(|p| self.mfcc.coefficients_from_power(p))
            .collect();
        let (mfcc_mean, mfcc_variance) = coefficient_statistics(&coefficients, NUM_MFCC);

        FeatureVector::assemble(
            rt60,
            edt,
            c50,
            c80,
            [
                spectral.compute_centroid(&power) / CENTROID_SCALE_HZ,
                spectral.compute_rolloff(&power) / ROLLOFF_SCALE_HZ,
                flux,
                spectral.compute_flatness(&power),
            ],
            mfcc_mean,
            mfcc_variance,
            self.temporal.compute_early_reflections(ir),
            octave_band_levels(&power, self.sample_rate, fft_size, &CHIRP_OCTAVE_CENTERS),
        )
    }
}

/// Extract the 60-slot feature vector of an impulse response at its own rate
pub fn extract_features(ir: &ImpulseResponse) -> FeatureVector {
    FeatureExtractor::new(ir.sample_rate).extract_samples(&ir.data)
}

/// Mean spectral flux over consecutive frame spectra (0 with fewer than two)
pub(crate) fn mean_flux(frame_powers: &[Vec<f32>]) -> f32 {
    if frame_powers.len() < 2 {
        return 0.0;
    }
    let total: f32 = frame_powers
        .windows(2)
        .map(|pair| compute_flux(&pair[0], &pair[1]))
        .sum();
    total / (frame_powers.len() - 1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Noise burst with an exponential envelope reaching −60 dB at `rt60`
    fn synthetic_ir(sample_rate: u32, rt60: f32, seconds: f32, seed: u64) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        let tau = rt60 / (3.0 * std::f32::consts::LN_10);
        let len = (seconds * sample_rate as f32) as usize;
        (0..len)
            .map(|n| {
                let t = n as f32 / sample_rate as f32;
                rng.gen_range(-1.0..1.0) * (-t / tau).exp()
            })
            .collect()
    }

    #[test]
    fn test_raw_length_is_fixed() {
        let extractor = FeatureExtractor::new(48000);
        for len in [1usize, 100, 1199, 4800, 48000] {
            let features = extractor.extract_samples(&synthetic_ir(48000, 0.5, len as f32 / 48000.0, 7));
            assert_eq!(features.raw.len(), FEATURE_VECTOR_LEN, "len {}", len);
            assert!(features.raw.iter().all(|x| x.is_finite()));
        }
        assert_eq!(extractor.extract_samples(&[]).raw.len(), FEATURE_VECTOR_LEN);
    }

    #[test]
    fn test_short_input_has_zero_mfcc_block() {
        let extractor = FeatureExtractor::new(48000);
        // 25 ms frame is 1200 samples
        let features = extractor.extract_samples(&synthetic_ir(48000, 0.3, 0.02, 3));
        assert!(features.raw[slots::MFCC_MEAN].iter().all(|&x| x == 0.0));
        assert!(features.raw[slots::MFCC_VARIANCE].iter().all(|&x| x == 0.0));
        assert_eq!(features.spectral_flux, 0.0);
    }

    #[test]
    fn test_c50_sentinel_when_energy_ends_early() {
        let mut ir = synthetic_ir(48000, 0.05, 0.04, 11);
        ir.resize(9600, 0.0);
        let features = extract_features(&ImpulseResponse::new(ir, 48000));
        assert_eq!(features.c50, 20.0);
        assert_eq!(features.c80, 20.0);
    }

    #[test]
    fn test_reverberant_room_has_longer_decay_and_lower_clarity() {
        let extractor = FeatureExtractor::new(16000);
        let dry = extractor.extract_samples(&synthetic_ir(16000, 0.3, 1.5, 1));
        let wet = extractor.extract_samples(&synthetic_ir(16000, 1.2, 1.5, 1));

        println!("dry rt60 {} c50 {}, wet rt60 {} c50 {}", dry.rt60, dry.c50, wet.rt60, wet.c50);
        assert!(wet.rt60 > dry.rt60);
        assert!(wet.edt > dry.edt);
        assert!(wet.c50 < dry.c50);
        assert!(wet.c80 < dry.c80);
    }

    #[test]
    fn test_named_fields_match_raw_slots() {
        let features = FeatureExtractor::new(48000).extract_samples(&synthetic_ir(48000, 0.6, 0.5, 5));
        assert_eq!(features.raw[slots::RT60], features.rt60);
        assert_eq!(features.raw[slots::SPECTRAL_CENTROID], features.spectral_centroid);
        assert_eq!(features.mfcc_mean.len(), NUM_MFCC);
        assert_eq!(features.early_reflections.len(), NUM_EARLY_REFLECTION_BINS);
        assert_eq!(features.octave_bands.len(), NUM_OCTAVE_BANDS);
        assert!(features.spectral_centroid > 0.0 && features.spectral_centroid < 2.4);
        assert!(features.spectral_rolloff > 0.0 && features.spectral_rolloff <= 1.2);
        assert!(features.spectral_flatness > 0.0 && features.spectral_flatness <= 1.0);
        assert_eq!(features.early_reflections[0], 0.0);
    }

    #[test]
    fn test_extract_rejects_rate_mismatch() {
        let extractor = FeatureExtractor::new(48000);
        let ir = ImpulseResponse::new(vec![1.0; 100], 44100);
        assert!(matches!(
            extractor.extract(&ir),
            Err(DspError::SampleRateMismatch {
                expected: 48000,
                actual: 44100
            })
        ));
    }
}
