// Types module - fixed-layout chirp feature vector
//
// Slot layout of `FeatureVector::raw` (60 slots):
//   0 rt60 | 1 edt | 2 c50 | 3 c80
//   4 centroid/10k | 5 rolloff/20k | 6 flux | 7 flatness
//   8..21 MFCC means | 21..34 MFCC variances
//   34..42 early-reflection bins (dB re first bin)
//   42..49 octave-band energies (dB re total)
//   49..60 zero padding

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::DspError;

/// Length of every chirp feature vector
pub const FEATURE_VECTOR_LEN: usize = 60;

/// Cepstral coefficients kept per frame
pub const NUM_MFCC: usize = 13;

/// 10 ms energy bins covering the first 80 ms
pub const NUM_EARLY_REFLECTION_BINS: usize = 8;

/// Octave bands 125 Hz … 8 kHz
pub const NUM_OCTAVE_BANDS: usize = 7;

/// Slot indices inside `FeatureVector::raw`
pub mod slots {
    use std::ops::Range;

    pub const RT60: usize = 0;
    pub const EDT: usize = 1;
    pub const C50: usize = 2;
    pub const C80: usize = 3;
    pub const SPECTRAL_CENTROID: usize = 4;
    pub const SPECTRAL_ROLLOFF: usize = 5;
    pub const SPECTRAL_FLUX: usize = 6;
    pub const SPECTRAL_FLATNESS: usize = 7;
    pub const MFCC_MEAN: Range<usize> = 8..21;
    pub const MFCC_VARIANCE: Range<usize> = 21..34;
    pub const EARLY_REFLECTIONS: Range<usize> = 34..42;
    pub const OCTAVE_BANDS: Range<usize> = 42..49;
}

/// Acoustic fingerprint computed from one room impulse response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Reverberation time in seconds (T30 extrapolation)
    pub rt60: f32,
    /// Early decay time in seconds
    pub edt: f32,
    /// Clarity at 50 ms in dB
    pub c50: f32,
    /// Clarity at 80 ms in dB
    pub c80: f32,
    /// Spectral centroid in Hz / 10000
    pub spectral_centroid: f32,
    /// 85% rolloff frequency in Hz / 20000
    pub spectral_rolloff: f32,
    /// Mean frame-to-frame spectral change
    pub spectral_flux: f32,
    /// Geometric / arithmetic mean of the power spectrum
    pub spectral_flatness: f32,
    pub mfcc_mean: Vec<f32>,
    pub mfcc_variance: Vec<f32>,
    pub early_reflections: Vec<f32>,
    pub octave_bands: Vec<f32>,
    /// All of the above in slot order, exactly 60 values
    pub raw: Vec<f32>,
}

impl FeatureVector {
    /// Assemble named fields and derive `raw`
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        rt60: f32,
        edt: f32,
        c50: f32,
        c80: f32,
        spectral: [f32; 4],
        mfcc_mean: Vec<f32>,
        mfcc_variance: Vec<f32>,
        early_reflections: Vec<f32>,
        octave_bands: Vec<f32>,
    ) -> Self {
        let mfcc_mean = fit_to_length(mfcc_mean, NUM_MFCC);
        let mfcc_variance = fit_to_length(mfcc_variance, NUM_MFCC);
        let early_reflections = fit_to_length(early_reflections, NUM_EARLY_REFLECTION_BINS);
        let octave_bands = fit_to_length(octave_bands, NUM_OCTAVE_BANDS);

        let mut values = vec![rt60, edt, c50, c80];
        values.extend_from_slice(&spectral);
        values.extend_from_slice(&mfcc_mean);
        values.extend_from_slice(&mfcc_variance);
        values.extend_from_slice(&early_reflections);
        values.extend_from_slice(&octave_bands);
        let raw = fit_to_length(values, FEATURE_VECTOR_LEN);

        Self::from_slots(raw)
    }

    /// Rebuild named fields from a stored raw vector
    ///
    /// # Errors
    /// `FeatureLengthMismatch` unless `raw.len() == 60`.
    pub fn from_raw(raw: &[f32]) -> Result<Self, DspError> {
        if raw.len() != FEATURE_VECTOR_LEN {
            return Err(DspError::FeatureLengthMismatch {
                expected: FEATURE_VECTOR_LEN,
                actual: raw.len(),
            });
        }
        Ok(Self::from_slots(raw.to_vec()))
    }

    fn from_slots(raw: Vec<f32>) -> Self {
        let range = |r: Range<usize>| raw[r].to_vec();
        Self {
            rt60: raw[slots::RT60],
            edt: raw[slots::EDT],
            c50: raw[slots::C50],
            c80: raw[slots::C80],
            spectral_centroid: raw[slots::SPECTRAL_CENTROID],
            spectral_rolloff: raw[slots::SPECTRAL_ROLLOFF],
            spectral_flux: raw[slots::SPECTRAL_FLUX],
            spectral_flatness: raw[slots::SPECTRAL_FLATNESS],
            mfcc_mean: range(slots::MFCC_MEAN),
            mfcc_variance: range(slots::MFCC_VARIANCE),
            early_reflections: range(slots::EARLY_REFLECTIONS),
            octave_bands: range(slots::OCTAVE_BANDS),
            raw,
        }
    }
}

/// Truncate or zero-pad to exactly `len` values, replacing non-finite values with 0
pub fn fit_to_length(mut values: Vec<f32>, len: usize) -> Vec<f32> {
    values.resize(len, 0.0);
    for value in values.iter_mut() {
        if !value.is_finite() {
            *value = 0.0;
        }
    }
    values
}
