// Ambient module - passive room fingerprint from a plain recording
//
// No probe signal is emitted, so there is no impulse response to analyze.
// The recording is framed at 50 ms with a 25 ms hop and summarized into a
// fixed 73-slot vector:
//
//    0..8   spectral centroid/rolloff/flux/flatness (mean, std pairs)
//    8..21  MFCC means | 21..34 MFCC variances | 34..47 MFCC deltas
//   47..51  noise floor: overall level, p10, p50, p90 of frame levels (dB)
//   51..61  octave bands 31.5 Hz … 16 kHz (dB re total)
//   61      variance of per-frame mean-square power (linear)
//   62..68  hum peaks at 50/60/100/120/150/180 Hz (dB re mean power)
//   68..73  top autocorrelation peaks

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::config::AmbientConfig;
use crate::dsp::{
    irfft, linear_to_db, mean, next_power_of_two, percentile, power_spectrum, power_to_db,
    rfft_padded, rms, std_dev, variance, Complex, ENERGY_FLOOR,
};
use crate::error::DspError;
use crate::features::mfcc::{coefficient_deltas, coefficient_statistics};
use crate::features::spectral::{compute_flux, SpectralFeatures};
use crate::features::{
    fit_to_length, octave_band_levels, MfccExtractor, AMBIENT_OCTAVE_CENTERS, NUM_MFCC,
};

/// Length of every ambient feature vector
pub const AMBIENT_VECTOR_LEN: usize = 73;

/// Mains hum fundamentals and harmonics probed for HVAC/electrical noise
pub const HVAC_FREQUENCIES: [f32; 6] = [50.0, 60.0, 100.0, 120.0, 150.0, 180.0];

/// Autocorrelation peaks kept
pub const NUM_AUTOCORRELATION_PEAKS: usize = 5;

/// Slot indices inside `AmbientFeatureVector::raw`
pub mod ambient_slots {
    use std::ops::Range;

    pub const SPECTRAL_STATS: Range<usize> = 0..8;
    pub const MFCC_MEAN: Range<usize> = 8..21;
    pub const MFCC_VARIANCE: Range<usize> = 21..34;
    pub const MFCC_DELTA: Range<usize> = 34..47;
    pub const NOISE_FLOOR: Range<usize> = 47..51;
    pub const OCTAVE_BANDS: Range<usize> = 51..61;
    pub const POWER_VARIANCE: usize = 61;
    pub const HVAC_PEAKS: Range<usize> = 62..68;
    pub const AUTOCORRELATION_PEAKS: Range<usize> = 68..73;
}

/// Passive acoustic fingerprint of a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientFeatureVector {
    pub spectral_centroid_mean: f32,
    pub spectral_centroid_std: f32,
    pub spectral_rolloff_mean: f32,
    pub spectral_rolloff_std: f32,
    pub spectral_flux_mean: f32,
    pub spectral_flux_std: f32,
    pub spectral_flatness_mean: f32,
    pub spectral_flatness_std: f32,
    pub mfcc_mean: Vec<f32>,
    pub mfcc_variance: Vec<f32>,
    pub mfcc_delta: Vec<f32>,
    /// Whole-recording RMS level in dB
    pub noise_floor_db: f32,
    /// 10th/50th/90th percentiles of per-frame RMS level in dB
    pub noise_floor_percentiles: Vec<f32>,
    pub octave_bands: Vec<f32>,
    /// Variance across frames of the linear mean-square frame power
    pub power_variance: f32,
    pub hvac_peaks: Vec<f32>,
    pub autocorrelation_peaks: Vec<f32>,
    /// All of the above in slot order, exactly 73 values
    pub raw: Vec<f32>,
}

impl AmbientFeatureVector {
    /// Rebuild named fields from a stored raw vector
    ///
    /// # Errors
    /// `FeatureLengthMismatch` unless `raw.len() == 73`.
    pub fn from_raw(raw: &[f32]) -> Result<Self, DspError> {
        if raw.len() != AMBIENT_VECTOR_LEN {
            return Err(DspError::FeatureLengthMismatch {
                expected: AMBIENT_VECTOR_LEN,
                actual: raw.len(),
            });
        }
        Ok(Self::from_slots(raw.to_vec()))
    }

    fn from_slots(raw: Vec<f32>) -> Self {
        let range = |r: Range<usize>| raw[r].to_vec();
        let stats = &raw[ambient_slots::SPECTRAL_STATS];
        Self {
            spectral_centroid_mean: stats[0],
            spectral_centroid_std: stats[1],
            spectral_rolloff_mean: stats[2],
            spectral_rolloff_std: stats[3],
            spectral_flux_mean: stats[4],
            spectral_flux_std: stats[5],
            spectral_flatness_mean: stats[6],
            spectral_flatness_std: stats[7],
            mfcc_mean: range(ambient_slots::MFCC_MEAN),
            mfcc_variance: range(ambient_slots::MFCC_VARIANCE),
            mfcc_delta: range(ambient_slots::MFCC_DELTA),
            noise_floor_db: raw[ambient_slots::NOISE_FLOOR.start],
            noise_floor_percentiles: range(ambient_slots::NOISE_FLOOR.start + 1..ambient_slots::NOISE_FLOOR.end),
            octave_bands: range(ambient_slots::OCTAVE_BANDS),
            power_variance: raw[ambient_slots::POWER_VARIANCE],
            hvac_peaks: range(ambient_slots::HVAC_PEAKS),
            autocorrelation_peaks: range(ambient_slots::AUTOCORRELATION_PEAKS),
            raw,
        }
    }
}

/// Ambient feature extractor for one sample rate
pub struct AmbientFeatureExtractor {
    sample_rate: u32,
    config: AmbientConfig,
    mfcc: MfccExtractor,
}

impl AmbientFeatureExtractor {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_config(sample_rate, AmbientConfig::default())
    }

    pub fn with_config(sample_rate: u32, config: AmbientConfig) -> Self {
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
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Compute the 73-slot vector of a passive recording
    ///
    /// Recordings shorter than one frame give zero frame statistics; the
    /// whole-signal features are still computed.
    pub fn extract(&self, audio: &[f32]) -> AmbientFeatureVector {
        let spectral = SpectralFeatures::new(self.sample_rate, self.mfcc.fft_size());

        let mut centroids = Vec::new();
        let mut rolloffs = Vec::new();
        let mut flatness = Vec::new();
        let mut levels = Vec::new();
        let mut mean_squares = Vec::new();
        let mut frame_powers = Vec::new();
        for frame in self.mfcc.frames(audio) {
            let power = self.mfcc.frame_power(frame);
            centroids.push(spectral.compute_centroid(&power) / 10000.0);
            rolloffs.push(spectral.compute_rolloff(&power) / 20000.0);
            flatness.push(spectral.compute_flatness(&power));
            let frame_rms = rms(frame);
            levels.push(linear_to_db(frame_rms));
            mean_squares.push(frame_rms * frame_rms);
            frame_powers.push(power);
        }
        let fluxes: Vec<f32> = frame_powers
            .windows(2)
            .map(|pair| compute_flux(&pair[0], &pair[1]))
            .collect();

        let coefficients: Vec<Vec<f32>> = frame_powers
            .iter()
            .map(|p| self.mfcc.coefficients_from_power(p))
            .collect();
        let (mfcc_mean, mfcc_variance) = coefficient_statistics(&coefficients, NUM_MFCC);
        let mfcc_delta = coefficient_deltas(&coefficients, NUM_MFCC);

        let overall_db = linear_to_db(rms(audio));
        if levels.is_empty() {
            levels.push(overall_db);
        }

        let fft_size = next_power_of_two(audio.len());
        let whole_power = power_spectrum(audio);

        let mut values = vec![
            mean(&centroids),
            std_dev(&centroids),
            mean(&rolloffs),
            std_dev(&rolloffs),
            mean(&fluxes),
            std_dev(&fluxes),
            mean(&flatness),
            std_dev(&flatness),
        ];
        values.extend(mfcc_mean);
        values.extend(mfcc_variance);
        values.extend(mfcc_delta);
        values.extend([
            overall_db,
            percentile(&levels, 10.0),
            percentile(&levels, 50.0),
            percentile(&levels, 90.0),
        ]);
        values.extend(octave_band_levels(
            &whole_power,
            self.sample_rate,
            fft_size,
            &AMBIENT_OCTAVE_CENTERS,
        ));
        values.push(variance(&mean_squares));
        values.extend(hvac_peaks(
            &whole_power,
            self.sample_rate,
            fft_size,
            self.config.hvac_search_hz,
        ));
        values.extend(autocorrelation_peaks(
            audio,
            self.config.autocorrelation_min_lag_ratio,
            NUM_AUTOCORRELATION_PEAKS,
        ));

        AmbientFeatureVector::from_slots(fit_to_length(values, AMBIENT_VECTOR_LEN))
    }
}

/// Compute the ambient feature vector with default framing
pub fn extract_ambient_features(audio: &[f32], sample_rate: u32) -> AmbientFeatureVector {
    AmbientFeatureExtractor::new(sample_rate).extract(audio)
}

/// Strongest bin within ±`search_hz` of each hum frequency, in dB relative
/// to the mean spectrum power
///
/// When no bin center falls inside the window (coarse spectra) the nearest
/// bin is used.
pub fn hvac_peaks(power: &[f32], sample_rate: u32, fft_size: usize, search_hz: f32) -> Vec<f32> {
    let bin_width = sample_rate as f32 / fft_size.max(1) as f32;
    let reference_db = power_to_db(mean(power));
    let last = power.len().saturating_sub(1);

    HVAC_FREQUENCIES
        .iter()
        .map(|&target| {
            if power.is_empty() {
                return 0.0;
            }
            let low = ((target - search_hz).max(0.0) / bin_width).ceil() as usize;
            let high = (((target + search_hz) / bin_width).floor() as usize).min(last);
            let peak = if low <= high {
                power[low..=high].iter().fold(0.0f32, |acc, &p| acc.max(p))
            } else {
                power[((target / bin_width).round() as usize).min(last)]
            };
            power_to_db(peak) - reference_db
        })
        .collect()
}

/// Largest local maxima of the normalized autocorrelation
///
/// Lags below `max(1, len·min_lag_ratio)` are skipped so the zero-lag lobe
/// does not dominate. Peaks are returned in descending order, zero-padded to
/// `count`.
pub fn autocorrelation_peaks(signal: &[f32], min_lag_ratio: f32, count: usize) -> Vec<f32> {
    let mut peaks = Vec::new();
    let r = autocorrelation(signal);
    if let Some(&r0) = r.first() {
        if r0 > ENERGY_FLOOR {
            let min_lag = ((signal.len() as f32 * min_lag_ratio) as usize).max(1);
            for lag in min_lag..r.len().saturating_sub(1) {
                if r[lag] > r[lag - 1] && r[lag] >= r[lag + 1] {
                    peaks.push(r[lag] / r0);
                }
            }
        }
    }

    peaks.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    fit_to_length(peaks, count)
}

/// Linear (non-circular) autocorrelation for lags 0..len via the FFT
fn autocorrelation(signal: &[f32]) -> Vec<f32> {
    if signal.is_empty() {
        return Vec::new();
    }
    let size = next_power_of_two(2 * signal.len());
    let Ok(spectrum) = rfft_padded(signal, size) else {
        return vec![0.0; signal.len()];
    };
    let power: Vec<Complex> = spectrum
        .iter()
        .map(|c| Complex::new(c.norm_sqr(), 0.0))
        .collect();
    match irfft(&power) {
        Ok(mut r) => {
            r.truncate(signal.len());
            r
        }
        Err(_) => vec![0.0; signal.len()],
    }
}
