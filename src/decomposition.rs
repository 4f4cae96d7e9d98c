// Decomposition module - early/late split of an impulse response
//
// After the mixing time the reverberant field is diffuse and its statistics
// barely depend on where source and receiver sit, while the early part is a
// handful of discrete reflections that change with every device pose. The
// split produces a 68-slot vector:
//
//    0..20  late reverberation (orientation-invariant)
//   20..68  early reflections (chirp feature slots 1..49 of the early segment)
//
// Late slots: rt60 | 7 octave decay rates (dB/s) | 7 late octave-band
// energies (dB re late total) | centroid/10k | flatness | energy fraction
// below 300 Hz | late share of total energy | mixing time (s)

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::config::{ChirpFeatureConfig, MixingTimeConfig};
use crate::dsp::{mean, next_power_of_two, power_spectrum, std_dev, ENERGY_FLOOR};
use crate::error::DspError;
use crate::features::bands::{bandpass, octave_band_edges};
use crate::features::spectral::SpectralFeatures;
use crate::features::{fit_to_length, octave_band_levels, FeatureExtractor, CHIRP_OCTAVE_CENTERS};
use crate::impulse::{estimate_rt60, ImpulseResponse};

pub const LATE_FEATURE_LEN: usize = 20;
pub const EARLY_FEATURE_LEN: usize = 48;
pub const ORIENTATION_AWARE_LEN: usize = LATE_FEATURE_LEN + EARLY_FEATURE_LEN;

/// Chirp feature slots carried over as early-reflection features (RT60 dropped)
const EARLY_SOURCE_SLOTS: Range<usize> = 1..49;

/// Low-frequency energy cutoff for the late segment
const LOW_FREQUENCY_CUTOFF_HZ: f32 = 300.0;

/// Late segment length treated as fully adequate
const CONFIDENCE_MIN_LATE_MS: f32 = 100.0;

/// Late energy share treated as fully adequate
const CONFIDENCE_EXPECTED_LATE_FRACTION: f32 = 0.2;

/// Slot ranges and detection details for downstream weighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMetadata {
    pub late_reverb_range: Range<usize>,
    pub early_reflection_range: Range<usize>,
    pub mixing_time_ms: f32,
    /// Reliability of the late-reverb estimate, 0–1
    pub confidence: f32,
}

/// Chirp features split into orientation-invariant and orientation-sensitive parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientationAwareFeatures {
    pub late_reverb_features: Vec<f32>,
    pub early_reflection_features: Vec<f32>,
    /// Late followed by early, exactly 68 values
    pub raw: Vec<f32>,
    pub metadata: FeatureMetadata,
}

impl OrientationAwareFeatures {
    fn from_parts(late: Vec<f32>, early: Vec<f32>, mixing_time_ms: f32, confidence: f32) -> Self {
        let late_reverb_features = fit_to_length(late, LATE_FEATURE_LEN);
        let early_reflection_features = fit_to_length(early, EARLY_FEATURE_LEN);
        let mut raw = late_reverb_features.clone();
        raw.extend_from_slice(&early_reflection_features);

        Self {
            late_reverb_features,
            early_reflection_features,
            raw,
            metadata: FeatureMetadata {
                late_reverb_range: 0..LATE_FEATURE_LEN,
                early_reflection_range: LATE_FEATURE_LEN..ORIENTATION_AWARE_LEN,
                mixing_time_ms,
                confidence,
            },
        }
    }

    /// Rebuild from a stored raw vector
    ///
    /// The mixing time is recovered from its late-reverb slot; confidence is
    /// not part of the vector and must be supplied.
    ///
    /// # Errors
    /// `FeatureLengthMismatch` unless `raw.len() == 68`.
    pub fn from_raw(raw: &[f32], confidence: f32) -> Result<Self, DspError> {
        if raw.len() != ORIENTATION_AWARE_LEN {
            return Err(DspError::FeatureLengthMismatch {
                expected: ORIENTATION_AWARE_LEN,
                actual: raw.len(),
            });
        }
        let (late, early) = raw.split_at(LATE_FEATURE_LEN);
        let mixing_time_ms = late[LATE_FEATURE_LEN - 1] * 1000.0;
        Ok(Self::from_parts(
            late.to_vec(),
            early.to_vec(),
            mixing_time_ms,
            confidence.clamp(0.0, 1.0),
        ))
    }
}

/// Detect the mixing time of an impulse response in milliseconds
///
/// The energy envelope is cut into `envelope_window_ms` windows and the
/// coefficient of variation is computed over ±`neighborhood_windows`. The
/// mixing time is the start of the first run of `stable_windows` windows whose
/// CoV stays below `cov_threshold`, clamped to [`min_ms`, `max_ms`]. Responses
/// shorter than 1.5 × `default_ms` give `min(default_ms, duration / 2)`.
pub fn detect_mixing_time(ir: &[f32], sample_rate: u32, config: &MixingTimeConfig) -> f32 {
    let duration_ms = if sample_rate == 0 {
        0.0
    } else {
        ir.len() as f32 * 1000.0 / sample_rate as f32
    };
    if duration_ms < 1.5 * config.default_ms {
        return config.default_ms.min(duration_ms * 0.5);
    }

    let envelope = energy_envelope(ir, sample_rate, config.envelope_window_ms);
    let k = config.neighborhood_windows;
    let stable = config.stable_windows.max(1);

    let mut run = 0;
    let mut detected = None;
    for i in 0..envelope.len() {
        let neighborhood = &envelope[i.saturating_sub(k)..(i + k + 1).min(envelope.len())];
        let m = mean(neighborhood);
        let diffuse = m > ENERGY_FLOOR && std_dev(neighborhood) / m < config.cov_threshold;
        if diffuse {
            run += 1;
            if run >= stable {
                detected = Some(i + 1 - stable);
                break;
            }
        } else {
            run = 0;
        }
    }

    let mixing_ms = match detected {
        Some(index) => index as f32 * config.envelope_window_ms,
        None => config.default_ms,
    };
    mixing_ms.clamp(config.min_ms, config.max_ms)
}

/// Reliability of the late-reverb estimate, 0–1
///
/// 30% late-segment length (full at 100 ms), 30% late energy share (full at
/// 20%), 40% share of consecutive envelope windows that do not increase. A
/// silent late segment scores no smoothness.
pub fn late_reverb_confidence(
    late: &[f32],
    late_energy_fraction: f32,
    sample_rate: u32,
    envelope_window_ms: f32,
) -> f32 {
    if sample_rate == 0 {
        return 0.0;
    }
    let late_ms = late.len() as f32 * 1000.0 / sample_rate as f32;
    let length_score = (late_ms / CONFIDENCE_MIN_LATE_MS).min(1.0);
    let energy_score = (late_energy_fraction / CONFIDENCE_EXPECTED_LATE_FRACTION).min(1.0);

    let envelope = energy_envelope(late, sample_rate, envelope_window_ms);
    let smoothness = if envelope.len() < 2 || envelope.iter().sum::<f32>() <= ENERGY_FLOOR {
        0.0
    } else {
        let decreasing = envelope.windows(2).filter(|w| w[1] <= w[0]).count();
        decreasing as f32 / (envelope.len() - 1) as f32
    };

    (0.3 * length_score + 0.3 * energy_score + 0.4 * smoothness).clamp(0.0, 1.0)
}

/// Energy of consecutive non-overlapping windows (trailing partial window dropped)
fn energy_envelope(signal: &[f32], sample_rate: u32, window_ms: f32) -> Vec<f32> {
    let window = ((window_ms / 1000.0) * sample_rate as f32).round().max(1.0) as usize;
    signal
        .chunks_exact(window)
        .map(energy)
        .collect()
}

fn energy(samples: &[f32]) -> f32 {
    samples.iter().map(|x| x * x).sum()
}

/// Splits impulse responses at the mixing time and featurizes both parts
pub struct OrientationAwareExtractor {
    sample_rate: u32,
    mixing: MixingTimeConfig,
    early: FeatureExtractor,
}

impl OrientationAwareExtractor {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_config(
            sample_rate,
            MixingTimeConfig::default(),
            ChirpFeatureConfig::default(),
        )
    }

    pub fn with_config(
        sample_rate: u32,
        mixing: MixingTimeConfig,
        chirp_features: ChirpFeatureConfig,
    ) -> Self {
        Self {
            sample_rate,
            mixing,
            early: FeatureExtractor::with_config(sample_rate, chirp_features),
        }
    }

    /// # Errors
    /// `SampleRateMismatch` if the response was recorded at another rate.
    pub fn extract(&self, ir: &ImpulseResponse) -> Result<OrientationAwareFeatures, DspError> {
        if ir.sample_rate != self.sample_rate {
            return Err(DspError::SampleRateMismatch {
                expected: self.sample_rate,
                actual: ir.sample_rate,
            });
        }
        Ok(self.extract_samples(&ir.data))
    }

    pub fn extract_samples(&self, ir: &[f32]) -> OrientationAwareFeatures {
        let mixing_time_ms = detect_mixing_time(ir, self.sample_rate, &self.mixing);
        let split = ((mixing_time_ms / 1000.0) * self.sample_rate as f32).round() as usize;
        let (early, late) = ir.split_at(split.min(ir.len()));

        let total_energy = energy(ir);
        let late_energy_fraction = if total_energy > ENERGY_FLOOR {
            energy(late) / total_energy
        } else {
            0.0
        };

        let late_features = self.late_features(late, late_energy_fraction, mixing_time_ms);
        let early_features = self.early.extract_samples(early).raw[EARLY_SOURCE_SLOTS].to_vec();
        let confidence = late_reverb_confidence(
            late,
            late_energy_fraction,
            self.sample_rate,
            self.mixing.envelope_window_ms,
        );

        OrientationAwareFeatures::from_parts(late_features, early_features, mixing_time_ms, confidence)
    }

    fn late_features(&self, late: &[f32], late_energy_fraction: f32, mixing_time_ms: f32) -> Vec<f32> {
        let sample_rate = self.sample_rate;
        let mut values = vec![estimate_rt60(late, sample_rate)];

        // Per-band decay rate from the band-limited Schroeder curve
        values.extend(CHIRP_OCTAVE_CENTERS.iter().map(|&center| {
            let (low, high) = octave_band_edges(center);
            60.0 / estimate_rt60(&bandpass(late, sample_rate, low, high), sample_rate)
        }));

        let fft_size = next_power_of_two(late.len());
        let power = power_spectrum(late);
        values.extend(octave_band_levels(&power, sample_rate, fft_size, &CHIRP_OCTAVE_CENTERS));

        let spectral = SpectralFeatures::new(sample_rate, fft_size);
        let total: f32 = power.iter().sum();
        let low_fraction = if total > ENERGY_FLOOR {
            spectral.band_energy(&power, 0.0, LOW_FREQUENCY_CUTOFF_HZ) / total
        } else {
            0.0
        };
        values.extend([
            spectral.compute_centroid(&power) / 10000.0,
            spectral.compute_flatness(&power),
            low_fraction,
            late_energy_fraction,
            mixing_time_ms / 1000.0,
        ]);
        values
    }
}

/// Orientation-aware features of an impulse response with default thresholds
pub fn extract_orientation_aware_features(ir: &ImpulseResponse) -> OrientationAwareFeatures {
    OrientationAwareExtractor::new(ir.sample_rate).extract_samples(&ir.data)
}
