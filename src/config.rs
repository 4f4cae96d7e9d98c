//! Configuration management for pipeline parameter tuning
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling fast iteration without recompilation. The empirical constants
//! of deconvolution, feature framing, mixing-time detection, capture
//! timing, and orientation-diversity gating are all adjustable here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub deconvolution: DeconvolutionConfig,
    pub chirp_features: ChirpFeatureConfig,
    pub ambient: AmbientConfig,
    pub mixing_time: MixingTimeConfig,
    pub capture: CaptureTimingConfig,
    pub diversity: DiversityConfig,
}

/// Regularized deconvolution and impulse-response trimming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeconvolutionConfig {
    /// Regularization added to |X(f)|² so chirp spectral nulls do not blow up
    pub epsilon: f32,
    pub trim: TrimConfig,
}

impl Default for DeconvolutionConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.001,
            trim: TrimConfig::default(),
        }
    }
}

/// Impulse-response trimming around the direct sound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    /// Samples kept before the direct-sound peak
    pub pre_peak_margin_ms: f32,
    /// Sliding RMS window used to find the end of the decay
    pub rms_window_ms: f32,
    /// End of decay when window RMS < peak × ratio (0.001 = -60 dB)
    pub threshold_ratio: f32,
    pub max_length_seconds: f32,
    pub min_length_ms: f32,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            pre_peak_margin_ms: 1.0,
            rms_window_ms: 50.0,
            threshold_ratio: 0.001,
            max_length_seconds: 2.5,
            min_length_ms: 100.0,
        }
    }
}

/// Framing and cepstral parameters for chirp (RIR) features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChirpFeatureConfig {
    pub frame_ms: f32,
    pub hop_ms: f32,
    pub num_mel_filters: usize,
    /// Lower edge of the mel filterbank in Hz (upper edge is Nyquist)
    pub mel_low_hz: f32,
    /// Clarity value reported when late energy is effectively zero
    pub clarity_sentinel_db: f32,
}

impl Default for ChirpFeatureConfig {
    fn default() -> Self {
        Self {
            frame_ms: 25.0,
            hop_ms: 10.0,
            num_mel_filters: 26,
            mel_low_hz: 20.0,
            clarity_sentinel_db: 20.0,
        }
    }
}

/// Framing and search parameters for passive (ambient) features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    pub frame_ms: f32,
    pub hop_ms: f32,
    pub num_mel_filters: usize,
    pub mel_low_hz: f32,
    /// Half-width of the local-max search around each hum frequency
    pub hvac_search_hz: f32,
    /// Minimum autocorrelation lag as a fraction of the signal length
    pub autocorrelation_min_lag_ratio: f32,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            frame_ms: 50.0,
            hop_ms: 25.0,
            num_mel_filters: 26,
            mel_low_hz: 20.0,
            hvac_search_hz: 5.0,
            autocorrelation_min_lag_ratio: 0.01,
        }
    }
}

/// Mixing-time detector thresholds
///
/// These are empirical values; changing them changes the early/late split
/// and therefore every orientation-aware feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixingTimeConfig {
    pub envelope_window_ms: f32,
    /// Half-width (in envelope windows) of the coefficient-of-variation neighborhood
    pub neighborhood_windows: usize,
    pub cov_threshold: f32,
    /// Consecutive windows the CoV must stay below threshold
    pub stable_windows: usize,
    pub min_ms: f32,
    pub max_ms: f32,
    pub default_ms: f32,
}

impl Default for MixingTimeConfig {
    fn default() -> Self {
        Self {
            envelope_window_ms: 5.0,
            neighborhood_windows: 5,
            cov_threshold: 0.5,
            stable_windows: 3,
            min_ms: 20.0,
            max_ms: 150.0,
            default_ms: 80.0,
        }
    }
}

/// Capture/playback synchronization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureTimingConfig {
    /// Recording starts this long before playback
    pub pre_delay_ms: u64,
    /// Recording continues this long after the chirp ends
    pub reverb_tail_ms: u64,
    pub volume: f32,
}

impl Default for CaptureTimingConfig {
    fn default() -> Self {
        Self {
            pre_delay_ms: 100,
            reverb_tail_ms: 1000,
            volume: 0.8,
        }
    }
}

/// Orientation-diversity gate used to validate training data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiversityConfig {
    pub min_coverage: f32,
    pub min_diversity: f32,
    /// Warn when one octant holds more than this share of samples
    pub max_dominant_share: f32,
    pub min_samples: usize,
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            min_coverage: 0.5,
            min_diversity: 0.5,
            max_dominant_share: 0.5,
            min_samples: 8,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// the JSON is invalid. Missing sections fall back to their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}
