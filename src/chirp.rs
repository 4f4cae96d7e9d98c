// Chirp generator - logarithmic sine sweep used as the acoustic probe
//
// Phase of the sweep from f1 to f2 over T seconds:
//   φ(t) = 2π·f1·T/k·(e^(k·t/T) − 1),  k = ln(f2/f1)
// so the instantaneous frequency rises exponentially (constant octaves per
// second). A raised-cosine fade at both ends prevents audible clicks.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::DspError;

/// Default probe sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Probe band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChirpMode {
    /// 200 Hz – 18 kHz, 0.5 s
    Audible,
    /// 15 kHz – 20 kHz, 0.3 s
    Ultrasonic,
}

/// Sweep parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChirpConfig {
    pub mode: ChirpMode,
    pub start_frequency: f32,
    pub end_frequency: f32,
    pub duration_seconds: f32,
    pub sample_rate: u32,
    pub fade_seconds: f32,
}

impl ChirpConfig {
    /// Audible preset (200 Hz – 18 kHz, 0.5 s, 10 ms fades)
    pub fn audible(sample_rate: u32) -> Self {
        Self {
            mode: ChirpMode::Audible,
            start_frequency: 200.0,
            end_frequency: 18000.0,
            duration_seconds: 0.5,
            sample_rate,
            fade_seconds: 0.01,
        }
    }

    /// Ultrasonic preset (15 kHz – 20 kHz, 0.3 s, 5 ms fades)
    pub fn ultrasonic(sample_rate: u32) -> Self {
        Self {
            mode: ChirpMode::Ultrasonic,
            start_frequency: 15000.0,
            end_frequency: 20000.0,
            duration_seconds: 0.3,
            sample_rate,
            fade_seconds: 0.005,
        }
    }

    pub fn for_mode(mode: ChirpMode, sample_rate: u32) -> Self {
        match mode {
            ChirpMode::Audible => Self::audible(sample_rate),
            ChirpMode::Ultrasonic => Self::ultrasonic(sample_rate),
        }
    }

    /// Number of samples the sweep occupies
    pub fn num_samples(&self) -> usize {
        (self.duration_seconds as f64 * self.sample_rate as f64).round() as usize
    }

    /// Check the sweep invariants
    ///
    /// # Validation Rules
    /// * 0 < start_frequency < end_frequency ≤ Nyquist
    /// * duration_seconds finite and > 0, sample_rate > 0
    ///
    /// NaN in any field fails the rule it appears in.
    /// * 0 ≤ fade_seconds ≤ duration_seconds / 2 (fades must not overlap)
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> Result<(), DspError> {
        let invalid = |reason: String| Err(DspError::InvalidChirpConfig { reason });

        if self.sample_rate == 0 {
            return invalid("sample rate must be positive".to_string());
        }
        if !(self.start_frequency > 0.0) {
            return invalid(format!(
                "start frequency {} Hz must be positive",
                self.start_frequency
            ));
        }
        if !(self.end_frequency > self.start_frequency) {
            return invalid(format!(
                "start frequency {} Hz must be below end frequency {} Hz",
                self.start_frequency, self.end_frequency
            ));
        }
        let nyquist = self.sample_rate as f32 / 2.0;
        if !(self.end_frequency <= nyquist) {
            return invalid(format!(
                "end frequency {} Hz exceeds Nyquist {} Hz",
                self.end_frequency, nyquist
            ));
        }
        if !(self.duration_seconds > 0.0 && self.duration_seconds.is_finite()) {
            return invalid(format!(
                "duration {} s must be positive and finite",
                self.duration_seconds
            ));
        }
        if !(self.fade_seconds >= 0.0 && self.fade_seconds <= self.duration_seconds / 2.0) {
            return invalid(format!(
                "fade {} s must be within [0, duration/2 = {} s]",
                self.fade_seconds,
                self.duration_seconds / 2.0
            ));
        }
        Ok(())
    }
}

impl Default for ChirpConfig {
    fn default() -> Self {
        Self::audible(DEFAULT_SAMPLE_RATE)
    }
}

/// Generate the faded logarithmic sweep described by `config`
pub fn generate_chirp(config: &ChirpConfig) -> Result<Vec<f32>, DspError> {
    config.validate()?;

    let num_samples = config.num_samples();
    let f1 = config.start_frequency as f64;
    let f2 = config.end_frequency as f64;
    let duration = config.duration_seconds as f64;
    let sample_rate = config.sample_rate as f64;
    let k = (f2 / f1).ln();

    let mut sweep: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            let phase = 2.0 * PI * f1 * duration / k * ((k * t / duration).exp() - 1.0);
            phase.sin() as f32
        })
        .collect();

    apply_fades(&mut sweep, config);
    Ok(sweep)
}

/// Raised-cosine fade-in and fade-out, in place
fn apply_fades(sweep: &mut [f32], config: &ChirpConfig) {
    let len = sweep.len();
    let fade_samples =
        ((config.fade_seconds as f64 * config.sample_rate as f64).round() as usize).min(len / 2);
    if fade_samples == 0 {
        return;
    }

    for i in 0..fade_samples {
        let gain = (0.5 * (1.0 - (PI * i as f64 / fade_samples as f64).cos())) as f32;
        sweep[i] *= gain;
        sweep[len - 1 - i] *= gain;
    }
}
