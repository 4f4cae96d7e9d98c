// Impulse response extraction - chirp capture → room impulse response
//
// Module organization:
// - deconvolution: regularized spectral deconvolution and trimming
// - decay: Schroeder integration, RT60 (T30) and EDT estimators
// - mod.rs: ImpulseResponse type and the extractor that composes the steps

mod decay;
mod deconvolution;

pub use decay::{
    estimate_edt, estimate_rt60, schroeder_decay_db, schroeder_integration,
    DECAY_FALLBACK_SECONDS, EDT_RANGE, RT60_RANGE,
};
pub use deconvolution::{deconvolve, trim_impulse_response};

use serde::{Deserialize, Serialize};

use crate::capture::CaptureResult;
use crate::config::DeconvolutionConfig;
use crate::error::DspError;

/// Room impulse response produced once per capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpulseResponse {
    pub data: Vec<f32>,
    pub sample_rate: u32,
    pub duration_seconds: f32,
}

impl ImpulseResponse {
    pub fn new(data: Vec<f32>, sample_rate: u32) -> Self {
        let duration_seconds = if sample_rate == 0 {
            0.0
        } else {
            data.len() as f32 / sample_rate as f32
        };
        Self {
            data,
            sample_rate,
            duration_seconds,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Turns chirp captures into trimmed impulse responses
#[derive(Debug, Clone, Default)]
pub struct ImpulseResponseExtractor {
    config: DeconvolutionConfig,
}

impl ImpulseResponseExtractor {
    pub fn new(config: DeconvolutionConfig) -> Self {
        Self { config }
    }

    /// Deconvolve the capture against its emitted reference, then trim
    ///
    /// # Errors
    /// * `SampleRateMismatch` if the capture and its chirp config disagree
    /// * `EmptySignal` if either signal is empty
    pub fn extract(&self, capture: &CaptureResult) -> Result<ImpulseResponse, DspError> {
        if capture.sample_rate != capture.config.sample_rate {
            return Err(DspError::SampleRateMismatch {
                expected: capture.config.sample_rate,
                actual: capture.sample_rate,
            });
        }
        self.extract_from_signals(
            &capture.captured,
            &capture.chirp_reference,
            capture.sample_rate,
        )
    }

    /// Same as [`extract`](Self::extract) for raw recorded/reference signals
    pub fn extract_from_signals(
        &self,
        recorded: &[f32],
        reference: &[f32],
        sample_rate: u32,
    ) -> Result<ImpulseResponse, DspError> {
        let raw = deconvolve(recorded, reference, self.config.epsilon)?;
        let trimmed = trim_impulse_response(&raw, sample_rate, &self.config.trim);
        Ok(ImpulseResponse::new(trimmed, sample_rate))
    }
}
